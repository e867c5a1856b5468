//! Instruction text for each remote call.

use super::aspect::AspectRatio;
use super::params::{GenerationParams, Language};

const PHOTOREAL_DEFAULT: &str = "Produce a photorealistic architectural rendering, as if shot by a \
professional architectural photographer: physically plausible materials, accurate perspective, \
natural lighting and a believable surrounding context.";

/// Instruction for the analysis call that turns a sketch into a description.
pub fn analysis_instruction(
    params: &GenerationParams,
    has_context: bool,
    reference_count: usize,
    notes: Option<&str>,
) -> String {
    let mut text = String::from(
        "You are an architectural visualization expert. The first image is a building sketch. \
         Describe the building so that an image model can render it photorealistically: massing, \
         storeys, roof form, openings, facade materials and colours, and surroundings. \
         Keep the geometry of the sketch exactly.",
    );
    if has_context {
        text.push_str(" The next image shows the real site; place the building into that context.");
    }
    if reference_count > 0 {
        text.push_str(&format!(
            " The last {} image(s) are material and mood references; borrow their materials and atmosphere, not their geometry.",
            reference_count
        ));
    }
    text.push_str(&format!(" Scene conditions: {}", params.scene_description()));
    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        text.push_str(&format!(" Additional requirements from the user: {}.", notes));
    }
    text.push_str(&format!(
        " Reply with the description only, written in {}, as one paragraph.",
        params.language.phrase()
    ));
    text
}

/// Instruction for the synthesis call.
///
/// An explicit style instruction replaces the photorealistic default.
pub fn synthesis_instruction(description: &str, style: Option<&str>, aspect_ratio: AspectRatio) -> String {
    let style = style.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(PHOTOREAL_DEFAULT);
    format!(
        "{} Follow the geometry of the attached sketch exactly.\n\nScene: {}\n\nOutput aspect ratio: {}.",
        style, description, aspect_ratio
    )
}

/// Instruction for re-rendering an existing image in a master style.
pub fn style_instruction(style: &str) -> String {
    format!(
        "Re-render the attached architectural image in the following style while preserving its \
         geometry, camera position, perspective and composition exactly. Change only materials, \
         lighting, atmosphere and rendering style. Style: {}",
        style.trim()
    )
}

/// Instruction for a masked edit. The first image is the rendering, the second the mask.
pub fn edit_instruction(instruction: &str) -> String {
    format!(
        "Edit the first image. The second image is a mask: white pixels mark the region to change, \
         black pixels must stay exactly as they are. Inside the white region only: {}. \
         Keep lighting and perspective consistent with the rest of the image.",
        instruction.trim()
    )
}

/// Instruction for rewriting free text into a rendering description.
pub fn optimize_instruction(text: &str, language: Language) -> String {
    format!(
        "Rewrite the following request as a precise, vivid description for an architectural \
         rendering model. Keep every requirement the user stated and do not invent a different \
         building. Reply in {} with the rewritten description only.\n\nRequest: {}",
        language.phrase(),
        text.trim()
    )
}

/// Cuts `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
