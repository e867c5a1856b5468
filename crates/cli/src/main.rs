use archsketch_core::generation::{
    find_style, Language, Lighting, ResultOrigin, SunDirection, Weather, MASTER_STYLES,
};
use archsketch_core::logging::{init_logging, LoggingConfig};
use archsketch_core::mask::{DisplayRect, MaskExporter, Point};
use archsketch_core::{
    init, EnvCredentials, ExportedMask, GenerateRequest, MaskCanvas, PipelineStatus, PromptResult, SourceImage,
    Studio,
};
use anyhow::{bail, Context, Result};
use arboard::Clipboard;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Override the text model
    #[arg(long, global = true)]
    text_model: Option<String>,

    /// Override the image model
    #[arg(long, global = true)]
    image_model: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a sketch: analyze it, then synthesize an image
    Generate(GenerateArgs),
    /// Re-render an image in a master style
    Style {
        /// Image to restyle
        image: PathBuf,
        /// Master style id (see `styles`)
        #[arg(short, long)]
        style: String,
        /// Output file (extension follows the returned format)
        #[arg(short, long, default_value = "styled")]
        out: PathBuf,
    },
    /// Change the white region of a mask
    Edit {
        /// Image to edit
        image: PathBuf,
        /// Black/white mask at the image's size
        #[arg(short, long)]
        mask: PathBuf,
        /// What to change inside the mask
        #[arg(short, long)]
        instruction: String,
        #[arg(short, long, default_value = "edited")]
        out: PathBuf,
    },
    /// Rewrite free text into a rendering description
    Optimize {
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
        #[arg(short, long, default_value = "en")]
        language: Language,
        /// Copy the result to clipboard
        #[arg(short, long, default_value_t = false)]
        copy: bool,
    },
    /// List master styles and exit
    Styles,
    /// Paint a mask headlessly from display-space strokes
    Mask(MaskArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Building sketch
    sketch: PathBuf,
    /// Photo of the site
    #[arg(long)]
    context: Option<PathBuf>,
    /// Material/mood reference images
    #[arg(long = "reference")]
    references: Vec<PathBuf>,
    #[arg(long)]
    lighting: Option<Lighting>,
    #[arg(long)]
    sun: Option<SunDirection>,
    #[arg(long)]
    weather: Option<Weather>,
    #[arg(long)]
    language: Option<Language>,
    /// Master style id to use instead of the photorealistic default
    #[arg(long)]
    style: Option<String>,
    /// Extra requirements for the description
    #[arg(long)]
    notes: Option<String>,
    #[arg(short, long, default_value = "rendering")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct MaskArgs {
    /// Image the mask is for
    image: PathBuf,
    /// Stroke as "x,y x,y ..." in display coordinates; repeat for more strokes
    #[arg(long = "stroke", required = true)]
    strokes: Vec<String>,
    /// Displayed size as WIDTHxHEIGHT (defaults to the image size)
    #[arg(long)]
    display: Option<String>,
    #[arg(long, default_value_t = 30.0)]
    brush: f32,
    /// Undo this many strokes before exporting
    #[arg(long, default_value_t = 0)]
    undo: usize,
    #[arg(short, long, default_value = "mask.png")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    init();
    let cli = Cli::parse();
    init_logging(if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    });

    match cli.command {
        Command::Styles => {
            println!("Available master styles:");
            for style in MASTER_STYLES {
                println!("  {:<20} {}", style.id, style.label);
            }
            Ok(())
        }
        Command::Mask(args) => run_mask(args),
        Command::Generate(args) => run_generate(&build_studio(cli.text_model, cli.image_model)?, args).await,
        Command::Style { image, style, out } => {
            let studio = build_studio(cli.text_model, cli.image_model)?;
            let target = as_result(load(&image)?);
            let spinner = spinner(format!("Applying style '{}'...", style))?;
            let styled = studio.orchestrator().apply_style_by_id(&target, &style).await;
            spinner.finish_and_clear();
            report_saved(&styled.context("Style application failed")?, &out)
        }
        Command::Edit {
            image,
            mask,
            instruction,
            out,
        } => {
            let studio = build_studio(cli.text_model, cli.image_model)?;
            let target = as_result(load(&image)?);
            let mask = mask_from_file(&mask)?;
            let spinner = spinner("Editing masked region...".to_string())?;
            let edited = studio.orchestrator().apply_edit(&target, &mask, &instruction).await;
            spinner.finish_and_clear();
            report_saved(&edited.context("Edit failed")?, &out)
        }
        Command::Optimize { text, language, copy } => {
            let studio = build_studio(cli.text_model, cli.image_model)?;
            let spinner = spinner("Optimizing prompt...".to_string())?;
            let refined = studio.orchestrator().optimize_prompt(&text.join(" "), language).await;
            spinner.finish_and_clear();
            println!("{}", refined);

            if copy {
                match Clipboard::new() {
                    Ok(mut clipboard) => {
                        if let Err(e) = clipboard.set_text(refined) {
                            eprintln!("Warning: Failed to copy to clipboard: {}", e);
                        } else {
                            println!("(Copied to clipboard)");
                        }
                    }
                    Err(e) => eprintln!("Warning: Could not access clipboard: {}", e),
                }
            }
            Ok(())
        }
    }
}

fn build_studio(text_model: Option<String>, image_model: Option<String>) -> Result<Studio> {
    let studio = Studio::new().context("Failed to initialize. Is GEMINI_API_KEY set?")?;
    if text_model.is_none() && image_model.is_none() {
        return Ok(studio);
    }
    let mut config = studio.config().clone();
    if let Some(m) = text_model {
        config.text_model = m;
    }
    if let Some(m) = image_model {
        config.image_model = m;
    }
    if studio.settings().has_api_key() {
        Studio::with_config(config, studio.settings()).context("Failed to apply model overrides")
    } else {
        Studio::with_config(config, &EnvCredentials).context("Failed to apply model overrides")
    }
}

async fn run_generate(studio: &Studio, args: GenerateArgs) -> Result<()> {
    let orch = studio.orchestrator();
    let mut params = studio.default_params();
    params.lighting = args.lighting.unwrap_or(params.lighting);
    params.sun_direction = args.sun.unwrap_or(params.sun_direction);
    params.weather = args.weather.unwrap_or(params.weather);
    params.language = args.language.unwrap_or(params.language);

    let mut request = GenerateRequest::new(load(&args.sketch)?, params);
    if let Some(path) = &args.context {
        request = request.with_context(load(path)?);
    }
    for path in &args.references {
        request = request.with_reference(load(path)?);
    }
    if let Some(id) = &args.style {
        let style = find_style(id).with_context(|| format!("Unknown style '{}'", id))?;
        request = request.with_style_override(style.instruction);
    }
    if let Some(notes) = args.notes {
        request = request.with_notes(notes);
    }

    let spinner = spinner(format!("Analyzing sketch with {}...", studio.config().text_model))?;
    let mut status = orch.subscribe_status();
    let image_model = studio.config().image_model.clone();
    let watcher = spinner.clone();
    let progress = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            if *status.borrow_and_update() == PipelineStatus::Generating {
                watcher.set_message(format!("Rendering with {}...", image_model));
            }
        }
    });

    let result = orch.generate(request).await;
    spinner.finish_and_clear();
    progress.abort();

    let result = result.context("Generation failed")?;
    println!("{}\n", result.prompt);
    match &result.error {
        Some(error) => eprintln!("Image step failed: {}", error),
        None => report_saved(&result, &args.out)?,
    }
    Ok(())
}

fn run_mask(args: MaskArgs) -> Result<()> {
    let source = load(&args.image)?;
    let mut canvas = MaskCanvas::new();
    let (width, height) = canvas
        .load_source(&source)
        .with_context(|| format!("Cannot paint on {}", args.image.display()))?;
    canvas.set_brush_size(args.brush);

    let surface = match &args.display {
        Some(size) => {
            let (w, h) = parse_size(size)?;
            DisplayRect::sized(w, h)
        }
        None => DisplayRect::sized(width as f32, height as f32),
    };

    for stroke in &args.strokes {
        let points = parse_stroke(stroke)?;
        log::debug!("painting {} point stroke on {:?}", points.len(), surface);
        canvas.paint_stroke(&points, surface)?;
    }
    for _ in 0..args.undo {
        canvas.undo()?;
    }

    let mask = canvas.current_mask().context("Mask surface is not ready")?;
    std::fs::write(&args.out, &mask.payload.bytes)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    println!(
        "Wrote {}x{} mask to {} ({:.1}% painted)",
        mask.width,
        mask.height,
        args.out.display(),
        mask.coverage() * 100.0
    );
    Ok(())
}

fn load(path: &Path) -> Result<SourceImage> {
    SourceImage::from_path(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Wraps an image from disk as a result so it can be refined.
fn as_result(image: SourceImage) -> PromptResult {
    PromptResult::new(String::new(), Some(image.payload), None, ResultOrigin::Generated)
}

/// Reads a mask file and binarizes it with the canvas export rule.
fn mask_from_file(path: &Path) -> Result<ExportedMask> {
    let image = load(path)?.decode().context("Mask is not a readable image")?;
    MaskExporter::default()
        .import(&image)
        .with_context(|| format!("Failed to read mask {}", path.display()))
}

fn report_saved(result: &PromptResult, out: &Path) -> Result<()> {
    let image = result.image.as_ref().context("No image in result")?;
    let path = out.with_extension(image.extension());
    std::fs::write(&path, &image.bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved {} ({})", path.display(), result.id);
    Ok(())
}

fn spinner(message: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")?,
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

fn parse_size(text: &str) -> Result<(f32, f32)> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .with_context(|| format!("Expected WIDTHxHEIGHT, got '{}'", text))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

fn parse_stroke(text: &str) -> Result<Vec<Point>> {
    let points = text
        .split_whitespace()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .with_context(|| format!("Expected x,y, got '{}'", pair))?;
            Ok(Point::new(x.trim().parse()?, y.trim().parse()?))
        })
        .collect::<Result<Vec<_>>>()?;
    if points.is_empty() {
        bail!("Empty stroke");
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strokes_and_sizes() {
        assert_eq!(
            parse_stroke("1,2 3.5,4").unwrap(),
            vec![Point::new(1.0, 2.0), Point::new(3.5, 4.0)]
        );
        assert!(parse_stroke("1;2").is_err());
        assert!(parse_stroke("   ").is_err());
        assert_eq!(parse_size("800x600").unwrap(), (800.0, 600.0));
        assert!(parse_size("800").is_err());
    }
}
