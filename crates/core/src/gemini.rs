use crate::config::{Config, CredentialProvider};
use crate::error::{AppError, Result};
use crate::generation::{FailureKind, GenerationRequest, GenerationService};
use crate::imaging::ImagePayload;
use gemini_rust::{BlockReason, Blob, Content, FinishReason, Gemini, GenerationResponse, Message, Part, Role};
use serde::Serialize;
use std::future::Future;

/// [`GenerationService`] backed by the Gemini API.
///
/// Text replies come from the text model, images from the image model.
pub struct GeminiClient {
    text: Gemini,
    image: Gemini,
}

impl GeminiClient {
    pub fn new(config: &Config, credentials: &impl CredentialProvider) -> Result<Self> {
        let api_key = credentials.api_key()?;
        Ok(Self {
            text: build_client(&api_key, &config.base_url, &config.text_model)?,
            image: build_client(&api_key, &config.base_url, &config.image_model)?,
        })
    }

    async fn execute(client: &Gemini, request: GenerationRequest) -> Result<GenerationResponse> {
        log::debug!(
            "{} request: {} image(s), {} chars",
            request.operation,
            request.images.len(),
            request.instruction.len()
        );

        let mut instruction = request.instruction;
        if let Some(ratio) = request.aspect_ratio {
            // the ratio is carried in the prompt; the image model honours it there
            if !instruction.contains(ratio.as_str()) {
                instruction.push_str(&format!("\n\nOutput aspect ratio: {}.", ratio));
            }
        }

        let mut parts = vec![Part::Text {
            text: instruction,
            thought: None,
            thought_signature: None,
        }];
        parts.extend(request.images.iter().map(|image| Part::InlineData {
            inline_data: Blob {
                mime_type: image.mime_type.clone(),
                data: image.to_base64(),
            },
        }));

        let message = Message {
            role: Role::User,
            content: Content {
                role: Some(Role::User),
                parts: Some(parts),
            },
        };

        client
            .generate_content()
            .with_messages(vec![message])
            .execute()
            .await
            .map_err(|e| AppError::GeminiApi(format!("API request failed: {:?}", e)))
    }
}

fn build_client(api_key: &str, base_url: &str, model: &str) -> Result<Gemini> {
    // Explicit base URL avoids the BadScheme error from relative model paths
    let base = url::Url::parse(base_url).map_err(|e| AppError::Config(format!("Invalid base URL: {}", e)))?;

    let model_name = if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    };
    let model_url = format!("{}/{}", base_url.trim_end_matches('/'), model_name);

    Gemini::with_model_and_base_url(api_key, model_url, base)
        .map_err(|e| AppError::Config(format!("Failed to create Gemini client: {}", e)))
}

/// First non-thought text part of the first candidate.
fn first_text(response: &GenerationResponse) -> Option<String> {
    let parts = response.candidates.first()?.content.parts.as_ref()?;
    parts.iter().find_map(|part| match part {
        Part::Text { text, thought, .. } if !thought.unwrap_or(false) => Some(text.clone()),
        _ => None,
    })
}

/// First inline image of the first candidate.
fn first_image(response: &GenerationResponse) -> Option<Result<ImagePayload>> {
    let parts = response.candidates.first()?.content.parts.as_ref()?;
    parts.iter().find_map(|part| match part {
        Part::InlineData { inline_data } => Some(ImagePayload::from_base64(
            inline_data.mime_type.clone(),
            &inline_data.data,
        )),
        _ => None,
    })
}

/// Wire name of a reply enum, e.g. `PROHIBITED_CONTENT`.
fn wire_name(value: &impl Serialize) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => "UNKNOWN".to_string(),
    }
}

fn is_policy_finish(reason: &FinishReason) -> bool {
    matches!(
        reason,
        FinishReason::Safety
            | FinishReason::ImageSafety
            | FinishReason::ProhibitedContent
            | FinishReason::Blocklist
            | FinishReason::Spii
    )
}

fn is_policy_block(reason: &BlockReason) -> bool {
    matches!(
        reason,
        BlockReason::Safety | BlockReason::ImageSafety | BlockReason::ProhibitedContent | BlockReason::Blocklist
    )
}

/// Error for a reply that carried no image.
///
/// Content-policy stops, on the prompt or on the candidate, are reported as
/// already-classified safety failures so they are neither retried nor shown
/// as generic errors.
fn missing_image_error(response: &GenerationResponse) -> AppError {
    let blocked = response.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_ref());
    let finish = response.candidates.first().and_then(|c| c.finish_reason.as_ref());

    let detail = match (blocked, finish) {
        (Some(reason), _) => format!("Prompt blocked (block reason: {})", wire_name(reason)),
        (None, Some(reason)) => {
            let note = first_text(response).unwrap_or_default();
            format!("No image returned (finish reason: {}) {}", wire_name(reason), note.trim())
                .trim_end()
                .to_string()
        }
        (None, None) if response.candidates.is_empty() => {
            "No candidates returned; the prompt may have been blocked by safety filters".to_string()
        }
        (None, None) => "No image returned".to_string(),
    };

    if blocked.is_some_and(is_policy_block) || finish.is_some_and(is_policy_finish) {
        log::warn!("image refused by content policy: {}", detail);
        let kind = FailureKind::SafetyBlocked;
        return AppError::Generation {
            kind,
            message: kind.user_message(&detail),
        };
    }
    AppError::gemini(detail)
}

impl GenerationService for GeminiClient {
    fn describe(&self, request: GenerationRequest) -> impl Future<Output = Result<String>> + Send {
        async move {
            let response = Self::execute(&self.text, request).await?;
            first_text(&response).ok_or_else(|| AppError::gemini("No text response received from Gemini"))
        }
    }

    fn render(&self, request: GenerationRequest) -> impl Future<Output = Result<ImagePayload>> + Send {
        async move {
            let response = Self::execute(&self.image, request).await?;
            match first_image(&response) {
                Some(image) => image,
                None => Err(missing_image_error(&response)),
            }
        }
    }
}
