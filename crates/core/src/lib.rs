//! ArchSketch Core Library
//!
//! Turns building sketches into AI renderings and refines them, either with
//! whole-image master styles or with localized edits painted through a mask.
//!
//! # Overview
//!
//! - **Mask capture**: freehand painting, undo/redo and binary mask export via [`mask`]
//! - **Generation**: the analyze → synthesize pipeline, retries and result history via [`generation`]
//! - **AI Integration**: the Gemini-backed service via [`gemini`]
//!
//! # Quick Start
//!
//! ```ignore
//! use archsketch_core::{Studio, GenerateRequest, GenerationParams, SourceImage};
//!
//! let studio = Studio::new()?;
//! let sketch = SourceImage::from_path("sketch.png")?;
//! let result = studio
//!     .orchestrator()
//!     .generate(GenerateRequest::new(sketch, GenerationParams::default()))
//!     .await?;
//! ```
//!
//! # Module Structure
//!
//! - [`config`]: Configuration and credential providers
//! - [`error`]: Error types and result aliases
//! - [`gemini`]: Gemini client implementing the generation service
//! - [`generation`]: Orchestrator, retry, classification, history
//! - [`imaging`]: Image payloads
//! - [`logging`]: Logger initialization
//! - [`mask`]: Mask canvas engine
//! - [`settings`]: Persisted user preferences

pub mod config;
pub mod error;
pub mod gemini;
pub mod generation;
pub mod imaging;
pub mod logging;
pub mod mask;
pub mod settings;

// Re-export primary types for convenience
pub use config::{Config, CredentialProvider, EnvCredentials, StaticCredentials};
pub use error::{AppError, Result};
pub use gemini::GeminiClient;
pub use generation::{
    GenerateRequest, GenerationParams, Orchestrator, PipelineStatus, PromptResult,
};
pub use imaging::{ImagePayload, SourceImage};
pub use mask::{ExportedMask, MaskCanvas};
pub use settings::Settings;

/// Main entry point wiring configuration, credentials and the Gemini
/// service into an [`Orchestrator`].
pub struct Studio {
    config: Config,
    settings: Settings,
    orchestrator: Orchestrator<GeminiClient>,
}

impl Studio {
    /// Loads configuration from the environment and settings from disk.
    ///
    /// The API key stored in settings wins over the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is malformed or no API key is available.
    pub fn new() -> Result<Self> {
        let settings = Settings::load();
        let mut config = Config::load()?;
        settings.apply_to(&mut config);
        if settings.has_api_key() {
            let credentials = settings.clone();
            Self::build(config, settings, &credentials)
        } else {
            Self::build(config, settings, &EnvCredentials)
        }
    }

    /// Creates an instance with explicit configuration and credentials.
    pub fn with_config(config: Config, credentials: &impl CredentialProvider) -> Result<Self> {
        Self::build(config, Settings::default(), credentials)
    }

    fn build(config: Config, settings: Settings, credentials: &impl CredentialProvider) -> Result<Self> {
        let client = GeminiClient::new(&config, credentials)?;
        let orchestrator = Orchestrator::from_config(client, &config);
        log::debug!("studio ready (text: {}, image: {})", config.text_model, config.image_model);
        Ok(Self {
            config,
            settings,
            orchestrator,
        })
    }

    pub fn orchestrator(&self) -> &Orchestrator<GeminiClient> {
        &self.orchestrator
    }

    /// A mask canvas using the stored brush size.
    pub fn mask_canvas(&self) -> MaskCanvas {
        let mut canvas = MaskCanvas::new();
        canvas.set_brush_size(self.settings.brush_size);
        canvas
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Default scene parameters from settings.
    pub fn default_params(&self) -> GenerationParams {
        self.settings.params
    }
}

/// Loads `.env` so later configuration lookups can see it.
///
/// Call this once at application startup.
pub fn init() {
    let _ = dotenvy::dotenv();
}
