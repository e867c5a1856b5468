//! Remote generation pipeline.
//!
//! - [`params`]: scene parameters chosen in the UI
//! - [`aspect`]: output aspect-ratio selection
//! - [`classify`]: remote failure taxonomy
//! - [`retry`]: sequential backoff for image synthesis
//! - [`service`]: the remote boundary trait
//! - [`prompts`]: instruction text per call
//! - [`styles`]: built-in master styles
//! - [`result`] / [`history`]: results and the bounded result list
//! - [`orchestrator`]: sequencing, status and single-flight control

pub mod aspect;
pub mod classify;
pub mod history;
pub mod orchestrator;
pub mod params;
pub mod prompts;
pub mod result;
pub mod retry;
pub mod service;
pub mod styles;

pub use aspect::{select_aspect_ratio, AspectRatio};
pub use classify::{classify_failure, FailureKind};
pub use history::{ResultHistory, HISTORY_CAPACITY};
pub use orchestrator::{GenerateRequest, Orchestrator, PipelineStatus};
pub use params::{GenerationParams, Language, Lighting, SunDirection, Weather};
pub use result::{PromptResult, ResultOrigin};
pub use retry::{AttemptState, Retrier, RetryPolicy, Sleeper, TokioSleeper};
pub use service::{GenerationRequest, GenerationService, Operation};
pub use styles::{find_style, MasterStyle, MASTER_STYLES};
