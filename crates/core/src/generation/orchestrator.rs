//! Pipeline sequencing and status tracking.
//!
//! The orchestrator runs one pipeline at a time. Status moves
//! `Idle -> Analyzing -> Generating -> Idle` for a full generation,
//! `Idle -> Generating -> Idle` for a style application and
//! `Idle -> Editing -> Idle` for a masked edit. Starting anything while the
//! status is not `Idle` fails with [`AppError::Busy`]; the status returns to
//! `Idle` on every exit path, including a caller dropping the future.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;

use super::aspect::select_aspect_ratio;
use super::classify::classify_failure;
use super::history::ResultHistory;
use super::params::{GenerationParams, Language};
use super::prompts;
use super::result::{PromptResult, ResultOrigin};
use super::retry::{Retrier, RetryPolicy, Sleeper, TokioSleeper};
use super::service::{GenerationRequest, GenerationService, Operation};
use super::styles::find_style;
use crate::config::{Config, DEFAULT_MAX_PROMPT_CHARS};
use crate::error::{AppError, Result};
use crate::imaging::SourceImage;
use crate::mask::ExportedMask;

/// What the orchestrator is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineStatus {
    #[default]
    Idle,
    Analyzing,
    Generating,
    Editing,
}

impl PipelineStatus {
    pub fn is_idle(self) -> bool {
        self == PipelineStatus::Idle
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineStatus::Idle => "idle",
            PipelineStatus::Analyzing => "analyzing",
            PipelineStatus::Generating => "generating",
            PipelineStatus::Editing => "editing",
        })
    }
}

/// Inputs for a full sketch-to-rendering generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Required; a request without one is rejected before any remote call.
    pub sketch: Option<SourceImage>,
    /// Photo of the real site.
    pub context: Option<SourceImage>,
    /// Material and mood references.
    pub references: Vec<SourceImage>,
    pub params: GenerationParams,
    /// Replaces the photorealistic default in the synthesis call.
    pub style_override: Option<String>,
    /// Free-text requirements folded into the analysis.
    pub notes: Option<String>,
}

impl GenerateRequest {
    pub fn new(sketch: SourceImage, params: GenerationParams) -> Self {
        Self {
            sketch: Some(sketch),
            params,
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context: SourceImage) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_reference(mut self, reference: SourceImage) -> Self {
        self.references.push(reference);
        self
    }

    pub fn with_style_override(mut self, style: impl Into<String>) -> Self {
        self.style_override = Some(style.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Holds the single-flight slot; resets the status to idle when dropped.
struct Flight<'a> {
    status: &'a watch::Sender<PipelineStatus>,
}

impl Flight<'_> {
    fn advance(&self, next: PipelineStatus) {
        log::debug!("pipeline status -> {}", next);
        self.status.send_replace(next);
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.status.send_replace(PipelineStatus::Idle);
        log::debug!("pipeline status -> idle");
    }
}

/// Drives remote generation calls and owns the result history.
pub struct Orchestrator<S, Z = TokioSleeper> {
    service: S,
    sleeper: Z,
    retry: RetryPolicy,
    max_prompt_chars: usize,
    status: watch::Sender<PipelineStatus>,
    history: Mutex<ResultHistory>,
}

impl<S: GenerationService> Orchestrator<S, TokioSleeper> {
    pub fn new(service: S) -> Self {
        Self::with_sleeper(service, TokioSleeper)
    }

    /// Uses the retry policy and prompt limit from `config`.
    pub fn from_config(service: S, config: &Config) -> Self {
        Self::new(service)
            .with_retry_policy(config.retry)
            .with_max_prompt_chars(config.max_prompt_chars)
    }
}

impl<S: GenerationService, Z: Sleeper> Orchestrator<S, Z> {
    pub fn with_sleeper(service: S, sleeper: Z) -> Self {
        let (status, _) = watch::channel(PipelineStatus::Idle);
        Self {
            service,
            sleeper,
            retry: RetryPolicy::default(),
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            status,
            history: Mutex::new(ResultHistory::default()),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn with_max_prompt_chars(mut self, max: usize) -> Self {
        self.max_prompt_chars = max.max(1);
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn status(&self) -> PipelineStatus {
        *self.status.borrow()
    }

    /// A receiver that observes every status change.
    pub fn subscribe_status(&self) -> watch::Receiver<PipelineStatus> {
        self.status.subscribe()
    }

    /// Results, newest first (at most three).
    pub fn history(&self) -> Vec<PromptResult> {
        self.lock_history().to_vec()
    }

    pub fn latest(&self) -> Option<PromptResult> {
        self.lock_history().latest().cloned()
    }

    /// Sketch → description → image.
    ///
    /// An image failure after retries does not fail the call: the result
    /// keeps the description and records the error instead.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if no sketch was supplied (nothing is sent)
    /// - [`AppError::Busy`] if another pipeline is running
    /// - [`AppError::Generation`] if the analysis call fails
    pub async fn generate(&self, request: GenerateRequest) -> Result<PromptResult> {
        let sketch = request
            .sketch
            .as_ref()
            .ok_or_else(|| AppError::validation("a sketch image is required to generate a rendering"))?;

        let flight = self.begin(PipelineStatus::Analyzing)?;
        log::info!("generation started ({} reference image(s))", request.references.len());

        let analysis = GenerationRequest::new(
            Operation::Analyze,
            prompts::analysis_instruction(
                &request.params,
                request.context.is_some(),
                request.references.len(),
                request.notes.as_deref(),
            ),
        )
        .with_image(sketch.payload.clone())
        .with_images(request.context.iter().map(|c| c.payload.clone()))
        .with_images(request.references.iter().map(|r| r.payload.clone()));

        let description = match self.service.describe(analysis).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                return Err(analysis_failure("the service returned an empty description"));
            }
            Err(e) => return Err(analysis_failure(&e.to_string())),
        };

        flight.advance(PipelineStatus::Generating);
        let ratio = select_aspect_ratio(sketch.dimensions);
        let prompt = prompts::truncate_chars(&description, self.max_prompt_chars);
        let synthesis = GenerationRequest::new(
            Operation::Synthesize,
            prompts::synthesis_instruction(prompt, request.style_override.as_deref(), ratio),
        )
        .with_image(sketch.payload.clone())
        .with_aspect_ratio(ratio);

        let retrier = Retrier::new(self.retry, &self.sleeper);
        let rendered = retrier.run(|_| self.service.render(synthesis.clone())).await;

        let result = match rendered {
            Ok(image) => {
                log::info!("generation finished at {}", ratio);
                PromptResult::new(description, Some(image), None, ResultOrigin::Generated)
            }
            Err(e) => {
                log::warn!("image step failed, keeping the description: {}", e);
                PromptResult::new(description, None, Some(e.to_string()), ResultOrigin::Generated)
            }
        };

        // history first, so watchers woken by Idle see the new result
        self.record(result.clone());
        drop(flight);
        Ok(result)
    }

    /// Re-renders `target`'s image with a style instruction, keeping its geometry.
    ///
    /// Single attempt; a failure leaves history untouched.
    pub async fn apply_style(&self, target: &PromptResult, style_label: &str, style_instruction: &str) -> Result<PromptResult> {
        let image = target
            .image
            .clone()
            .ok_or_else(|| AppError::validation("the selected result has no image to restyle"))?;

        let _flight = self.begin(PipelineStatus::Generating)?;
        log::info!("applying style '{}' to {}", style_label, target.id);

        let request = GenerationRequest::new(Operation::Style, prompts::style_instruction(style_instruction))
            .with_image(image);
        let styled = self.service.render(request).await.map_err(classified)?;

        let result = target.derive(
            styled,
            ResultOrigin::Styled {
                style: style_label.to_string(),
            },
        );
        self.record(result.clone());
        Ok(result)
    }

    /// [`Self::apply_style`] with a built-in master style.
    pub async fn apply_style_by_id(&self, target: &PromptResult, style_id: &str) -> Result<PromptResult> {
        let style = find_style(style_id)
            .ok_or_else(|| AppError::validation(format!("unknown master style '{}'", style_id)))?;
        self.apply_style(target, style.id, style.instruction).await
    }

    /// Changes the white region of `mask` in `target`'s image.
    ///
    /// Produces a new result; `target` stays as it was.
    pub async fn apply_edit(&self, target: &PromptResult, mask: &ExportedMask, instruction: &str) -> Result<PromptResult> {
        let image = target
            .image
            .clone()
            .ok_or_else(|| AppError::validation("the selected result has no image to edit"))?;
        if instruction.trim().is_empty() {
            return Err(AppError::validation("describe the change to make inside the mask"));
        }
        if mask.is_empty() {
            return Err(AppError::validation("paint the region to edit before applying"));
        }
        if let Some(dims) = SourceImage::from_payload(image.clone()).dimensions
            && dims != mask.dimensions()
        {
            return Err(AppError::validation(format!(
                "mask is {}x{} but the image is {}x{}",
                mask.width, mask.height, dims.0, dims.1
            )));
        }

        let _flight = self.begin(PipelineStatus::Editing)?;
        log::info!(
            "editing {} ({:.1}% of the image)",
            target.id,
            mask.coverage() * 100.0
        );

        let request = GenerationRequest::new(Operation::Edit, prompts::edit_instruction(instruction))
            .with_image(image)
            .with_image(mask.payload.clone());
        let edited = self.service.render(request).await.map_err(classified)?;

        let result = target.derive(
            edited,
            ResultOrigin::Edited {
                instruction: instruction.trim().to_string(),
                parent: target.id,
            },
        );
        self.record(result.clone());
        Ok(result)
    }

    /// Best-effort rewrite of free text into a rendering description.
    ///
    /// Never fails: any problem yields `text` unchanged. Does not take the
    /// pipeline slot.
    pub async fn optimize_prompt(&self, text: &str, language: Language) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        let request = GenerationRequest::new(Operation::Optimize, prompts::optimize_instruction(text, language));
        match self.service.describe(request).await {
            Ok(refined) if !refined.trim().is_empty() => refined.trim().to_string(),
            Ok(_) => text.to_string(),
            Err(e) => {
                log::warn!("prompt optimization failed, keeping the original: {}", e);
                text.to_string()
            }
        }
    }

    fn begin(&self, initial: PipelineStatus) -> Result<Flight<'_>> {
        let mut current = PipelineStatus::Idle;
        let acquired = self.status.send_if_modified(|status| {
            if status.is_idle() {
                *status = initial;
                true
            } else {
                current = *status;
                false
            }
        });
        if !acquired {
            log::warn!("rejected {} request while {}", initial, current);
            return Err(AppError::Busy(current));
        }
        log::debug!("pipeline status -> {}", initial);
        Ok(Flight { status: &self.status })
    }

    fn record(&self, result: PromptResult) {
        self.lock_history().push(result);
    }

    fn lock_history(&self) -> MutexGuard<'_, ResultHistory> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn analysis_failure(detail: &str) -> AppError {
    let kind = classify_failure(detail);
    AppError::Generation {
        kind,
        message: format!("Sketch analysis failed ({}): {}", kind, detail),
    }
}

fn classified(error: AppError) -> AppError {
    if error.failure_kind().is_some() {
        return error;
    }
    let detail = error.to_string();
    let kind = classify_failure(&detail);
    log::warn!("{} failure: {}", kind, detail);
    AppError::Generation {
        kind,
        message: kind.user_message(&detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::classify::FailureKind;
    use crate::imaging::ImagePayload;
    use crate::mask::{DisplayRect, MaskCanvas, Point};
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::collections::VecDeque;
    use std::future::Future;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeService {
        texts: Mutex<VecDeque<Result<String>>>,
        images: Mutex<VecDeque<Result<ImagePayload>>>,
        calls: Mutex<Vec<GenerationRequest>>,
    }

    impl FakeService {
        fn text(self, reply: &str) -> Self {
            self.texts.lock().unwrap().push_back(Ok(reply.to_string()));
            self
        }

        fn text_error(self, message: &str) -> Self {
            self.texts.lock().unwrap().push_back(Err(AppError::gemini(message)));
            self
        }

        fn image(self, payload: ImagePayload) -> Self {
            self.images.lock().unwrap().push_back(Ok(payload));
            self
        }

        fn image_error(self, message: &str) -> Self {
            self.images.lock().unwrap().push_back(Err(AppError::gemini(message)));
            self
        }

        fn operations(&self) -> Vec<Operation> {
            self.calls.lock().unwrap().iter().map(|c| c.operation).collect()
        }
    }

    impl GenerationService for FakeService {
        fn describe(&self, request: GenerationRequest) -> impl Future<Output = Result<String>> + Send {
            self.calls.lock().unwrap().push(request);
            let reply = self
                .texts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::gemini("no scripted text reply")));
            std::future::ready(reply)
        }

        fn render(&self, request: GenerationRequest) -> impl Future<Output = Result<ImagePayload>> + Send {
            self.calls.lock().unwrap().push(request);
            let reply = self
                .images
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::gemini("no scripted image reply")));
            std::future::ready(reply)
        }
    }

    #[derive(Default)]
    struct RecordingSleeper(Mutex<Vec<Duration>>);

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
            self.0.lock().unwrap().push(duration);
            std::future::ready(())
        }
    }

    fn png(width: u32, height: u32) -> ImagePayload {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([90, 90, 90, 255])));
        ImagePayload::encode_png(&img).unwrap()
    }

    fn sketch(width: u32, height: u32) -> SourceImage {
        SourceImage::from_payload(png(width, height))
    }

    fn orchestrator(service: FakeService) -> Orchestrator<FakeService, RecordingSleeper> {
        Orchestrator::with_sleeper(service, RecordingSleeper::default())
    }

    fn rendered(width: u32, height: u32) -> PromptResult {
        PromptResult::new("a house", Some(png(width, height)), None, ResultOrigin::Generated)
    }

    #[tokio::test]
    async fn generate_without_a_sketch_never_calls_the_service() {
        let orch = orchestrator(FakeService::default());
        let err = orch.generate(GenerateRequest::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(orch.service().operations().is_empty());
        assert!(orch.history().is_empty());
        assert_eq!(orch.status(), PipelineStatus::Idle);
    }

    #[tokio::test]
    async fn generate_runs_analysis_then_synthesis() {
        let service = FakeService::default().text("  A two-storey timber house.  ").image(png(16, 9));
        let orch = orchestrator(service);
        let mut status = orch.subscribe_status();

        let result = orch
            .generate(GenerateRequest::new(sketch(1600, 900), GenerationParams::default()).with_reference(sketch(4, 4)))
            .await
            .unwrap();

        assert_eq!(result.prompt, "A two-storey timber house.");
        assert!(result.is_complete());
        assert_eq!(orch.service().operations(), [Operation::Analyze, Operation::Synthesize]);

        let calls = orch.service().calls.lock().unwrap();
        assert_eq!(calls[0].images.len(), 2);
        assert_eq!(calls[1].aspect_ratio, Some(crate::generation::AspectRatio::Landscape16x9));
        assert!(calls[1].instruction.contains("A two-storey timber house."));
        drop(calls);

        assert!(status.has_changed().unwrap());
        assert_eq!(*status.borrow_and_update(), PipelineStatus::Idle);
        assert_eq!(orch.history().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn idle_status_is_published_after_the_result_is_recorded() {
        for round in 0..20 {
            let orch = std::sync::Arc::new(orchestrator(FakeService::default().text("desc").image(png(8, 8))));
            let mut status = orch.subscribe_status();
            let watcher = tokio::spawn({
                let orch = orch.clone();
                async move {
                    while status.changed().await.is_ok() {
                        if status.borrow_and_update().is_idle() {
                            return orch.history().len();
                        }
                    }
                    usize::MAX
                }
            });

            orch.generate(GenerateRequest::new(sketch(10, 10), GenerationParams::default()))
                .await
                .unwrap();
            assert_eq!(watcher.await.unwrap(), 1, "round {round}");
        }
    }

    #[tokio::test]
    async fn analysis_failure_aborts_without_an_image_attempt() {
        let orch = orchestrator(FakeService::default().text_error("API key not valid"));
        let err = orch
            .generate(GenerateRequest::new(sketch(10, 10), GenerationParams::default()))
            .await
            .unwrap_err();
        assert_eq!(err.failure_kind(), Some(FailureKind::FatalOther));
        assert_eq!(orch.service().operations(), [Operation::Analyze]);
        assert!(orch.history().is_empty());
        assert_eq!(orch.status(), PipelineStatus::Idle);
    }

    #[tokio::test]
    async fn overload_twice_then_success_waits_two_and_four_seconds() {
        let service = FakeService::default()
            .text("desc")
            .image_error("503 The model is overloaded")
            .image_error("503 The model is overloaded")
            .image(png(8, 8));
        let orch = orchestrator(service);
        let result = orch
            .generate(GenerateRequest::new(sketch(10, 10), GenerationParams::default()))
            .await
            .unwrap();

        assert!(result.error.is_none());
        assert!(result.has_image());
        assert_eq!(
            *orch.sleeper.0.lock().unwrap(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn exhausted_retries_give_a_partial_result() {
        let service = FakeService::default()
            .text("desc")
            .image_error("503 overloaded")
            .image_error("503 overloaded")
            .image_error("503 overloaded");
        let orch = orchestrator(service);
        let result = orch
            .generate(GenerateRequest::new(sketch(10, 10), GenerationParams::default()))
            .await
            .unwrap();

        assert_eq!(result.prompt, "desc");
        assert!(result.image.is_none());
        assert!(result.error.as_deref().unwrap().contains("overloaded"));
        assert_eq!(orch.service().operations().len(), 4);
        assert_eq!(orch.history().len(), 1, "partial results are kept");
    }

    #[tokio::test]
    async fn safety_block_is_not_retried() {
        let service = FakeService::default()
            .text("desc")
            .image_error("No image returned (finish reason: Some(Safety))");
        let orch = orchestrator(service);
        let result = orch
            .generate(GenerateRequest::new(sketch(10, 10), GenerationParams::default()))
            .await
            .unwrap();

        assert!(result.error.as_deref().unwrap().contains("safety policy"));
        assert_eq!(orch.service().operations(), [Operation::Analyze, Operation::Synthesize]);
        assert!(orch.sleeper.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn long_descriptions_are_truncated_for_synthesis() {
        let long = "x".repeat(5000);
        let service = FakeService::default().text(&long).image(png(4, 4));
        let orch = orchestrator(service).with_max_prompt_chars(100);
        let result = orch
            .generate(GenerateRequest::new(sketch(10, 10), GenerationParams::default()))
            .await
            .unwrap();
        assert_eq!(result.prompt.len(), 5000);
        let calls = orch.service().calls.lock().unwrap();
        assert!(!calls[1].instruction.contains(&"x".repeat(101)));
        assert!(calls[1].instruction.contains(&"x".repeat(100)));
    }

    #[tokio::test]
    async fn style_produces_a_new_result_and_keeps_the_original() {
        let orch = orchestrator(FakeService::default().image(png(8, 8)));
        let target = rendered(8, 8);
        let styled = orch.apply_style_by_id(&target, "nordic-timber").await.unwrap();

        assert_ne!(styled.id, target.id);
        assert_eq!(styled.prompt, target.prompt);
        assert_eq!(styled.origin, ResultOrigin::Styled { style: "nordic-timber".into() });
        assert_eq!(orch.history()[0].id, styled.id);
    }

    #[tokio::test]
    async fn style_failure_is_reported_and_not_recorded() {
        let orch = orchestrator(FakeService::default().image_error("429 RESOURCE_EXHAUSTED"));
        let err = orch.apply_style(&rendered(8, 8), "custom", "ink wash").await.unwrap_err();
        assert_eq!(err.failure_kind(), Some(FailureKind::QuotaExceeded));
        assert_eq!(orch.service().operations().len(), 1, "style calls are single attempt");
        assert!(orch.history().is_empty());
    }

    #[tokio::test]
    async fn style_requires_an_image() {
        let orch = orchestrator(FakeService::default());
        let text_only = PromptResult::new("desc", None, Some("failed".into()), ResultOrigin::Generated);
        assert!(matches!(
            orch.apply_style_by_id(&text_only, "nordic-timber").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            orch.apply_style_by_id(&rendered(4, 4), "baroque").await,
            Err(AppError::Validation(_))
        ));
        assert!(orch.service().operations().is_empty());
    }

    #[tokio::test]
    async fn edit_sends_image_and_mask_and_links_the_parent() {
        let orch = orchestrator(FakeService::default().image(png(40, 20)));
        let target = rendered(40, 20);

        let mut canvas = MaskCanvas::new();
        canvas.load_source(&target.image_source().unwrap()).unwrap();
        let mask = canvas
            .paint_stroke(&[Point::new(10.0, 10.0), Point::new(30.0, 10.0)], DisplayRect::sized(40.0, 20.0))
            .unwrap()
            .unwrap();

        let edited = orch.apply_edit(&target, &mask, "add a balcony").await.unwrap();
        assert_eq!(
            edited.origin,
            ResultOrigin::Edited {
                instruction: "add a balcony".into(),
                parent: target.id
            }
        );
        let calls = orch.service().calls.lock().unwrap();
        assert_eq!(calls[0].operation, Operation::Edit);
        assert_eq!(calls[0].images.len(), 2);
        assert_eq!(calls[0].images[1], mask.payload);
    }

    #[tokio::test]
    async fn edit_validates_mask_locally() {
        let orch = orchestrator(FakeService::default());
        let target = rendered(40, 20);

        let mut canvas = MaskCanvas::new();
        canvas.load_source(&target.image_source().unwrap()).unwrap();
        let blank = canvas.current_mask().unwrap().clone();
        assert!(matches!(
            orch.apply_edit(&target, &blank, "add a balcony").await,
            Err(AppError::Validation(_))
        ));

        canvas.load_source(&sketch(10, 10)).unwrap();
        let wrong_size = canvas
            .paint_stroke(&[Point::new(5.0, 5.0)], DisplayRect::sized(10.0, 10.0))
            .unwrap()
            .unwrap();
        assert!(matches!(
            orch.apply_edit(&target, &wrong_size, "add a balcony").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            orch.apply_edit(&target, &wrong_size, "   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(orch.service().operations().is_empty());
    }

    #[tokio::test]
    async fn optimize_prompt_falls_back_to_the_input() {
        let orch = orchestrator(FakeService::default().text("Refined.").text_error("boom").text("  "));
        assert_eq!(orch.optimize_prompt("a house", Language::English).await, "Refined.");
        assert_eq!(orch.optimize_prompt("a house", Language::English).await, "a house");
        assert_eq!(orch.optimize_prompt("a house", Language::English).await, "a house");
        // blank input is not sent at all
        assert_eq!(orch.optimize_prompt("", Language::English).await, "");
        assert_eq!(orch.service().operations().len(), 3);
    }

    #[tokio::test]
    async fn history_keeps_the_three_newest() {
        let service = FakeService::default()
            .image(png(4, 4))
            .image(png(4, 4))
            .image(png(4, 4))
            .image(png(4, 4));
        let orch = orchestrator(service);
        let target = rendered(4, 4);
        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(orch.apply_style(&target, "s", "ink").await.unwrap().id);
        }
        let kept: Vec<_> = orch.history().iter().map(|r| r.id).collect();
        assert_eq!(kept, [ids[3], ids[2], ids[1]]);
    }

    struct GatedService {
        gate: tokio::sync::Notify,
    }

    impl GenerationService for GatedService {
        fn describe(&self, _request: GenerationRequest) -> impl Future<Output = Result<String>> + Send {
            std::future::ready(Ok("desc".to_string()))
        }

        fn render(&self, _request: GenerationRequest) -> impl Future<Output = Result<ImagePayload>> + Send {
            async move {
                self.gate.notified().await;
                Ok(png(4, 4))
            }
        }
    }

    #[tokio::test]
    async fn second_pipeline_is_rejected_while_busy() {
        let orch = Orchestrator::with_sleeper(
            GatedService {
                gate: tokio::sync::Notify::new(),
            },
            RecordingSleeper::default(),
        );
        let target = rendered(4, 4);

        let (first, second) = futures::join!(
            orch.generate(GenerateRequest::new(sketch(10, 10), GenerationParams::default())),
            async {
                let rejected = orch.apply_style(&target, "s", "ink").await;
                orch.service().gate.notify_one();
                rejected
            }
        );

        assert!(first.unwrap().is_complete());
        assert!(matches!(second, Err(AppError::Busy(PipelineStatus::Generating))));
        assert_eq!(orch.status(), PipelineStatus::Idle);
    }

    #[tokio::test]
    async fn dropping_an_in_flight_pipeline_resets_the_status() {
        let orch = Orchestrator::with_sleeper(
            GatedService {
                gate: tokio::sync::Notify::new(),
            },
            RecordingSleeper::default(),
        );
        {
            let mut pending = std::pin::pin!(orch.generate(GenerateRequest::new(sketch(10, 10), GenerationParams::default())));
            assert!(futures::poll!(pending.as_mut()).is_pending());
            assert_eq!(orch.status(), PipelineStatus::Generating);
        }
        assert_eq!(orch.status(), PipelineStatus::Idle);
        assert!(orch.history().is_empty());
    }
}
