use super::error::PipelineError;
use super::operator::{OperatorInput, OperatorReply};
use super::state::{PipelineState, Transition};
use crate::config::{self, ParamforgeConfig};
use crate::edit::EditBatch;
use crate::extraction::candidates_from_response;
use crate::generation::{code_prompt, conversion_prompt, refine, GeneratedArtifact};
use crate::llm::{BackendError, GenerationRequest, GenerationResponse, TextGenerator};
use crate::progress::{ProgressEvent, ProgressHandler, RequestPurpose};
use crate::retrieval::{
    Exemplar, ExemplarStore, RetrievalContextFormatter, RetrievalQuery, StoreError, StoreQuery,
    DEFAULT_MAX_EXEMPLAR_CHARS,
};
use crate::validation::{EditBatchGuard, EditRecordValidator};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const CONVERSION_TEMPERATURE: f32 = 0.1;
const CONVERSION_MAX_TOKENS: u32 = 1024;
const GENERATION_TEMPERATURE: f32 = 0.2;
const GENERATION_MAX_TOKENS: u32 = 2048;

const MANUAL_PROMPT: &str =
    "Enter the edit as JSON (part, feature, parameter, new_value or delta, unit, confidence), or 'abort': ";

/// Per-run knobs, usually derived from [`ParamforgeConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub conversion_model: String,
    pub generation_model: String,
    pub conversion_timeout: Duration,
    pub generation_timeout: Duration,
    pub retrieval_timeout: Duration,
    pub operator_timeout: Duration,
    pub result_count: usize,
    pub category: Option<String>,
    pub max_exemplar_chars: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            conversion_model: config::DEFAULT_MODEL.to_string(),
            generation_model: config::DEFAULT_MODEL.to_string(),
            conversion_timeout: Duration::from_secs(config::DEFAULT_CONVERSION_TIMEOUT_SECS),
            generation_timeout: Duration::from_secs(config::DEFAULT_GENERATION_TIMEOUT_SECS),
            retrieval_timeout: Duration::from_secs(config::DEFAULT_CONVERSION_TIMEOUT_SECS),
            operator_timeout: Duration::from_secs(config::DEFAULT_OPERATOR_TIMEOUT_SECS),
            result_count: config::DEFAULT_RESULT_COUNT,
            category: None,
            max_exemplar_chars: DEFAULT_MAX_EXEMPLAR_CHARS,
        }
    }
}

impl From<&ParamforgeConfig> for PipelineSettings {
    fn from(config: &ParamforgeConfig) -> Self {
        Self {
            conversion_model: config.conversion_model.clone(),
            generation_model: config.generation_model.clone(),
            conversion_timeout: config.conversion_timeout(),
            generation_timeout: config.generation_timeout(),
            retrieval_timeout: config.conversion_timeout(),
            operator_timeout: config.operator_timeout(),
            result_count: config.result_count,
            category: config.category.clone(),
            max_exemplar_chars: config.max_exemplar_chars,
        }
    }
}

/// Report for one instruction, successful or not
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub id: Uuid,
    pub instruction: String,
    pub transitions: Vec<Transition>,
    pub batch: Option<EditBatch>,
    pub query: Option<RetrievalQuery>,
    pub exemplar_count: usize,
    pub artifact: Option<GeneratedArtifact>,
    pub failure: Option<PipelineError>,
    /// Errors the run recovered from (manual fallback, empty retrieval)
    pub recovered: Vec<PipelineError>,
}

impl PipelineRun {
    pub fn final_state(&self) -> PipelineState {
        self.transitions
            .last()
            .map(|t| t.to)
            .unwrap_or(PipelineState::Submitted)
    }

    pub fn succeeded(&self) -> bool {
        self.final_state() == PipelineState::Done
    }

    pub fn visited(&self, state: PipelineState) -> bool {
        self.transitions.iter().any(|t| t.to == state)
    }

    pub fn path(&self) -> Vec<PipelineState> {
        std::iter::once(PipelineState::Submitted)
            .chain(self.transitions.iter().map(|t| t.to))
            .collect()
    }
}

/// Records transitions and forwards them to the progress handler.
struct RunTrace<'a> {
    started: Instant,
    current: PipelineState,
    transitions: Vec<Transition>,
    progress: Option<&'a Arc<dyn ProgressHandler>>,
}

impl<'a> RunTrace<'a> {
    fn new(progress: Option<&'a Arc<dyn ProgressHandler>>) -> Self {
        Self {
            started: Instant::now(),
            current: PipelineState::Submitted,
            transitions: Vec::new(),
            progress,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        if let Err(err) = self.current.check_transition(next) {
            error!(error = %err, "Illegal pipeline transition");
            debug_assert!(false, "{err}");
        }

        if let Some(handler) = self.progress {
            handler.on_progress(&ProgressEvent::StateChanged {
                from: self.current,
                to: next,
            });
        }

        self.transitions.push(Transition {
            from: self.current,
            to: next,
            at: self.started.elapsed(),
        });
        self.current = next;
    }
}

/// Drives one instruction through conversion, validation, retrieval and
/// code generation.
pub struct PipelineOrchestrator {
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn ExemplarStore>,
    operator: Arc<dyn OperatorInput>,
    settings: PipelineSettings,
    progress_handler: Option<Arc<dyn ProgressHandler>>,
    validator: EditRecordValidator,
    guard: EditBatchGuard,
    formatter: RetrievalContextFormatter,
}

impl PipelineOrchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn ExemplarStore>,
        operator: Arc<dyn OperatorInput>,
    ) -> Self {
        let settings = PipelineSettings::default();
        let formatter =
            RetrievalContextFormatter::new(settings.result_count, settings.max_exemplar_chars);
        Self {
            generator,
            store,
            operator,
            settings,
            progress_handler: None,
            validator: EditRecordValidator::new(),
            guard: EditBatchGuard::new(),
            formatter,
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.formatter =
            RetrievalContextFormatter::new(settings.result_count, settings.max_exemplar_chars);
        self.settings = settings;
        self
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress_handler = Some(handler);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&event);
        }
    }

    /// Runs the full pipeline. Failures are reported in the returned run.
    pub async fn run(&self, instruction: &str) -> PipelineRun {
        let id = Uuid::new_v4();
        let mut trace = RunTrace::new(self.progress_handler.as_ref());
        let mut recovered = Vec::new();

        info!(run = %id, "Processing instruction");
        self.emit(ProgressEvent::Started {
            run_id: id.to_string(),
            instruction: instruction.to_string(),
        });

        let mut run = PipelineRun {
            id,
            instruction: instruction.to_string(),
            transitions: Vec::new(),
            batch: None,
            query: None,
            exemplar_count: 0,
            artifact: None,
            failure: None,
            recovered: Vec::new(),
        };

        trace.advance(PipelineState::Extracting);
        let automated = match self.extract(instruction).await {
            Ok(candidates) => {
                trace.advance(PipelineState::Validating);
                self.admit(&candidates)
            }
            Err(e) => Err(e),
        };

        let batch = match automated {
            Ok(batch) => {
                trace.advance(PipelineState::ValidBatch);
                batch
            }
            Err(reason) => {
                warn!(error = %reason, "Automated conversion unusable");
                trace.advance(PipelineState::FallbackManual);
                self.emit(ProgressEvent::ManualInputRequested {
                    reason: reason.to_string(),
                });
                recovered.push(reason);

                match self.manual_fallback().await {
                    Ok(batch) => batch,
                    Err(e) => {
                        trace.advance(PipelineState::Failed);
                        return self.finish_failed(run, trace, recovered, e);
                    }
                }
            }
        };
        info!(records = batch.len(), "Edit batch accepted");

        trace.advance(PipelineState::QuerySynth);
        let query = RetrievalQuery::from_record(batch.first());
        debug!(query = %query, "Synthesized retrieval query");

        trace.advance(PipelineState::Retrieving);
        let exemplars = match self.retrieve(&query).await {
            Ok(exemplars) => {
                self.emit(ProgressEvent::RetrievalComplete {
                    exemplars: exemplars.len(),
                    degraded: false,
                });
                exemplars
            }
            Err(e) => {
                warn!(error = %e, "Continuing without exemplars");
                self.emit(ProgressEvent::RetrievalComplete {
                    exemplars: 0,
                    degraded: true,
                });
                recovered.push(PipelineError::RetrievalUnavailable(e));
                Vec::new()
            }
        };
        let context = self.formatter.format(&exemplars);

        trace.advance(PipelineState::Generating);
        let generated = self.generate(&batch, &context).await;

        run.batch = Some(batch);
        run.query = Some(query);
        run.exemplar_count = exemplars.len();

        let response = match generated {
            Ok(response) => response,
            Err(e) => {
                trace.advance(PipelineState::Failed);
                return self.finish_failed(run, trace, recovered, e);
            }
        };

        trace.advance(PipelineState::Refining);
        let artifact = refine(&response.content);
        debug!(
            has_entrypoint = artifact.has_entrypoint,
            has_teardown = artifact.has_teardown,
            "Refined generated code"
        );

        trace.advance(PipelineState::Done);
        let total_time = trace.started.elapsed();
        info!(run = %id, total_time_ms = total_time.as_millis(), "Run complete");
        self.emit(ProgressEvent::Completed { total_time });

        run.artifact = Some(artifact);
        run.transitions = trace.transitions;
        run.recovered = recovered;
        run
    }

    /// Conversion and validation only, without the manual fallback.
    pub async fn convert(&self, instruction: &str) -> Result<EditBatch, PipelineError> {
        let candidates = self.extract(instruction).await?;
        self.admit(&candidates)
    }

    fn finish_failed(
        &self,
        mut run: PipelineRun,
        trace: RunTrace<'_>,
        recovered: Vec<PipelineError>,
        failure: PipelineError,
    ) -> PipelineRun {
        error!(run = %run.id, error = %failure, "Run failed");
        self.emit(ProgressEvent::Failed {
            error: failure.to_string(),
        });
        run.transitions = trace.transitions;
        run.recovered = recovered;
        run.failure = Some(failure);
        run
    }

    async fn extract(&self, instruction: &str) -> Result<Vec<Value>, PipelineError> {
        let request = GenerationRequest::new(conversion_prompt(instruction))
            .with_model(self.settings.conversion_model.clone())
            .with_temperature(CONVERSION_TEMPERATURE)
            .with_max_tokens(CONVERSION_MAX_TOKENS)
            .with_timeout(self.settings.conversion_timeout);

        let response = self
            .call(request, RequestPurpose::Conversion, self.settings.conversion_timeout)
            .await
            .map_err(PipelineError::ConversionUnavailable)?;

        let candidates = candidates_from_response(&response.content);
        self.emit(ProgressEvent::CandidatesExtracted {
            count: candidates.len(),
        });

        if candidates.is_empty() {
            return Err(PipelineError::ExtractionEmpty);
        }
        Ok(candidates)
    }

    fn admit(&self, candidates: &[Value]) -> Result<EditBatch, PipelineError> {
        let report = self.validator.validate_all(candidates);
        self.emit(ProgressEvent::ValidationComplete {
            accepted: report.accepted.len(),
            rejected: report.rejected.len(),
        });
        for rejected in &report.rejected {
            debug!(rejection = %rejected.summary(), "Candidate rejected");
        }

        self.guard
            .admit(report)
            .map_err(PipelineError::from_rejection)
    }

    async fn manual_fallback(&self) -> Result<EditBatch, PipelineError> {
        let timeout = self.settings.operator_timeout;
        let reply = match tokio::time::timeout(
            timeout,
            self.operator.request_line(MANUAL_PROMPT, timeout),
        )
        .await
        {
            Ok(reply) => reply,
            Err(_) => OperatorReply::TimedOut,
        };

        match reply {
            OperatorReply::Aborted => Err(PipelineError::OperatorAborted),
            OperatorReply::TimedOut => Err(PipelineError::OperatorTimedOut {
                seconds: timeout.as_secs(),
            }),
            OperatorReply::Line(line) => {
                let candidates = candidates_from_response(&line);
                if candidates.is_empty() {
                    return Err(PipelineError::ManualInputUnusable(
                        "no JSON object found in input".to_string(),
                    ));
                }
                self.admit(&candidates)
                    .map_err(|e| PipelineError::ManualInputUnusable(e.to_string()))
            }
        }
    }

    async fn retrieve(&self, query: &RetrievalQuery) -> Result<Vec<Exemplar>, StoreError> {
        let mut store_query = StoreQuery::new(query.as_text(), self.settings.result_count);
        if let Some(category) = &self.settings.category {
            store_query = store_query.with_category(category.clone());
        }

        debug!(store = self.store.name(), text = %store_query.text, "Querying exemplar store");
        let timeout = self.settings.retrieval_timeout;
        match tokio::time::timeout(timeout, self.store.query(&store_query)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::TimeoutError {
                seconds: timeout.as_secs(),
            }),
        }
    }

    async fn generate(
        &self,
        batch: &EditBatch,
        context: &str,
    ) -> Result<GenerationResponse, PipelineError> {
        let request = GenerationRequest::new(code_prompt(batch, context))
            .with_model(self.settings.generation_model.clone())
            .with_temperature(GENERATION_TEMPERATURE)
            .with_max_tokens(GENERATION_MAX_TOKENS)
            .with_timeout(self.settings.generation_timeout);

        self.call(request, RequestPurpose::Generation, self.settings.generation_timeout)
            .await
            .map_err(PipelineError::GenerationUnavailable)
    }

    /// One bounded text-generation call. Blank completions are errors.
    async fn call(
        &self,
        request: GenerationRequest,
        purpose: RequestPurpose,
        timeout: Duration,
    ) -> Result<GenerationResponse, BackendError> {
        self.emit(ProgressEvent::LlmRequestStarted { purpose });
        debug!(
            backend = self.generator.name(),
            purpose = %purpose,
            prompt_chars = request.prompt.len(),
            "Sending generation request"
        );

        let response = match tokio::time::timeout(timeout, self.generator.generate(request)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(BackendError::TimeoutError {
                    seconds: timeout.as_secs(),
                })
            }
        };

        self.emit(ProgressEvent::LlmResponseReceived {
            purpose,
            response_time: response.response_time,
            chars: response.content.len(),
        });

        if response.is_blank() {
            return Err(BackendError::EmptyCompletion);
        }
        Ok(response)
    }
}
