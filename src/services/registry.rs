//! Process-wide model registry
//!
//! The classifier artifact is heavyweight to load, so exactly one instance
//! lives per process, shared read-only by every request. `ModelCell` is the
//! initialize-once holder: the first `get_or_init` performs the load (on the
//! blocking pool) and every later or concurrent caller receives the same
//! handle. Startup warms the cell before the listener binds, so request
//! handlers only ever observe an already-initialized registry.

use crate::error::{PipelineError, PipelineResult};
use crate::services::bert::BertEmotionModel;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Compute device a model runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeDevice {
    Cpu,
    Gpu,
}

impl std::fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeDevice::Cpu => write!(f, "cpu"),
            ComputeDevice::Gpu => write!(f, "gpu"),
        }
    }
}

/// A loaded emotion model: label vocabulary plus per-label logit inference
///
/// The trait boundary lets the ranking pipeline run against a deterministic
/// stand-in in tests, without model artifacts on disk.
pub trait EmotionModel: Send + Sync {
    /// Label vocabulary in the model's canonical declaration order
    fn labels(&self) -> &[String];

    /// Raw per-label logits for one text, aligned with `labels()`
    fn predict(&self, text: &str) -> PipelineResult<Vec<f32>>;

    /// Device the forward pass executes on
    fn device(&self) -> ComputeDevice;
}

/// Immutable holder of the loaded classifier, shared across all requests
pub struct ModelRegistry {
    model_id: String,
    model: Box<dyn EmotionModel>,
}

impl ModelRegistry {
    /// Load tokenizer and model weights for `model_id`
    ///
    /// Resolution failures are configuration errors: the artifact name is
    /// wrong or its files are unavailable.
    pub fn load(model_id: &str) -> PipelineResult<Self> {
        let model = BertEmotionModel::load(model_id)?;
        Ok(Self::with_model(model_id, Box::new(model)))
    }

    /// Wrap an already-constructed model, such as a test stand-in
    pub fn with_model(model_id: &str, model: Box<dyn EmotionModel>) -> Self {
        Self {
            model_id: model_id.to_string(),
            model,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn labels(&self) -> &[String] {
        self.model.labels()
    }

    pub fn device(&self) -> ComputeDevice {
        self.model.device()
    }

    pub fn predict(&self, text: &str) -> PipelineResult<Vec<f32>> {
        self.model.predict(text)
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("model_id", &self.model_id)
            .field("device", &self.device())
            .field("labels", &self.labels().len())
            .finish()
    }
}

/// Initialize-once cell for the process-wide [`ModelRegistry`]
///
/// Backed by `tokio::sync::OnceCell`, so concurrent first callers serialize
/// on one load instead of racing a check-then-act flag. A failed load leaves
/// the cell empty and a later call may retry.
#[derive(Debug, Default)]
pub struct ModelCell {
    cell: OnceCell<Arc<ModelRegistry>>,
}

impl ModelCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cell already holding `registry`, for tests that skip the real load
    pub fn preloaded(registry: ModelRegistry) -> Self {
        Self {
            cell: OnceCell::new_with(Some(Arc::new(registry))),
        }
    }

    /// Get the registry, loading `model_id` on the blocking pool if this is
    /// the first caller
    pub async fn get_or_init(&self, model_id: &str) -> PipelineResult<Arc<ModelRegistry>> {
        let model_id = model_id.to_owned();
        self.get_or_try_init(move || run_load_task(move || ModelRegistry::load(&model_id)))
            .await
    }

    /// Get the registry, running `init` if the cell is empty
    ///
    /// At most one `init` runs even under concurrent first access.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> PipelineResult<Arc<ModelRegistry>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PipelineResult<ModelRegistry>>,
    {
        self.cell
            .get_or_try_init(|| async { Ok(Arc::new(init().await?)) })
            .await
            .cloned()
    }

    /// The registry, if initialization has completed
    pub fn get(&self) -> Option<Arc<ModelRegistry>> {
        self.cell.get().cloned()
    }
}

/// Run a loader on the blocking pool
///
/// A panicked load task reports as `Configuration`, the category of every
/// other load-path failure.
async fn run_load_task<F>(load: F) -> PipelineResult<ModelRegistry>
where
    F: FnOnce() -> PipelineResult<ModelRegistry> + Send + 'static,
{
    tokio::task::spawn_blocking(load)
        .await
        .map_err(|e| PipelineError::Configuration(format!("model load task panicked: {}", e)))?
}

/// Deterministic stand-in model returning the same logits for every input
///
/// Used by tests and local smoke runs to exercise the ranking and persistence
/// path without downloading model artifacts.
#[derive(Debug, Clone)]
pub struct FixedLogitsModel {
    labels: Vec<String>,
    logits: Vec<f32>,
}

impl FixedLogitsModel {
    pub fn new(labels: &[&str], logits: &[f32]) -> Self {
        Self {
            labels: labels.iter().map(|label| label.to_string()).collect(),
            logits: logits.to_vec(),
        }
    }
}

impl EmotionModel for FixedLogitsModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, _text: &str) -> PipelineResult<Vec<f32>> {
        Ok(self.logits.clone())
    }

    fn device(&self) -> ComputeDevice {
        ComputeDevice::Cpu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn stand_in_registry() -> ModelRegistry {
        ModelRegistry::with_model(
            "stand-in",
            Box::new(FixedLogitsModel::new(&["A", "B", "C"], &[2.0, -1.0, 0.0])),
        )
    }

    #[test]
    fn test_fixed_logits_model_ignores_input_text() {
        let model = FixedLogitsModel::new(&["A", "B"], &[1.0, -1.0]);
        assert_eq!(model.predict("one").unwrap(), vec![1.0, -1.0]);
        assert_eq!(model.predict("").unwrap(), vec![1.0, -1.0]);
        assert_eq!(model.labels(), &["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_empty_cell_returns_none() {
        let cell = ModelCell::new();
        assert!(cell.get().is_none());
    }

    #[test]
    fn test_preloaded_cell_returns_registry() {
        let cell = ModelCell::preloaded(stand_in_registry());
        let registry = cell.get().unwrap();
        assert_eq!(registry.model_id(), "stand-in");
        assert_eq!(registry.labels().len(), 3);
        assert_eq!(registry.device(), ComputeDevice::Cpu);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_init_loads_exactly_once() {
        let cell = Arc::new(ModelCell::new());
        let loads = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cell = Arc::clone(&cell);
            let loads = Arc::clone(&loads);
            handles.push(tokio::spawn(async move {
                cell.get_or_try_init(move || async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(stand_in_registry())
                })
                .await
            }));
        }

        for handle in handles {
            let registry = handle.await.unwrap().unwrap();
            assert_eq!(registry.model_id(), "stand-in");
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicked_load_task_is_configuration_error() {
        let err = run_load_task(|| panic!("load blew up")).await.unwrap_err();
        match err {
            PipelineError::Configuration(message) => {
                assert!(message.contains("panicked"));
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_init_leaves_cell_empty_for_retry() {
        let cell = ModelCell::new();

        let err = cell
            .get_or_try_init(|| async {
                Err(PipelineError::Configuration("artifact missing".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(cell.get().is_none());

        let registry = cell
            .get_or_try_init(|| async { Ok(stand_in_registry()) })
            .await
            .unwrap();
        assert_eq!(registry.model_id(), "stand-in");
    }
}
