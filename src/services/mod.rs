//! Service modules for the emotion analysis pipeline

pub mod batch;
pub mod bert;
pub mod classifier;
pub mod log_buffer;
pub mod registry;
pub mod session;
pub mod storage;

pub use batch::BatchProcessor;
pub use bert::BertEmotionModel;
pub use classifier::EmotionClassifier;
pub use log_buffer::{LogBuffer, SessionLogger};
pub use registry::{ComputeDevice, EmotionModel, FixedLogitsModel, ModelCell, ModelRegistry};
pub use session::Session;
pub use storage::StorageClient;
