//! Text to ranked emotion scores
//!
//! Multi-label post-processing: each logit passes through its own sigmoid, so
//! scores are independent probabilities that do not sum to one. Scores are
//! scaled to percentages, rounded to 5 decimal digits, and ranked descending
//! with ties kept in the label vocabulary's declaration order.

use crate::error::{PipelineError, PipelineResult};
use crate::models::{EmotionScore, EmotionScoreMap};
use crate::services::registry::ModelRegistry;
use std::sync::Arc;

/// Stateless classification front-end over the shared model registry
#[derive(Clone)]
pub struct EmotionClassifier {
    registry: Arc<ModelRegistry>,
}

impl EmotionClassifier {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Classify one text into a full ranked score map
    ///
    /// The result carries every label in the model's vocabulary exactly once,
    /// including for the empty string.
    pub fn classify(&self, text: &str) -> PipelineResult<EmotionScoreMap> {
        let labels = self.registry.labels();
        let logits = self.registry.predict(text)?;
        if logits.len() != labels.len() {
            return Err(PipelineError::Inference(format!(
                "model returned {} logits for {} labels",
                logits.len(),
                labels.len()
            )));
        }

        let scores = labels
            .iter()
            .zip(logits.iter())
            .map(|(label, &logit)| EmotionScore {
                label: label.clone(),
                score: round5(sigmoid(f64::from(logit)) * 100.0),
            })
            .collect();
        Ok(EmotionScoreMap::from_scores(scores))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Round to exactly 5 decimal digits, half away from zero
fn round5(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}
