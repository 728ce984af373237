//! Sequential batch classification
//!
//! Items run one at a time to bound peak memory and device usage. Output
//! order matches input order, and a failure on any item fails the whole
//! batch with no partial results.

use crate::error::PipelineResult;
use crate::models::{EmotionScoreMap, Utterance};
use crate::services::classifier::EmotionClassifier;
use crate::services::log_buffer::SessionLogger;

pub struct BatchProcessor {
    classifier: EmotionClassifier,
}

impl BatchProcessor {
    pub fn new(classifier: EmotionClassifier) -> Self {
        Self { classifier }
    }

    /// Classify every utterance in order
    ///
    /// The returned vector has the same length and positional correspondence
    /// as the input.
    pub fn process(
        &self,
        utterances: &[Utterance],
        logger: &SessionLogger,
    ) -> PipelineResult<Vec<EmotionScoreMap>> {
        logger.info(format!(
            "Start processing emotions from {} texts",
            utterances.len()
        ));

        let mut results = Vec::with_capacity(utterances.len());
        for utterance in utterances {
            results.push(self.classifier.classify(&utterance.text)?);
        }
        Ok(results)
    }
}
