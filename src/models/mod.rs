//! Domain types for the emotion pipeline

pub mod emotion;

pub use emotion::{EmotionScore, EmotionScoreMap, ResultRecord, Utterance};
