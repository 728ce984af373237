//! Utterances and ranked emotion scores
//!
//! An `EmotionScoreMap` is the pipeline's output unit: every label of the
//! model's label set paired with an independent probability percentage,
//! ranked by descending score. Scores come from per-label sigmoids, so they
//! do not sum to 100.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One transcript utterance fetched from the datastore
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: i64,
    /// Transcript text; may be empty
    pub text: String,
}

/// A single label/score pair
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionScore {
    pub label: String,
    /// Probability percentage in [0, 100], rounded to 5 decimal digits
    pub score: f64,
}

/// Ranked emotion scores for one utterance
///
/// Entries are ordered non-increasing by score; equal scores keep the label
/// set's declaration order. Serializes as a JSON object whose keys appear in
/// rank order (a plain `serde_json::Map` would re-sort them).
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionScoreMap(Vec<EmotionScore>);

impl EmotionScoreMap {
    /// Rank entries by descending score
    ///
    /// The sort is stable: entries with equal scores keep the order they
    /// arrived in, which is the label set's declaration order.
    pub fn from_scores(mut entries: Vec<EmotionScore>) -> Self {
        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self(entries)
    }

    pub fn entries(&self) -> &[EmotionScore] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest-ranked entry, if any
    pub fn top(&self) -> Option<&EmotionScore> {
        self.0.first()
    }
}

impl Serialize for EmotionScoreMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.label, &entry.score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EmotionScoreMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScoreMapVisitor;

        impl<'de> Visitor<'de> for ScoreMapVisitor {
            type Value = EmotionScoreMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a map of emotion labels to scores")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((label, score)) = access.next_entry::<String, f64>()? {
                    entries.push(EmotionScore { label, score });
                }
                // Stored maps were written in rank order; trust it on the way back
                Ok(EmotionScoreMap(entries))
            }
        }

        deserializer.deserialize_map(ScoreMapVisitor)
    }
}

/// One utterance's persisted result: the text column is dropped, only the
/// id and the ranked scores travel back to the datastore
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub id: i64,
    pub text_emotions: EmotionScoreMap,
}
