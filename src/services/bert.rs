//! Candle-backed BERT emotion classifier
//!
//! Loads a sequence-classification checkpoint (safetensors) from the
//! HuggingFace hub: BERT encoder, linear classification head, tokenizer, and
//! the label vocabulary from `id2label` in `config.json`. The forward pass
//! produces one raw logit per label; the multi-label sigmoid and ranking
//! happen downstream in the classifier.

use crate::error::{PipelineError, PipelineResult};
use crate::services::registry::{ComputeDevice, EmotionModel};
use candle_core::{DType, Device, Module, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{
    BertModel, Config as BertConfig, HiddenAct, PositionEmbeddingType,
};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::Tokenizer;

/// Hard cap on tokenized sequence length, matching BERT position embeddings
const MAX_SEQUENCE_LENGTH: usize = 512;

pub struct BertEmotionModel {
    model: BertModel,
    classifier_head: candle_nn::Linear,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
    labels: Vec<String>,
}

impl BertEmotionModel {
    /// Download and load the checkpoint named by `model_id`
    ///
    /// Picks the GPU when one is available, otherwise the CPU. Any failure to
    /// resolve or parse the artifacts is a configuration error.
    pub fn load(model_id: &str) -> PipelineResult<Self> {
        let device = Device::cuda_if_available(0)
            .map_err(|e| PipelineError::Configuration(format!("device selection failed: {}", e)))?;
        tracing::info!("Loading emotion model {} on {:?}", model_id, device);

        let api = Api::new()
            .map_err(|e| PipelineError::Configuration(format!("hub API init failed: {}", e)))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json").map_err(|e| {
            PipelineError::Configuration(format!("config.json for {} unavailable: {}", model_id, e))
        })?;
        let weights_path = repo.get("model.safetensors").map_err(|e| {
            PipelineError::Configuration(format!("weights for {} unavailable: {}", model_id, e))
        })?;
        let tokenizer_path = repo.get("tokenizer.json").map_err(|e| {
            PipelineError::Configuration(format!("tokenizer for {} unavailable: {}", model_id, e))
        })?;

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| PipelineError::Configuration(format!("cannot read config.json: {}", e)))?;
        let config: serde_json::Value = serde_json::from_str(&config_str)
            .map_err(|e| PipelineError::Configuration(format!("invalid config.json: {}", e)))?;

        let labels = parse_labels(&config)?;

        let bert_config = BertConfig {
            vocab_size: config["vocab_size"].as_u64().unwrap_or(30522) as usize,
            hidden_size: config["hidden_size"].as_u64().unwrap_or(768) as usize,
            num_hidden_layers: config["num_hidden_layers"].as_u64().unwrap_or(12) as usize,
            num_attention_heads: config["num_attention_heads"].as_u64().unwrap_or(12) as usize,
            intermediate_size: config["intermediate_size"].as_u64().unwrap_or(3072) as usize,
            hidden_act: HiddenAct::Gelu,
            hidden_dropout_prob: config["hidden_dropout_prob"].as_f64().unwrap_or(0.1),
            max_position_embeddings: config["max_position_embeddings"].as_u64().unwrap_or(512)
                as usize,
            type_vocab_size: config["type_vocab_size"].as_u64().unwrap_or(2) as usize,
            initializer_range: config["initializer_range"].as_f64().unwrap_or(0.02),
            layer_norm_eps: config["layer_norm_eps"].as_f64().unwrap_or(1e-12),
            pad_token_id: config["pad_token_id"].as_u64().unwrap_or(0) as usize,
            position_embedding_type: PositionEmbeddingType::Absolute,
            use_cache: false,
            classifier_dropout: None,
            model_type: None,
        };
        let max_len = bert_config.max_position_embeddings.min(MAX_SEQUENCE_LENGTH);

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device).map_err(
                |e| PipelineError::Configuration(format!("cannot map weights: {}", e)),
            )?
        };

        let model = BertModel::load(vb.pp("bert"), &bert_config)
            .map_err(|e| PipelineError::Configuration(format!("BERT encoder load failed: {}", e)))?;
        let classifier_head = candle_nn::linear(
            bert_config.hidden_size,
            labels.len(),
            vb.pp("classifier"),
        )
        .map_err(|e| {
            PipelineError::Configuration(format!("classification head load failed: {}", e))
        })?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| PipelineError::Configuration(format!("tokenizer load failed: {}", e)))?;

        tracing::info!(
            "Emotion model ready: {} labels, max_len={}, device={:?}",
            labels.len(),
            max_len,
            device
        );

        Ok(Self {
            model,
            classifier_head,
            tokenizer,
            device,
            max_len,
            labels,
        })
    }

    /// Tensor plumbing for one forward pass, all candle errors in one place
    fn forward_logits(&self, ids: &[i64], mask: &[i64]) -> candle_core::Result<Vec<f32>> {
        let seq_len = ids.len();
        let input_ids = Tensor::from_slice(ids, (1, seq_len), &self.device)?;
        let attention_mask = Tensor::from_slice(mask, (1, seq_len), &self.device)?;
        let token_type_ids = Tensor::zeros((1, seq_len), DType::I64, &self.device)?;

        // Encoder output [1, seq_len, hidden]
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Masked mean pooling across the sequence
        let mask_f32 = attention_mask.to_dtype(DType::F32)?.unsqueeze(D::Minus1)?;
        let summed = hidden.broadcast_mul(&mask_f32)?.sum(D::Minus2)?;
        let counts = mask_f32.sum(D::Minus2)?.clamp(1e-6, f32::MAX)?;
        let pooled = summed.broadcast_div(&counts)?;

        // [1, hidden] -> [1, num_labels] -> [num_labels]
        let logits = self.classifier_head.forward(&pooled)?.squeeze(0)?;
        logits.to_vec1::<f32>()
    }
}

impl EmotionModel for BertEmotionModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, text: &str) -> PipelineResult<Vec<f32>> {
        // An empty string still tokenizes to the special-token frame
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| PipelineError::Inference(format!("tokenization failed: {}", e)))?;

        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mut mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        if ids.len() > self.max_len {
            ids.truncate(self.max_len);
            mask.truncate(self.max_len);
        }
        tracing::debug!("Tokenized {} tokens for inference", ids.len());

        let logits = self
            .forward_logits(&ids, &mask)
            .map_err(|e| PipelineError::Inference(format!("forward pass failed: {}", e)))?;

        if logits.len() != self.labels.len() {
            return Err(PipelineError::Inference(format!(
                "label count mismatch: {} labels but {} logits",
                self.labels.len(),
                logits.len()
            )));
        }
        Ok(logits)
    }

    fn device(&self) -> ComputeDevice {
        match self.device {
            Device::Cpu => ComputeDevice::Cpu,
            _ => ComputeDevice::Gpu,
        }
    }
}

/// Label vocabulary from `id2label`, ordered by numeric index
fn parse_labels(config: &serde_json::Value) -> PipelineResult<Vec<String>> {
    let id2label = config
        .get("id2label")
        .and_then(|v| v.as_object())
        .ok_or_else(|| {
            PipelineError::Configuration("config.json has no id2label mapping".to_string())
        })?;

    let mut pairs: Vec<(usize, String)> = Vec::with_capacity(id2label.len());
    for (key, value) in id2label {
        let index = key.parse::<usize>().map_err(|_| {
            PipelineError::Configuration(format!("non-numeric id2label key: {}", key))
        })?;
        let label = value
            .as_str()
            .ok_or_else(|| {
                PipelineError::Configuration(format!("non-string id2label entry at {}", index))
            })?
            .to_string();
        pairs.push((index, label));
    }
    pairs.sort_by_key(|(index, _)| *index);
    Ok(pairs.into_iter().map(|(_, label)| label).collect())
}
