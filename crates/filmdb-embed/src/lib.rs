//! Text embedding backends for the vector index.
//!
//! `EmbeddingModel` runs BGE-M3 (XLM-RoBERTa weights) through candle;
//! `HashEmbedder` is a deterministic stand-in for tests and offline work.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};
use twox_hash::XxHash64;

use filmdb_core::config::{EmbeddingBackend, EmbeddingSettings};
use filmdb_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

const SLOW_BATCH_MS: u128 = 500;

pub struct EmbeddingModel {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl EmbeddingModel {
    /// Load `tokenizer.json`, `config.json` and `pytorch_model.bin` from `model_dir`.
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        if !model_dir.exists() {
            return Err(anyhow!("model directory {} does not exist", model_dir.display()));
        }
        let device = select_device();

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let config_text = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: XLMRobertaConfig = serde_json::from_str(&config_text)?;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights: HashMap<String, Tensor> = candle_core::pickle::read_all(&weights_path)
            .with_context(|| format!("Failed to read weights {}", weights_path.display()))?
            .into_iter()
            .collect();
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;

        info!(dir = %model_dir.display(), dim = config.hidden_size, max_len, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim: config.hidden_size, max_len })
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids = Tensor::zeros(input_ids.dims(), DType::I64, &self.device)?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let rows: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        let elapsed = start.elapsed().as_millis();
        if elapsed > SLOW_BATCH_MS { warn!(batch = texts.len(), elapsed_ms = elapsed as u64, "slow embedding batch"); }
        debug!(batch = texts.len(), elapsed_ms = elapsed as u64, "embedded batch");
        Ok(rows)
    }
}

/// Feature-hashing embedder: each lower-cased alphanumeric token bumps one
/// bucket chosen by xxHash64. Same text, same vector, on every platform.
///
/// Text without tokens maps to the zero vector.
#[derive(Debug, Clone)]
pub struct HashEmbedder { dim: usize, max_len: usize }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1), max_len: 256 } }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        let tokens = lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).take(self.max_len);
        for token in tokens {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 0.5 + ((h >> 32) as u32 as f32) / (u32::MAX as f32);
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn fake_embeddings_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the configured backend. `APP_USE_FAKE_EMBEDDINGS=1` forces hashing.
pub fn embedder_from_settings(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if fake_embeddings_forced() || settings.backend == EmbeddingBackend::Hash {
        info!(dim = settings.dimension, "using hashing embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.dimension).with_max_len(settings.max_len)));
    }
    Ok(Arc::new(EmbeddingModel::load(&settings.model_dir, settings.max_len)?))
}
