//! Sentence-transformer embedder running a BERT checkpoint on candle.
//!
//! Loads `config.json`, `tokenizer.json` and `model.safetensors` either from a
//! local directory or from the Hugging Face hub cache, then embeds texts by
//! mean pooling the last hidden state over the attention mask.

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::api::sync::ApiBuilder;
use log::{debug, info};
use serde::Deserialize;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::embedder::Embedder;
use crate::error::{Error, Result};

/// Hub id of the default checkpoint.
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Files every checkpoint directory must hold.
const MODEL_FILES: [&str; 3] = ["config.json", "tokenizer.json", "model.safetensors"];

/// Longest token sequence fed to the model; MiniLM was trained on 256.
const MAX_SEQ_LEN: usize = 256;

/// Texts per forward pass.
const BATCH_SIZE: usize = 32;

#[derive(Deserialize)]
struct HiddenSize {
    hidden_size: usize,
}

/// [`Embedder`] backed by a sentence-transformers BERT model.
///
/// Load once and pass by reference; every call reuses the same weights.
pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
}

impl std::fmt::Debug for MiniLmEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniLmEmbedder")
            .field("device", &self.device)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl MiniLmEmbedder {
    /// Load [`DEFAULT_MODEL_ID`] on the CPU.
    pub fn new() -> Result<Self> {
        Self::load(DEFAULT_MODEL_ID)
    }

    /// Load a hub model id or local checkpoint directory on the CPU.
    pub fn load(model: &str) -> Result<Self> {
        Self::from_pretrained(model, &Device::Cpu)
    }

    /// Load from a local checkpoint directory, or else from the hub by id.
    pub fn from_pretrained(model: &str, device: &Device) -> Result<Self> {
        let local = Path::new(model);
        if local.is_dir() {
            return Self::from_dir(local, device);
        }
        let [config, tokenizer, weights] = fetch_from_hub(model)?;
        Self::from_files(&config, &tokenizer, &weights, device)
    }

    /// Load from a directory holding the three checkpoint files.
    pub fn from_dir(dir: &Path, device: &Device) -> Result<Self> {
        let [config, tokenizer, weights] = MODEL_FILES.map(|name| dir.join(name));
        if let Some(missing) = [&config, &tokenizer, &weights]
            .into_iter()
            .find(|p| !p.is_file())
        {
            return Err(Error::Embedding(format!(
                "model file not found: {}",
                missing.display()
            )));
        }
        Self::from_files(&config, &tokenizer, &weights, device)
    }

    /// Load from explicit file paths.
    pub fn from_files(
        config_path: &Path,
        tokenizer_path: &Path,
        weights_path: &Path,
        device: &Device,
    ) -> Result<Self> {
        let raw = std::fs::read_to_string(config_path)?;
        let config: BertConfig = serde_json::from_str(&raw)?;
        let HiddenSize { hidden_size } = serde_json::from_str(&raw)?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| Error::Embedding(format!("cannot load tokenizer: {e}")))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| Error::Embedding(format!("cannot configure tokenizer: {e}")))?;

        // SAFETY: the weights file is not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };
        let model = BertModel::load(vb, &config)?;

        info!(
            "Loaded embedding model from {} ({} dimensions)",
            weights_path.display(),
            hidden_size
        );
        Ok(Self {
            model,
            tokenizer,
            device: device.clone(),
            dimension: hidden_size,
        })
    }

    fn embed_chunk(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| Error::Embedding(format!("tokenization failed: {e}")))?;

        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());
        let mut ids = Vec::with_capacity(texts.len() * seq_len);
        let mut mask = Vec::with_capacity(texts.len() * seq_len);
        for encoding in &encodings {
            ids.extend_from_slice(encoding.get_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        let shape = (encodings.len(), seq_len);
        let input_ids = Tensor::from_vec(ids, shape, &self.device)?;
        let attention_mask = Tensor::from_vec(mask, shape, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        // [batch, seq_len, hidden]
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let weights = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&weights)?.sum(1)?;
        let counts = weights.sum(1)?;
        let pooled = summed.broadcast_div(&counts)?;

        let norms = (pooled.sqr()?.sum_keepdim(1)?.sqrt()? + 1e-12)?;
        let normalized = pooled.broadcast_div(&norms)?;
        Ok(normalized.to_vec2::<f32>()?)
    }
}

impl Embedder for MiniLmEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            debug!("Embedding {} texts", chunk.len());
            vectors.extend(self.embed_chunk(chunk)?);
        }
        Ok(vectors)
    }
}

/// Resolve the checkpoint files through the hub cache, downloading on a miss.
fn fetch_from_hub(model_id: &str) -> Result<[PathBuf; 3]> {
    let api = ApiBuilder::new()
        .with_progress(true)
        .build()
        .map_err(|e| Error::Embedding(format!("cannot reach model hub: {e}")))?;
    let repo = api.model(model_id.to_string());

    info!("Fetching embedding model {}", model_id);
    let mut paths = Vec::with_capacity(MODEL_FILES.len());
    for name in MODEL_FILES {
        let path = repo
            .get(name)
            .map_err(|e| Error::Embedding(format!("cannot fetch {model_id}/{name}: {e}")))?;
        paths.push(path);
    }
    paths
        .try_into()
        .map_err(|_| Error::Embedding(format!("incomplete checkpoint for {model_id}")))
}
