use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::{LogitsProcessor, Sampling};
use candle_transformers::models::qwen2::{Config as QwenConfig, ModelForCausalLM};
use candle_transformers::utils::apply_repeat_penalty;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use sitebot_core::config::{expand_path, GenerateSettings};
use sitebot_core::traits::Generator;
use sitebot_embed::select_device;

/// Tokens considered by the repetition penalty.
const REPEAT_LAST_N: usize = 64;

/// Sampling knobs taken from `generate.*`.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    pub max_new_tokens: usize,
    pub temperature: f64,
    pub top_k: usize,
    pub top_p: f64,
    pub repetition_penalty: f32,
    pub seed: u64,
}

impl From<&GenerateSettings> for SamplingConfig {
    fn from(s: &GenerateSettings) -> Self {
        Self {
            max_new_tokens: s.max_new_tokens,
            temperature: s.temperature,
            top_k: s.top_k,
            top_p: s.top_p,
            repetition_penalty: s.repetition_penalty,
            seed: s.seed,
        }
    }
}

impl SamplingConfig {
    fn sampling(&self) -> Sampling {
        if self.temperature <= 0.0 { return Sampling::ArgMax; }
        Sampling::TopKThenTopP { k: self.top_k, p: self.top_p, temperature: self.temperature }
    }
}

/// Qwen2 instruct model decoded with candle.
///
/// Decoding mutates the KV cache, so the model sits behind a mutex and
/// concurrent calls run one at a time.
pub struct QwenGenerator {
    model: Mutex<ModelForCausalLM>,
    tokenizer: Tokenizer,
    device: Device,
    eos_ids: Vec<u32>,
    sampling: SamplingConfig,
}

impl QwenGenerator {
    pub fn new(settings: &GenerateSettings) -> Result<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir(settings.model_dir.as_deref())?;
        info!(dir = %model_dir.display(), "loading generator model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config: QwenConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let dtype = if device.is_cpu() { DType::F32 } else { DType::BF16 };
        let weights = weight_files(&model_dir)?;
        // SAFETY: the weights files are treated as immutable for the lifetime of the process.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&weights, dtype, &device)? };
        let model = ModelForCausalLM::new(&config, vb)?;
        let eos_ids: Vec<u32> = ["<|endoftext|>", "<|im_end|>"].iter().filter_map(|t| tokenizer.token_to_id(t)).collect();
        if eos_ids.is_empty() { warn!("no end-of-sequence token in tokenizer; decoding runs to max_new_tokens"); }
        info!(layers = config.num_hidden_layers, ?dtype, "generator model loaded");
        Ok(Self { model: Mutex::new(model), tokenizer, device, eos_ids, sampling: SamplingConfig::from(settings) })
    }

    fn decode(&self, model: &mut ModelForCausalLM, prompt_ids: &[u32]) -> Result<Vec<u32>> {
        let mut processor = LogitsProcessor::from_sampling(self.sampling.seed, self.sampling.sampling());
        let mut tokens = prompt_ids.to_vec();
        let mut generated = Vec::new();
        model.clear_kv_cache();
        for step in 0..self.sampling.max_new_tokens {
            let context_size = if step > 0 { 1 } else { tokens.len() };
            let start_pos = tokens.len().saturating_sub(context_size);
            let input = Tensor::new(&tokens[start_pos..], &self.device)?.unsqueeze(0)?;
            let logits = model.forward(&input, start_pos)?.squeeze(0)?.squeeze(0)?.to_dtype(DType::F32)?;
            let logits = if (self.sampling.repetition_penalty - 1.0).abs() < f32::EPSILON {
                logits
            } else {
                let from = tokens.len().saturating_sub(REPEAT_LAST_N);
                apply_repeat_penalty(&logits, self.sampling.repetition_penalty, &tokens[from..])?
            };
            let next = processor.sample(&logits)?;
            if self.eos_ids.contains(&next) { break; }
            tokens.push(next);
            generated.push(next);
        }
        Ok(generated)
    }
}

impl Generator for QwenGenerator {
    /// Returns only the continuation; the prompt is not echoed.
    fn generate(&self, prompt: &str) -> Result<String> {
        let encoding = self.tokenizer.encode(prompt, true).map_err(|e| anyhow!("tokenize prompt: {e}"))?;
        let prompt_ids = encoding.get_ids();
        if prompt_ids.is_empty() { anyhow::bail!("prompt encoded to zero tokens"); }

        let start = Instant::now();
        let generated = {
            let mut model = self.model.lock().map_err(|_| anyhow!("generator model lock poisoned"))?;
            self.decode(&mut model, prompt_ids)?
        };
        let text = self.tokenizer.decode(&generated, true).map_err(|e| anyhow!("detokenize: {e}"))?;
        debug!(prompt_tokens = prompt_ids.len(), new_tokens = generated.len(), elapsed = ?start.elapsed(), "generated answer");
        Ok(text)
    }
}

/// `model.safetensors`, or every shard named in `model.safetensors.index.json`.
fn weight_files(model_dir: &Path) -> Result<Vec<PathBuf>> {
    let single = model_dir.join("model.safetensors");
    if single.exists() { return Ok(vec![single]); }
    let index_path = model_dir.join("model.safetensors.index.json");
    let index: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&index_path)
        .map_err(|e| anyhow!("No safetensors weights in {}: {}", model_dir.display(), e))?)?;
    let map = index.get("weight_map").and_then(serde_json::Value::as_object)
        .ok_or_else(|| anyhow!("{} has no weight_map", index_path.display()))?;
    let mut files: Vec<PathBuf> = map.values().filter_map(serde_json::Value::as_str).map(|f| model_dir.join(f)).collect();
    files.sort();
    files.dedup();
    Ok(files)
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured { let p = expand_path(dir); if p.exists() { return Ok(p); } warn!(dir = %p.display(), "configured generate.model_dir does not exist"); }
    if let Ok(dir) = std::env::var("APP_GENERATOR_MODEL_DIR") { let p = expand_path(&dir); if p.exists() { return Ok(p); } }
    for candidate in ["models/Qwen2.5-1.5B-Instruct", "../models/Qwen2.5-1.5B-Instruct"] {
        let p = Path::new(candidate); if p.exists() { return Ok(p.to_path_buf()); }
    }
    Err(anyhow!("Could not locate the Qwen2.5 model directory (set generate.model_dir or APP_GENERATOR_MODEL_DIR)"))
}
