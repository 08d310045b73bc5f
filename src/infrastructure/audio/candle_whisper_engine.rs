use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use parking_lot::Mutex;
use tokenizers::Tokenizer;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::domain::{
    EngineTranscript, LanguageCode, TranscriptSegment, TranscriptionOptions, TranscriptionTask,
};

use super::audio_decoder::decode_to_mono_pcm;

const MAX_DECODE_TOKENS: usize = 224;

struct WhisperModel {
    model: Mutex<m::model::Whisper>,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    mel_filters: Vec<f32>,
}

/// Whisper running in-process on CPU. Each 30 second window becomes one segment.
pub struct CandleWhisperEngine {
    inner: Arc<WhisperModel>,
}

impl CandleWhisperEngine {
    pub fn new(model_id: &str) -> Result<Self, TranscriptionError> {
        let device = Device::Cpu;
        tracing::info!(device = ?device, model = model_id, "Loading local Whisper model");

        let load = |e: String| TranscriptionError::ModelLoadFailed(e);
        let api = Api::new().map_err(|e| load(e.to_string()))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json").map_err(|e| load(format!("config.json: {}", e)))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| load(format!("tokenizer.json: {}", e)))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| load(format!("model.safetensors: {}", e)))?;
        let mel_path = api
            .repo(Repo::new("FL33TW00D-HF/whisper-base".to_string(), RepoType::Model))
            .get("melfilters.bytes")
            .map_err(|e| load(format!("melfilters.bytes: {}", e)))?;

        let config_json =
            std::fs::read_to_string(&config_path).map_err(|e| load(format!("read config: {}", e)))?;
        let config: Config =
            serde_json::from_str(&config_json).map_err(|e| load(format!("parse config: {}", e)))?;
        let tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| load(format!("tokenizer: {}", e)))?;
        let mel_bytes = std::fs::read(&mel_path).map_err(|e| load(format!("mel filters: {}", e)))?;
        let mel_filters = read_mel_filters(&mel_bytes, &config)?;

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], m::DTYPE, &device)
                .map_err(|e| load(format!("weights: {}", e)))?
        };
        let model = m::model::Whisper::load(&vb, config.clone())
            .map_err(|e| load(format!("model: {}", e)))?;

        tracing::info!("Local Whisper model loaded");

        Ok(Self {
            inner: Arc::new(WhisperModel {
                model: Mutex::new(model),
                tokenizer,
                config,
                device,
                mel_filters,
            }),
        })
    }
}

#[async_trait]
impl TranscriptionEngine for CandleWhisperEngine {
    fn name(&self) -> &str {
        "candle-whisper"
    }

    async fn transcribe(
        &self,
        audio_data: &[u8],
        _file_name: &str,
        options: &TranscriptionOptions,
    ) -> Result<EngineTranscript, TranscriptionError> {
        let inner = Arc::clone(&self.inner);
        let audio = audio_data.to_vec();
        let options = options.clone();

        tokio::task::spawn_blocking(move || inner.run(&audio, &options))
            .await
            .map_err(|e| TranscriptionError::TranscriptionFailed(format!("worker: {}", e)))?
    }

    async fn health_check(&self) -> Result<(), TranscriptionError> {
        Ok(())
    }
}

impl WhisperModel {
    fn run(
        &self,
        audio: &[u8],
        options: &TranscriptionOptions,
    ) -> Result<EngineTranscript, TranscriptionError> {
        let pcm = decode_to_mono_pcm(audio, m::SAMPLE_RATE as u32).map_err(|e| {
            TranscriptionError::DecodingFailed(e.to_string())
        })?;

        let window_secs = m::CHUNK_LENGTH as f64;
        let mut model = self.model.lock();
        let mut detected: Option<LanguageCode> = None;
        let mut segments = Vec::new();

        for (i, chunk) in pcm.chunks(m::N_SAMPLES).enumerate() {
            let mut samples = chunk.to_vec();
            samples.resize(m::N_SAMPLES, 0.0);

            let mel_data = m::audio::pcm_to_mel(&self.config, &samples, &self.mel_filters);
            let n_mel = self.config.num_mel_bins;
            let n_frames = mel_data.len() / n_mel;
            let mel = Tensor::from_vec(mel_data, (1, n_mel, n_frames), &self.device)
                .map_err(failed)?;

            let language = options.language.as_ref().or(detected.as_ref()).cloned();
            let window = self.decode_window(&mut model, &mel, language.as_ref(), options.task)?;
            if detected.is_none() {
                detected = window.language;
            }

            let start = i as f64 * window_secs;
            let end = start + chunk.len() as f64 / m::SAMPLE_RATE as f64;
            tracing::debug!(window = i, start, end, "Decoded audio window");
            if !window.text.is_empty() {
                segments.push(TranscriptSegment::new(start, end, window.text));
            }
        }

        let language = match options.task {
            TranscriptionTask::TranslateToEnglish => LanguageCode::parse("en").ok(),
            TranscriptionTask::Transcribe => options.language.clone().or(detected),
        };

        tracing::info!(
            segments = segments.len(),
            language = language.as_ref().map(|l| l.as_str()),
            "Local transcription completed"
        );

        Ok(EngineTranscript { language, segments })
    }

    fn decode_window(
        &self,
        model: &mut m::model::Whisper,
        mel: &Tensor,
        language: Option<&LanguageCode>,
        task: TranscriptionTask,
    ) -> Result<DecodedWindow, TranscriptionError> {
        let eot = self.token_id(m::EOT_TOKEN)?;
        let task_token = match task {
            TranscriptionTask::Transcribe => self.token_id(m::TRANSCRIBE_TOKEN)?,
            TranscriptionTask::TranslateToEnglish => self.token_id(m::TRANSLATE_TOKEN)?,
        };

        let mut prompt = vec![self.token_id(m::SOT_TOKEN)?];
        let mut detected = None;
        match language {
            Some(code) => prompt.push(self.token_id(&format!("<|{}|>", code))?),
            None => {
                let (token, code) = self.detect_language(model, mel, &prompt)?;
                prompt.push(token);
                detected = code;
            }
        }
        prompt.push(task_token);
        prompt.push(self.token_id(m::NO_TIMESTAMPS_TOKEN)?);

        let features = model.encoder.forward(mel, true).map_err(failed)?;
        let mut tokens = prompt.clone();
        let mut text = String::new();

        for _ in 0..MAX_DECODE_TOKENS {
            let next = self.next_token(model, &features, &tokens, tokens.len() == prompt.len())?;
            if next == eot {
                break;
            }
            tokens.push(next);
            if let Some(piece) = self.tokenizer.id_to_token(next) {
                if !piece.starts_with("<|") {
                    text.push_str(&piece.replace('Ġ', " ").replace('▁', " "));
                }
            }
        }
        model.reset_kv_cache();

        Ok(DecodedWindow {
            text: text.trim().to_string(),
            language: detected,
        })
    }

    fn detect_language(
        &self,
        model: &mut m::model::Whisper,
        mel: &Tensor,
        prompt: &[u32],
    ) -> Result<(u32, Option<LanguageCode>), TranscriptionError> {
        let features = model.encoder.forward(mel, true).map_err(failed)?;
        let token = self.next_token(model, &features, prompt, true)?;
        model.reset_kv_cache();

        let code = self
            .tokenizer
            .id_to_token(token)
            .and_then(|piece| {
                piece
                    .strip_prefix("<|")
                    .and_then(|p| p.strip_suffix("|>"))
                    .map(str::to_string)
            })
            .and_then(|raw| LanguageCode::parse(&raw).ok());
        Ok((token, code))
    }

    fn next_token(
        &self,
        model: &mut m::model::Whisper,
        features: &Tensor,
        tokens: &[u32],
        flush: bool,
    ) -> Result<u32, TranscriptionError> {
        let input = Tensor::new(tokens, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(failed)?;
        let hidden = model.decoder.forward(&input, features, flush).map_err(failed)?;
        let logits = model
            .decoder
            .final_linear(&hidden.squeeze(0).map_err(failed)?)
            .map_err(failed)?;
        let last = logits.dim(0).and_then(|n| logits.get(n - 1)).map_err(failed)?;
        last.argmax(0)
            .and_then(|t| t.to_scalar::<u32>())
            .map_err(failed)
    }

    fn token_id(&self, token: &str) -> Result<u32, TranscriptionError> {
        self.tokenizer.token_to_id(token).ok_or_else(|| {
            TranscriptionError::TranscriptionFailed(format!("token not found: {}", token))
        })
    }
}

struct DecodedWindow {
    text: String,
    language: Option<LanguageCode>,
}

fn failed(e: candle_core::Error) -> TranscriptionError {
    TranscriptionError::TranscriptionFailed(e.to_string())
}

fn read_mel_filters(bytes: &[u8], config: &Config) -> Result<Vec<f32>, TranscriptionError> {
    let expected = config.num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected * 4 {
        return Err(TranscriptionError::ModelLoadFailed(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected * 4
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .take(expected)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
