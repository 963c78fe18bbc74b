//! Python bridge for F5-TTS inference
//! Keeps one `f5_tts_mlx` worker process alive and talks to it with
//! line-delimited JSON over stdin/stdout

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::{MelSpectrogram, SampleRequest, SpeechSampler, Vocoder};
use crate::audio::{decode_raw_f32, encode_raw_f32, ReferenceAsset};
use crate::config::SAMPLE_RATE;
use crate::error::{Error, Result};
use crate::text::TextNormalizer;

/// Request to the bridge worker
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum BridgeRequest<'a> {
    Check,
    DefaultReference,
    NormalizeText {
        text: &'a str,
    },
    Sample {
        model_path: String,
        reference_base64: String,
        text_tokens: &'a [String],
        duration: usize,
        steps: usize,
        cfg_strength: f64,
        sway_sampling_coef: f64,
        seed: Option<u64>,
    },
    Decode {
        vocoder_path: String,
        mel_base64: String,
        mel_frames: usize,
        mel_channels: usize,
    },
}

/// Response from the bridge worker
#[derive(Debug, Deserialize, Default)]
pub struct BridgeResponse {
    pub status: Option<String>,
    pub error: Option<String>,
    pub tokens: Option<Vec<String>>,
    pub mel_base64: Option<String>,
    pub mel_frames: Option<usize>,
    pub mel_channels: Option<usize>,
    pub audio_base64: Option<String>,
    pub sample_rate: Option<u32>,
    pub wav_base64: Option<String>,
}

struct Worker {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Long-lived Python worker shared by the sampler, vocoder and text normalizer
pub struct BridgeProcess {
    python_cmd: String,
    script_path: PathBuf,
    worker: Mutex<Option<Worker>>,
}

impl BridgeProcess {
    pub fn new(python_cmd: impl Into<String>, script_path: impl Into<PathBuf>) -> Self {
        Self {
            python_cmd: python_cmd.into(),
            script_path: script_path.into(),
            worker: Mutex::new(None),
        }
    }

    /// Check if the worker starts and its Python dependencies import
    pub fn check_dependencies(&self) -> bool {
        match self.call(&BridgeRequest::Check) {
            Ok(response) => response.status.as_deref() == Some("ok"),
            Err(e) => {
                warn!("Python bridge unavailable: {}", e);
                false
            }
        }
    }

    /// Send one request and wait for its reply
    pub fn call(&self, request: &BridgeRequest<'_>) -> Result<BridgeResponse> {
        let line = serde_json::to_string(request)?;

        let mut guard = self
            .worker
            .lock()
            .map_err(|_| Error::InferenceError("Python bridge lock poisoned".to_string()))?;

        if guard.is_none() {
            *guard = Some(self.spawn()?);
        }
        let worker = guard
            .as_mut()
            .ok_or_else(|| Error::InferenceError("Python bridge not running".to_string()))?;

        let result = exchange(worker, &line);
        if result.is_err() {
            // A worker in an unknown state is restarted on the next call
            if let Some(mut worker) = guard.take() {
                let _ = worker.child.kill();
                let _ = worker.child.wait();
            }
        }

        let response = result?;
        if let Some(err) = response.error {
            return Err(Error::InferenceError(format!("Python bridge error: {}", err)));
        }
        Ok(response)
    }

    fn spawn(&self) -> Result<Worker> {
        info!("Starting Python bridge {:?}", self.script_path);

        let mut child = Command::new(&self.python_cmd)
            .arg(&self.script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::InferenceError(format!("Failed to start Python: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::InferenceError("Python stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::InferenceError("Python stdout unavailable".to_string()))?;

        Ok(Worker {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }
}

impl Drop for BridgeProcess {
    fn drop(&mut self) {
        let worker = match self.worker.get_mut() {
            Ok(worker) => worker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(mut worker) = worker {
            debug!("Stopping Python bridge");
            let _ = worker.child.kill();
            let _ = worker.child.wait();
        }
    }
}

fn exchange(worker: &mut Worker, request_json: &str) -> Result<BridgeResponse> {
    writeln!(worker.stdin, "{}", request_json)
        .and_then(|_| worker.stdin.flush())
        .map_err(|e| Error::InferenceError(format!("Failed to write to Python: {}", e)))?;

    let mut line = String::new();
    loop {
        line.clear();
        let read = worker
            .stdout
            .read_line(&mut line)
            .map_err(|e| Error::InferenceError(format!("Failed to read from Python: {}", e)))?;
        if read == 0 {
            return Err(Error::InferenceError(
                "Python bridge exited unexpectedly".to_string(),
            ));
        }

        // Libraries print warnings to stdout; replies are the JSON lines
        let trimmed = line.trim();
        if trimmed.starts_with('{') {
            return parse_response(trimmed);
        }
        debug!("python: {}", trimmed);
    }
}

fn parse_response(json_str: &str) -> Result<BridgeResponse> {
    serde_json::from_str(json_str).map_err(|e| {
        Error::InferenceError(format!(
            "Failed to parse Python response: {} - {}",
            e, json_str
        ))
    })
}

fn encode_f32_base64(samples: &[f32]) -> String {
    base64::engine::general_purpose::STANDARD.encode(encode_raw_f32(samples))
}

fn decode_base64(data: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| Error::InferenceError(format!("Failed to decode payload: {}", e)))
}

fn decode_f32_base64(data: &str) -> Result<Vec<f32>> {
    decode_raw_f32(&decode_base64(data)?)
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| Error::InferenceError(format!("Python response is missing `{}`", field)))
}

/// Diffusion sampler hosted by the bridge
pub struct BridgeSampler {
    bridge: Arc<BridgeProcess>,
    model_path: PathBuf,
}

impl BridgeSampler {
    pub fn new(bridge: Arc<BridgeProcess>, model_path: &Path) -> Self {
        Self {
            bridge,
            model_path: model_path.to_path_buf(),
        }
    }
}

impl SpeechSampler for BridgeSampler {
    fn sample(&self, request: &SampleRequest<'_>, vocoder: &dyn Vocoder) -> Result<Vec<f32>> {
        let reference = match request.reference_batch {
            [reference] => *reference,
            batch => {
                return Err(Error::InvalidInput(format!(
                    "Python sampler takes one reference clip, got {}",
                    batch.len()
                )))
            }
        };

        debug!(
            "Sampling {} frames with {} steps",
            request.duration, request.steps
        );

        let response = self.bridge.call(&BridgeRequest::Sample {
            model_path: self.model_path.to_string_lossy().to_string(),
            reference_base64: encode_f32_base64(reference),
            text_tokens: request.text,
            duration: request.duration.frames(),
            steps: request.steps,
            cfg_strength: request.cfg_strength,
            sway_sampling_coef: request.sway_sampling_coef,
            seed: request.seed,
        })?;

        let mel = MelSpectrogram::new(
            decode_f32_base64(&required(response.mel_base64, "mel_base64")?)?,
            required(response.mel_frames, "mel_frames")?,
            required(response.mel_channels, "mel_channels")?,
        )?;

        vocoder.decode(&mel)
    }
}

/// Vocoder hosted by the bridge
pub struct BridgeVocoder {
    bridge: Arc<BridgeProcess>,
    vocoder_path: PathBuf,
}

impl BridgeVocoder {
    pub fn new(bridge: Arc<BridgeProcess>, vocoder_path: &Path) -> Self {
        Self {
            bridge,
            vocoder_path: vocoder_path.to_path_buf(),
        }
    }
}

impl Vocoder for BridgeVocoder {
    fn decode(&self, mel: &MelSpectrogram) -> Result<Vec<f32>> {
        let response = self.bridge.call(&BridgeRequest::Decode {
            vocoder_path: self.vocoder_path.to_string_lossy().to_string(),
            mel_base64: encode_f32_base64(mel.data()),
            mel_frames: mel.frames(),
            mel_channels: mel.channels(),
        })?;

        let sample_rate = response.sample_rate.unwrap_or(SAMPLE_RATE);
        if sample_rate != SAMPLE_RATE {
            return Err(Error::InferenceError(format!(
                "vocoder produced {} Hz audio, expected {} Hz",
                sample_rate, SAMPLE_RATE
            )));
        }

        let samples = decode_f32_base64(&required(response.audio_base64, "audio_base64")?)?;
        debug!("Vocoder produced {} samples", samples.len());
        Ok(samples)
    }
}

/// Pinyin conversion hosted by the bridge
pub struct BridgeTextNormalizer {
    bridge: Arc<BridgeProcess>,
}

impl BridgeTextNormalizer {
    pub fn new(bridge: Arc<BridgeProcess>) -> Self {
        Self { bridge }
    }
}

impl TextNormalizer for BridgeTextNormalizer {
    fn normalize(&self, text: &str) -> Result<Vec<String>> {
        let response = self.bridge.call(&BridgeRequest::NormalizeText { text })?;
        required(response.tokens, "tokens")
    }
}

/// The reference clip shipped inside the installed `f5_tts_mlx` package
pub struct BridgeReferenceAsset {
    bridge: Arc<BridgeProcess>,
}

impl BridgeReferenceAsset {
    pub fn new(bridge: Arc<BridgeProcess>) -> Self {
        Self { bridge }
    }
}

impl ReferenceAsset for BridgeReferenceAsset {
    fn read(&self) -> Result<Vec<u8>> {
        let response = self.bridge.call(&BridgeRequest::DefaultReference)?;
        decode_base64(&required(response.wav_base64, "wav_base64")?)
    }
}
