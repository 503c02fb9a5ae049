//! Shared test utilities
//!
//! - [`ScriptedApi`]: in-memory `WatermarkApi` with queued responses,
//!   recorded calls and optional gates that hold a request in flight
//! - [`sine_wav`]: deterministic WAV bytes generated with hound

#![allow(dead_code)]

use async_trait::async_trait;
use echocrypt_client::api::{
    ApiError, EmbedRequest, EmbedResponse, ExtractRequest, ExtractResponse, SuggestResponse,
    UploadResponse, WatermarkApi,
};
use echocrypt_client::AudioFile;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::collections::{HashMap, VecDeque};
use std::f32::consts::PI;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Standard test sample rate
const TEST_SAMPLE_RATE: u32 = 8000;

/// Mono 16-bit sine wave as WAV bytes
pub fn sine_wav(frames: u32, frequency_hz: f32, amplitude: f32) -> Vec<u8> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: TEST_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        let amplitude_i16 = amplitude * i16::MAX as f32;
        for frame_idx in 0..frames {
            let t = frame_idx as f32 / TEST_SAMPLE_RATE as f32;
            let sample = (2.0 * PI * frequency_hz * t).sin() * amplitude_i16;
            writer.write_sample(sample as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// WAV file of `frames` sine frames
pub fn wav_file(name: &str, frames: u32) -> AudioFile {
    AudioFile::new(name, sine_wav(frames, 440.0, 0.5))
}

/// Opaque file of an exact size (never decoded)
pub fn sized_file(name: &str, size: usize) -> AudioFile {
    AudioFile::new(name, vec![0u8; size])
}

/// One recorded API call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Suggest { size_bytes: u64 },
    Upload { file_name: String, size_bytes: u64 },
    Embed(EmbedRequest),
    Extract {
        file_name: String,
        cipher_keyword: String,
        transposition_depth: i64,
        bit_depth: u8,
    },
    Download { url: String },
}

/// Holds one request until released
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the gated request has arrived
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the gated request continue
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct Script {
    calls: Vec<ApiCall>,
    suggest: VecDeque<Result<SuggestResponse, ApiError>>,
    upload: VecDeque<Result<UploadResponse, ApiError>>,
    embed: VecDeque<Result<EmbedResponse, ApiError>>,
    extract: VecDeque<Result<ExtractResponse, ApiError>>,
    downloads: HashMap<String, Vec<u8>>,
    gates: HashMap<&'static str, Arc<Gate>>,
}

/// Scripted `WatermarkApi` double
///
/// Each endpoint pops its next queued response; an empty queue yields a
/// network error. A gate applies to the next call of its endpoint only.
#[derive(Default)]
pub struct ScriptedApi {
    script: Mutex<Script>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_suggest(&self, response: Result<SuggestResponse, ApiError>) {
        self.script.lock().unwrap().suggest.push_back(response);
    }

    pub fn push_suggest_bits(&self, bits: i64) {
        self.push_suggest(Ok(SuggestResponse {
            recommended_bits: bits,
        }));
    }

    pub fn push_upload(&self, response: Result<UploadResponse, ApiError>) {
        self.script.lock().unwrap().upload.push_back(response);
    }

    pub fn push_upload_id(&self, file_id: &str) {
        self.push_upload(Ok(UploadResponse {
            file_id: file_id.to_string(),
            filename: None,
            size: None,
        }));
    }

    pub fn push_embed(&self, response: Result<EmbedResponse, ApiError>) {
        self.script.lock().unwrap().embed.push_back(response);
    }

    pub fn push_extract(&self, response: Result<ExtractResponse, ApiError>) {
        self.script.lock().unwrap().extract.push_back(response);
    }

    pub fn serve_download(&self, url: &str, bytes: Vec<u8>) {
        self.script
            .lock()
            .unwrap()
            .downloads
            .insert(url.to_string(), bytes);
    }

    /// Gate the next call to `endpoint` ("suggest", "upload", "embed", "extract")
    pub fn gate(&self, endpoint: &'static str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.script
            .lock()
            .unwrap()
            .gates
            .insert(endpoint, Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Total number of recorded calls
    pub fn call_count(&self) -> usize {
        self.script.lock().unwrap().calls.len()
    }

    pub fn count(&self, matches: impl Fn(&ApiCall) -> bool) -> usize {
        self.script
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| matches(c))
            .count()
    }

    /// Record the call, pop the response, then honour any gate
    async fn handle<T>(
        &self,
        endpoint: &'static str,
        call: ApiCall,
        pop: impl FnOnce(&mut Script) -> Option<Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        let (response, gate) = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(call);
            let response = pop(&mut script);
            let gate = script.gates.remove(endpoint);
            (response, gate)
        };

        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        response.unwrap_or_else(|| {
            Err(ApiError::Network(format!(
                "no scripted response for {}",
                endpoint
            )))
        })
    }
}

#[async_trait]
impl WatermarkApi for ScriptedApi {
    async fn suggest(&self, size_bytes: u64) -> Result<SuggestResponse, ApiError> {
        self.handle("suggest", ApiCall::Suggest { size_bytes }, |s| {
            s.suggest.pop_front()
        })
        .await
    }

    async fn upload(&self, file: &AudioFile) -> Result<UploadResponse, ApiError> {
        let call = ApiCall::Upload {
            file_name: file.name().to_string(),
            size_bytes: file.size(),
        };
        self.handle("upload", call, |s| s.upload.pop_front()).await
    }

    async fn embed(&self, request: &EmbedRequest) -> Result<EmbedResponse, ApiError> {
        self.handle("embed", ApiCall::Embed(request.clone()), |s| {
            s.embed.pop_front()
        })
        .await
    }

    async fn extract(&self, request: &ExtractRequest) -> Result<ExtractResponse, ApiError> {
        let call = ApiCall::Extract {
            file_name: request.file.name().to_string(),
            cipher_keyword: request.cipher_keyword.clone(),
            transposition_depth: request.transposition_depth,
            bit_depth: request.bit_depth,
        };
        self.handle("extract", call, |s| s.extract.pop_front()).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let call = ApiCall::Download {
            url: url.to_string(),
        };
        let url = url.to_string();
        self.handle("download", call, move |s| {
            Some(
                s.downloads
                    .get(&url)
                    .cloned()
                    .ok_or_else(|| ApiError::from_error_body(404, "")),
            )
        })
        .await
    }
}
