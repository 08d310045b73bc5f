/// Basic facts about an encoded audio buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioInfo {
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: usize,
}

/// Reads container/codec metadata without running any ML model. Implementations
/// are blocking; callers run them on a blocking thread.
pub trait AudioProbe: Send + Sync {
    fn probe(&self, data: &[u8]) -> Result<AudioInfo, AudioProbeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AudioProbeError {
    #[error("unrecognized audio container: {0}")]
    UnrecognizedFormat(String),
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("audio stream is empty")]
    Empty,
}
