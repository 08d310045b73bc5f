use super::LanguageCode;

/// Sample rate of the raw PCM accepted on a transcription stream.
pub const STREAM_SAMPLE_RATE: u32 = 16_000;

const BYTES_PER_SAMPLE: usize = 2;

/// Accumulates 16 bit little-endian mono PCM and cuts it into fixed-size chunks.
#[derive(Debug)]
pub struct PcmBuffer {
    pending: Vec<u8>,
    chunk_bytes: usize,
}

impl PcmBuffer {
    /// `chunk_bytes` is rounded down to whole samples, minimum one sample.
    pub fn new(chunk_bytes: usize) -> Self {
        let chunk_bytes = (chunk_bytes - chunk_bytes % BYTES_PER_SAMPLE).max(BYTES_PER_SAMPLE);
        Self {
            pending: Vec::with_capacity(chunk_bytes),
            chunk_bytes,
        }
    }

    pub fn for_duration(chunk_secs: f64) -> Self {
        let samples = (chunk_secs.max(0.0) * STREAM_SAMPLE_RATE as f64) as usize;
        Self::new(samples * BYTES_PER_SAMPLE)
    }

    pub fn chunk_bytes(&self) -> usize {
        self.chunk_bytes
    }

    pub fn pending_bytes(&self) -> usize {
        self.pending.len()
    }

    /// Appends data and returns every chunk that is now complete, oldest first.
    pub fn push(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(data);

        let mut chunks = Vec::new();
        while self.pending.len() >= self.chunk_bytes {
            let rest = self.pending.split_off(self.chunk_bytes);
            chunks.push(std::mem::replace(&mut self.pending, rest));
        }
        chunks
    }

    /// Takes whatever whole samples remain. A dangling odd byte is dropped.
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        let whole = self.pending.len() - self.pending.len() % BYTES_PER_SAMPLE;
        self.pending.truncate(whole);
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }
}

/// Result of one transcribed stream chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    pub chunk_id: u64,
    pub language: Option<LanguageCode>,
    pub transcription: String,
    /// Equals the transcription when no translation was requested or needed.
    pub translation: String,
    pub confidence: f32,
}
