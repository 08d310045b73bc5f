use std::io::Cursor;

use async_trait::async_trait;

use crate::application::ports::{SynthesisEngine, SynthesisError};
use crate::domain::{SynthesisOptions, Voice};

const SAMPLE_RATE: u32 = 16_000;
const CHARS_PER_SECOND: f64 = 15.0;
const MIN_DURATION_SECS: f64 = 0.5;

/// Produces silent WAV audio whose length follows a typical speaking rate.
pub struct MockSynthesisEngine;

impl MockSynthesisEngine {
    pub fn duration_for(text: &str, speed: f32) -> f64 {
        let speed = if speed > 0.0 { speed as f64 } else { 1.0 };
        (text.chars().count() as f64 / CHARS_PER_SECOND / speed).max(MIN_DURATION_SECS)
    }
}

#[async_trait]
impl SynthesisEngine for MockSynthesisEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn synthesize(
        &self,
        text: &str,
        _voice: &Voice,
        options: &SynthesisOptions,
    ) -> Result<Vec<u8>, SynthesisError> {
        let frames = (Self::duration_for(text, options.speed) * SAMPLE_RATE as f64) as u32;
        silent_wav(frames).map_err(|e| SynthesisError::SynthesisFailed(e.to_string()))
    }

    async fn health_check(&self) -> Result<(), SynthesisError> {
        Ok(())
    }
}

fn silent_wav(frames: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for _ in 0..frames {
            writer.write_sample(0i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
