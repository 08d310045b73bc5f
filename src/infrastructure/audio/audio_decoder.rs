use std::io::Cursor;

use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioInfo, AudioProbe, AudioProbeError};

struct OpenedStream {
    format: Box<dyn FormatReader>,
    track_id: u32,
    params: CodecParameters,
}

fn open_stream(data: &[u8]) -> Result<OpenedStream, AudioProbeError> {
    if data.is_empty() {
        return Err(AudioProbeError::Empty);
    }

    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioProbeError::UnrecognizedFormat(e.to_string()))?;

    let format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| AudioProbeError::DecodingFailed("no audio track found".to_string()))?;

    Ok(OpenedStream {
        track_id: track.id,
        params: track.codec_params.clone(),
        format,
    })
}

fn make_decoder(params: &CodecParameters) -> Result<Box<dyn Decoder>, AudioProbeError> {
    symphonia::default::get_codecs()
        .make(params, &DecoderOptions::default())
        .map_err(|e| AudioProbeError::DecodingFailed(format!("codec: {}", e)))
}

/// `Ok(None)` at end of stream.
fn next_packet(
    format: &mut dyn FormatReader,
    track_id: u32,
) -> Result<Option<Packet>, AudioProbeError> {
    loop {
        match format.next_packet() {
            Ok(packet) if packet.track_id() == track_id => return Ok(Some(packet)),
            Ok(_) => continue,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(None);
            }
            Err(e) => return Err(AudioProbeError::DecodingFailed(format!("packet: {}", e))),
        }
    }
}

/// Duration comes from the container frame count when present, otherwise
/// from decoding every packet and counting frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaAudioProbe;

impl SymphoniaAudioProbe {
    pub fn new() -> Self {
        Self
    }
}

impl AudioProbe for SymphoniaAudioProbe {
    fn probe(&self, data: &[u8]) -> Result<AudioInfo, AudioProbeError> {
        let mut stream = open_stream(data)?;
        let sample_rate = stream
            .params
            .sample_rate
            .ok_or_else(|| AudioProbeError::DecodingFailed("unknown sample rate".to_string()))?;
        let channels = stream.params.channels.map(|c| c.count()).unwrap_or(1);

        let frames = match stream.params.n_frames {
            Some(n) if n > 0 => n,
            _ => count_frames(&mut stream)?,
        };
        if frames == 0 {
            return Err(AudioProbeError::Empty);
        }

        Ok(AudioInfo {
            duration_secs: frames as f64 / sample_rate as f64,
            sample_rate,
            channels,
        })
    }
}

fn count_frames(stream: &mut OpenedStream) -> Result<u64, AudioProbeError> {
    let mut decoder = make_decoder(&stream.params)?;
    let mut frames = 0u64;

    while let Some(packet) = next_packet(stream.format.as_mut(), stream.track_id)? {
        match decoder.decode(&packet) {
            Ok(decoded) => frames += decoded.frames() as u64,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!(error = %e, "Skipping corrupt frame while probing");
            }
            Err(e) => return Err(AudioProbeError::DecodingFailed(format!("decode: {}", e))),
        }
    }
    Ok(frames)
}

#[cfg(feature = "local-whisper")]
pub use pcm::decode_to_mono_pcm;

#[cfg(feature = "local-whisper")]
mod pcm {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::errors::Error as SymphoniaError;

    use crate::application::ports::AudioProbeError;

    use super::{make_decoder, next_packet, open_stream};

    /// Decodes to mono f32 PCM at `target_rate`, downmixing and resampling as needed.
    pub fn decode_to_mono_pcm(data: &[u8], target_rate: u32) -> Result<Vec<f32>, AudioProbeError> {
        let mut stream = open_stream(data)?;
        let source_rate = stream
            .params
            .sample_rate
            .ok_or_else(|| AudioProbeError::DecodingFailed("unknown sample rate".to_string()))?;
        let channels = stream.params.channels.map(|c| c.count()).unwrap_or(1).max(1);
        let mut decoder = make_decoder(&stream.params)?;

        let mut mono: Vec<f32> = Vec::new();
        while let Some(packet) = next_packet(stream.format.as_mut(), stream.track_id)? {
            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!(error = %e, "Skipping corrupt audio frame");
                    continue;
                }
                Err(e) => return Err(AudioProbeError::DecodingFailed(format!("decode: {}", e))),
            };
            if decoded.frames() == 0 {
                continue;
            }

            let mut buffer = SampleBuffer::<f32>::new(decoded.frames() as u64, *decoded.spec());
            buffer.copy_interleaved_ref(decoded);
            mono.extend(
                buffer
                    .samples()
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        }

        if mono.is_empty() {
            return Err(AudioProbeError::Empty);
        }

        if source_rate == target_rate {
            return Ok(mono);
        }
        resample(&mono, source_rate, target_rate)
    }

    fn resample(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>, AudioProbeError> {
        use rubato::{
            Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
            WindowFunction,
        };

        const CHUNK: usize = 1024;
        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };
        let ratio = to as f64 / from as f64;

        let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK, 1)
            .map_err(|e| AudioProbeError::DecodingFailed(format!("resampler: {}", e)))?;

        let mut output = Vec::with_capacity((samples.len() as f64 * ratio) as usize + CHUNK);
        for chunk in samples.chunks(CHUNK) {
            let mut input = chunk.to_vec();
            input.resize(CHUNK, 0.0);
            let result = resampler
                .process(&[input], None)
                .map_err(|e| AudioProbeError::DecodingFailed(format!("resample: {}", e)))?;
            if let Some(channel) = result.first() {
                output.extend_from_slice(channel);
            }
        }

        output.truncate((samples.len() as f64 * ratio) as usize);
        Ok(output)
    }
}
