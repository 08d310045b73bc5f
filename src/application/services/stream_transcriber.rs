use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::application::ports::ArtifactStore;
use crate::domain::{
    ArtifactKind, JobId, LanguageCode, Stage, StreamChunk, Transcript, TranscriptionOptions,
    TranscriptionTask,
};

use super::{AcquireError, StageError, StagePermit, StagePools, TranscriptionAdapter, TranslationAdapter};

#[derive(Debug, Clone, Default)]
pub struct StreamRequest {
    /// `None` lets the engine detect the language per chunk.
    pub source_language: Option<LanguageCode>,
    pub target_language: Option<LanguageCode>,
}

/// One open stream. Chunk audio is stored under the session id while it is transcribed.
pub struct StreamSession {
    id: JobId,
    request: StreamRequest,
    cancel: CancellationToken,
    chunks: u64,
}

impl StreamSession {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn request(&self) -> &StreamRequest {
        &self.request
    }

    /// Chunks handed to the transcriber so far, including silent ones.
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    /// Stops a pending wait for a stage slot.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Transcribes, then translates, audio chunks as they arrive on a stream,
/// sharing the stage pools with uploaded jobs.
pub struct StreamTranscriber {
    store: Arc<dyn ArtifactStore>,
    transcription: Arc<TranscriptionAdapter>,
    translation: Arc<TranslationAdapter>,
    pools: Arc<StagePools>,
}

impl StreamTranscriber {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        transcription: Arc<TranscriptionAdapter>,
        translation: Arc<TranslationAdapter>,
        pools: Arc<StagePools>,
    ) -> Self {
        Self {
            store,
            transcription,
            translation,
            pools,
        }
    }

    pub fn open(&self, request: StreamRequest) -> StreamSession {
        let id = JobId::new();
        self.store.pin(id);
        tracing::info!(
            session_id = %id,
            source = request.source_language.as_ref().map(|l| l.as_str()),
            target = request.target_language.as_ref().map(|l| l.as_str()),
            "Stream opened"
        );
        StreamSession {
            id,
            request,
            cancel: CancellationToken::new(),
            chunks: 0,
        }
    }

    /// Runs one WAV chunk through transcription and, when a different target
    /// language was requested, translation. Silent chunks yield `None`.
    pub async fn process_chunk(
        &self,
        session: &mut StreamSession,
        wav: Bytes,
    ) -> Result<Option<StreamChunk>, StageError> {
        session.chunks += 1;
        let chunk_id = session.chunks;

        let Some(transcript) = self.transcribe_chunk(session, wav).await? else {
            tracing::debug!(session_id = %session.id, chunk_id, "No speech in chunk");
            return Ok(None);
        };

        let transcription = transcript.text();
        let language = session
            .request
            .source_language
            .clone()
            .or_else(|| transcript.language.clone());

        let translation = match (&session.request.target_language, &language) {
            (None, _) => transcription.clone(),
            (Some(target), Some(source)) if source == target => transcription.clone(),
            (Some(target), Some(source)) => {
                let permit = self.acquire(session, Stage::Translation).await?;
                let outcome = self.translation.translate(&transcription, source, target).await;
                drop(permit);
                outcome?.translated_text
            }
            (Some(target), None) => {
                return Err(StageError::UnsupportedLanguagePair {
                    source_language: "unknown".to_string(),
                    target_language: target.to_string(),
                });
            }
        };

        tracing::debug!(
            session_id = %session.id,
            chunk_id,
            segments = transcript.segments.len(),
            "Stream chunk transcribed"
        );

        Ok(Some(StreamChunk {
            chunk_id,
            language,
            translation,
            confidence: mean_confidence(&transcript),
            transcription,
        }))
    }

    /// Cancels pending waits and removes whatever chunk audio is left.
    pub async fn close(&self, session: StreamSession) -> usize {
        session.cancel.cancel();
        let removed = match self.store.release_job(session.id).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "Failed to release stream audio");
                0
            }
        };
        self.store.unpin(session.id);
        tracing::info!(session_id = %session.id, chunks = session.chunks, "Stream closed");
        removed
    }

    async fn transcribe_chunk(
        &self,
        session: &StreamSession,
        wav: Bytes,
    ) -> Result<Option<Transcript>, StageError> {
        let artifact = self
            .store
            .put(session.id, ArtifactKind::SourceAudio, wav, "audio/wav")
            .await?;

        let options = TranscriptionOptions {
            language: session.request.source_language.clone(),
            task: TranscriptionTask::Transcribe,
        };
        let outcome = match self.acquire(session, Stage::Transcription).await {
            Ok(permit) => {
                let outcome = self.transcription.transcribe(&artifact, &options).await;
                drop(permit);
                outcome
            }
            Err(e) => Err(e),
        };

        if let Err(e) = self.store.delete(&artifact.id).await {
            tracing::warn!(artifact_id = %artifact.id, error = %e, "Failed to delete chunk audio");
        }

        match outcome {
            Ok(transcript) => Ok(Some(transcript)),
            Err(StageError::NoSpeechDetected) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn acquire(&self, session: &StreamSession, stage: Stage) -> Result<StagePermit, StageError> {
        self.pools
            .acquire(stage, &session.cancel)
            .await
            .map_err(|e| match e {
                AcquireError::QueueTimeout { stage, waited } => StageError::QueueTimeout { stage, waited },
                AcquireError::Cancelled => StageError::Internal("stream closed".to_string()),
                AcquireError::Closed(stage) => StageError::Internal(format!("{} pool closed", stage)),
            })
    }
}

fn mean_confidence(transcript: &Transcript) -> f32 {
    let scores: Vec<f32> = transcript
        .segments
        .iter()
        .filter_map(|s| s.confidence)
        .collect();
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f32>() / scores.len() as f32
}
