use chrono::{DateTime, Utc};

use super::{ArtifactId, JobId, StoragePath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    SourceAudio,
    Transcript,
    Translation,
    SynthesizedAudio,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceAudio => "source_audio",
            Self::Transcript => "transcript",
            Self::Translation => "translation",
            Self::SynthesizedAudio => "synthesized_audio",
        }
    }
}

/// Which directory the artifact currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageTier {
    Temporary,
    Output,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub id: ArtifactId,
    pub owner: JobId,
    pub kind: ArtifactKind,
    pub content_type: String,
    pub size_bytes: u64,
    pub path: StoragePath,
    pub tier: StorageTier,
    pub created_at: DateTime<Utc>,
    pub retention_deadline: DateTime<Utc>,
}

impl Artifact {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.retention_deadline
    }

    /// File extension used when persisting bytes of this content type.
    pub fn extension_for(content_type: &str) -> &'static str {
        match content_type {
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/mp4" | "audio/x-m4a" | "audio/m4a" => "m4a",
            "audio/flac" | "audio/x-flac" => "flac",
            "audio/ogg" => "ogg",
            "audio/aac" => "aac",
            "audio/x-ms-wma" => "wma",
            "text/plain" | "text/plain; charset=utf-8" => "txt",
            "application/json" => "json",
            _ => "bin",
        }
    }
}
