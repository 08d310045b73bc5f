use std::collections::HashMap;

use crate::domain::{LanguageCode, Voice, VoiceSelection};

/// Configured voices. The first voice listed for a language is its default.
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    by_id: HashMap<String, usize>,
    defaults: HashMap<LanguageCode, usize>,
}

impl VoiceCatalog {
    pub fn new(voices: Vec<Voice>) -> Self {
        let mut by_id = HashMap::new();
        let mut defaults = HashMap::new();
        for (idx, voice) in voices.iter().enumerate() {
            by_id.entry(voice.id.clone()).or_insert(idx);
            defaults.entry(voice.language.clone()).or_insert(idx);
        }
        Self {
            voices,
            by_id,
            defaults,
        }
    }

    pub fn resolve(&self, selection: &VoiceSelection) -> Option<&Voice> {
        let idx = match selection {
            VoiceSelection::Voice(id) => self.by_id.get(id.as_str())?,
            VoiceSelection::Language(code) => self.defaults.get(code)?,
        };
        self.voices.get(*idx)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }
}
