use super::LanguageCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub source_language: LanguageCode,
    pub target_language: LanguageCode,
    pub source_text: String,
    pub translated_text: String,
    /// Intermediate language when no direct model bridges the pair.
    pub pivot: Option<LanguageCode>,
}
