use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::application::ports::{TranslationEngine, TranslationError};
use crate::domain::{LanguageCode, LanguagePair, Stage, TranslationResult};

use super::StageError;

#[derive(Debug, Clone)]
pub struct TranslationPolicy {
    /// Requested pairs allowed end to end. Empty allows anything the engine can route.
    pub allowed_pairs: Vec<LanguagePair>,
    pub pivot: Option<LanguageCode>,
    pub max_text_chars: usize,
    pub load_retries: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Direct,
    Pivot(LanguageCode),
}

pub struct TranslationAdapter {
    engine: Arc<dyn TranslationEngine>,
    policy: TranslationPolicy,
    allowed: HashSet<LanguagePair>,
    installed: RwLock<Option<HashSet<LanguagePair>>>,
}

impl TranslationAdapter {
    pub fn new(engine: Arc<dyn TranslationEngine>, policy: TranslationPolicy) -> Self {
        let allowed = policy.allowed_pairs.iter().cloned().collect();
        Self {
            engine,
            policy,
            allowed,
            installed: RwLock::new(None),
        }
    }

    /// Loads the engine's installed pairs once. A failure is logged and the
    /// load is retried on first use.
    pub async fn initialize(&self) {
        if let Err(e) = self.installed_pairs().await {
            tracing::warn!(
                engine = self.engine.name(),
                error = %e,
                "Translation pairs not loaded at startup"
            );
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub async fn health_check(&self) -> Result<(), String> {
        match tokio::time::timeout(self.policy.timeout, self.engine.health_check()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "health check timed out after {:?}",
                self.policy.timeout
            )),
        }
    }

    /// Pairs reachable in one or two hops, restricted by the policy.
    pub async fn supported_pairs(&self) -> Result<Vec<LanguagePair>, StageError> {
        let installed = self.installed_pairs().await?;
        let mut languages: Vec<LanguageCode> = installed
            .iter()
            .flat_map(|p| [p.source.clone(), p.target.clone()])
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        languages.sort();

        let mut pairs = Vec::new();
        for source in &languages {
            for target in &languages {
                if source != target && self.route_in(&installed, source, target).is_ok() {
                    pairs.push(LanguagePair::new(source.clone(), target.clone()));
                }
            }
        }
        Ok(pairs)
    }

    pub async fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<TranslationResult, StageError> {
        if source == target {
            return Ok(TranslationResult {
                source_language: source.clone(),
                target_language: target.clone(),
                source_text: text.to_string(),
                translated_text: text.to_string(),
                pivot: None,
            });
        }

        let length = text.chars().count();
        if length > self.policy.max_text_chars {
            return Err(StageError::TextTooLong {
                length,
                limit: self.policy.max_text_chars,
            });
        }

        let installed = self.installed_pairs().await?;
        let route = self.route_in(&installed, source, target)?;

        let (translated_text, pivot) = match route {
            Route::Direct => (self.call_engine(text, source, target).await?, None),
            Route::Pivot(pivot) => {
                tracing::debug!(
                    source = %source,
                    pivot = %pivot,
                    target = %target,
                    "Translating through pivot language"
                );
                let intermediate = self.call_engine(text, source, &pivot).await?;
                let translated = self.call_engine(&intermediate, &pivot, target).await?;
                (translated, Some(pivot))
            }
        };

        tracing::info!(
            source = %source,
            target = %target,
            pivot = pivot.as_ref().map(|p| p.as_str()),
            source_chars = length,
            translated_chars = translated_text.chars().count(),
            "Translation completed"
        );

        Ok(TranslationResult {
            source_language: source.clone(),
            target_language: target.clone(),
            source_text: text.to_string(),
            translated_text,
            pivot,
        })
    }

    fn route_in(
        &self,
        installed: &HashSet<LanguagePair>,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<Route, StageError> {
        let requested = LanguagePair::new(source.clone(), target.clone());
        let unsupported = || StageError::UnsupportedLanguagePair {
            source_language: source.to_string(),
            target_language: target.to_string(),
        };

        if !self.allowed.is_empty() && !self.allowed.contains(&requested) {
            return Err(unsupported());
        }
        if installed.contains(&requested) {
            return Ok(Route::Direct);
        }
        if let Some(pivot) = &self.policy.pivot {
            if pivot != source && pivot != target {
                let first = LanguagePair::new(source.clone(), pivot.clone());
                let second = LanguagePair::new(pivot.clone(), target.clone());
                if installed.contains(&first) && installed.contains(&second) {
                    return Ok(Route::Pivot(pivot.clone()));
                }
            }
        }
        Err(unsupported())
    }

    async fn installed_pairs(&self) -> Result<HashSet<LanguagePair>, StageError> {
        if let Some(pairs) = self.installed.read().await.as_ref() {
            return Ok(pairs.clone());
        }

        let mut slot = self.installed.write().await;
        if let Some(pairs) = slot.as_ref() {
            return Ok(pairs.clone());
        }

        let pairs: HashSet<LanguagePair> = tokio::time::timeout(
            self.policy.timeout,
            self.engine.language_pairs(),
        )
        .await
        .map_err(|_| StageError::EngineTimeout {
            stage: Stage::Translation,
            timeout: self.policy.timeout,
        })?
        .map_err(map_engine_error)?
        .into_iter()
        .collect();

        tracing::info!(
            engine = self.engine.name(),
            pairs = pairs.len(),
            "Translation language pairs loaded"
        );
        *slot = Some(pairs.clone());
        Ok(pairs)
    }

    async fn call_engine(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String, StageError> {
        let mut attempt = 0;
        loop {
            let call = self.engine.translate(text, source, target);
            let outcome = tokio::time::timeout(self.policy.timeout, call)
                .await
                .map_err(|_| StageError::EngineTimeout {
                    stage: Stage::Translation,
                    timeout: self.policy.timeout,
                })?;

            match outcome {
                Ok(translated) if translated.trim().is_empty() && !text.trim().is_empty() => {
                    return Err(StageError::engine(
                        Stage::Translation,
                        format!("engine returned empty text for {} -> {}", source, target),
                    ));
                }
                Ok(translated) => return Ok(translated),
                Err(TranslationError::EngineUnavailable(reason))
                    if attempt < self.policy.load_retries =>
                {
                    attempt += 1;
                    tracing::warn!(
                        attempt = attempt,
                        reason = %reason,
                        "Translation engine not ready, retrying"
                    );
                }
                Err(e) => return Err(map_engine_error(e)),
            }
        }
    }
}

fn map_engine_error(e: TranslationError) -> StageError {
    match e {
        TranslationError::UnsupportedPair {
            source_language,
            target_language,
        } => StageError::UnsupportedLanguagePair {
            source_language,
            target_language,
        },
        other => StageError::engine(Stage::Translation, other.to_string()),
    }
}
