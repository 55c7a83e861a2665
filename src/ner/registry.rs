//! Lazy, process-wide recognizer registry.
//!
//! Recognizers are loaded at most once per language and shared through
//! `Arc`. Loading goes through a [`ModelLoader`] so tests and embedders can
//! plug their own models; a failed load is logged and replaced by
//! [`BlankRecognizer`].

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;

use super::{BlankRecognizer, EntityRecognizer, GazetteerFile, GazetteerRecognizer, NerResult};
use crate::lang::Language;

/// Source of per-language recognizers.
pub trait ModelLoader: Send + Sync {
    fn load(&self, language: Language) -> NerResult<Arc<dyn EntityRecognizer>>;
}

/// Loads the built-in gazetteer recognizer, extended by `<dir>/<code>.toml`
/// when a gazetteer directory is configured.
#[derive(Debug, Clone, Default)]
pub struct BuiltinLoader {
    pub gazetteer_dir: Option<PathBuf>,
}

impl BuiltinLoader {
    pub fn new(gazetteer_dir: Option<PathBuf>) -> Self {
        Self { gazetteer_dir }
    }
}

impl ModelLoader for BuiltinLoader {
    fn load(&self, language: Language) -> NerResult<Arc<dyn EntityRecognizer>> {
        let mut recognizer = GazetteerRecognizer::builtin(language);
        if let Some(dir) = &self.gazetteer_dir {
            let path = dir.join(format!("{}.toml", language.code()));
            if let Some(file) = GazetteerFile::load(&path)? {
                tracing::debug!(
                    path = %path.display(),
                    persons = file.persons.len(),
                    locations = file.locations.len(),
                    "loaded gazetteer"
                );
                recognizer = recognizer.with_file(file);
            }
        }
        Ok(Arc::new(recognizer))
    }
}

static GLOBAL: LazyLock<Arc<RecognizerRegistry>> =
    LazyLock::new(|| Arc::new(RecognizerRegistry::new(Box::new(BuiltinLoader::default()))));

/// Per-language recognizer cache.
pub struct RecognizerRegistry {
    models: DashMap<Language, Arc<dyn EntityRecognizer>>,
    loader: Box<dyn ModelLoader>,
}

impl RecognizerRegistry {
    pub fn new(loader: Box<dyn ModelLoader>) -> Self {
        Self {
            models: DashMap::new(),
            loader,
        }
    }

    /// The shared registry backed by the built-in gazetteers.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Recognizer for `language`, loading it on first use.
    ///
    /// The entry lock is held while loading, so concurrent callers for the
    /// same language trigger a single load.
    pub fn get(&self, language: Language) -> Arc<dyn EntityRecognizer> {
        self.models
            .entry(language)
            .or_insert_with(|| match self.loader.load(language) {
                Ok(model) => model,
                Err(err) => {
                    tracing::warn!(
                        language = language.code(),
                        error = %err,
                        "entity model unavailable, using blank recognizer"
                    );
                    Arc::new(BlankRecognizer)
                }
            })
            .value()
            .clone()
    }

    /// Number of languages loaded so far.
    pub fn loaded(&self) -> usize {
        self.models.len()
    }
}

impl std::fmt::Debug for RecognizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerRegistry")
            .field("loaded", &self.models.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::ner::{EntityLabel, NerError};

    struct CountingLoader(Arc<AtomicUsize>);

    impl ModelLoader for CountingLoader {
        fn load(&self, language: Language) -> NerResult<Arc<dyn EntityRecognizer>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(GazetteerRecognizer::builtin(language)))
        }
    }

    struct FailingLoader;

    impl ModelLoader for FailingLoader {
        fn load(&self, _language: Language) -> NerResult<Arc<dyn EntityRecognizer>> {
            Err(NerError::ModelParse {
                path: "da.toml".into(),
                message: "broken".into(),
            })
        }
    }

    #[test]
    fn loads_once_per_language() {
        let count = Arc::new(AtomicUsize::new(0));
        let registry = RecognizerRegistry::new(Box::new(CountingLoader(Arc::clone(&count))));
        registry.get(Language::French);
        registry.get(Language::French);
        registry.get(Language::English);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(registry.loaded(), 2);
    }

    #[test]
    fn concurrent_gets_share_one_load() {
        let count = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(RecognizerRegistry::new(Box::new(CountingLoader(
            Arc::clone(&count),
        ))));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get(Language::Danish).language())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(Language::Danish));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_degrades_to_blank() {
        let registry = RecognizerRegistry::new(Box::new(FailingLoader));
        let model = registry.get(Language::Danish);
        assert!(model.language().is_none());
        assert!(model.recognize_entities("Jens Hansen i Aarhus").is_empty());
    }

    #[test]
    fn malformed_gazetteer_file_degrades_to_blank() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fr.toml"), "persons = [unterminated").unwrap();
        let loader = BuiltinLoader::new(Some(dir.path().to_path_buf()));
        assert!(matches!(
            loader.load(Language::French),
            Err(NerError::ModelParse { .. })
        ));

        let registry = RecognizerRegistry::new(Box::new(loader));
        assert!(registry.get(Language::French).language().is_none());
    }

    #[test]
    fn gazetteer_dir_extends_builtin_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.toml"), "locations = [\"Springfield\"]\n").unwrap();
        let registry = RecognizerRegistry::new(Box::new(BuiltinLoader::new(Some(
            dir.path().to_path_buf(),
        ))));
        let entities = registry
            .get(Language::English)
            .recognize_entities("Springfield is lovely.");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].label, EntityLabel::Location);
    }

    #[test]
    fn global_registry_is_shared() {
        let a = RecognizerRegistry::global();
        let b = RecognizerRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
