//! # Engine Manager Module
//!
//! This module provides thread-safe, lazily initialized ownership of the
//! shared OCR engine instance. Engine construction has a slow warm-up
//! phase, so the manager loads it at most once, tracks an explicit load
//! state, and serializes every recognition call through a single mutex —
//! the engine instance is not assumed reentrant.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::engine::{EngineError, RecognitionEngine, TesseractEngine};
use crate::scan_config::EngineConfig;

/// Shared handle to the serialized engine instance
pub type EngineHandle = Arc<Mutex<Box<dyn RecognitionEngine>>>;

/// Factory invoked on first use to construct the engine
pub type EngineFactory =
    Box<dyn Fn() -> Result<Box<dyn RecognitionEngine>, EngineError> + Send + Sync>;

/// Load state of the shared engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Not constructed yet; first use will load
    #[default]
    Unloaded,
    /// Construction in progress
    Loading,
    /// Constructed and usable
    Ready,
    /// Construction failed; calls fail fast until `retry_load`
    Failed,
}

struct Inner {
    state: EngineState,
    instance: Option<EngineHandle>,
}

/// Lazily initialized owner of the shared recognition engine
pub struct EngineManager {
    factory: EngineFactory,
    inner: Mutex<Inner>,
}

impl EngineManager {
    /// Create a manager that constructs the engine with `factory` on first use
    pub fn with_factory(factory: EngineFactory) -> Self {
        Self {
            factory,
            inner: Mutex::new(Inner {
                state: EngineState::Unloaded,
                instance: None,
            }),
        }
    }

    /// Create a manager backed by the Tesseract engine
    pub fn tesseract(config: EngineConfig) -> Self {
        Self::with_factory(Box::new(move || {
            TesseractEngine::new(&config).map(|e| Box::new(e) as Box<dyn RecognitionEngine>)
        }))
    }

    /// Current load state
    pub fn state(&self) -> EngineState {
        self.inner
            .lock()
            .expect("Failed to acquire engine state lock")
            .state
    }

    /// Get the engine handle, constructing the instance on first use.
    ///
    /// Idempotent: subsequent calls return the same instance. After a failed
    /// load the manager stays `Failed` and every call fails fast until
    /// [`retry_load`] clears it.
    ///
    /// [`retry_load`]: EngineManager::retry_load
    pub fn ensure_loaded(&self) -> Result<EngineHandle, EngineError> {
        let mut inner = self
            .inner
            .lock()
            .expect("Failed to acquire engine state lock");

        match inner.state {
            EngineState::Ready => Ok(Arc::clone(
                inner
                    .instance
                    .as_ref()
                    .expect("Ready state implies a loaded instance"),
            )),
            EngineState::Failed => Err(EngineError::Load(
                "engine previously failed to load; retry_load() to attempt again".to_string(),
            )),
            EngineState::Unloaded | EngineState::Loading => {
                inner.state = EngineState::Loading;
                info!("Loading recognition engine");
                match (self.factory)() {
                    Ok(engine) => {
                        let handle: EngineHandle = Arc::new(Mutex::new(engine));
                        inner.instance = Some(Arc::clone(&handle));
                        inner.state = EngineState::Ready;
                        info!("Recognition engine ready");
                        Ok(handle)
                    }
                    Err(err) => {
                        inner.state = EngineState::Failed;
                        warn!(error = %err, "Recognition engine failed to load");
                        Err(err)
                    }
                }
            }
        }
    }

    /// Clear a failed load so the next `ensure_loaded` attempts again.
    /// No-op unless the state is `Failed`.
    pub fn retry_load(&self) {
        let mut inner = self
            .inner
            .lock()
            .expect("Failed to acquire engine state lock");
        if inner.state == EngineState::Failed {
            inner.state = EngineState::Unloaded;
            info!("Engine load failure cleared; next use will retry");
        }
    }

    /// Drop the engine instance and return to `Unloaded`.
    pub fn teardown(&self) {
        let mut inner = self
            .inner
            .lock()
            .expect("Failed to acquire engine state lock");
        if inner.instance.take().is_some() {
            info!("Recognition engine torn down");
        }
        inner.state = EngineState::Unloaded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Recognition;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingEngine;

    impl RecognitionEngine for CountingEngine {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn recognize(&mut self, _image: &[u8]) -> Result<Recognition, EngineError> {
            Ok(Recognition {
                text: "HR26AB1234".to_string(),
                confidence: Some(0.9),
            })
        }
    }

    fn counting_manager(loads: Arc<AtomicU32>) -> EngineManager {
        EngineManager::with_factory(Box::new(move || {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingEngine) as Box<dyn RecognitionEngine>)
        }))
    }

    #[test]
    fn test_lazy_load_happens_once() {
        let loads = Arc::new(AtomicU32::new(0));
        let manager = counting_manager(Arc::clone(&loads));

        assert_eq!(manager.state(), EngineState::Unloaded);
        assert_eq!(loads.load(Ordering::SeqCst), 0);

        manager.ensure_loaded().unwrap();
        manager.ensure_loaded().unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state(), EngineState::Ready);
    }

    #[test]
    fn test_failed_load_fails_fast_until_retry() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_in_factory = Arc::clone(&attempts);
        let manager = EngineManager::with_factory(Box::new(move || {
            let attempt = attempts_in_factory.fetch_add(1, Ordering::SeqCst);
            if attempt == 0 {
                Err(EngineError::Load("tessdata missing".to_string()))
            } else {
                Ok(Box::new(CountingEngine) as Box<dyn RecognitionEngine>)
            }
        }));

        assert!(manager.ensure_loaded().is_err());
        assert_eq!(manager.state(), EngineState::Failed);

        // Fails fast without touching the factory again
        assert!(manager.ensure_loaded().is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        manager.retry_load();
        assert_eq!(manager.state(), EngineState::Unloaded);
        assert!(manager.ensure_loaded().is_ok());
        assert_eq!(manager.state(), EngineState::Ready);
    }

    #[test]
    fn test_teardown_returns_to_unloaded() {
        let loads = Arc::new(AtomicU32::new(0));
        let manager = counting_manager(Arc::clone(&loads));

        manager.ensure_loaded().unwrap();
        manager.teardown();
        assert_eq!(manager.state(), EngineState::Unloaded);

        // Next use loads again
        manager.ensure_loaded().unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }
}
