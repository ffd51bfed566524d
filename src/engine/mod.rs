//! Synthesis engine lifecycle.
//!
//! The engine handle is process-wide state built exactly once at startup:
//!
//! ```text
//! Unloaded -> LoadingPreferred -> Ready(preferred)
//!                              \-> LoadingFallback -> Ready(fallback)
//!                                                  \-> Failed
//! ```
//!
//! `Failed` is terminal — every synthesis call reports the model as not
//! loaded until the process restarts. The handle is immutable after
//! construction and is shared across requests behind an `Arc`; the model
//! capability itself guarantees safe concurrent use.

#[cfg(feature = "chatterbox")]
pub mod chatterbox;

use derive_builder::Builder;

use crate::{Error, Waveform};

/// Compute backend a model can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Preferred accelerator-backed compute.
    Cuda,
    /// Degraded general-purpose compute.
    Cpu,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Cuda => "cuda",
            Backend::Cpu => "cpu",
        }
    }
}

/// Style parameters for a synthesis request.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct SynthesisOptions {
    /// Emotion exaggeration, recommended range [0, 1].
    pub exaggeration: f32,
    /// Classifier-free guidance weight, recommended range [0, 1].
    pub cfg_weight: f32,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            exaggeration: 0.2,
            cfg_weight: 0.8,
        }
    }
}

/// The external speech-model capability: given text and an optional
/// reference waveform, produce a waveform. Implementations must be safe
/// to call from multiple requests (serialize internally if needed).
pub trait SpeechModel: Send + Sync {
    /// Synthesize speech. A reference waveform conditions the voice
    /// identity of the output; without one a default voice is used.
    fn synthesize(
        &self,
        text: &str,
        reference: Option<&Waveform>,
        options: &SynthesisOptions,
    ) -> Result<Waveform, Error>;

    /// Sample rate of waveforms this model produces.
    fn output_sample_rate(&self) -> u32;
}

/// Loads the speech model onto a given compute backend.
pub trait ModelLoader {
    fn load(&self, backend: Backend) -> Result<Box<dyn SpeechModel>, Error>;
}

enum EngineState {
    /// Startup has not run yet; only observable in tests or before
    /// `initialize` is called.
    Unloaded,
    Ready {
        backend: Backend,
        model: Box<dyn SpeechModel>,
    },
    /// Both load attempts failed; terminal until process restart.
    Failed,
}

/// Process-wide handle to the loaded speech model.
pub struct EngineHandle {
    state: EngineState,
}

impl EngineHandle {
    /// A handle that has never attempted a load. Every synthesis call
    /// fails with [`Error::EngineUnavailable`].
    pub fn unloaded() -> Self {
        Self {
            state: EngineState::Unloaded,
        }
    }

    /// Run the one-shot load lifecycle: attempt the preferred backend,
    /// fall back to CPU once, end in `Ready` or terminal `Failed`.
    pub fn initialize(loader: &dyn ModelLoader) -> Self {
        log::info!("Loading speech model on {} backend", Backend::Cuda.as_str());
        match loader.load(Backend::Cuda) {
            Ok(model) => {
                log::info!("Speech model loaded on {}", Backend::Cuda.as_str());
                return Self {
                    state: EngineState::Ready {
                        backend: Backend::Cuda,
                        model,
                    },
                };
            }
            Err(e) => {
                log::warn!(
                    "Failed to load speech model on {}: {e}; trying {} fallback",
                    Backend::Cuda.as_str(),
                    Backend::Cpu.as_str()
                );
            }
        }

        match loader.load(Backend::Cpu) {
            Ok(model) => {
                log::info!("Speech model loaded on {}", Backend::Cpu.as_str());
                Self {
                    state: EngineState::Ready {
                        backend: Backend::Cpu,
                        model,
                    },
                }
            }
            Err(e) => {
                log::error!(
                    "Failed to load speech model on {}: {e}; synthesis disabled until restart",
                    Backend::Cpu.as_str()
                );
                Self {
                    state: EngineState::Failed,
                }
            }
        }
    }

    /// Whether the engine reached `Ready`.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, EngineState::Ready { .. })
    }

    /// The backend the model is bound to, when `Ready`.
    pub fn backend(&self) -> Option<Backend> {
        match &self.state {
            EngineState::Ready { backend, .. } => Some(*backend),
            _ => None,
        }
    }

    /// Synthesize speech through the loaded model.
    ///
    /// Requires state `Ready`; otherwise fails with
    /// [`Error::EngineUnavailable`]. Long-running; callers dispatch this
    /// onto a blocking worker.
    pub fn synthesize(
        &self,
        text: &str,
        reference: Option<&Waveform>,
        options: &SynthesisOptions,
    ) -> Result<Waveform, Error> {
        match &self.state {
            EngineState::Ready { model, .. } => model.synthesize(text, reference, options),
            EngineState::Unloaded | EngineState::Failed => Err(Error::EngineUnavailable),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Mock model capability for lifecycle and orchestration tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::CANONICAL_SAMPLE_RATE;

    pub struct MockModel {
        pub calls: Arc<AtomicUsize>,
    }

    impl SpeechModel for MockModel {
        fn synthesize(
            &self,
            _text: &str,
            reference: Option<&Waveform>,
            _options: &SynthesisOptions,
        ) -> Result<Waveform, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Echo a short tone; length differs when a reference is given
            // so tests can tell cloned from default-voice output.
            let n = if reference.is_some() { 2400 } else { 1200 };
            Ok(Waveform::mono(vec![0.5; n], CANONICAL_SAMPLE_RATE))
        }

        fn output_sample_rate(&self) -> u32 {
            CANONICAL_SAMPLE_RATE
        }
    }

    /// Loader that fails on the backends listed in `fail_on`.
    pub struct MockLoader {
        pub fail_on: Vec<Backend>,
        pub calls: Arc<AtomicUsize>,
    }

    impl MockLoader {
        pub fn new(fail_on: Vec<Backend>) -> Self {
            Self {
                fail_on,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl ModelLoader for MockLoader {
        fn load(&self, backend: Backend) -> Result<Box<dyn SpeechModel>, Error> {
            if self.fail_on.contains(&backend) {
                return Err(Error::Synthesis(format!(
                    "no {} device in test",
                    backend.as_str()
                )));
            }
            Ok(Box::new(MockModel {
                calls: self.calls.clone(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockLoader;
    use super::*;

    #[test]
    fn preferred_backend_wins_when_available() {
        let engine = EngineHandle::initialize(&MockLoader::new(vec![]));
        assert!(engine.is_ready());
        assert_eq!(engine.backend(), Some(Backend::Cuda));
    }

    #[test]
    fn falls_back_to_cpu_once() {
        let engine = EngineHandle::initialize(&MockLoader::new(vec![Backend::Cuda]));
        assert!(engine.is_ready());
        assert_eq!(engine.backend(), Some(Backend::Cpu));
    }

    #[test]
    fn double_failure_is_terminal() {
        let engine =
            EngineHandle::initialize(&MockLoader::new(vec![Backend::Cuda, Backend::Cpu]));
        assert!(!engine.is_ready());
        assert_eq!(engine.backend(), None);

        for _ in 0..3 {
            let err = engine
                .synthesize("hello", None, &SynthesisOptions::default())
                .unwrap_err();
            assert!(matches!(err, Error::EngineUnavailable));
        }
    }

    #[test]
    fn unloaded_handle_rejects_synthesis() {
        let engine = EngineHandle::unloaded();
        let err = engine
            .synthesize("hello", None, &SynthesisOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::EngineUnavailable));
    }

    #[test]
    fn ready_handle_passes_through_to_the_model() {
        let engine = EngineHandle::initialize(&MockLoader::new(vec![]));
        let out = engine
            .synthesize("hello", None, &SynthesisOptions::default())
            .unwrap();
        assert!(!out.samples.is_empty());
    }

    #[test]
    fn options_builder_fills_defaults() {
        let opts = SynthesisOptionsBuilder::default()
            .exaggeration(0.7f32)
            .build()
            .unwrap();
        assert!((opts.exaggeration - 0.7).abs() < 1e-6);
        assert!((opts.cfg_weight - 0.8).abs() < 1e-6);
    }
}
