//! Chatterbox ONNX synthesis backend.
//!
//! Wraps the exported Chatterbox TTS graph behind the [`SpeechModel`]
//! capability. The model directory must contain the `.onnx` export
//! (preferably `chatterbox.onnx`). Loading binds the session to a single
//! execution provider per attempt: CUDA for the preferred backend, CPU
//! for the fallback — provider failures are surfaced as load errors so
//! the engine lifecycle can run its documented fallback.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array2;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use super::{Backend, ModelLoader, SpeechModel, SynthesisOptions};
use crate::{Error, Waveform};

/// Output sample rate of the Chatterbox graph.
pub const SAMPLE_RATE: u32 = 24_000;

/// Loader for the Chatterbox model directory.
pub struct ChatterboxLoader {
    model_dir: PathBuf,
    num_threads: Option<usize>,
}

impl ChatterboxLoader {
    pub fn new(model_dir: impl Into<PathBuf>, num_threads: Option<usize>) -> Self {
        Self {
            model_dir: model_dir.into(),
            num_threads,
        }
    }
}

impl ModelLoader for ChatterboxLoader {
    fn load(&self, backend: Backend) -> Result<Box<dyn SpeechModel>, Error> {
        let model = ChatterboxModel::load(&self.model_dir, backend, self.num_threads)?;
        Ok(Box::new(model))
    }
}

/// Loaded Chatterbox session.
///
/// The ONNX session requires `&mut` to run, so it sits behind a mutex;
/// concurrent synthesis calls against the shared model are serialized here.
pub struct ChatterboxModel {
    session: Mutex<Session>,
}

impl ChatterboxModel {
    pub fn load(
        model_dir: &Path,
        backend: Backend,
        num_threads: Option<usize>,
    ) -> Result<Self, Error> {
        let onnx_path = find_onnx_file(model_dir)?;
        log::info!(
            "Loading Chatterbox model from {} on {}",
            onnx_path.display(),
            backend.as_str()
        );

        let providers = match backend {
            // error_on_failure makes a missing CUDA runtime a hard load
            // error instead of a silent CPU registration.
            Backend::Cuda => vec![CUDAExecutionProvider::default().build().error_on_failure()],
            Backend::Cpu => vec![CPUExecutionProvider::default().build()],
        };

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_execution_providers(providers)?;

        if let Some(threads) = num_threads {
            builder = builder
                .with_intra_threads(threads)?
                .with_inter_threads(threads)?;
        }

        let session = builder.commit_from_file(&onnx_path)?;

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl SpeechModel for ChatterboxModel {
    fn synthesize(
        &self,
        text: &str,
        reference: Option<&Waveform>,
        options: &SynthesisOptions,
    ) -> Result<Waveform, Error> {
        let tokens: Vec<i64> = text.chars().map(|c| c as i64).collect();
        let tokens_arr = Array2::from_shape_vec((1, tokens.len()), tokens)
            .map_err(|e| Error::Synthesis(format!("token tensor shape: {e}")))?;

        // Default voice = a single silent reference frame.
        let ref_samples: Vec<f32> = match reference {
            Some(wave) => wave.samples.clone(),
            None => vec![0.0],
        };
        let ref_arr = Array2::from_shape_vec((1, ref_samples.len()), ref_samples)
            .map_err(|e| Error::Synthesis(format!("reference tensor shape: {e}")))?;

        let exaggeration = ndarray::arr1(&[options.exaggeration]);
        let cfg_weight = ndarray::arr1(&[options.cfg_weight]);

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Synthesis("model session poisoned".to_string()))?;

        let inputs = inputs![
            "text_tokens" => TensorRef::from_array_view(tokens_arr.view())?,
            "reference_audio" => TensorRef::from_array_view(ref_arr.view())?,
            "exaggeration" => TensorRef::from_array_view(exaggeration.view())?,
            "cfg_weight" => TensorRef::from_array_view(cfg_weight.view())?,
        ];
        let output = session.run(inputs)?;

        let first_output = output
            .iter()
            .next()
            .ok_or_else(|| Error::Synthesis("no output from model".to_string()))?;
        let waveform = first_output.1.try_extract_array::<f32>()?;

        Ok(Waveform::mono(
            waveform.as_slice().unwrap_or(&[]).to_vec(),
            SAMPLE_RATE,
        ))
    }

    fn output_sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

/// Find the ONNX export in the model directory.
///
/// Prefers `chatterbox.onnx`, then falls back to the first `.onnx` file.
fn find_onnx_file(model_dir: &Path) -> Result<PathBuf, Error> {
    let preferred = model_dir.join("chatterbox.onnx");
    if preferred.exists() {
        return Ok(preferred);
    }

    for entry in std::fs::read_dir(model_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("onnx") {
            log::info!("Using ONNX file: {}", path.display());
            return Ok(path);
        }
    }

    Err(Error::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("No .onnx file found in {}", model_dir.display()),
    )))
}
