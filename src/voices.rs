//! Filesystem-backed catalog of voice assets.
//!
//! One canonical WAV per voice, named after the sanitized voice name.
//! Re-uploading a name overwrites the prior asset (last-writer-wins, the
//! expected re-recording workflow); delete is permanent.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{Error, Waveform};

/// Catalog entry metadata, as returned by `GET /voices`.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceInfo {
    pub name: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
}

/// Result of storing a voice asset.
#[derive(Debug, Clone)]
pub struct StoredVoice {
    /// The sanitized name the asset was stored under.
    pub name: String,
    pub path: PathBuf,
    pub duration_seconds: f64,
}

/// Directory-backed store of canonical voice waveforms.
pub struct VoiceStore {
    dir: PathBuf,
}

impl VoiceStore {
    /// Open (creating if needed) a voice store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Root directory of the catalog.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store a canonical waveform under `name`, overwriting any prior
    /// asset with that name. The waveform must already be normalized.
    pub fn create(&self, name: &str, waveform: &Waveform) -> Result<StoredVoice, Error> {
        let safe = sanitize_name(name)?;
        let path = self.voice_path(&safe);
        waveform.write_wav(&path)?;
        log::info!("Stored voice '{}' at {}", safe, path.display());
        Ok(StoredVoice {
            name: safe,
            path,
            duration_seconds: waveform.duration_secs(),
        })
    }

    /// Load the waveform for `name`, failing with
    /// [`Error::VoiceNotFound`] when no such asset exists.
    pub fn resolve(&self, name: &str) -> Result<Waveform, Error> {
        let safe = sanitize_name(name)?;
        let path = self.voice_path(&safe);
        if !path.exists() {
            return Err(Error::VoiceNotFound(safe));
        }
        Waveform::read_wav(&path)
    }

    /// Enumerate all stored voices, sorted by name.
    ///
    /// Entries that fail to read are logged and skipped; a corrupt file
    /// must not abort the whole listing.
    pub fn list(&self) -> Result<Vec<VoiceInfo>, Error> {
        let mut voices = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("wav") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match Waveform::read_wav(&path) {
                Ok(wave) => voices.push(VoiceInfo {
                    name: name.to_string(),
                    duration_seconds: wave.duration_secs(),
                    sample_rate: wave.sample_rate,
                }),
                Err(e) => {
                    log::warn!("Skipping unreadable voice file {}: {e}", path.display());
                }
            }
        }

        voices.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(voices)
    }

    /// Permanently remove the asset for `name`.
    pub fn delete(&self, name: &str) -> Result<(), Error> {
        let safe = sanitize_name(name)?;
        let path = self.voice_path(&safe);
        if !path.exists() {
            return Err(Error::VoiceNotFound(safe));
        }
        fs::remove_file(&path)?;
        log::info!("Deleted voice '{safe}'");
        Ok(())
    }

    fn voice_path(&self, safe_name: &str) -> PathBuf {
        self.dir.join(format!("{safe_name}.wav"))
    }
}

/// Reduce a caller-supplied voice name to a filesystem-safe form.
///
/// Keeps alphanumerics, spaces, hyphens and underscores; everything else
/// (path separators and parent-directory segments included) is dropped.
/// A name with nothing left after filtering is rejected.
pub fn sanitize_name(name: &str) -> Result<String, Error> {
    let safe: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect();
    let safe = safe.trim().to_string();

    if safe.is_empty() {
        return Err(Error::Validation(format!(
            "Voice name {name:?} contains no usable characters"
        )));
    }
    Ok(safe)
}
