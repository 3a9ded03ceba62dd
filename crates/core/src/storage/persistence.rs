//! Disk persistence for the model/vectorizer artifact pair.
//!
//! Each artifact is a bincode payload followed by an 8-byte footer:
//! `[magic 4 bytes][u32 CRC32 BE]`. Both artifacts record the vocabulary
//! checksum and feature count so a model is never served with a vectorizer
//! from another training run. Writes go to `.tmp` siblings and are renamed
//! into place only after both succeeded; the previous vectorizer is kept as a
//! `.bak` sibling until the model rename lands, and restored if it fails.

use crate::classifier::LogisticModel;
use crate::config;
use crate::error::{Result, SpamError};
use crate::vectorize::FittedVectorizer;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Footer magic of the model artifact.
const MODEL_MAGIC: &[u8; 4] = b"SFM1";
/// Footer magic of the vectorizer artifact.
const VECTORIZER_MAGIC: &[u8; 4] = b"SFV1";

/// Payload layout version. Bumped on any incompatible change.
pub const FORMAT_VERSION: u32 = 1;

/// Locations of the two artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub vectorizer: PathBuf,
}

impl ArtifactPaths {
    pub fn new(model: impl Into<PathBuf>, vectorizer: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            vectorizer: vectorizer.into(),
        }
    }

    /// Both artifacts under `dir` with their default file names.
    pub fn in_dir(dir: &Path) -> Self {
        let file_name = |p: &str| {
            Path::new(p)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(p))
        };
        Self {
            model: dir.join(file_name(config::DEFAULT_MODEL_PATH)),
            vectorizer: dir.join(file_name(config::DEFAULT_VECTORIZER_PATH)),
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::new(config::DEFAULT_MODEL_PATH, config::DEFAULT_VECTORIZER_PATH)
    }
}

#[derive(Serialize, Deserialize)]
struct ArtifactHeader {
    format_version: u32,
    vocabulary_checksum: u32,
    n_features: u64,
}

#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    header: ArtifactHeader,
    model: LogisticModel,
}

#[derive(Serialize, Deserialize)]
struct VectorizerArtifact {
    header: ArtifactHeader,
    vectorizer: FittedVectorizer,
}

/// Save the artifact pair. Neither file is replaced unless both were written.
pub fn save_artifacts(
    paths: &ArtifactPaths,
    model: &LogisticModel,
    vectorizer: &FittedVectorizer,
) -> Result<()> {
    if model.n_features() != vectorizer.n_features() {
        return Err(SpamError::ArtifactMismatch(format!(
            "model expects {} features, vectorizer produces {}",
            model.n_features(),
            vectorizer.n_features()
        )));
    }
    let checksum = vectorizer.vocabulary().checksum();
    let header = || ArtifactHeader {
        format_version: FORMAT_VERSION,
        vocabulary_checksum: checksum,
        n_features: vectorizer.n_features() as u64,
    };

    let model_bytes = encode(
        &ModelArtifact {
            header: header(),
            model: model.clone(),
        },
        MODEL_MAGIC,
    )?;
    let vectorizer_bytes = encode(
        &VectorizerArtifact {
            header: header(),
            vectorizer: vectorizer.clone(),
        },
        VECTORIZER_MAGIC,
    )?;

    let model_tmp = write_tmp(&paths.model, &model_bytes)?;
    let vectorizer_tmp = match write_tmp(&paths.vectorizer, &vectorizer_bytes) {
        Ok(tmp) => tmp,
        Err(e) => {
            let _ = fs::remove_file(&model_tmp);
            return Err(e);
        }
    };
    commit_pair(paths, &model_tmp, &vectorizer_tmp)?;

    tracing::info!(
        "Saved artifacts {:?} ({} bytes) and {:?} ({} bytes), vocabulary CRC32={:#010x}",
        paths.model,
        model_bytes.len(),
        paths.vectorizer,
        vectorizer_bytes.len(),
        checksum
    );
    Ok(())
}

/// Load and cross-check the artifact pair.
pub fn load_artifacts(paths: &ArtifactPaths) -> Result<(LogisticModel, FittedVectorizer)> {
    let model: ModelArtifact = decode(&paths.model, MODEL_MAGIC)?;
    let vectorizer: VectorizerArtifact = decode(&paths.vectorizer, VECTORIZER_MAGIC)?;

    for (header, path) in [
        (&model.header, &paths.model),
        (&vectorizer.header, &paths.vectorizer),
    ] {
        if header.format_version != FORMAT_VERSION {
            return Err(SpamError::artifact(format!(
                "{:?} has format version {}, expected {}",
                path, header.format_version, FORMAT_VERSION
            )));
        }
    }

    vectorizer.vectorizer.validate()?;
    model.model.validate()?;

    let checksum = vectorizer.vectorizer.vocabulary().checksum();
    if vectorizer.header.vocabulary_checksum != checksum {
        return Err(SpamError::artifact(format!(
            "{:?} vocabulary checksum {:#010x} does not match its contents ({:#010x})",
            paths.vectorizer, vectorizer.header.vocabulary_checksum, checksum
        )));
    }
    if model.header.vocabulary_checksum != vectorizer.header.vocabulary_checksum {
        return Err(SpamError::ArtifactMismatch(format!(
            "model was trained against vocabulary {:#010x}, vectorizer has {:#010x}",
            model.header.vocabulary_checksum, vectorizer.header.vocabulary_checksum
        )));
    }
    let n_features = vectorizer.vectorizer.n_features();
    if model.model.n_features() != n_features || model.header.n_features != n_features as u64 {
        return Err(SpamError::ArtifactMismatch(format!(
            "model expects {} features, vectorizer produces {}",
            model.model.n_features(),
            n_features
        )));
    }

    tracing::info!(
        "Loaded artifacts {:?} and {:?} ({} features)",
        paths.model,
        paths.vectorizer,
        n_features
    );
    Ok((model.model, vectorizer.vectorizer))
}

fn encode<T: Serialize>(value: &T, magic: &[u8; 4]) -> Result<Vec<u8>> {
    let bytes = bincode::serialize(value).map_err(|e| SpamError::artifact(e.to_string()))?;
    let crc = crc32fast::hash(&bytes);
    let mut output = Vec::with_capacity(bytes.len() + 8);
    output.extend_from_slice(&bytes);
    output.extend_from_slice(magic);
    output.extend_from_slice(&crc.to_be_bytes());
    Ok(output)
}

fn decode<T: DeserializeOwned>(path: &Path, magic: &[u8; 4]) -> Result<T> {
    let raw = fs::read(path)
        .map_err(|e| SpamError::artifact(format!("cannot read {:?}: {}", path, e)))?;
    if raw.len() < 8 || &raw[raw.len() - 8..raw.len() - 4] != magic {
        return Err(SpamError::artifact(format!(
            "{:?} is not a {} artifact (missing footer)",
            path,
            String::from_utf8_lossy(magic)
        )));
    }
    let payload = &raw[..raw.len() - 8];
    let stored_crc = u32::from_be_bytes([
        raw[raw.len() - 4],
        raw[raw.len() - 3],
        raw[raw.len() - 2],
        raw[raw.len() - 1],
    ]);
    let computed_crc = crc32fast::hash(payload);
    if computed_crc != stored_crc {
        return Err(SpamError::artifact(format!(
            "CRC32 mismatch: expected {:#010x}, got {:#010x}. File may be corrupted: {:?}",
            stored_crc, computed_crc, path
        )));
    }
    tracing::debug!("Artifact CRC32 verified: {:#010x}", stored_crc);
    bincode::deserialize(payload)
        .map_err(|e| SpamError::artifact(format!("cannot decode {:?}: {}", path, e)))
}

/// Renames both tmp files into place, leaving the previous pair on disk if
/// either rename fails. Tmp files never outlive the call.
fn commit_pair(paths: &ArtifactPaths, model_tmp: &Path, vectorizer_tmp: &Path) -> Result<()> {
    let discard = || {
        let _ = fs::remove_file(model_tmp);
        let _ = fs::remove_file(vectorizer_tmp);
    };
    let backup = sibling(&paths.vectorizer, ".bak");
    let had_previous = paths.vectorizer.exists();
    if had_previous {
        if let Err(e) = fs::rename(&paths.vectorizer, &backup) {
            discard();
            return Err(e.into());
        }
    }
    let restore = || {
        if had_previous {
            if let Err(e) = fs::rename(&backup, &paths.vectorizer) {
                tracing::error!("Cannot restore {:?} from {:?}: {}", paths.vectorizer, backup, e);
            }
        } else {
            let _ = fs::remove_file(&paths.vectorizer);
        }
    };

    if let Err(e) = fs::rename(vectorizer_tmp, &paths.vectorizer) {
        restore();
        discard();
        return Err(e.into());
    }
    if let Err(e) = fs::rename(model_tmp, &paths.model) {
        tracing::warn!("Cannot replace {:?} ({}); keeping the previous pair", paths.model, e);
        restore();
        discard();
        return Err(e.into());
    }
    if had_previous {
        let _ = fs::remove_file(&backup);
    }
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_tmp(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = sibling(path, ".tmp");
    fs::write(&tmp, bytes)?;
    Ok(tmp)
}
