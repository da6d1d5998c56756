//! Model artifact loading
//!
//! Resolves a path on disk to a ready-to-use predictor:
//! - existence check (`ArtifactNotFound`)
//! - optional `<artifact>.sha256` sidecar validation
//! - format dispatch by extension (`.onnx`, `.json`)

use super::inference::OnnxPredictor;
use super::linear::LinearModel;
use super::Predictor;
use crate::error::{AdapterError, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Supported artifact formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Onnx,
    LinearJson,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "onnx" => Some(ArtifactFormat::Onnx),
            "json" => Some(ArtifactFormat::LinearJson),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactFormat::Onnx => "onnx",
            ArtifactFormat::LinearJson => "linear-json",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predictor together with what was learned while loading it
#[derive(Clone)]
pub struct LoadedModel {
    pub predictor: Arc<dyn Predictor>,
    pub format: ArtifactFormat,
    pub path: PathBuf,
    pub checksum: String,
    pub size_bytes: usize,
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("format", &self.format)
            .field("path", &self.path)
            .field("checksum", &self.checksum)
            .field("size_bytes", &self.size_bytes)
            .field("model_version", &self.predictor.model_version())
            .finish()
    }
}

/// Load a predictor from a model artifact
pub fn load(path: impl AsRef<Path>) -> Result<Arc<dyn Predictor>> {
    load_model(path).map(|m| m.predictor)
}

/// Load a predictor and keep the artifact's metadata
pub fn load_model(path: impl AsRef<Path>) -> Result<LoadedModel> {
    let path = path.as_ref();

    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AdapterError::ArtifactNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(AdapterError::corrupt(path, format!("cannot stat artifact: {}", e))),
    };
    if !metadata.is_file() {
        return Err(AdapterError::ArtifactNotFound {
            path: path.to_path_buf(),
        });
    }

    let format = ArtifactFormat::from_path(path).ok_or_else(|| {
        AdapterError::corrupt(path, "unsupported artifact format, expected .onnx or .json")
    })?;

    let bytes = fs::read(path).map_err(|e| AdapterError::corrupt(path, format!("cannot read artifact: {}", e)))?;
    let checksum = compute_checksum(&bytes);
    verify_sidecar(path, &checksum)?;

    let model_version = version_tag(path, &checksum);
    debug!(path = %path.display(), format = %format, "Deserializing model artifact");

    let predictor: Arc<dyn Predictor> = match format {
        ArtifactFormat::Onnx => Arc::new(
            OnnxPredictor::from_bytes(&bytes, model_version)
                .map_err(|e| AdapterError::corrupt(path, format!("{:#}", e)))?,
        ),
        ArtifactFormat::LinearJson => Arc::new(
            LinearModel::from_json(&bytes, model_version).map_err(|e| AdapterError::corrupt(path, e))?,
        ),
    };

    info!(
        path = %path.display(),
        format = %format,
        task = ?predictor.task(),
        model_version = %predictor.model_version(),
        size = bytes.len(),
        "Model artifact loaded"
    );

    Ok(LoadedModel {
        predictor,
        format,
        path: path.to_path_buf(),
        checksum,
        size_bytes: bytes.len(),
    })
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Path of the optional checksum sidecar for an artifact
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

fn verify_sidecar(path: &Path, checksum: &str) -> Result<()> {
    let sidecar = sidecar_path(path);
    let content = match fs::read_to_string(&sidecar) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(AdapterError::corrupt(path, format!("cannot read checksum file: {}", e))),
    };
    // `sha256sum` output is "<hex>  <file>", so only the first token matters
    let expected = content.split_whitespace().next().unwrap_or_default().to_ascii_lowercase();
    if expected != checksum {
        return Err(AdapterError::corrupt(
            path,
            format!("checksum mismatch: expected {}, got {}", expected, checksum),
        ));
    }
    debug!(checksum = %checksum, "Model checksum validated");
    Ok(())
}

fn version_tag(path: &Path, checksum: &str) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");
    format!("{}@{}", stem, &checksum[..12.min(checksum.len())])
}
