//! Loading compiled kind artifacts

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::{hex, Bytes};

use crate::{
    constants::{ABI_EXTENSION, BIN_EXTENSION},
    errors::ConfigError,
    types::{Artifact, InterfaceDescriptor},
};

/// A source of compiled artifacts, keyed by kind name
pub trait ArtifactSource: Send + Sync {
    /// Load the artifact for `kind_name`
    fn load(&self, kind_name: &str) -> Result<Artifact, ConfigError>;
}

/// A directory of `<Kind>.abi` / `<Kind>.bin` pairs as emitted by `solc --abi --bin`
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    /// The directory holding the artifacts
    root: PathBuf,
}

impl ArtifactDir {
    /// Read artifacts from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding the artifacts
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path of one of the kind's artifact files
    fn file(&self, kind_name: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{kind_name}.{extension}"))
    }
}

impl ArtifactSource for ArtifactDir {
    fn load(&self, kind_name: &str) -> Result<Artifact, ConfigError> {
        let artifact_err = |reason: String| ConfigError::Artifact {
            kind: kind_name.to_string(),
            reason,
        };

        let abi_path = self.file(kind_name, ABI_EXTENSION);
        let abi = fs::read_to_string(&abi_path)
            .map_err(|e| artifact_err(format!("{}: {e}", abi_path.display())))?;
        let interface_descriptor: InterfaceDescriptor =
            serde_json::from_str(&abi).map_err(|e| artifact_err(e.to_string()))?;

        let bin_path = self.file(kind_name, BIN_EXTENSION);
        let bin = fs::read_to_string(&bin_path)
            .map_err(|e| artifact_err(format!("{}: {e}", bin_path.display())))?;
        let image = parse_image(&bin).map_err(artifact_err)?;

        Ok(Artifact {
            kind_name: kind_name.to_string(),
            interface_descriptor,
            image,
        })
    }
}

impl ArtifactSource for HashMap<String, Artifact> {
    fn load(&self, kind_name: &str) -> Result<Artifact, ConfigError> {
        self.get(kind_name).cloned().ok_or_else(|| ConfigError::Artifact {
            kind: kind_name.to_string(),
            reason: "no artifact registered".to_string(),
        })
    }
}

/// Parse a hex-encoded image, with or without a `0x` prefix
fn parse_image(bin: &str) -> Result<Bytes, String> {
    let image = hex::decode(bin.trim()).map_err(|e| e.to_string())?;
    if image.is_empty() {
        return Err("empty bytecode".to_string());
    }

    Ok(image.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal ABI with a single getter
    const ADMIN_ABI: &str = r#"[
        {
            "type": "function",
            "name": "admin",
            "inputs": [],
            "outputs": [{ "name": "", "type": "address", "internalType": "address" }],
            "stateMutability": "view"
        }
    ]"#;

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("FujiAdmin.abi"), ADMIN_ABI).unwrap();
        fs::write(dir.path().join("FujiAdmin.bin"), "0x6080604052\n").unwrap();

        let artifact = ArtifactDir::new(dir.path()).load("FujiAdmin").unwrap();
        assert_eq!(artifact.kind_name, "FujiAdmin");
        assert_eq!(&artifact.image[..], &[0x60, 0x80, 0x60, 0x40, 0x52]);
        assert!(artifact.interface_descriptor.function("admin").is_some());
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactDir::new(dir.path()).load("FujiOracle").unwrap_err();
        assert!(matches!(err, ConfigError::Artifact { kind, .. } if kind == "FujiOracle"));
    }

    #[test]
    fn test_rejects_empty_image() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Controller.abi"), "[]").unwrap();
        fs::write(dir.path().join("Controller.bin"), "0x").unwrap();

        assert!(ArtifactDir::new(dir.path()).load("Controller").is_err());
    }
}
