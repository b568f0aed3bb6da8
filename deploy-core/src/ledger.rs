//! The deployment ledger: one JSON document per (network, market), keyed by
//! resource name
//!
//! The ledger is the operator's audit trail across runs, so partitions are
//! written pretty-printed with their keys in sorted order. Every lookup
//! re-reads the partition from disk; nothing is cached between calls.

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::fs;
use tracing::debug;

use crate::{
    constants::LEDGER_STAGING_EXTENSION,
    context::LedgerKey,
    errors::StorageError,
    types::DeploymentRecord,
};

/// The records of a single ledger partition, keyed by resource name
pub type Partition = BTreeMap<String, DeploymentRecord>;

/// A file-backed, namespace-partitioned store of deployment records
#[derive(Debug, Clone)]
pub struct DeploymentLedger {
    /// The directory partitions are stored under
    root: PathBuf,
}

impl DeploymentLedger {
    /// Open the ledger stored under `root`
    ///
    /// Nothing is created on disk until the first record is written.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory partitions are stored under
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file backing the given partition
    pub fn partition_path(&self, key: &LedgerKey) -> PathBuf {
        key.path_under(&self.root)
    }

    /// Read all records of a partition. A partition that was never written
    /// is empty.
    pub async fn records(&self, key: &LedgerKey) -> Result<Partition, StorageError> {
        let path = self.partition_path(key);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Partition::new()),
            Err(source) => return Err(StorageError::Read { path, source }),
        };

        if contents.trim().is_empty() {
            return Ok(Partition::new());
        }

        serde_json::from_str(&contents).map_err(|source| StorageError::Malformed { path, source })
    }

    /// Look up a single record
    pub async fn get(
        &self,
        key: &LedgerKey,
        resource_name: &str,
    ) -> Result<Option<DeploymentRecord>, StorageError> {
        let mut partition = self.records(key).await?;
        Ok(partition.remove(resource_name))
    }

    /// Write a record, overwriting any record with the same name in the
    /// partition
    ///
    /// Writing the same record twice leaves the partition unchanged, so a
    /// failed `put` can be retried freely.
    pub async fn put(
        &self,
        key: &LedgerKey,
        resource_name: &str,
        record: DeploymentRecord,
    ) -> Result<(), StorageError> {
        let path = self.partition_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::Write { path: path.clone(), source })?;
        }

        let mut partition = self.records(key).await?;
        partition.insert(resource_name.to_string(), record);

        let contents = serde_json::to_string_pretty(&partition)
            .map_err(|source| StorageError::Malformed { path: path.clone(), source })?;

        // Stage the new partition next to the old one so a failed write
        // never truncates what is already recorded
        let staging = path.with_extension(LEDGER_STAGING_EXTENSION);
        fs::write(&staging, contents + "\n")
            .await
            .map_err(|source| StorageError::Write { path: staging.clone(), source })?;
        fs::rename(&staging, &path)
            .await
            .map_err(|source| StorageError::Write { path: path.clone(), source })?;

        debug!(
            resource = resource_name,
            partition = %path.display(),
            "recorded deployment"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256, bytes, Address};

    use super::*;
    use crate::types::InterfaceDescriptor;

    /// A record at the given address
    fn record(address: Address) -> DeploymentRecord {
        DeploymentRecord {
            kind: "FujiOracle".to_string(),
            address,
            interface_descriptor: InterfaceDescriptor::default(),
            image: bytes!("6080604052"),
            fingerprint: b256!("0x1111111111111111111111111111111111111111111111111111111111111111"),
            implementation: None,
        }
    }

    /// A key for the given network and market
    fn key(network_id: &str, namespace: &str) -> LedgerKey {
        LedgerKey {
            network_id: network_id.to_string(),
            namespace: namespace.to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_absent() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DeploymentLedger::new(dir.path());

        assert!(ledger.get(&key("local", "core"), "oracle").await.unwrap().is_none());
        assert!(ledger.records(&key("local", "core")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_after_put() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DeploymentLedger::new(dir.path());
        let oracle = record(address!("0x00000000000000000000000000000000000000aa"));

        ledger.put(&key("local", "core"), "oracle", oracle.clone()).await.unwrap();

        // A fresh handle on the same directory sees the record
        let reopened = DeploymentLedger::new(dir.path());
        assert_eq!(reopened.get(&key("local", "core"), "oracle").await.unwrap(), Some(oracle));
    }

    #[tokio::test]
    async fn test_put_overwrites_and_keeps_others() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DeploymentLedger::new(dir.path());
        let k = key("local", "core");

        let first = record(address!("0x00000000000000000000000000000000000000aa"));
        let second = record(address!("0x00000000000000000000000000000000000000bb"));
        let admin = record(address!("0x00000000000000000000000000000000000000cc"));

        ledger.put(&k, "oracle", first).await.unwrap();
        ledger.put(&k, "admin", admin.clone()).await.unwrap();
        ledger.put(&k, "oracle", second.clone()).await.unwrap();

        let records = ledger.records(&k).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records["oracle"], second);
        assert_eq!(records["admin"], admin);
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DeploymentLedger::new(dir.path());
        let core = record(address!("0x00000000000000000000000000000000000000aa"));

        ledger.put(&key("local", "core"), "vaultA", core.clone()).await.unwrap();

        assert!(ledger.get(&key("local", "fuse"), "vaultA").await.unwrap().is_none());
        assert!(ledger.get(&key("ethereum", "core"), "vaultA").await.unwrap().is_none());
        assert_eq!(ledger.get(&key("local", "core"), "vaultA").await.unwrap(), Some(core));
    }

    #[tokio::test]
    async fn test_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DeploymentLedger::new(dir.path());
        let oracle = record(address!("0x00000000000000000000000000000000000000aa"));

        ledger.put(&key("fantom", "core"), "oracle", oracle).await.unwrap();

        let path = dir.path().join("fantom").join("core.json");
        let contents = std::fs::read_to_string(path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&contents).unwrap();

        let entry = &json["oracle"];
        assert_eq!(
            entry["address"].as_str().unwrap().to_lowercase(),
            "0x00000000000000000000000000000000000000aa"
        );
        assert_eq!(entry["image"], "0x6080604052");
        assert!(entry["interfaceDescriptor"].is_array());
        assert!(entry.get("implementation").is_none());
    }

    #[tokio::test]
    async fn test_malformed_partition() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DeploymentLedger::new(dir.path());
        let k = key("local", "core");

        let path = ledger.partition_path(&k);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let err = ledger.get(&k, "oracle").await.unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_unwritable_root() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the network directory should be
        let root = dir.path().join("ledger");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("local"), "").unwrap();

        let ledger = DeploymentLedger::new(&root);
        let oracle = record(address!("0x00000000000000000000000000000000000000aa"));

        let err = ledger.put(&key("local", "core"), "oracle", oracle).await.unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
    }
}
