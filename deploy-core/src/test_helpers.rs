//! Helpers for testing deployment scripts without a network

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes, TxHash, B256};
use async_trait::async_trait;

use crate::{
    client::{LedgerClient, UpgradeManager},
    errors::ClientError,
    reporter::{Reporter, StepStatus},
    types::{Artifact, UpgradeableDeployment},
};

/// The first address handed out by a [`MockNetwork`]
const FIRST_MOCK_ADDRESS: u64 = 0x1000;

/// The kind name of the proxy a [`MockNetwork`] deploys upgradeable
/// resources behind
pub const MOCK_PROXY_KIND: &str = "TransparentUpgradeableProxy";

/// The number of bytes of calldata naming the storage slot a mock call
/// reads or writes
pub const SLOT_ID_LEN: usize = 4;

/// A record of a single creation on a [`MockNetwork`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCreation {
    /// The kind that was instantiated
    pub kind_name: String,
    /// The constructor or initializer arguments
    pub args: Bytes,
    /// The address assigned to the new resource
    pub address: Address,
}

/// The mutable state of a [`MockNetwork`]
#[derive(Debug, Default)]
struct MockState {
    /// The next address to assign
    next_address: u64,
    /// Every creation, in order
    creations: Vec<MockCreation>,
    /// The number of read-only calls
    reads: usize,
    /// The number of state-mutating calls
    writes: usize,
    /// Storage of every resource, keyed by (address, slot id)
    storage: HashMap<(Address, Bytes), Bytes>,
    /// Implementations that have been initialized
    initialized: HashSet<Address>,
    /// The error the next creation fails with
    fail_next_create: Option<ClientError>,
    /// The error the next write fails with
    fail_next_send: Option<ClientError>,
    /// Whether writes are accepted but have no effect
    drop_writes: bool,
    /// Whether upgradeable deployments leave the implementation uninitialized
    skip_implementation_init: bool,
}

/// An in-memory network of toy resources
///
/// Every mock resource exposes the same surface: a call whose calldata is a
/// [`SLOT_ID_LEN`]-byte slot id reads that slot, and a write whose calldata
/// is a slot id followed by a value stores the value in that slot.
#[derive(Debug)]
pub struct MockNetwork {
    /// The network state
    state: Mutex<MockState>,
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_address: FIRST_MOCK_ADDRESS,
                ..Default::default()
            }),
        }
    }
}

impl MockNetwork {
    /// Every creation made so far, including proxies and implementations
    pub fn creations(&self) -> Vec<MockCreation> {
        self.state.lock().unwrap().creations.clone()
    }

    /// The number of read-only calls made so far
    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    /// The number of state-mutating calls made so far
    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    /// Read a storage slot directly
    pub fn slot(&self, address: Address, slot_id: &[u8]) -> Option<Bytes> {
        let state = self.state.lock().unwrap();
        state.storage.get(&(address, Bytes::copy_from_slice(slot_id))).cloned()
    }

    /// Make the next creation fail with `err`
    pub fn fail_next_create(&self, err: ClientError) {
        self.state.lock().unwrap().fail_next_create = Some(err);
    }

    /// Make the next write fail with `err`
    pub fn fail_next_send(&self, err: ClientError) {
        self.state.lock().unwrap().fail_next_send = Some(err);
    }

    /// Accept writes without applying them
    pub fn drop_writes(&self) {
        self.state.lock().unwrap().drop_writes = true;
    }

    /// Leave implementations deployed from now on uninitialized
    pub fn skip_implementation_init(&self) {
        self.state.lock().unwrap().skip_implementation_init = true;
    }

    /// Mark an implementation as initialized
    pub fn initialize_implementation(&self, implementation: Address) {
        self.state.lock().unwrap().initialized.insert(implementation);
    }
}

impl MockState {
    /// Assign an address and record the creation
    fn create(&mut self, kind_name: &str, args: &Bytes) -> Address {
        let address = Address::left_padding_from(&self.next_address.to_be_bytes());
        self.next_address += 1;
        self.creations.push(MockCreation {
            kind_name: kind_name.to_string(),
            args: args.clone(),
            address,
        });

        address
    }
}

/// Split mock calldata into its slot id and the remaining bytes
fn split_calldata(calldata: &Bytes) -> Result<(Bytes, Bytes), ClientError> {
    if calldata.len() < SLOT_ID_LEN {
        return Err(ClientError::Reverted("calldata too short".to_string()));
    }

    let (slot, value) = calldata.split_at(SLOT_ID_LEN);
    Ok((Bytes::copy_from_slice(slot), Bytes::copy_from_slice(value)))
}

#[async_trait]
impl LedgerClient for MockNetwork {
    async fn create(&self, artifact: &Artifact, args: &Bytes) -> Result<Address, ClientError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_next_create.take() {
            return Err(err);
        }

        Ok(state.create(&artifact.kind_name, args))
    }

    async fn call(&self, address: Address, calldata: Bytes) -> Result<Bytes, ClientError> {
        let (slot, _) = split_calldata(&calldata)?;
        let mut state = self.state.lock().unwrap();
        state.reads += 1;

        Ok(state.storage.get(&(address, slot)).cloned().unwrap_or_default())
    }

    async fn send(&self, address: Address, calldata: Bytes) -> Result<TxHash, ClientError> {
        let (slot, value) = split_calldata(&calldata)?;
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_next_send.take() {
            return Err(err);
        }

        state.writes += 1;
        if !state.drop_writes {
            state.storage.insert((address, slot), value);
        }

        Ok(B256::left_padding_from(&(state.writes as u64).to_be_bytes()))
    }
}

#[async_trait]
impl UpgradeManager for MockNetwork {
    fn proxy_kind(&self) -> &str {
        MOCK_PROXY_KIND
    }

    async fn deploy_upgradeable(
        &self,
        artifact: &Artifact,
        proxy: &Artifact,
        init_calldata: &Bytes,
    ) -> Result<UpgradeableDeployment, ClientError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_next_create.take() {
            return Err(err);
        }

        let implementation = state.create(&artifact.kind_name, &Bytes::new());
        let proxy = state.create(&proxy.kind_name, init_calldata);
        if !state.skip_implementation_init {
            state.initialized.insert(implementation);
        }

        Ok(UpgradeableDeployment {
            proxy,
            implementation,
        })
    }

    async fn verify_implementation_initialized(
        &self,
        implementation: Address,
    ) -> Result<bool, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        Ok(state.initialized.contains(&implementation))
    }
}

/// A [`Reporter`] that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    /// The reported events, in order
    events: Mutex<Vec<(String, StepStatus)>>,
}

impl RecordingReporter {
    /// The reported events, in order
    pub fn events(&self) -> Vec<(String, StepStatus)> {
        self.events.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, step: &str, status: StepStatus) {
        self.events.lock().unwrap().push((step.to_string(), status));
    }
}

/// A toy artifact for `kind_name` with the given image
pub fn mock_artifact(kind_name: &str, image: &[u8]) -> Artifact {
    Artifact {
        kind_name: kind_name.to_string(),
        interface_descriptor: JsonAbi::default(),
        image: Bytes::copy_from_slice(image),
    }
}

/// Mock calldata reading `slot_id`
pub fn read_calldata(slot_id: [u8; SLOT_ID_LEN]) -> Bytes {
    Bytes::copy_from_slice(&slot_id)
}

/// Mock calldata writing `value` to `slot_id`
pub fn write_calldata(slot_id: [u8; SLOT_ID_LEN], value: &[u8]) -> Bytes {
    [slot_id.as_slice(), value].concat().into()
}
