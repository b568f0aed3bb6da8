//! Type definitions used throughout the deployment engine

use alloy_json_abi::JsonAbi;
use alloy_primitives::{keccak256, Address, Bytes, B256};
use serde::{Deserialize, Serialize};

/// The machine-readable description of a resource's callable surface
pub type InterfaceDescriptor = JsonAbi;

/// The compiled template a resource is instantiated from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// The name of the kind
    pub kind_name: String,
    /// The kind's ABI
    pub interface_descriptor: InterfaceDescriptor,
    /// The deployable bytecode
    pub image: Bytes,
}

impl Artifact {
    /// The fingerprint of a deployment of this artifact with the given
    /// ABI-encoded constructor or initializer arguments
    pub fn fingerprint(&self, args: &[u8]) -> B256 {
        keccak256([self.image.as_ref(), args].concat())
    }
}

/// How a resource is instantiated on the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentStrategy {
    /// A single contract created directly from its image
    #[default]
    Plain,
    /// An implementation contract behind a transparent proxy
    Upgradeable,
}

/// What to do when a recorded resource was deployed from a different image
/// or with different arguments than the ones now requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Keep using the recorded resource and log a warning
    #[default]
    Warn,
    /// Abort the script
    Deny,
}

/// A single entry in the deployment ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    /// The kind the resource was instantiated from
    pub kind: String,
    /// The address of the resource, the proxy for upgradeable resources
    pub address: Address,
    /// The resource's ABI
    pub interface_descriptor: InterfaceDescriptor,
    /// The image the resource was deployed from
    pub image: Bytes,
    /// The keccak256 hash of the image and the encoded arguments
    pub fingerprint: B256,
    /// The implementation behind the proxy, for upgradeable resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<Address>,
}

impl DeploymentRecord {
    /// The handle through which scripts interact with the recorded resource
    pub fn handle(&self, resource_name: &str) -> ResourceHandle {
        ResourceHandle {
            resource_name: resource_name.to_string(),
            address: self.address,
            interface_descriptor: self.interface_descriptor.clone(),
            implementation: self.implementation,
        }
    }
}

/// A handle to a materialized resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    /// The script-chosen name of the resource
    pub resource_name: String,
    /// The address calls should be sent to
    pub address: Address,
    /// The resource's ABI
    pub interface_descriptor: InterfaceDescriptor,
    /// The implementation behind the proxy, for upgradeable resources
    pub implementation: Option<Address>,
}

/// The addresses produced by deploying an upgradeable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeableDeployment {
    /// The stable proxy address
    pub proxy: Address,
    /// The implementation the proxy forwards to
    pub implementation: Address,
}
