//! Constants used in the deploy scripts

use std::time::Duration;

use alloy_primitives::{b256, B256};

/// The kind name of the proxy artifact upgradeable resources are deployed
/// behind
///
/// Compiled from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/transparent/TransparentUpgradeableProxy.sol
pub const PROXY_KIND_NAME: &str = "TransparentUpgradeableProxy";

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: B256 =
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// The storage slot of OpenZeppelin v5's `Initializable` state.
///
/// This is the ERC-7201 namespace `openzeppelin.storage.Initializable`
pub const INITIALIZABLE_STORAGE_SLOT: B256 =
    b256!("f0c57e16840df040f15088dc2f81fe391c3923bec73e23a9662efc9c229c6a00");

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The number of bytes in a function selector
pub const NUM_BYTES_SELECTOR: usize = 4;

/// The prefix marking a `wire` value as the name of a recorded resource
/// rather than a literal address
pub const RESOURCE_REF_PREFIX: char = '@';

/// The number of times to poll for a transaction receipt
pub const RECEIPT_POLL_ATTEMPTS: usize = 120;

/// The interval between receipt polls
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);
