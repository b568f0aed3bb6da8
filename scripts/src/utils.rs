//! Utilities for the deploy scripts.

use std::str::FromStr;

use alloy::{
    providers::{DynProvider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use alloy_primitives::{keccak256, Address, Bytes};
use alloy_sol_types::SolValue;
use deploy_core::errors::ClientError;

use crate::{
    client::Wallet,
    constants::{
        NUM_BYTES_ADDRESS, NUM_BYTES_SELECTOR, NUM_BYTES_STORAGE_SLOT, RESOURCE_REF_PREFIX,
    },
    errors::ScriptError,
};

/// Sets up a signing provider from the private key and RPC url, returning it
/// along with the signer's address
pub fn setup_client(priv_key: &str, rpc_url: &str) -> Result<(Wallet, Address), ScriptError> {
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let address = signer.address();

    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);
    Ok((DynProvider::new(provider), address))
}

/// Parse a hex string, with or without a `0x` prefix, into bytes
pub fn parse_hex_bytes(s: &str) -> Result<Bytes, ScriptError> {
    let s = s.trim();
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| ScriptError::ArgParsing(format!("invalid hex `{s}`: {e}")))
}

/// Parse a hex address
pub fn parse_address(s: &str) -> Result<Address, ScriptError> {
    Address::from_str(s.trim())
        .map_err(|e| ScriptError::ArgParsing(format!("invalid address `{s}`: {e}")))
}

/// The value of an address-valued setting, as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressValue {
    /// A literal address
    Literal(Address),
    /// The address of a resource recorded in the ledger
    Resource(String),
}

impl FromStr for AddressValue {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix(RESOURCE_REF_PREFIX) {
            Some("") => Err(ScriptError::ArgParsing("empty resource reference".to_string())),
            Some(name) => Ok(AddressValue::Resource(name.to_string())),
            None => parse_address(s).map(AddressValue::Literal),
        }
    }
}

/// The selector of a function signature such as `setFujiAdmin(address)`
pub fn selector(signature: &str) -> [u8; NUM_BYTES_SELECTOR] {
    let mut selector = [0u8; NUM_BYTES_SELECTOR];
    selector.copy_from_slice(&keccak256(signature.as_bytes())[..NUM_BYTES_SELECTOR]);
    selector
}

/// Calldata for a function taking no arguments
pub fn getter_calldata(signature: &str) -> Bytes {
    Bytes::copy_from_slice(&selector(signature))
}

/// Calldata for a function taking a single address
pub fn setter_calldata(signature: &str, value: Address) -> Bytes {
    [selector(signature).as_slice(), value.abi_encode().as_slice()].concat().into()
}

/// Decode an address returned by a getter
pub fn decode_address(ret: &[u8]) -> Result<Address, ClientError> {
    if ret.len() < NUM_BYTES_STORAGE_SLOT {
        return Err(ClientError::Decoding(format!(
            "expected an address word, got {} bytes",
            ret.len()
        )));
    }

    Ok(Address::from_slice(
        &ret[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..NUM_BYTES_STORAGE_SLOT],
    ))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    #[test]
    fn test_selector() {
        // `transfer(address,uint256)` is the well known `0xa9059cbb`
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn test_setter_calldata_then_decode() {
        let value = address!("00000000000000000000000000000000000000aa");
        let calldata = setter_calldata("setFujiAdmin(address)", value);

        assert_eq!(calldata.len(), NUM_BYTES_SELECTOR + NUM_BYTES_STORAGE_SLOT);
        assert_eq!(&calldata[..NUM_BYTES_SELECTOR], &selector("setFujiAdmin(address)"));
        assert_eq!(decode_address(&calldata[NUM_BYTES_SELECTOR..]).unwrap(), value);
    }

    #[test]
    fn test_decode_short_return() {
        assert!(matches!(decode_address(&[0u8; 20]), Err(ClientError::Decoding(_))));
    }

    #[test]
    fn test_parse_address_value() {
        assert_eq!(
            "@fujiAdmin".parse::<AddressValue>().unwrap(),
            AddressValue::Resource("fujiAdmin".to_string())
        );
        assert_eq!(
            "0x00000000000000000000000000000000000000aa".parse::<AddressValue>().unwrap(),
            AddressValue::Literal(address!("00000000000000000000000000000000000000aa"))
        );
        assert!("@".parse::<AddressValue>().is_err());
        assert!("fujiAdmin".parse::<AddressValue>().is_err());
    }

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(&parse_hex_bytes("0xdeadbeef").unwrap()[..], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&parse_hex_bytes(" beef ").unwrap()[..], &[0xbe, 0xef]);
        assert!(parse_hex_bytes("0xzz").is_err());
    }
}
