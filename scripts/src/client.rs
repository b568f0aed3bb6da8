//! A [`LedgerClient`] backed by a signing alloy provider

use std::sync::Arc;

use alloy::{
    network::{Ethereum, TransactionBuilder},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
    transports::{RpcError, TransportError},
};
use alloy_primitives::{Address, Bytes, TxHash, B256, U256};
use async_trait::async_trait;
use deploy_core::{client::LedgerClient, errors::ClientError, types::Artifact};
use tokio::time::sleep;
use tracing::debug;

use crate::constants::{RECEIPT_POLL_ATTEMPTS, RECEIPT_POLL_INTERVAL};

/// The provider type used by the scripts
pub type Wallet = DynProvider<Ethereum>;

/// Reads raw contract storage
#[async_trait]
pub trait StorageReader: Send + Sync {
    /// Read the storage slot `slot` of `address`
    async fn storage_at(&self, address: Address, slot: B256) -> Result<U256, ClientError>;
}

#[async_trait]
impl<T: StorageReader + ?Sized> StorageReader for Arc<T> {
    async fn storage_at(&self, address: Address, slot: B256) -> Result<U256, ClientError> {
        (**self).storage_at(address, slot).await
    }
}

/// A network client sending transactions from the provider's signer
#[derive(Clone)]
pub struct AlloyClient {
    /// The signing provider
    provider: Wallet,
}

impl AlloyClient {
    /// Wrap a signing provider
    pub fn new(provider: Wallet) -> Self {
        Self { provider }
    }

    /// The underlying provider
    pub fn provider(&self) -> &Wallet {
        &self.provider
    }

    // ----------------
    // | Transactions |
    // ----------------

    /// Send a transaction and wait for it to succeed
    async fn send_and_confirm(
        &self,
        tx: TransactionRequest,
    ) -> Result<TransactionReceipt, ClientError> {
        let pending_tx = self.provider.send_transaction(tx).await.map_err(client_error)?;
        let tx_hash = *pending_tx.tx_hash();
        debug!(%tx_hash, "sent transaction");

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.status() {
            return Err(ClientError::Reverted(format!("transaction {tx_hash} failed")));
        }

        Ok(receipt)
    }

    /// Poll for the receipt of a sent transaction
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, ClientError> {
        for _ in 0..RECEIPT_POLL_ATTEMPTS {
            if let Some(receipt) =
                self.provider.get_transaction_receipt(tx_hash).await.map_err(client_error)?
            {
                return Ok(receipt);
            }

            sleep(RECEIPT_POLL_INTERVAL).await;
        }

        Err(ClientError::Timeout(format!(
            "no receipt for {tx_hash} after {RECEIPT_POLL_ATTEMPTS} attempts"
        )))
    }
}

#[async_trait]
impl StorageReader for AlloyClient {
    async fn storage_at(&self, address: Address, slot: B256) -> Result<U256, ClientError> {
        self.provider
            .get_storage_at(address, U256::from_be_bytes(slot.0))
            .await
            .map_err(client_error)
    }
}

#[async_trait]
impl LedgerClient for AlloyClient {
    async fn create(&self, artifact: &Artifact, args: &Bytes) -> Result<Address, ClientError> {
        let code: Bytes = [artifact.image.as_ref(), args.as_ref()].concat().into();
        let tx = TransactionRequest::default().with_deploy_code(code);

        let receipt = self.send_and_confirm(tx).await?;
        receipt.contract_address.ok_or_else(|| {
            ClientError::Reverted(format!(
                "no contract address in the receipt of {}",
                receipt.transaction_hash
            ))
        })
    }

    async fn call(&self, address: Address, calldata: Bytes) -> Result<Bytes, ClientError> {
        let tx = TransactionRequest::default().with_to(address).with_input(calldata);
        self.provider.call(tx).await.map_err(client_error)
    }

    async fn send(&self, address: Address, calldata: Bytes) -> Result<TxHash, ClientError> {
        let tx = TransactionRequest::default().with_to(address).with_input(calldata);
        let receipt = self.send_and_confirm(tx).await?;
        Ok(receipt.transaction_hash)
    }
}

/// Classify an RPC error
fn client_error(err: TransportError) -> ClientError {
    match err {
        RpcError::ErrorResp(payload) if payload.message.contains("revert") => {
            ClientError::Reverted(payload.to_string())
        }
        RpcError::ErrorResp(payload) => ClientError::Rejected(payload.to_string()),
        RpcError::DeserError { err, .. } => ClientError::Decoding(err.to_string()),
        other => ClientError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use alloy::transports::TransportErrorKind;

    use super::*;

    #[test]
    fn test_transport_failures_are_classified() {
        let err = client_error(TransportErrorKind::custom_str("connection refused"));
        assert!(matches!(
            err,
            ClientError::Transport(ref msg) if msg.contains("connection refused")
        ));

        let err = client_error(RpcError::NullResp);
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
