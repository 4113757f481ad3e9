//! Signing and submission module for the omniwire toolkit.
//!
//! This module implements the delivery half of the toolkit: signer
//! abstractions bound to a single chain, the grouped submission pipeline,
//! and the interactive sign-and-send flow that previews plans and drives
//! retry rounds.
//!
//! Signers are deliberately chain-scoped. A signer created for one endpoint
//! refuses transactions attributed to any other, which turns cross-chain
//! mixups into loud errors instead of silently misdirected submissions.

use async_trait::async_trait;
use omni_types::{EndpointId, OmniTransaction, OmniTransactionReceipt};
use std::sync::Arc;
use thiserror::Error;

pub mod flow;
pub mod pipeline;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use flow::{AutoApprove, SignAndSendFlow, UserPrompt};
pub use pipeline::sign_and_send;
pub use retry::{with_backoff, with_backoff_policy};

/// Errors that can occur during transaction signing and submission.
#[derive(Debug, Error)]
pub enum SignerError {
	/// A transaction was handed to a signer bound to a different chain.
	#[error("Transaction for {transaction} cannot be handled by a signer bound to {signer}")]
	WrongChain {
		transaction: EndpointId,
		signer: EndpointId,
	},
	/// No signer could be created for the endpoint.
	#[error("No signer available for {0}")]
	MissingSigner(EndpointId),
	/// Signing itself failed.
	#[error("Failed to sign transaction: {0}")]
	Signing(String),
	/// The chain rejected the submission.
	#[error("Failed to submit transaction: {0}")]
	Submission(String),
	/// The transaction was submitted but never confirmed.
	#[error("Transaction failed to confirm: {0}")]
	Confirmation(String),
	/// A transport-level provider failure.
	#[error("Network error: {0}")]
	Network(String),
}

impl SignerError {
	/// Whether the failure is worth retrying without user intervention.
	pub fn is_transient(&self) -> bool {
		matches!(self, SignerError::Network(_))
	}
}

/// A signer bound to exactly one chain.
#[async_trait]
pub trait OmniSigner: Send + Sync {
	/// The endpoint this signer submits to.
	fn eid(&self) -> EndpointId;

	/// Signs the transaction without submitting it.
	async fn sign(&self, transaction: &OmniTransaction) -> Result<String, SignerError>;

	/// Signs and submits the transaction, returning a handle for awaiting
	/// confirmation.
	async fn sign_and_send(
		&self,
		transaction: &OmniTransaction,
	) -> Result<Box<dyn TransactionResponse>, SignerError>;
}

/// Handle to a submitted transaction.
#[async_trait]
pub trait TransactionResponse: Send + Sync {
	/// The hash assigned at submission time.
	fn transaction_hash(&self) -> String;

	/// Waits until the transaction is confirmed on-chain.
	async fn wait(&self) -> Result<OmniTransactionReceipt, SignerError>;
}

/// Creates chain-scoped signers on demand.
#[async_trait]
pub trait SignerFactory: Send + Sync {
	async fn create(&self, eid: EndpointId) -> Result<Arc<dyn OmniSigner>, SignerError>;
}

/// Guard for signer implementations: rejects transactions attributed to a
/// chain other than the signer's own.
pub fn ensure_same_chain(
	signer: EndpointId,
	transaction: &OmniTransaction,
) -> Result<(), SignerError> {
	if transaction.point.eid != signer {
		return Err(SignerError::WrongChain {
			transaction: transaction.point.eid,
			signer,
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use omni_types::OmniPoint;

	#[test]
	fn test_ensure_same_chain_accepts_matching_eid() {
		let transaction = OmniTransaction::new(OmniPoint::new(101u32, "0xA"), "0x01");
		assert!(ensure_same_chain(EndpointId(101), &transaction).is_ok());
	}

	#[test]
	fn test_ensure_same_chain_rejects_foreign_transaction() {
		let transaction = OmniTransaction::new(OmniPoint::new(102u32, "0xB"), "0x01");
		let err = ensure_same_chain(EndpointId(101), &transaction).unwrap_err();
		assert!(matches!(
			err,
			SignerError::WrongChain {
				transaction: EndpointId(102),
				signer: EndpointId(101),
			}
		));
	}

	#[test]
	fn test_only_network_errors_are_transient() {
		assert!(SignerError::Network("timeout".into()).is_transient());
		assert!(!SignerError::Submission("reverted".into()).is_transient());
		assert!(!SignerError::Confirmation("dropped".into()).is_transient());
	}
}
