//! Transaction model and submission outcome types.
//!
//! An [`OmniTransaction`] is one unsigned, chain-specific state-changing
//! call, always attributed to exactly one point: the chain and account that
//! must sign and submit it. Transactions for the same point carry an
//! implicit FIFO ordering that the sign-and-send pipeline preserves.

use crate::coordinates::OmniPoint;
use serde::{Deserialize, Serialize};

/// One unsigned state-changing call produced by a configurator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmniTransaction {
	/// The point that must sign and submit this transaction.
	pub point: OmniPoint,
	/// Chain-opaque call data, typically hex-encoded.
	pub data: String,
	/// Human-readable description of what the transaction changes.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Optional gas limit override.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gas_limit: Option<u128>,
	/// Optional native value attached to the call.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<u128>,
}

impl OmniTransaction {
	pub fn new(point: OmniPoint, data: impl Into<String>) -> Self {
		Self {
			point,
			data: data.into(),
			description: None,
			gas_limit: None,
			value: None,
		}
	}

	pub fn describe(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}
}

/// Receipt for a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmniTransactionReceipt {
	/// The hash of the confirmed transaction.
	pub transaction_hash: String,
	/// The block the transaction was included in, where the chain has one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub block_number: Option<u64>,
}

/// A transaction that was submitted and confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmniTransactionWithReceipt {
	pub transaction: OmniTransaction,
	pub receipt: OmniTransactionReceipt,
}

/// A transaction whose submission or confirmation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmniTransactionWithError {
	pub transaction: OmniTransaction,
	/// The underlying failure, stringified at the signer boundary.
	pub error: String,
}

/// Three-way partition of a submission round.
///
/// The sets are disjoint: a transaction is either confirmed, failed, or
/// never attempted in the round. A partial-batch failure never rolls back
/// prior successes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignAndSendOutcome {
	/// Transactions confirmed with their receipts.
	pub successful: Vec<OmniTransactionWithReceipt>,
	/// Transactions whose submission or confirmation failed.
	pub errors: Vec<OmniTransactionWithError>,
	/// Transactions never attempted (queued behind a failure or declined).
	pub pending: Vec<OmniTransaction>,
}

impl SignAndSendOutcome {
	/// Whether the round completed without a single failure.
	pub fn is_clean(&self) -> bool {
		self.errors.is_empty() && self.pending.is_empty()
	}
}

/// Concatenates transaction lists in order, dropping absent and empty
/// entries.
///
/// No deduplication is performed: if two configurators emit conflicting
/// writes for the same point, both are kept and submitted in declared
/// order, so the last writer wins on-chain.
pub fn flatten_transactions(
	lists: impl IntoIterator<Item = Option<Vec<OmniTransaction>>>,
) -> Vec<OmniTransaction> {
	lists.into_iter().flatten().flatten().collect()
}
