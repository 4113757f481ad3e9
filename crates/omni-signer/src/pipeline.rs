//! Grouped transaction submission.
//!
//! Transactions are grouped by endpoint and the groups run concurrently;
//! within a group submission is strictly sequential, each transaction
//! confirmed before the next is sent, so nonce ordering and configuration
//! dependencies hold. A failure stops its own group only: the failed
//! transaction is recorded as an error, everything queued behind it in the
//! same group becomes pending, and the other groups keep going.

use crate::{retry, OmniSigner, SignerError, SignerFactory};
use futures::future::join_all;
use omni_types::{
	EndpointId, OmniTransaction, OmniTransactionReceipt, OmniTransactionWithError,
	OmniTransactionWithReceipt, SignAndSendOutcome,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Submits the transactions and partitions them into confirmed, failed and
/// never-attempted sets.
///
/// The partition is disjoint and ordering within each set follows the input
/// order. `on_progress` fires once per confirmation with the running count
/// and the batch total.
pub async fn sign_and_send<F>(
	transactions: Vec<OmniTransaction>,
	factory: &dyn SignerFactory,
	on_progress: F,
) -> SignAndSendOutcome
where
	F: Fn(&OmniTransactionWithReceipt, usize, usize) + Send + Sync,
{
	if transactions.is_empty() {
		return SignAndSendOutcome::default();
	}

	let total = transactions.len();
	let groups = group_by_endpoint(transactions);
	tracing::info!(transactions = total, chains = groups.len(), "Submitting transactions");

	let completed = AtomicUsize::new(0);
	let results = join_all(groups.into_iter().map(|(eid, group)| {
		submit_group(eid, group, factory, &on_progress, &completed, total)
	}))
	.await;

	let mut outcome = SignAndSendOutcome::default();
	for (successful, errors, pending) in results {
		outcome.successful.extend(successful);
		outcome.errors.extend(errors);
		outcome.pending.extend(pending);
	}

	tracing::info!(
		successful = outcome.successful.len(),
		errors = outcome.errors.len(),
		pending = outcome.pending.len(),
		"Submission round finished"
	);
	outcome
}

/// Splits the batch into per-endpoint groups, preserving first-seen
/// endpoint order and input order within each group.
fn group_by_endpoint(
	transactions: Vec<OmniTransaction>,
) -> Vec<(EndpointId, Vec<OmniTransaction>)> {
	let mut order: Vec<EndpointId> = Vec::new();
	let mut groups: HashMap<EndpointId, Vec<OmniTransaction>> = HashMap::new();

	for transaction in transactions {
		let group = groups.entry(transaction.point.eid).or_default();
		if group.is_empty() {
			order.push(transaction.point.eid);
		}
		group.push(transaction);
	}

	order
		.into_iter()
		.map(|eid| {
			let group = groups.remove(&eid).unwrap_or_default();
			(eid, group)
		})
		.collect()
}

async fn submit_group<F>(
	eid: EndpointId,
	group: Vec<OmniTransaction>,
	factory: &dyn SignerFactory,
	on_progress: &F,
	completed: &AtomicUsize,
	total: usize,
) -> (
	Vec<OmniTransactionWithReceipt>,
	Vec<OmniTransactionWithError>,
	Vec<OmniTransaction>,
)
where
	F: Fn(&OmniTransactionWithReceipt, usize, usize) + Send + Sync,
{
	let mut queue = group.into_iter();

	let signer = match factory.create(eid).await {
		Ok(signer) => signer,
		Err(error) => {
			tracing::error!(%eid, %error, "Failed to create signer");
			let mut errors = Vec::new();
			if let Some(transaction) = queue.next() {
				errors.push(OmniTransactionWithError {
					transaction,
					error: error.to_string(),
				});
			}
			return (Vec::new(), errors, queue.collect());
		}
	};

	let mut successful = Vec::new();
	while let Some(transaction) = queue.next() {
		match submit_one(signer.as_ref(), &transaction).await {
			Ok(receipt) => {
				tracing::debug!(
					%eid,
					hash = %receipt.transaction_hash,
					"Transaction confirmed"
				);
				let confirmed = OmniTransactionWithReceipt {
					transaction,
					receipt,
				};
				let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
				on_progress(&confirmed, done, total);
				successful.push(confirmed);
			}
			Err(error) => {
				tracing::warn!(%eid, %error, "Transaction failed, parking the rest of the group");
				let errors = vec![OmniTransactionWithError {
					transaction,
					error: error.to_string(),
				}];
				return (successful, errors, queue.collect());
			}
		}
	}

	(successful, Vec::new(), Vec::new())
}

/// Submits one transaction and waits for its confirmation, retrying
/// transient provider failures at both steps.
async fn submit_one(
	signer: &dyn OmniSigner,
	transaction: &OmniTransaction,
) -> Result<OmniTransactionReceipt, SignerError> {
	let response = retry::with_backoff(|| signer.sign_and_send(transaction)).await?;
	retry::with_backoff(|| response.wait()).await
}
