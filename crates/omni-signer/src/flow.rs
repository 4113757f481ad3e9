//! The interactive sign-and-send flow.
//!
//! The flow wraps the submission pipeline with consent gates: the plan is
//! shown and confirmed before anything is signed, and after a partial
//! failure the user decides whether the not-yet-successful remainder gets
//! another round. Successes accumulate across rounds and are never
//! resubmitted. Retrying is strictly consent-driven; the pipeline's own
//! backoff handles transient provider noise, and everything else waits for
//! a human.

use crate::{pipeline, SignerFactory};
use async_trait::async_trait;
use omni_types::{
	OmniTransaction, OmniTransactionWithError, OmniTransactionWithReceipt, SignAndSendOutcome,
};
use std::sync::Arc;

/// Consent and progress hooks for the flow.
#[async_trait]
pub trait UserPrompt: Send + Sync {
	/// Whether the previewed plan should be submitted at all.
	async fn confirm_submission(&self, transactions: &[OmniTransaction]) -> bool;

	/// Whether the not-yet-successful remainder should get another round
	/// after the shown failures.
	async fn confirm_retry(&self, errors: &[OmniTransactionWithError]) -> bool;

	/// Fires once per confirmed transaction.
	fn on_progress(&self, confirmed: &OmniTransactionWithReceipt, completed: usize, total: usize) {
		let _ = (confirmed, completed, total);
	}
}

/// Unattended approval: submits the plan once and never retries, so a
/// failed run surfaces in the outcome instead of looping forever.
pub struct AutoApprove;

#[async_trait]
impl UserPrompt for AutoApprove {
	async fn confirm_submission(&self, _transactions: &[OmniTransaction]) -> bool {
		true
	}

	async fn confirm_retry(&self, _errors: &[OmniTransactionWithError]) -> bool {
		false
	}
}

/// Drives a transaction plan through consent, submission and retry rounds.
pub struct SignAndSendFlow {
	factory: Arc<dyn SignerFactory>,
	prompt: Arc<dyn UserPrompt>,
}

impl SignAndSendFlow {
	pub fn new(factory: Arc<dyn SignerFactory>, prompt: Arc<dyn UserPrompt>) -> Self {
		Self { factory, prompt }
	}

	/// Executes the plan.
	///
	/// The returned outcome covers the whole flow: `successful` accumulates
	/// across retry rounds, `errors` is the final round's failures, and
	/// `pending` is everything never confirmed, in plan order.
	pub async fn execute(&self, transactions: Vec<OmniTransaction>) -> SignAndSendOutcome {
		if transactions.is_empty() {
			tracing::info!("Nothing to sign, configuration is in sync");
			return SignAndSendOutcome::default();
		}

		if !self.prompt.confirm_submission(&transactions).await {
			tracing::info!("Submission declined, leaving the plan untouched");
			return SignAndSendOutcome {
				pending: transactions,
				..Default::default()
			};
		}

		let mut successful: Vec<OmniTransactionWithReceipt> = Vec::new();
		// The not-yet-confirmed pool, in plan order. Confirmations remove one
		// occurrence each, so duplicate transactions in the plan keep their
		// own slot across retry rounds.
		let mut remaining = transactions;

		loop {
			let pool = remaining.clone();
			let round = pipeline::sign_and_send(pool, self.factory.as_ref(), |confirmed, done, total| {
				self.prompt.on_progress(confirmed, done, total)
			})
			.await;

			for confirmed in &round.successful {
				if let Some(position) = remaining.iter().position(|t| t == &confirmed.transaction) {
					remaining.remove(position);
				}
			}
			successful.extend(round.successful);

			if round.errors.is_empty() {
				return SignAndSendOutcome {
					successful,
					errors: Vec::new(),
					pending: round.pending,
				};
			}

			if !self.prompt.confirm_retry(&round.errors).await {
				let mut pending = remaining;
				for failed in &round.errors {
					if let Some(position) = pending.iter().position(|t| t == &failed.transaction) {
						pending.remove(position);
					}
				}
				return SignAndSendOutcome {
					successful,
					errors: round.errors,
					pending,
				};
			}

			tracing::info!(remaining = remaining.len(), "Retrying failed transactions");
		}
	}
}
