//! Bounded exponential backoff for transient provider failures.
//!
//! Only failures classified transient by [`SignerError::is_transient`] are
//! retried here. Everything else surfaces immediately so the flow layer can
//! put the decision in front of the user instead of spinning on a revert.

use crate::SignerError;
use backoff::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;

/// Retries the operation under the default policy: exponential backoff
/// capped at thirty seconds of total waiting.
pub async fn with_backoff<T, F, Fut>(operation: F) -> Result<T, SignerError>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, SignerError>>,
{
	let policy = ExponentialBackoff {
		max_elapsed_time: Some(Duration::from_secs(30)),
		..Default::default()
	};
	with_backoff_policy(policy, operation).await
}

/// Retries the operation under an explicit backoff policy.
pub async fn with_backoff_policy<T, F, Fut>(
	policy: ExponentialBackoff,
	mut operation: F,
) -> Result<T, SignerError>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, SignerError>>,
{
	backoff::future::retry(policy, || {
		let attempt = operation();
		async move {
			attempt.await.map_err(|error| {
				if error.is_transient() {
					tracing::debug!(%error, "Transient failure, backing off");
					backoff::Error::transient(error)
				} else {
					backoff::Error::permanent(error)
				}
			})
		}
	})
	.await
}
