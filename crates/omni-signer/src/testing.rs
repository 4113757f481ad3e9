//! Scriptable signer fakes shared by the pipeline and flow tests.

use crate::{
	ensure_same_chain, OmniSigner, SignerError, SignerFactory, TransactionResponse,
};
use async_trait::async_trait;
use omni_types::{EndpointId, OmniTransaction, OmniTransactionReceipt};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub struct StubResponse {
	hash: String,
}

#[async_trait]
impl TransactionResponse for StubResponse {
	fn transaction_hash(&self) -> String {
		self.hash.clone()
	}

	async fn wait(&self) -> Result<OmniTransactionReceipt, SignerError> {
		Ok(OmniTransactionReceipt {
			transaction_hash: self.hash.clone(),
			block_number: Some(1),
		})
	}
}

pub struct StubSigner {
	eid: EndpointId,
	failures: Arc<Mutex<HashMap<String, usize>>>,
}

#[async_trait]
impl OmniSigner for StubSigner {
	fn eid(&self) -> EndpointId {
		self.eid
	}

	async fn sign(&self, transaction: &OmniTransaction) -> Result<String, SignerError> {
		ensure_same_chain(self.eid, transaction)?;
		Ok(format!("signed:{}", transaction.data))
	}

	async fn sign_and_send(
		&self,
		transaction: &OmniTransaction,
	) -> Result<Box<dyn TransactionResponse>, SignerError> {
		ensure_same_chain(self.eid, transaction)?;

		let mut failures = self.failures.lock().unwrap();
		if let Some(remaining) = failures.get_mut(&transaction.data) {
			if *remaining > 0 {
				*remaining -= 1;
				return Err(SignerError::Submission(format!(
					"scripted failure for {}",
					transaction.data
				)));
			}
		}

		Ok(Box::new(StubResponse {
			hash: format!("0xhash:{}", transaction.data),
		}))
	}
}

/// Factory handing out [`StubSigner`]s with scripted, shared failure
/// budgets keyed by transaction data.
#[derive(Default)]
pub struct ScriptedFactory {
	failures: Arc<Mutex<HashMap<String, usize>>>,
	missing: HashSet<EndpointId>,
}

impl ScriptedFactory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Scripts the next `times` submissions of the given transaction data
	/// to fail.
	pub fn fail(self, data: &str, times: usize) -> Self {
		self.failures.lock().unwrap().insert(data.to_string(), times);
		self
	}

	/// Makes signer creation fail for the given endpoint.
	pub fn without_signer(mut self, eid: u32) -> Self {
		self.missing.insert(EndpointId(eid));
		self
	}
}

#[async_trait]
impl SignerFactory for ScriptedFactory {
	async fn create(&self, eid: EndpointId) -> Result<Arc<dyn OmniSigner>, SignerError> {
		if self.missing.contains(&eid) {
			return Err(SignerError::MissingSigner(eid));
		}
		Ok(Arc::new(StubSigner {
			eid,
			failures: self.failures.clone(),
		}))
	}
}
