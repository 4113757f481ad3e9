//! Chain-adapter abstraction module for the omniwire toolkit.
//!
//! This module defines the capability interfaces every chain adapter must
//! implement: [`OAppSdk`] for application-level operations on one deployed
//! contract and [`EndpointSdk`] for endpoint-level library and message
//! configuration. Adapters translate between these canonical shapes and
//! whatever the chain natively speaks; chain-native encodings never cross
//! this boundary.
//!
//! The [`OAppFactory`] is the sole injection point connecting the
//! chain-agnostic configurators to chain-specific implementations. Wrap a
//! factory in [`MemoizedFactory`] so repeated lookups for one point reuse a
//! single instance, since adapter construction may itself involve a network
//! round trip.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use omni_types::{
	EndpointId, ExecutorConfig, OmniAddress, OmniPoint, OmniTransaction, SetConfigParam, Timeout,
	UlnConfig,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during chain-adapter operations.
///
/// The error is `Clone` so a memoized construction failure can be fanned
/// out to every caller awaiting the same in-flight future.
#[derive(Debug, Clone, Error)]
pub enum SdkError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error returned by the underlying provider call.
	#[error("Provider call failed: {0}")]
	Provider(String),
	/// Error that occurs while encoding a transaction payload.
	#[error("Failed to encode transaction: {0}")]
	Encoding(String),
}

/// One enforced-options write for a remote endpoint and message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcedOptionParam {
	/// The remote endpoint the preset applies to.
	pub eid: EndpointId,
	/// The application message type.
	pub msg_type: u16,
	/// The encoded type-3 options value.
	pub options: String,
}

/// Application-level operations on one deployed contract.
///
/// An instance is bound to exactly one point. All `get_*`/`has_*` methods
/// read live on-chain state; all `set_*` methods build unsigned
/// transactions without submitting anything.
#[async_trait]
pub trait OAppSdk: Send + Sync {
	/// The point this adapter is bound to.
	fn point(&self) -> &OmniPoint;

	/// Handle to the endpoint adapter for library-level operations.
	async fn endpoint(&self) -> Result<Arc<dyn EndpointSdk>, SdkError>;

	/// Whether the peer for the given endpoint is explicitly set to the
	/// given address.
	///
	/// This is an explicit-vs-default check: it must return `false` when
	/// the on-chain peer is unset, even if the queried address is the
	/// zero value some chains use to represent "not set".
	async fn has_peer(&self, eid: EndpointId, address: &str) -> Result<bool, SdkError>;

	/// Builds a transaction linking the peer on the given endpoint.
	async fn set_peer(&self, eid: EndpointId, address: &str)
		-> Result<OmniTransaction, SdkError>;

	/// Reads the currently enforced options for one message type, as an
	/// encoded hex value.
	async fn get_enforced_options(
		&self,
		eid: EndpointId,
		msg_type: u16,
	) -> Result<String, SdkError>;

	/// Builds a transaction applying the given enforced-option presets.
	async fn set_enforced_options(
		&self,
		params: Vec<EnforcedOptionParam>,
	) -> Result<OmniTransaction, SdkError>;

	/// Whether the given read channel is currently active.
	async fn is_read_channel_active(&self, channel_id: u32) -> Result<bool, SdkError>;

	/// Builds a transaction activating or deactivating a read channel.
	async fn set_read_channel(
		&self,
		channel_id: u32,
		active: bool,
	) -> Result<OmniTransaction, SdkError>;

	/// Whether the given address is the currently configured delegate.
	async fn is_delegate(&self, delegate: &str) -> Result<bool, SdkError>;

	/// Builds a transaction setting the configuration delegate.
	async fn set_delegate(&self, delegate: &str) -> Result<OmniTransaction, SdkError>;

	/// Reads the current owner, if the contract exposes ownership.
	async fn get_owner(&self) -> Result<Option<OmniAddress>, SdkError>;

	/// Builds a transaction transferring ownership.
	async fn set_owner(&self, owner: &str) -> Result<OmniTransaction, SdkError>;

	/// Reads the current caller fee cap in basis points, if set.
	async fn get_caller_bps_cap(&self) -> Result<Option<u128>, SdkError>;

	/// Builds a transaction setting the caller fee cap.
	async fn set_caller_bps_cap(&self, cap: u128) -> Result<OmniTransaction, SdkError>;
}

/// Endpoint-level library and message-configuration operations.
///
/// Obtained through [`OAppSdk::endpoint`]; all transactions built here are
/// still attributed to the owning application's point, since the sender
/// configures outbound behavior by protocol convention.
#[async_trait]
pub trait EndpointSdk: Send + Sync {
	/// Whether the given message library is registered with the endpoint.
	async fn is_registered_library(&self, lib: &str) -> Result<bool, SdkError>;

	/// Builds a transaction registering a message library.
	async fn register_library(&self, lib: &str) -> Result<OmniTransaction, SdkError>;

	/// Whether the sender is currently falling back on the default send
	/// library for the given destination.
	async fn is_default_send_library(
		&self,
		sender: &str,
		dst_eid: EndpointId,
	) -> Result<bool, SdkError>;

	/// The effective send library for the given destination, if any.
	async fn get_send_library(
		&self,
		sender: &str,
		dst_eid: EndpointId,
	) -> Result<Option<OmniAddress>, SdkError>;

	/// Builds a transaction selecting the send library.
	async fn set_send_library(
		&self,
		sender: &str,
		dst_eid: EndpointId,
		lib: &str,
	) -> Result<OmniTransaction, SdkError>;

	/// The effective receive library for the given source, plus whether it
	/// is the endpoint default rather than an explicit selection.
	async fn get_receive_library(
		&self,
		receiver: &str,
		src_eid: EndpointId,
	) -> Result<(Option<OmniAddress>, bool), SdkError>;

	/// Builds a transaction selecting the receive library with a grace
	/// period for the outgoing one.
	async fn set_receive_library(
		&self,
		receiver: &str,
		src_eid: EndpointId,
		lib: &str,
		grace_period: u64,
	) -> Result<OmniTransaction, SdkError>;

	/// The expiring fallback window for a rotated-out receive library.
	async fn get_receive_library_timeout(
		&self,
		receiver: &str,
		src_eid: EndpointId,
	) -> Result<Option<Timeout>, SdkError>;

	/// Builds a transaction setting the receive-library fallback window.
	async fn set_receive_library_timeout(
		&self,
		receiver: &str,
		src_eid: EndpointId,
		lib: &str,
		expiry: u64,
	) -> Result<OmniTransaction, SdkError>;

	/// Whether the app's explicit executor config for the library and
	/// remote endpoint equals the given config.
	///
	/// This checks the application's own configuration, never the
	/// effective value merged with endpoint defaults, because some chains
	/// represent "not set" distinctly from "set to the default value".
	async fn has_app_executor_config(
		&self,
		oapp: &str,
		lib: &str,
		eid: EndpointId,
		config: &ExecutorConfig,
	) -> Result<bool, SdkError>;

	/// Whether the app's explicit ULN config for the library and remote
	/// endpoint equals the given config. Same explicit-vs-default contract
	/// as [`Self::has_app_executor_config`].
	async fn has_app_uln_config(
		&self,
		oapp: &str,
		lib: &str,
		eid: EndpointId,
		config: &UlnConfig,
	) -> Result<bool, SdkError>;

	/// Builds one transaction applying a batch of configuration writes to
	/// a message library.
	async fn set_config(
		&self,
		oapp: &str,
		lib: &str,
		params: Vec<SetConfigParam>,
	) -> Result<OmniTransaction, SdkError>;
}

/// Factory producing a chain adapter for a point.
///
/// This is the only seam between the chain-agnostic planning code and the
/// chain-specific implementations: the toolkit resolves no providers and
/// holds no key material itself.
#[async_trait]
pub trait OAppFactory: Send + Sync {
	async fn create(&self, point: &OmniPoint) -> Result<Arc<dyn OAppSdk>, SdkError>;
}

type SharedSdkFuture = Shared<BoxFuture<'static, Result<Arc<dyn OAppSdk>, SdkError>>>;

/// Single-flight memoizing wrapper around an [`OAppFactory`].
///
/// Concurrent callers for the same point await the same in-flight
/// construction instead of racing independent ones; a resolved instance is
/// reused for the rest of the run. Failed constructions are evicted so a
/// later round can retry.
pub struct MemoizedFactory<F> {
	inner: Arc<F>,
	cache: dashmap::DashMap<OmniPoint, SharedSdkFuture>,
}

impl<F: OAppFactory + 'static> MemoizedFactory<F> {
	pub fn new(inner: F) -> Self {
		Self {
			inner: Arc::new(inner),
			cache: dashmap::DashMap::new(),
		}
	}
}

#[async_trait]
impl<F: OAppFactory + 'static> OAppFactory for MemoizedFactory<F> {
	async fn create(&self, point: &OmniPoint) -> Result<Arc<dyn OAppSdk>, SdkError> {
		let future = self
			.cache
			.entry(point.clone())
			.or_insert_with(|| {
				tracing::debug!(point = %point, "Creating SDK");
				let inner = self.inner.clone();
				let point = point.clone();
				async move { inner.create(&point).await }.boxed().shared()
			})
			.clone();

		let result = future.await;
		if result.is_err() {
			self.cache.remove(point);
		}
		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use omni_types::OmniTransaction;
	use std::sync::atomic::{AtomicUsize, Ordering};

	struct StubSdk {
		point: OmniPoint,
	}

	#[async_trait]
	impl OAppSdk for StubSdk {
		fn point(&self) -> &OmniPoint {
			&self.point
		}

		async fn endpoint(&self) -> Result<Arc<dyn EndpointSdk>, SdkError> {
			Err(SdkError::Provider("no endpoint".into()))
		}

		async fn has_peer(&self, _eid: EndpointId, _address: &str) -> Result<bool, SdkError> {
			Ok(false)
		}

		async fn set_peer(
			&self,
			_eid: EndpointId,
			_address: &str,
		) -> Result<OmniTransaction, SdkError> {
			Ok(OmniTransaction::new(self.point.clone(), "0x"))
		}

		async fn get_enforced_options(
			&self,
			_eid: EndpointId,
			_msg_type: u16,
		) -> Result<String, SdkError> {
			Ok("0x".into())
		}

		async fn set_enforced_options(
			&self,
			_params: Vec<EnforcedOptionParam>,
		) -> Result<OmniTransaction, SdkError> {
			Ok(OmniTransaction::new(self.point.clone(), "0x"))
		}

		async fn is_read_channel_active(&self, _channel_id: u32) -> Result<bool, SdkError> {
			Ok(false)
		}

		async fn set_read_channel(
			&self,
			_channel_id: u32,
			_active: bool,
		) -> Result<OmniTransaction, SdkError> {
			Ok(OmniTransaction::new(self.point.clone(), "0x"))
		}

		async fn is_delegate(&self, _delegate: &str) -> Result<bool, SdkError> {
			Ok(false)
		}

		async fn set_delegate(&self, _delegate: &str) -> Result<OmniTransaction, SdkError> {
			Ok(OmniTransaction::new(self.point.clone(), "0x"))
		}

		async fn get_owner(&self) -> Result<Option<OmniAddress>, SdkError> {
			Ok(None)
		}

		async fn set_owner(&self, _owner: &str) -> Result<OmniTransaction, SdkError> {
			Ok(OmniTransaction::new(self.point.clone(), "0x"))
		}

		async fn get_caller_bps_cap(&self) -> Result<Option<u128>, SdkError> {
			Ok(None)
		}

		async fn set_caller_bps_cap(&self, _cap: u128) -> Result<OmniTransaction, SdkError> {
			Ok(OmniTransaction::new(self.point.clone(), "0x"))
		}
	}

	struct CountingFactory {
		constructions: AtomicUsize,
		fail_first: AtomicUsize,
	}

	impl CountingFactory {
		fn new() -> Self {
			Self {
				constructions: AtomicUsize::new(0),
				fail_first: AtomicUsize::new(0),
			}
		}

		fn failing_once() -> Self {
			Self {
				constructions: AtomicUsize::new(0),
				fail_first: AtomicUsize::new(1),
			}
		}
	}

	#[async_trait]
	impl OAppFactory for CountingFactory {
		async fn create(&self, point: &OmniPoint) -> Result<Arc<dyn OAppSdk>, SdkError> {
			self.constructions.fetch_add(1, Ordering::SeqCst);

			if self
				.fail_first
				.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
				.is_ok()
			{
				return Err(SdkError::Network("connection refused".into()));
			}

			Ok(Arc::new(StubSdk {
				point: point.clone(),
			}))
		}
	}

	#[tokio::test]
	async fn test_repeated_lookups_reuse_one_construction() {
		let factory = MemoizedFactory::new(CountingFactory::new());
		let point = OmniPoint::new(101u32, "0xA");

		let first = factory.create(&point).await.unwrap();
		let second = factory.create(&point).await.unwrap();

		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(factory.inner.constructions.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_concurrent_lookups_share_one_flight() {
		let factory = MemoizedFactory::new(CountingFactory::new());
		let point = OmniPoint::new(101u32, "0xA");

		let (a, b) = tokio::join!(factory.create(&point), factory.create(&point));

		assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
		assert_eq!(factory.inner.constructions.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_distinct_points_get_distinct_instances() {
		let factory = MemoizedFactory::new(CountingFactory::new());

		let a = factory.create(&OmniPoint::new(101u32, "0xA")).await.unwrap();
		let b = factory.create(&OmniPoint::new(102u32, "0xB")).await.unwrap();

		assert!(!Arc::ptr_eq(&a, &b));
		assert_eq!(factory.inner.constructions.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn test_failed_construction_is_retried() {
		let factory = MemoizedFactory::new(CountingFactory::failing_once());
		let point = OmniPoint::new(101u32, "0xA");

		assert!(factory.create(&point).await.is_err());
		assert!(factory.create(&point).await.is_ok());
		assert_eq!(factory.inner.constructions.load(Ordering::SeqCst), 2);
	}
}
