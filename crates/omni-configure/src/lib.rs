//! Configuration planning module for the omniwire toolkit.
//!
//! A configurator is a pure planning function: it walks the omnigraph,
//! reads current on-chain state through the chain-adapter factory, diffs it
//! against the declared state, and emits corrective transactions only for
//! the deltas. Running a configurator never submits anything; submission
//! belongs to the sign-and-send pipeline.
//!
//! Planning errors abort the whole run: they indicate a logic or
//! configuration mismatch, not a transient network blip, so no partial plan
//! is ever produced and nothing is retried at this layer.

use async_trait::async_trait;
use omni_sdk::{OAppFactory, SdkError};
use omni_types::{OmniGraph, OmniPoint, OmniTransaction, OmniVector, OptionsError};
use thiserror::Error;

pub mod combinators;
pub mod oapp;

#[cfg(test)]
pub(crate) mod testing;

pub use combinators::{configure_edges, configure_nodes, ConfigureMultiple, Execution};
pub use oapp::{
	configure_oapp, configure_oapp_read, configure_owners, ConfigureCallerBpsCap,
	ConfigureDelegates, ConfigureEnforcedOptions, ConfigureLibraryRegistrations, ConfigureOwners,
	ConfigurePeers, ConfigureReadChannels, ConfigureReceiveConfig, ConfigureReceiveLibraries,
	ConfigureReceiveLibraryTimeouts, ConfigureSendConfig, ConfigureSendLibraries, OAppGraph,
};

/// Errors that can occur while planning configuration transactions.
#[derive(Debug, Error)]
pub enum ConfigureError {
	/// An adapter call failed while configuring a deployment.
	#[error("Failed to configure {point}: {source}")]
	Node {
		point: OmniPoint,
		#[source]
		source: SdkError,
	},
	/// An adapter call failed while configuring a connection.
	#[error("Failed to configure {vector}: {source}")]
	Edge {
		vector: OmniVector,
		#[source]
		source: SdkError,
	},
	/// A send library is neither declared nor available as a default.
	#[error("No send library declared for {vector} and no default value exists")]
	MissingSendLibrary { vector: OmniVector },
	/// A receive library is neither declared nor available as a default.
	#[error("No receive library declared for {vector} and no default value exists")]
	MissingReceiveLibrary { vector: OmniVector },
	/// Enforced options could not be encoded.
	#[error(transparent)]
	Options(#[from] OptionsError),
}

/// A planning step turning declared graph state plus live on-chain state
/// into a list of corrective transactions.
#[async_trait]
pub trait Configurator<N: Send + Sync, E: Send + Sync>: Send + Sync {
	async fn configure(
		&self,
		graph: &OmniGraph<N, E>,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError>;
}
