//! Declarative wiring configuration for the omniwire toolkit.
//!
//! A wiring file is a TOML description of the desired omnigraph: the
//! deployed contracts and the connections between them, each carrying the
//! declared configuration the configurators reconcile against. Loading goes
//! through [`GraphBuilder`], so a connection referencing an undeclared
//! contract fails at load time with the builder's descriptive error rather
//! than surfacing later as a missing adapter.
//!
//! ```toml
//! [[contracts]]
//! eid = 101
//! address = "0xA"
//!
//! [contracts.config]
//! delegate = "0xD"
//!
//! [[connections]]
//! from = { eid = 101, address = "0xA" }
//! to = { eid = 102, address = "0xB" }
//!
//! [connections.config]
//! send_library = "0xLIB"
//! ```

use omni_graph::{GraphBuilder, GraphError};
use omni_types::{
	EndpointId, OAppEdgeConfig, OAppNodeConfig, OmniAddress, OmniEdge, OmniGraph, OmniNode,
	OmniPoint, OmniVector,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a wiring configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The wiring file could not be read.
	#[error("Failed to read wiring config: {0}")]
	Io(#[from] std::io::Error),
	/// The wiring file is not valid TOML for the expected shape.
	#[error("Failed to parse wiring config: {0}")]
	Parse(#[from] toml::de::Error),
	/// The described graph is inconsistent.
	#[error(transparent)]
	Graph(#[from] GraphError),
}

/// One declared contract deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEntry {
	pub eid: EndpointId,
	pub address: OmniAddress,
	#[serde(default)]
	pub config: OAppNodeConfig,
}

/// One declared directed connection between two deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEntry {
	pub from: OmniPoint,
	pub to: OmniPoint,
	#[serde(default)]
	pub config: OAppEdgeConfig,
}

/// The declarative wiring description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireConfig {
	#[serde(default)]
	pub contracts: Vec<ContractEntry>,
	#[serde(default)]
	pub connections: Vec<ConnectionEntry>,
}

impl WireConfig {
	/// Builds the omnigraph, validating that every connection endpoint is a
	/// declared contract.
	pub fn build_graph(&self) -> Result<OmniGraph<OAppNodeConfig, OAppEdgeConfig>, ConfigError> {
		let mut builder = GraphBuilder::new();

		builder.add_nodes(self.contracts.iter().map(|contract| {
			OmniNode::new(
				OmniPoint::new(contract.eid, contract.address.clone()),
				contract.config.clone(),
			)
		}));
		builder.add_edges(self.connections.iter().map(|connection| {
			OmniEdge::new(
				OmniVector::new(connection.from.clone(), connection.to.clone()),
				connection.config.clone(),
			)
		}))?;

		Ok(builder.graph())
	}
}

/// Reads and parses a wiring file.
pub async fn load_wire_config(path: impl AsRef<Path>) -> Result<WireConfig, ConfigError> {
	let path = path.as_ref();
	tracing::debug!(path = %path.display(), "Loading wiring config");
	let raw = tokio::fs::read_to_string(path).await?;
	Ok(toml::from_str(&raw)?)
}
