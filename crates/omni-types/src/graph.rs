//! Graph value types carrying declared configuration.
//!
//! Nodes attach caller-defined configuration to a point, edges to a vector.
//! The graph itself is a plain value; the integrity invariant (no edge
//! without both endpoint nodes) is enforced by the builder in `omni-graph`.

use crate::coordinates::{OmniPoint, OmniVector};
use serde::{Deserialize, Serialize};

/// A node in the omnigraph: one deployment plus its declared configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmniNode<T> {
	/// The point this node configures.
	pub point: OmniPoint,
	/// The declared configuration for this deployment.
	pub config: T,
}

impl<T> OmniNode<T> {
	pub fn new(point: OmniPoint, config: T) -> Self {
		Self { point, config }
	}
}

/// An edge in the omnigraph: one directed connection plus its declared
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmniEdge<T> {
	/// The vector this edge configures.
	pub vector: OmniVector,
	/// The declared configuration for this connection.
	pub config: T,
}

impl<T> OmniEdge<T> {
	pub fn new(vector: OmniVector, config: T) -> Self {
		Self { vector, config }
	}
}

/// The omnigraph: every deployment and every connection under management.
///
/// Constructed once per invocation from validated input and read-only
/// during the diff phase. The graph is always small (tens of nodes and
/// edges) and held fully in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmniGraph<N, E> {
	/// The deployments under management.
	pub contracts: Vec<OmniNode<N>>,
	/// The connections between them.
	pub connections: Vec<OmniEdge<E>>,
}

impl<N, E> Default for OmniGraph<N, E> {
	fn default() -> Self {
		Self {
			contracts: Vec::new(),
			connections: Vec::new(),
		}
	}
}
