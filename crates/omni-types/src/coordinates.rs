//! Coordinate model types for the omniwire toolkit.
//!
//! A point locates one deployed contract instance on one chain, a vector is
//! a directed pair of points describing a configurable cross-chain
//! connection. Both are structural value types used directly as map keys,
//! which keeps key derivation injective without string concatenation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one endpoint (chain) in the omniverse.
///
/// Endpoint IDs are protocol-assigned and opaque to this toolkit; two
/// points on the same endpoint share this value.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EndpointId(pub u32);

impl fmt::Display for EndpointId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "eid:{}", self.0)
	}
}

impl From<u32> for EndpointId {
	fn from(eid: u32) -> Self {
		EndpointId(eid)
	}
}

/// Chain-opaque contract address.
///
/// Addresses are carried as strings since their native representation
/// differs per chain family; use [`crate::utils::addresses_equal`] rather
/// than raw string comparison.
pub type OmniAddress = String;

/// A point in the omniverse: one deployed contract on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OmniPoint {
	/// The endpoint (chain) this contract lives on.
	pub eid: EndpointId,
	/// The contract address on that endpoint.
	pub address: OmniAddress,
}

impl OmniPoint {
	pub fn new(eid: impl Into<EndpointId>, address: impl Into<OmniAddress>) -> Self {
		Self {
			eid: eid.into(),
			address: address.into(),
		}
	}
}

impl fmt::Display for OmniPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}|{}", self.eid, self.address)
	}
}

/// A vector in the omniverse: a directed pair of points describing the
/// configurable relationship "messages from `from` to `to`".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OmniVector {
	/// The sending side of the connection.
	pub from: OmniPoint,
	/// The receiving side of the connection.
	pub to: OmniPoint,
}

impl OmniVector {
	pub fn new(from: OmniPoint, to: OmniPoint) -> Self {
		Self { from, to }
	}
}

impl fmt::Display for OmniVector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} → {}", self.from, self.to)
	}
}

/// Checks whether two points identify the same deployment.
pub fn points_equal(a: &OmniPoint, b: &OmniPoint) -> bool {
	a == b
}

/// Checks whether two points live on the same endpoint, ignoring the
/// address. Used for loopback detection.
pub fn same_endpoint(a: &OmniPoint, b: &OmniPoint) -> bool {
	a.eid == b.eid
}

/// Checks whether two vectors identify the same connection.
pub fn vectors_equal(a: &OmniVector, b: &OmniVector) -> bool {
	a == b
}

/// Checks whether a vector describes a loopback connection, i.e. both ends
/// live on the same endpoint.
pub fn is_loopback(vector: &OmniVector) -> bool {
	same_endpoint(&vector.from, &vector.to)
}
