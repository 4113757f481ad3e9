//! Canonical cross-chain configuration shapes.
//!
//! These are the shapes the diff logic compares: chain-native encodings
//! (borsh, BCS, ABI words) never leave the chain adapters, so every adapter
//! translates into and out of these types. Comparison helpers canonicalize
//! (normalized addresses, order-insensitive DVN sets) before comparing so
//! raw provider responses never produce false-positive diffs.

use crate::coordinates::{EndpointId, OmniAddress};
use crate::options::EnforcedOptions;
use crate::utils::{addresses_equal, normalize_address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Verification network (ULN/DVN) configuration for one direction of a
/// connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UlnConfig {
	/// Number of block confirmations required before verification.
	pub confirmations: u64,
	/// DVNs that must all verify a message.
	#[serde(default)]
	pub required_dvns: Vec<OmniAddress>,
	/// DVNs of which a threshold must verify a message.
	#[serde(default)]
	pub optional_dvns: Vec<OmniAddress>,
	/// How many optional DVNs must verify.
	#[serde(default)]
	pub optional_dvn_threshold: u8,
}

impl UlnConfig {
	/// Semantic equality: DVN lists are compared as normalized sets, so
	/// ordering and address casing differences are not diffs.
	pub fn matches(&self, other: &UlnConfig) -> bool {
		fn normalized(addresses: &[OmniAddress]) -> BTreeSet<OmniAddress> {
			addresses.iter().map(|a| normalize_address(a)).collect()
		}

		self.confirmations == other.confirmations
			&& self.optional_dvn_threshold == other.optional_dvn_threshold
			&& normalized(&self.required_dvns) == normalized(&other.required_dvns)
			&& normalized(&self.optional_dvns) == normalized(&other.optional_dvns)
	}
}

/// Message-execution configuration for the sending direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
	/// Maximum message size the executor accepts, in bytes.
	pub max_message_size: u32,
	/// The executor contract address.
	pub executor: OmniAddress,
}

impl ExecutorConfig {
	/// Semantic equality over the normalized executor address.
	pub fn matches(&self, other: &ExecutorConfig) -> bool {
		self.max_message_size == other.max_message_size
			&& addresses_equal(&self.executor, &other.executor)
	}
}

/// Declared receive library selection for a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveLibraryConfig {
	/// The library that should verify inbound messages.
	pub receive_library: OmniAddress,
	/// Blocks during which the previous library stays valid.
	#[serde(default)]
	pub grace_period: u64,
}

/// Expiring fallback window for a previously active receive library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeout {
	/// The library the timeout applies to.
	pub lib: OmniAddress,
	/// Block number at which the fallback expires.
	pub expiry: u64,
}

impl Timeout {
	pub fn matches(&self, other: &Timeout) -> bool {
		self.expiry == other.expiry && addresses_equal(&self.lib, &other.lib)
	}
}

/// One configuration write destined for a message library.
///
/// This is the canonical shape handed to `EndpointSdk::set_config`; the
/// adapter encodes it into whatever the chain expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetConfigParam {
	/// The remote endpoint this configuration applies to.
	pub eid: EndpointId,
	/// The configuration payload.
	pub config: SetConfig,
}

/// The payload of a [`SetConfigParam`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SetConfig {
	Executor(ExecutorConfig),
	Uln(UlnConfig),
}

/// Declared activation state for one read channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadChannelConfig {
	/// The read channel identifier.
	pub channel_id: u32,
	/// Whether the channel should be active. Absent means active.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub active: Option<bool>,
}

impl ReadChannelConfig {
	/// The desired activation state, defaulting to active.
	pub fn is_active(&self) -> bool {
		self.active.unwrap_or(true)
	}
}

/// Declared per-deployment (node) configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAppNodeConfig {
	/// Desired owner of the deployment.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub owner: Option<OmniAddress>,
	/// Desired delegate authorized to change endpoint configuration.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub delegate: Option<OmniAddress>,
	/// Desired caller fee cap in basis points.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub caller_bps_cap: Option<u128>,
	/// Desired activation state per read channel, for read-enabled
	/// deployments. Absent means "leave the channels alone".
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub read_channel_configs: Option<Vec<ReadChannelConfig>>,
}

/// Declared sending-direction configuration for a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAppSendConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub executor_config: Option<ExecutorConfig>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uln_config: Option<UlnConfig>,
}

/// Declared receiving-direction configuration for a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAppReceiveConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uln_config: Option<UlnConfig>,
}

/// Declared per-connection (edge) configuration.
///
/// Every field is optional; an absent field means "leave that facet
/// alone", never "reset to default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAppEdgeConfig {
	/// The library that should send outbound messages.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub send_library: Option<OmniAddress>,
	/// The library that should verify inbound messages.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub receive_library_config: Option<ReceiveLibraryConfig>,
	/// Fallback window for a library being rotated out.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub receive_library_timeout_config: Option<Timeout>,
	/// ULN and executor settings for the sending direction.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub send_config: Option<OAppSendConfig>,
	/// ULN settings for the receiving direction.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub receive_config: Option<OAppReceiveConfig>,
	/// Execution parameter presets enforced per message type.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub enforced_options: Option<Vec<EnforcedOptions>>,
}
