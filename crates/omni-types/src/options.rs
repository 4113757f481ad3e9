//! Execution-options encoding for enforced options.
//!
//! Enforced options are per-message-type execution parameter presets (gas
//! limits, native drops) stored on-chain in the compact type-3 options
//! format: a `u16` format version followed by a sequence of
//! `worker id (u8) | option length (u16) | option type (u8) | params`
//! entries, all big-endian. The encoding is compared as a lowercase hex
//! string, which is also how the on-chain value is read back.

use crate::coordinates::OmniAddress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Options format version understood by this encoder.
const OPTIONS_TYPE_3: u16 = 3;
/// Worker id of the executor, the only worker this toolkit configures.
const WORKER_ID_EXECUTOR: u8 = 1;

const OPTION_TYPE_LZ_RECEIVE: u8 = 1;
const OPTION_TYPE_NATIVE_DROP: u8 = 2;
const OPTION_TYPE_COMPOSE: u8 = 3;
const OPTION_TYPE_ORDERED_EXECUTION: u8 = 4;

/// Errors that can occur while encoding execution options.
#[derive(Debug, Clone, Error)]
pub enum OptionsError {
	/// The native-drop receiver is not a valid 32-byte hex value.
	#[error("Invalid native drop receiver {0}: expected a hex value of at most 32 bytes")]
	InvalidReceiver(String),
}

/// Builder for the bit-packed type-3 options value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsBuilder {
	buffer: Vec<u8>,
}

impl Default for OptionsBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl OptionsBuilder {
	pub fn new() -> Self {
		Self {
			buffer: OPTIONS_TYPE_3.to_be_bytes().to_vec(),
		}
	}

	fn add_executor_option(&mut self, option_type: u8, params: &[u8]) {
		self.buffer.push(WORKER_ID_EXECUTOR);
		// The option length covers the option type byte plus its params
		self.buffer
			.extend_from_slice(&((params.len() as u16 + 1).to_be_bytes()));
		self.buffer.push(option_type);
		self.buffer.extend_from_slice(params);
	}

	/// Adds a message-execution gas preset; `value` is appended only when
	/// non-zero, matching the canonical on-chain encoding.
	pub fn add_executor_lz_receive_option(mut self, gas: u128, value: u128) -> Self {
		let mut params = gas.to_be_bytes().to_vec();
		if value > 0 {
			params.extend_from_slice(&value.to_be_bytes());
		}
		self.add_executor_option(OPTION_TYPE_LZ_RECEIVE, &params);
		self
	}

	/// Adds a native token drop to a 32-byte receiver.
	pub fn add_executor_native_drop_option(
		mut self,
		amount: u128,
		receiver: &str,
	) -> Result<Self, OptionsError> {
		let mut params = amount.to_be_bytes().to_vec();
		params.extend_from_slice(&decode_bytes32(receiver)?);
		self.add_executor_option(OPTION_TYPE_NATIVE_DROP, &params);
		Ok(self)
	}

	/// Adds a gas preset for the composed message at `index`.
	pub fn add_executor_compose_option(mut self, index: u16, gas: u128, value: u128) -> Self {
		let mut params = index.to_be_bytes().to_vec();
		params.extend_from_slice(&gas.to_be_bytes());
		if value > 0 {
			params.extend_from_slice(&value.to_be_bytes());
		}
		self.add_executor_option(OPTION_TYPE_COMPOSE, &params);
		self
	}

	/// Requests ordered message execution; carries no parameters.
	pub fn add_executor_ordered_execution_option(mut self) -> Self {
		self.add_executor_option(OPTION_TYPE_ORDERED_EXECUTION, &[]);
		self
	}

	/// Renders the encoded options as a lowercase `0x` hex string.
	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(&self.buffer))
	}
}

/// Decodes a hex value into a left-padded 32-byte array.
fn decode_bytes32(value: &str) -> Result<[u8; 32], OptionsError> {
	let stripped = value.strip_prefix("0x").unwrap_or(value);
	let bytes =
		hex::decode(stripped).map_err(|_| OptionsError::InvalidReceiver(value.to_string()))?;
	if bytes.len() > 32 {
		return Err(OptionsError::InvalidReceiver(value.to_string()));
	}

	let mut padded = [0u8; 32];
	padded[32 - bytes.len()..].copy_from_slice(&bytes);
	Ok(padded)
}

/// One declared enforced-option entry for a message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "option_type", rename_all = "snake_case")]
pub enum EnforcedOptions {
	/// Gas and value preset for plain message execution.
	LzReceive {
		msg_type: u16,
		gas: u128,
		#[serde(default)]
		value: u128,
	},
	/// Native token drop delivered alongside the message.
	NativeDrop {
		msg_type: u16,
		amount: u128,
		receiver: OmniAddress,
	},
	/// Gas and value preset for a composed message.
	Compose {
		msg_type: u16,
		index: u16,
		gas: u128,
		#[serde(default)]
		value: u128,
	},
	/// Ordered execution request.
	OrderedExecution { msg_type: u16 },
}

impl EnforcedOptions {
	/// The application message type this entry applies to.
	pub fn msg_type(&self) -> u16 {
		match self {
			EnforcedOptions::LzReceive { msg_type, .. }
			| EnforcedOptions::NativeDrop { msg_type, .. }
			| EnforcedOptions::Compose { msg_type, .. }
			| EnforcedOptions::OrderedExecution { msg_type } => *msg_type,
		}
	}
}

/// Merges enforced-option entries by message type, encoding each group in
/// declaration order into a single options value.
pub fn enforced_options_by_msg_type(
	options: &[EnforcedOptions],
) -> Result<BTreeMap<u16, String>, OptionsError> {
	let mut builders: BTreeMap<u16, OptionsBuilder> = BTreeMap::new();

	for option in options {
		let builder = builders
			.remove(&option.msg_type())
			.unwrap_or_else(OptionsBuilder::new);

		let builder = match option {
			EnforcedOptions::LzReceive { gas, value, .. } => {
				builder.add_executor_lz_receive_option(*gas, *value)
			}
			EnforcedOptions::NativeDrop {
				amount, receiver, ..
			} => builder.add_executor_native_drop_option(*amount, receiver)?,
			EnforcedOptions::Compose {
				index, gas, value, ..
			} => builder.add_executor_compose_option(*index, *gas, *value),
			EnforcedOptions::OrderedExecution { .. } => {
				builder.add_executor_ordered_execution_option()
			}
		};

		builders.insert(option.msg_type(), builder);
	}

	Ok(builders
		.into_iter()
		.map(|(msg_type, builder)| (msg_type, builder.to_hex()))
		.collect())
}
