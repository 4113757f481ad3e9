//! Utility functions for address normalization.
//!
//! Provider responses and declared configuration frequently disagree on
//! address casing. Comparing raw strings produces false-positive diffs, so
//! every comparison in the toolkit goes through these helpers.

use crate::coordinates::OmniAddress;

/// Normalizes an address for comparison purposes.
///
/// Hex addresses are lowercased; identifiers that are not `0x`-prefixed
/// (e.g. named accounts on non-EVM chains) are left untouched.
pub fn normalize_address(address: &str) -> OmniAddress {
	if address.starts_with("0x") || address.starts_with("0X") {
		address.to_lowercase()
	} else {
		address.to_string()
	}
}

/// Compares two addresses over their normalized forms.
pub fn addresses_equal(a: &str, b: &str) -> bool {
	normalize_address(a) == normalize_address(b)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_hex_addresses_compare_case_insensitively() {
		assert!(addresses_equal("0xAbCd", "0xabcd"));
		assert!(!addresses_equal("0xAbCd", "0xabce"));
	}

	#[test]
	fn test_non_hex_identifiers_are_untouched() {
		assert_eq!(normalize_address("MyOApp"), "MyOApp");
		assert!(!addresses_equal("MyOApp", "myoapp"));
	}
}
