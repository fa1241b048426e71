//! Path-parameter format checks.
//!
//! Slots and addresses fail fast on malformed input; signatures get only a
//! minimal alphabet check, with anything subtler left to the upstream node
//! to reject (an unknown-but-plausible signature is a 404, not a 400).

use super::ParamIssue;

/// Base58 alphabet used by Solana addresses and signatures.
fn is_base58(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
        })
}

/// Parses a slot path segment as a non-negative integer.
///
/// # Errors
///
/// Returns a [`ParamIssue`] when the segment is not a valid `u64`.
pub fn parse_slot(raw: &str) -> Result<u64, ParamIssue> {
    raw.parse::<u64>()
        .map_err(|_| ParamIssue::new("slot", format!("must be a non-negative number, got {raw:?}")))
}

/// Checks that an address path segment is plausibly a Solana pubkey:
/// base58, 32-44 characters, decoding to exactly 32 bytes.
///
/// # Errors
///
/// Returns a [`ParamIssue`] describing the failed constraint.
pub fn check_address(raw: &str) -> Result<(), ParamIssue> {
    if raw.is_empty() {
        return Err(ParamIssue::new("address", "is required"));
    }
    if !(32..=44).contains(&raw.len()) || !is_base58(raw) {
        return Err(ParamIssue::new("address", "must be a base58 string of 32-44 characters"));
    }
    match bs58::decode(raw).into_vec() {
        Ok(bytes) if bytes.len() == 32 => Ok(()),
        _ => Err(ParamIssue::new("address", "must decode to a 32-byte public key")),
    }
}

/// Checks that a signature path segment is non-empty base58.
///
/// Length is deliberately not enforced: signatures of unusual length are
/// forwarded upstream and surface as not-found rather than bad-request.
///
/// # Errors
///
/// Returns a [`ParamIssue`] when the segment is empty or not base58.
pub fn check_signature(raw: &str) -> Result<(), ParamIssue> {
    if raw.is_empty() {
        return Err(ParamIssue::new("signature", "is required"));
    }
    if !is_base58(raw) {
        return Err(ParamIssue::new("signature", "must be a base58 string"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    #[test]
    fn slot_parses_digits_only() {
        assert_eq!(parse_slot("12345").unwrap(), 12345);
        assert_eq!(parse_slot("0").unwrap(), 0);
        assert!(parse_slot("-1").is_err());
        assert!(parse_slot("12abc").is_err());
        assert!(parse_slot("").is_err());
    }

    #[test]
    fn address_accepts_real_pubkeys() {
        assert!(check_address(USDC_MINT).is_ok());
        assert!(check_address("11111111111111111111111111111111").is_ok());
    }

    #[test]
    fn address_rejects_bad_input() {
        assert!(check_address("").is_err());
        assert!(check_address("short").is_err());
        // 'l' is outside the base58 alphabet
        assert!(check_address("l1111111111111111111111111111111").is_err());
        // right length, wrong decoded size
        assert!(check_address("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").is_err());
    }

    #[test]
    fn signature_checks_alphabet_only() {
        assert!(check_signature("5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW").is_ok());
        // short but base58: allowed, resolved upstream
        assert!(check_signature("abc").is_ok());
        assert!(check_signature("").is_err());
        assert!(check_signature("not-base58!").is_err());
    }
}
