//! Token Tampering Property Tests
//!
//! Changing any single character of a valid token must make it unverifiable.

use api_gateway::jwt::{DEFAULT_TOKEN_TTL_SECONDS, TokenCodec};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use secrecy::SecretString;

use super::generators::{BASE64URL, arb_principal};

fn codec() -> TokenCodec {
    TokenCodec::new(
        &SecretString::from("property-test-signing-secret-0123456789".to_string()),
        DEFAULT_TOKEN_TTL_SECONDS,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: a single-character substitution anywhere is rejected
    #[test]
    fn prop_substituted_token_rejected(
        principal in arb_principal(),
        position in any::<prop::sample::Index>(),
        replacement in any::<prop::sample::Index>(),
    ) {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let codec = codec();
        let token = codec.issue(&principal, now).unwrap().token;

        let mut bytes = token.clone().into_bytes();
        let at = position.index(bytes.len());
        prop_assume!(bytes[at] != b'.');

        let before = bytes[at];
        let mut candidate = BASE64URL[replacement.index(BASE64URL.len())];
        if candidate == before {
            candidate = if before == b'A' { b'B' } else { b'A' };
        }
        bytes[at] = candidate;
        let tampered = String::from_utf8(bytes).unwrap();

        prop_assert!(codec.parse_and_verify(&tampered, now).is_err());
    }

    /// Property: truncation is rejected
    #[test]
    fn prop_truncated_token_rejected(
        principal in arb_principal(),
        cut in any::<prop::sample::Index>(),
    ) {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let codec = codec();
        let token = codec.issue(&principal, now).unwrap().token;
        let keep = cut.index(token.len());

        prop_assert!(codec.parse_and_verify(&token[..keep], now).is_err());
    }
}
