//! Error Sanitization Property Tests
//!
//! Validates that caller-visible errors never carry internal detail.

use api_gateway::error::GatewayError;
use api_gateway::jwt::TokenError;
use proptest::prelude::*;

use super::generators::arb_sensitive_content;

fn arb_token_error() -> impl Strategy<Value = TokenError> {
    prop_oneof![
        Just(TokenError::BadSignature),
        any::<i64>().prop_map(|expired_at| TokenError::Expired { expired_at }),
        arb_sensitive_content().prop_map(|reason| TokenError::Malformed { reason }),
        arb_sensitive_content().prop_map(|reason| TokenError::Encoding { reason }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: every token failure produces the same body
    #[test]
    fn prop_token_failures_indistinguishable(error in arb_token_error()) {
        let body = GatewayError::from(error).to_response_body();
        prop_assert_eq!(body.error, "Authentication failed");
        prop_assert_eq!(body.message.as_str(), "Invalid or expired token");
    }

    /// Property: internal error details never reach the body
    #[test]
    fn prop_internal_details_hidden(sensitive in arb_sensitive_content()) {
        let err = GatewayError::Internal(anyhow::anyhow!("{sensitive}"));
        let body = serde_json::to_string(&err.to_response_body()).unwrap();
        prop_assert!(!body.contains(&sensitive));
    }
}
