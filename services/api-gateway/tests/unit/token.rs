//! Token Codec Unit Tests
//!
//! Expiry boundary, signature checks and the validation pipeline.

use api_gateway::credentials::Role;
use api_gateway::jwt::{Token, TokenCodec, TokenError, DEFAULT_TOKEN_TTL_SECONDS};
use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use super::{TEST_SECRET, admin, codec, secret, user};

#[test]
fn test_issue_then_verify_preserves_identity() {
    let now = Utc::now();
    let issued = codec().issue(&user(), now).unwrap();

    let identity = codec().parse_and_verify(&issued.token, now).unwrap();
    assert_eq!(identity.user_id, 2);
    assert_eq!(identity.username, "user");
    assert_eq!(identity.role, Role::User);
    assert_eq!(identity.issued_at, now.timestamp());
    assert_eq!(identity.expires_at, now.timestamp() + DEFAULT_TOKEN_TTL_SECONDS);
}

#[test]
fn test_expiry_boundary_is_strict() {
    let issued_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let token = codec().issue(&admin(), issued_at).unwrap().token;
    let exp = issued_at + Duration::seconds(DEFAULT_TOKEN_TTL_SECONDS);

    assert!(codec().parse_and_verify(&token, exp - Duration::seconds(1)).is_ok());
    assert!(matches!(
        codec().parse_and_verify(&token, exp),
        Err(TokenError::Expired { .. })
    ));
    assert!(matches!(
        codec().parse_and_verify(&token, exp + Duration::seconds(1)),
        Err(TokenError::Expired { .. })
    ));
}

#[test]
fn test_foreign_secret_rejected() {
    let now = Utc::now();
    let foreign = TokenCodec::new(
        &secret("another-signing-secret-abcdefghijklmnopqrstuv"),
        DEFAULT_TOKEN_TTL_SECONDS,
    );
    let token = foreign.issue(&admin(), now).unwrap().token;

    assert!(matches!(
        codec().parse_and_verify(&token, now),
        Err(TokenError::BadSignature)
    ));
}

#[test]
fn test_structurally_invalid_tokens_are_malformed() {
    let now = Utc::now();
    for raw in ["", "abc", "a.b", "a.b.c.d", "not.a.token"] {
        assert!(
            matches!(codec().parse_and_verify(raw, now), Err(TokenError::Malformed { .. })),
            "{raw}"
        );
    }
}

#[test]
fn test_typestate_pipeline() {
    let now = Utc::now();
    let raw = codec().issue(&admin(), now).unwrap().token;

    let unvalidated = Token::parse(&raw, Algorithm::HS256).unwrap();
    assert_eq!(unvalidated.state_name(), "Unvalidated");

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let signed = unvalidated
        .verify_signature(&DecodingKey::from_secret(TEST_SECRET.as_bytes()), &validation)
        .unwrap();
    assert_eq!(signed.peek_claims().username, "admin");

    let validated = signed.validate_expiry(now).unwrap();
    assert_eq!(validated.claims().role, Role::Admin);
    assert_eq!(validated.into_identity().user_id, 1);
}

#[test]
fn test_unexpected_algorithm_is_malformed() {
    let raw = codec().issue(&admin(), Utc::now()).unwrap().token;
    assert!(matches!(
        Token::parse(&raw, Algorithm::RS256),
        Err(TokenError::Malformed { .. })
    ));
}
