//! Authenticator Unit Tests

use api_gateway::authenticator::{Authenticator, LoginRequest};
use api_gateway::credentials::Role;
use api_gateway::error::GatewayError;
use chrono::Utc;

use super::{codec, store};

fn authenticator() -> Authenticator {
    Authenticator::new(store(), codec())
}

#[test]
fn test_admin_login_returns_token_and_view() {
    let now = Utc::now();
    let outcome = authenticator().login(Some("admin"), Some("admin123"), now).unwrap();

    assert_eq!(outcome.user.user_id, 1);
    assert_eq!(outcome.user.username, "admin");
    assert_eq!(outcome.user.role, Role::Admin);
    assert_eq!(outcome.expires_at, now.timestamp() + 86_400);

    let identity = codec().parse_and_verify(&outcome.token, now).unwrap();
    assert_eq!(identity.username, "admin");
    assert_eq!(identity.role, Role::Admin);
}

#[test]
fn test_missing_credentials() {
    let auth = authenticator();
    let now = Utc::now();

    for (identity, secret) in [
        (None, None),
        (Some("admin"), None),
        (None, Some("admin123")),
        (Some(""), Some("admin123")),
        (Some("admin"), Some("")),
    ] {
        assert!(
            matches!(
                auth.login(identity, secret, now),
                Err(GatewayError::MissingCredentials)
            ),
            "{identity:?}/{secret:?}"
        );
    }
}

#[test]
fn test_unknown_identity_and_wrong_secret_are_indistinguishable() {
    let auth = authenticator();
    let now = Utc::now();

    let unknown = auth.login(Some("nobody"), Some("admin123"), now).unwrap_err();
    let wrong = auth.login(Some("admin"), Some("wrong"), now).unwrap_err();

    assert!(matches!(unknown, GatewayError::InvalidCredentials));
    assert!(matches!(wrong, GatewayError::InvalidCredentials));
    assert_eq!(unknown.to_response_body(), wrong.to_response_body());
}

#[test]
fn test_login_request_wrapper() {
    let request = LoginRequest {
        username: Some("user".to_string()),
        password: Some("user123".to_string()),
    };
    let outcome = authenticator().login_request(&request, Utc::now()).unwrap();
    assert_eq!(outcome.user.role, Role::User);

    let empty = LoginRequest::default();
    assert!(matches!(
        authenticator().login_request(&empty, Utc::now()),
        Err(GatewayError::MissingCredentials)
    ));
}
