//! Credential Property Tests

use api_gateway::credentials::{CredentialStore, Principal, Role, StaticCredentialStore};
use proptest::prelude::*;
use secrecy::SecretString;

use super::generators::{arb_secret, arb_username};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: a secret matches only itself
    #[test]
    fn prop_secret_matches_exactly(stored in arb_secret(), candidate in arb_secret()) {
        let principal = Principal::new("p", 1, Role::User, &SecretString::from(stored.clone()));
        prop_assert!(principal.secret_matches(&stored));
        prop_assert_eq!(principal.secret_matches(&candidate), stored == candidate);
    }

    /// Property: lookup finds exactly the configured identities
    #[test]
    fn prop_lookup_by_identity(
        names in prop::collection::hash_set(arb_username(), 1..8),
        probe in arb_username(),
    ) {
        let principals: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Principal::new(name.clone(), i as u64 + 1, Role::User, &SecretString::from("s".to_string()))
            })
            .collect();
        let store = StaticCredentialStore::new(principals).unwrap();

        prop_assert_eq!(store.len(), names.len());
        prop_assert_eq!(store.lookup(&probe).is_ok(), names.contains(&probe));
        for name in &names {
            let found = store.lookup(name).unwrap();
            prop_assert_eq!(found.identity(), name.as_str());
        }
    }
}
