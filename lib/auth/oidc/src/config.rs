//  CONFIG.rs
//    by Lut99
//
//  Created:
//    16 Jan 2025, 09:30:18
//  Last edited:
//    18 Feb 2025, 14:40:33
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the configuration with which the OIDC authenticator is
//!   built.
//

use std::path::PathBuf;

use serde::{Deserialize, Serialize};


/***** LIBRARY *****/
/// Configuration for the OIDC authenticator.
///
/// The fields are handed to the token verifier as-is when the authenticator is
/// [built](crate::new_authenticator()). No defaulting or validation happens at this level;
/// whatever constraints apply are enforced by
/// [`OidcTokenAuthenticator::new()`](oidc_token::OidcTokenAuthenticator::new()). Fields absent
/// from a parsed configuration simply pass through as empty.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct OidcConfig {
    /// The URL of the OIDC issuer whose tokens are accepted.
    #[serde(default)]
    pub issuer_url: String,
    /// The OAuth2 client ID that accepted tokens must be minted for.
    #[serde(default)]
    pub client_id:  String,
    /// Path to a PEM file with the root certificates to trust when calling the issuer. The file
    /// is read exactly once, when the authenticator is built.
    #[serde(default)]
    pub ca_file:    PathBuf,

    /// The claim to read usernames from.
    #[serde(default)]
    pub username_claim:  String,
    /// Prefixed to every username to namespace it from users of other authenticators.
    #[serde(default)]
    pub username_prefix: String,
    /// The claim to read group memberships from. An empty name disables group resolution.
    #[serde(default)]
    pub groups_claim:    String,
    /// Prefixed to every resolved group.
    #[serde(default)]
    pub groups_prefix:   String,

    /// The names of the JWT signing algorithms to accept. An empty list defaults to `RS256`.
    #[serde(default)]
    pub supported_signing_algs: Vec<String>,
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_pass_through_as_empty() {
        let config: OidcConfig = serde_json::from_str("{}").unwrap();
        assert!(config.issuer_url.is_empty());
        assert!(config.client_id.is_empty());
        assert!(config.ca_file.as_os_str().is_empty());
        assert!(config.username_claim.is_empty());
        assert!(config.supported_signing_algs.is_empty());
    }

    #[test]
    fn test_reads_a_full_config() {
        let config: OidcConfig = serde_json::from_str(
            r#"{
                "issuer_url": "https://issuer.example.com",
                "client_id": "my-client",
                "ca_file": "/etc/ssl/oidc-ca.pem",
                "username_claim": "email",
                "username_prefix": "oidc:",
                "groups_claim": "groups",
                "groups_prefix": "oidc:",
                "supported_signing_algs": ["RS256", "ES256"]
            }"#,
        )
        .unwrap();
        assert_eq!(config.issuer_url, "https://issuer.example.com");
        assert_eq!(config.client_id, "my-client");
        assert_eq!(config.ca_file, PathBuf::from("/etc/ssl/oidc-ca.pem"));
        assert_eq!(config.username_claim, "email");
        assert_eq!(config.supported_signing_algs, vec!["RS256".to_string(), "ES256".to_string()]);
    }
}
