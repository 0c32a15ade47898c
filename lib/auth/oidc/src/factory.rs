//  FACTORY.rs
//    by Lut99
//
//  Created:
//    16 Jan 2025, 09:33:41
//  Last edited:
//    18 Feb 2025, 15:02:36
//  Auto updated?
//    Yes
//
//  Description:
//!   Wires an [`OidcConfig`] into a ready-to-use [`RequestAuthenticator`].
//

use bearer_token::BearerResolver;
use oidc_token::{OidcTokenAuthenticator, Options};
use thiserror::Error;
use tracing::{Level, info, span};

use crate::cabundle::CaBundle;
use crate::config::OidcConfig;


/***** ERRORS *****/
/// Defines the errors that may occur when [building](new_authenticator()) an
/// [`OidcAuthenticator`].
///
/// Both variants render as the underlying error, unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read the configured CA file.
    #[error(transparent)]
    CaFile { err: std::io::Error },
    /// The token verifier rejected the configuration or could not reach the issuer.
    #[error(transparent)]
    Verifier { err: oidc_token::NewError },
}





/***** AUXILLARY *****/
/// The authenticator that [`new_authenticator()`] produces.
pub type OidcAuthenticator = BearerResolver<OidcTokenAuthenticator>;





/***** HELPER FUNCTIONS *****/
/// Copies the configuration into options for the token verifier, field for field.
///
/// No transformation, validation or defaulting happens here. Whether the fields make sense is up
/// to [`OidcTokenAuthenticator::new()`].
///
/// # Arguments
/// - `config`: The [`OidcConfig`] to copy.
/// - `ca`: The already-loaded [`CaBundle`] to hand to the verifier.
///
/// # Returns
/// The [`Options`] to build the verifier with.
fn verifier_options(config: &OidcConfig, ca: CaBundle) -> Options<CaBundle> {
    Options {
        issuer_url: config.issuer_url.clone(),
        client_id: config.client_id.clone(),
        ca_content: Some(ca),
        username_claim: config.username_claim.clone(),
        username_prefix: config.username_prefix.clone(),
        groups_claim: config.groups_claim.clone(),
        groups_prefix: config.groups_prefix.clone(),
        supported_signing_algs: config.supported_signing_algs.clone(),
    }
}





/***** LIBRARY *****/
/// Builds a [`RequestAuthenticator`](specifications::RequestAuthenticator) that accepts bearer
/// tokens minted by the configured OIDC issuer.
///
/// Construction is a single linear sequence: snapshot the CA file, hand the configuration to the
/// token verifier as-is, wrap whatever comes out so it can read tokens off incoming requests.
/// There are no retries and no fallbacks; if any step fails, the whole build fails.
///
/// # Arguments
/// - `config`: The [`OidcConfig`] describing which issuer to trust and how to read identities
///   from its tokens.
///
/// # Returns
/// An [`OidcAuthenticator`], ready to be hooked into a server's authentication chain.
///
/// # Errors
/// This function errors if the CA file could not be read, or if the verifier rejected the
/// configuration. Either error is yielded exactly as the underlying step produced it.
pub async fn new_authenticator(config: &OidcConfig) -> Result<OidcAuthenticator, Error> {
    let _span = span!(Level::INFO, "new_authenticator");
    info!("Setting up OIDC request authentication for issuer {:?}", config.issuer_url);

    // Snapshot the CA bundle first; nothing else happens if this fails
    let ca: CaBundle = CaBundle::from_file(&config.ca_file).map_err(|err| Error::CaFile { err })?;

    // The verifier does all validation; the bearer wrap cannot fail
    let verifier: OidcTokenAuthenticator = OidcTokenAuthenticator::new(verifier_options(config, ca)).await.map_err(|err| Error::Verifier { err })?;
    Ok(BearerResolver::new(verifier))
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::path::PathBuf;
    use std::{env, fs, process};

    use specifications::CaContentProvider as _;

    use super::*;

    /// A configuration with every field filled in, pointing at the given CA file.
    fn example_config(ca_file: PathBuf) -> OidcConfig {
        OidcConfig {
            issuer_url: "https://issuer.example.com".into(),
            client_id: "my-client".into(),
            ca_file,
            username_claim: "email".into(),
            username_prefix: "oidc:".into(),
            groups_claim: "groups".into(),
            groups_prefix: "oidc:".into(),
            supported_signing_algs: vec!["RS256".into()],
        }
    }


    #[test]
    fn test_verifier_options_copy_the_config_one_to_one() {
        let path: PathBuf = env::temp_dir().join(format!("oidc-auth-factory-{}-dummy.pem", process::id()));
        fs::write(&path, b"DUMMY-CERT").unwrap();
        let config: OidcConfig = example_config(path.clone());

        let ca: CaBundle = CaBundle::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        let options: Options<CaBundle> = verifier_options(&config, ca);

        assert_eq!(options.issuer_url, "https://issuer.example.com");
        assert_eq!(options.client_id, "my-client");
        assert_eq!(options.username_claim, "email");
        assert_eq!(options.username_prefix, "oidc:");
        assert_eq!(options.groups_claim, "groups");
        assert_eq!(options.groups_prefix, "oidc:");
        assert_eq!(options.supported_signing_algs, vec!["RS256".to_string()]);
        assert_eq!(options.ca_content.unwrap().current_ca_bundle(), b"DUMMY-CERT");
    }

    #[tokio::test]
    async fn test_fails_on_a_missing_ca_file() {
        let config: OidcConfig = example_config(env::temp_dir().join(format!("oidc-auth-factory-{}-missing.pem", process::id())));
        match new_authenticator(&config).await.unwrap_err() {
            Error::CaFile { err } => assert_eq!(err.kind(), ErrorKind::NotFound),
            err => panic!("expected a CA file error, got {err:?}"),
        }
    }

    #[tokio::test]
    async fn test_fails_on_an_empty_ca_path_before_touching_the_verifier() {
        // The empty issuer URL would be refused by the verifier, but the CA read comes first
        let mut config: OidcConfig = example_config(PathBuf::new());
        config.issuer_url = String::new();
        assert!(matches!(new_authenticator(&config).await.unwrap_err(), Error::CaFile { .. }));
    }
}
