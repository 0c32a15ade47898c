//  AUTHENTICATOR.rs
//    by Lut99
//
//  Created:
//    14 Jan 2025, 10:48:19
//  Last edited:
//    18 Feb 2025, 14:05:12
//  Auto updated?
//    Yes
//
//  Description:
//!   Provides the actual [`TokenAuthenticator`] implementation, which
//!   verifies bearer tokens against an OIDC issuer.
//

use std::collections::HashMap;
use std::str::FromStr as _;
use std::time::Duration;

use http::StatusCode;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};
use reqwest::{Certificate, Client};
use serde::Deserialize;
use serde_json::Value;
use specifications::requestauthn::HttpError;
use specifications::{CaContentProvider, Identity, TokenAuthenticator};
use thiserror::Error;
use tracing::{Level, debug, info, span};

use crate::keys::{self, KeyStore};


/***** CONSTANTS *****/
/// The well-known path at which every issuer publishes its discovery document.
pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// How long to wait on any single HTTP call to the issuer before giving up.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);





/***** ERRORS *****/
/// Defines the errors that may occur when constructing an [`OidcTokenAuthenticator`].
#[derive(Debug, Error)]
pub enum NewError {
    /// The given CA bundle parsed, but held no certificates at all.
    #[error("CA bundle does not contain any certificates")]
    CaBundleEmpty,
    /// The given CA bundle was not parsable as PEM.
    #[error("Failed to parse CA bundle as PEM")]
    CaBundleParse {
        #[source]
        err: reqwest::Error,
    },
    /// Failed to build the HTTP client used to talk to the issuer.
    #[error("Failed to build HTTP client")]
    ClientBuild {
        #[source]
        err: reqwest::Error,
    },
    /// No client ID was given.
    #[error("Client ID cannot be empty")]
    ClientIdEmpty,
    /// The discovery endpoint answered something that is not a discovery document.
    #[error("Failed to deserialize contents of {url:?} as a discovery document")]
    DiscoveryDeserialize {
        url: String,
        #[source]
        err: reqwest::Error,
    },
    /// Failed to reach the discovery endpoint.
    #[error("Failed to fetch discovery document from {url:?}")]
    DiscoveryFetch {
        url: String,
        #[source]
        err: reqwest::Error,
    },
    /// The discovery endpoint answered, but not with a success status.
    #[error("Discovery endpoint {url:?} returned status {status}")]
    DiscoveryFetchStatus { url: String, status: StatusCode },
    /// The issuer registers itself under another name than the one configured.
    #[error("Issuer registered at {url:?} calls itself {registered:?}, but the authenticator is configured for {configured:?}")]
    IssuerMismatch { url: String, configured: String, registered: String },
    /// No issuer URL was given.
    #[error("Issuer URL cannot be empty")]
    IssuerUrlEmpty,
    /// Failed to fetch the initial key set from the issuer.
    #[error("Failed to fetch initial JWK set")]
    KeySetInit {
        #[source]
        err: keys::ServerError,
    },
    /// One of the configured signing algorithms is not a known JWT algorithm.
    #[error("Unknown signing algorithm {raw:?}")]
    UnknownAlgorithm {
        raw: String,
        #[source]
        err: jsonwebtoken::errors::Error,
    },
    /// No username claim was given.
    #[error("Username claim cannot be empty")]
    UsernameClaimEmpty,
}

/// Represents server-side errors which the client can't fix.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A key was resolved, but could not be turned into something to verify with.
    #[error("Failed to construct decoding key from JWK {kid:?}")]
    KeyDecode {
        kid: Option<String>,
        #[source]
        err: jsonwebtoken::errors::Error,
    },
    /// The embedded [`KeyStore`] failed to resolve a key due to some server-side error.
    #[error("Failed to resolve signing key")]
    KeyResolve {
        #[source]
        err: keys::ServerError,
    },
}

/// Represents client-side errors which the server can't fix.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The JWT is signed with an algorithm outside the accepted list.
    #[error("JWT is signed with {alg:?}, which is not an accepted algorithm (accepted: {allowed:?})")]
    AlgNotAllowed { alg: Algorithm, allowed: Vec<Algorithm> },
    /// The given token was not a valid JWT.
    #[error("Illegal JWT {raw:?}")]
    IllegalJwt {
        raw: String,
        #[source]
        err: jsonwebtoken::errors::Error,
    },
    /// The groups claim had an invalid type.
    #[error("JWT claim {claim:?} has an invalid type: only strings and arrays of strings allowed (value: {value:?})")]
    JwtIllegalGroupsType { claim: String, value: String },
    /// The username claim had an invalid type.
    #[error("JWT claim {claim:?} has an invalid type: only strings and integers allowed (value: {value:?})")]
    JwtIllegalType { claim: String, value: String },
    /// The JWT did not have the username claim we're looking for.
    #[error("Username claim {claim:?} not found in JWT")]
    JwtMissingUsernameClaim { claim: String },
    /// Failed to validate the JWT against the resolved key.
    #[error("Failed to validate JWT")]
    JwtValidate {
        #[source]
        err: jsonwebtoken::errors::Error,
    },
    /// The embedded [`KeyStore`] failed to resolve a key due to some client-side error.
    #[error("Failed to resolve signing key")]
    KeyResolve {
        #[source]
        err: keys::ClientError,
    },
}
impl HttpError for ClientError {
    #[inline]
    fn status_code(&self) -> StatusCode {
        use ClientError::*;
        match self {
            IllegalJwt { .. } | JwtIllegalGroupsType { .. } | JwtIllegalType { .. } | JwtMissingUsernameClaim { .. } => StatusCode::BAD_REQUEST,
            AlgNotAllowed { .. } | JwtValidate { .. } => StatusCode::UNAUTHORIZED,
            KeyResolve { err } => err.status_code(),
        }
    }
}





/***** AUXILLARY *****/
/// The parts of the issuer's discovery document that the authenticator consumes.
#[derive(Clone, Debug, Deserialize)]
pub struct DiscoveryDocument {
    /// The name the issuer registers itself under. Must match the configured issuer URL exactly.
    pub issuer:   String,
    /// The endpoint where the issuer publishes its signing keys.
    pub jwks_uri: String,
}

/// Options for constructing an [`OidcTokenAuthenticator`].
///
/// Every field is taken at face value when building this struct. Whatever validation happens,
/// happens in [`OidcTokenAuthenticator::new()`].
#[derive(Clone, Debug)]
pub struct Options<P> {
    /// The URL of the OIDC issuer whose tokens we accept. Tokens must carry it in `iss`.
    pub issuer_url: String,
    /// The OAuth2 client ID of this service. Tokens must carry it in `aud`.
    pub client_id:  String,
    /// The root certificates to trust when calling the issuer. [`None`] means the system roots.
    pub ca_content: Option<P>,

    /// The claim that carries the username.
    pub username_claim:  String,
    /// Prefixed to every username to namespace it from users of other authenticators.
    pub username_prefix: String,
    /// The claim that carries the user's groups. An empty name disables group resolution.
    pub groups_claim:    String,
    /// Prefixed to every resolved group.
    pub groups_prefix:   String,

    /// The names of the JWT signing algorithms to accept. An empty list defaults to `RS256`.
    pub supported_signing_algs: Vec<String>,
}





/***** HELPER FUNCTIONS *****/
/// Parses the configured signing algorithm names into [`Algorithm`]s.
///
/// # Arguments
/// - `raw`: The algorithm names as configured. An empty list defaults to
///   [`RS256`](Algorithm::RS256).
///
/// # Returns
/// The parsed algorithms, in the order they were given.
///
/// # Errors
/// This function errors on the first name that is not a known JWT signing algorithm.
fn parse_signing_algs(raw: &[String]) -> Result<Vec<Algorithm>, NewError> {
    if raw.is_empty() {
        return Ok(vec![Algorithm::RS256]);
    }
    let mut algs: Vec<Algorithm> = Vec::with_capacity(raw.len());
    for name in raw {
        algs.push(Algorithm::from_str(name).map_err(|err| NewError::UnknownAlgorithm { raw: name.clone(), err })?);
    }
    Ok(algs)
}

/// Maps the claims of a validated JWT to an [`Identity`].
///
/// # Arguments
/// - `claims`: The full claim map of the token.
/// - `username_claim`: The claim to read the username from.
/// - `username_prefix`: Prefixed to the resolved username.
/// - `groups_claim`: The claim to read the groups from. An empty name resolves no groups.
/// - `groups_prefix`: Prefixed to every resolved group.
///
/// # Returns
/// The [`Identity`] the token asserts.
///
/// # Errors
/// This function errors if the username claim is missing, or if either claim has a type we don't
/// accept. A missing groups claim is not an error; it simply resolves no groups.
fn resolve_identity(
    claims: &HashMap<String, Value>,
    username_claim: &str,
    username_prefix: &str,
    groups_claim: &str,
    groups_prefix: &str,
) -> Result<Identity, ClientError> {
    // Resolve the username first
    let username: String = match claims.get(username_claim) {
        Some(Value::Number(v)) => format!("{username_prefix}{v}"),
        Some(Value::String(v)) => format!("{username_prefix}{v}"),
        Some(other) => return Err(ClientError::JwtIllegalType { claim: username_claim.into(), value: format!("{other:?}") }),
        None => return Err(ClientError::JwtMissingUsernameClaim { claim: username_claim.into() }),
    };

    // Then the groups, if we're asked to resolve them at all
    let mut groups: Vec<String> = Vec::new();
    if !groups_claim.is_empty() {
        match claims.get(groups_claim) {
            Some(Value::String(v)) => groups.push(format!("{groups_prefix}{v}")),
            Some(Value::Array(vs)) => {
                groups.reserve(vs.len());
                for v in vs {
                    match v {
                        Value::String(v) => groups.push(format!("{groups_prefix}{v}")),
                        other => return Err(ClientError::JwtIllegalGroupsType { claim: groups_claim.into(), value: format!("{other:?}") }),
                    }
                }
            },
            Some(other) => return Err(ClientError::JwtIllegalGroupsType { claim: groups_claim.into(), value: format!("{other:?}") }),
            // A token without the claim simply belongs to no groups
            None => {},
        }
    }

    Ok(Identity { username, groups })
}





/***** LIBRARY *****/
/// Authenticates bearer tokens as JWTs minted by a preconfigured OIDC issuer.
#[derive(Debug)]
pub struct OidcTokenAuthenticator {
    /// The issuer whose tokens we accept.
    issuer_url: String,
    /// The audience that tokens must be minted for.
    client_id:  String,

    /// The claim we read usernames from.
    username_claim:  String,
    /// Prefixed to every username.
    username_prefix: String,
    /// The claim we read groups from, unless empty.
    groups_claim:    String,
    /// Prefixed to every group.
    groups_prefix:   String,

    /// The signing algorithms we accept.
    algs: Vec<Algorithm>,
    /// The keystore that we use to verify JWTs.
    keys: KeyStore,
}
impl OidcTokenAuthenticator {
    /// Constructor for the OidcTokenAuthenticator.
    ///
    /// This resolves the issuer's discovery document and pulls in its initial key set, so it
    /// needs the issuer to be reachable.
    ///
    /// # Arguments
    /// - `options`: The [`Options`] describing which issuer to trust and how to read identities
    ///   from its tokens.
    ///
    /// # Returns
    /// A new OidcTokenAuthenticator that can verify bearer tokens minted by the issuer.
    ///
    /// # Errors
    /// This function errors if the options are unusable (empty issuer URL, client ID or username
    /// claim, unknown signing algorithm, bad CA bundle), or if the issuer could not be resolved
    /// (discovery unreachable, issuer name mismatch, key set unreachable).
    pub async fn new<P: CaContentProvider>(options: Options<P>) -> Result<Self, NewError> {
        let _span = span!(Level::INFO, "OidcTokenAuthenticator::new");
        info!("Setting up OIDC token authentication for issuer {:?}", options.issuer_url);

        // Constraint checks on the options
        if options.issuer_url.is_empty() {
            return Err(NewError::IssuerUrlEmpty);
        }
        if options.client_id.is_empty() {
            return Err(NewError::ClientIdEmpty);
        }
        if options.username_claim.is_empty() {
            return Err(NewError::UsernameClaimEmpty);
        }
        let algs: Vec<Algorithm> = parse_signing_algs(&options.supported_signing_algs)?;
        debug!("Accepting signing algorithms {algs:?}");

        // Build the HTTP client, pinned to the given CA bundle if there is one
        let mut builder = Client::builder().use_rustls_tls().timeout(HTTP_TIMEOUT);
        if let Some(ca) = &options.ca_content {
            let certs: Vec<Certificate> = Certificate::from_pem_bundle(ca.current_ca_bundle()).map_err(|err| NewError::CaBundleParse { err })?;
            if certs.is_empty() {
                return Err(NewError::CaBundleEmpty);
            }
            debug!("Trusting {} certificate(s) from the configured CA bundle", certs.len());
            builder = builder.tls_built_in_root_certs(false);
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }
        let client: Client = builder.build().map_err(|err| NewError::ClientBuild { err })?;

        // Ask the issuer where it keeps its keys
        let url: String = format!("{}{}", options.issuer_url.trim_end_matches('/'), DISCOVERY_PATH);
        debug!("Fetching discovery document from {url:?}...");
        let res = client.get(&url).send().await.map_err(|err| NewError::DiscoveryFetch { url: url.clone(), err })?;
        if !res.status().is_success() {
            return Err(NewError::DiscoveryFetchStatus { url, status: res.status() });
        }
        let doc: DiscoveryDocument = res.json().await.map_err(|err| NewError::DiscoveryDeserialize { url: url.clone(), err })?;
        if doc.issuer != options.issuer_url {
            return Err(NewError::IssuerMismatch { url, configured: options.issuer_url, registered: doc.issuer });
        }

        // Pull in the initial key set
        let keys: KeyStore = KeyStore::new(client, doc.jwks_uri).await.map_err(|err| NewError::KeySetInit { err })?;

        info!("OIDC token authentication ready for issuer {:?}", options.issuer_url);
        Ok(Self {
            issuer_url: options.issuer_url,
            client_id: options.client_id,
            username_claim: options.username_claim,
            username_prefix: options.username_prefix,
            groups_claim: options.groups_claim,
            groups_prefix: options.groups_prefix,
            algs,
            keys,
        })
    }
}
impl TokenAuthenticator for OidcTokenAuthenticator {
    type ClientError = ClientError;
    type Context = Identity;
    type ServerError = ServerError;


    async fn authenticate_token(&self, token: &str) -> Result<Result<Self::Context, Self::ClientError>, Self::ServerError> {
        let _span = span!(Level::INFO, "OidcTokenAuthenticator::authenticate_token");
        info!("Verifying bearer token against issuer {:?}", self.issuer_url);

        // Peek at the header to learn how the token claims to be signed
        let header: Header = match jsonwebtoken::decode_header(token) {
            Ok(header) => header,
            Err(err) => return Ok(Err(ClientError::IllegalJwt { raw: token.into(), err })),
        };
        debug!("JWT header: {header:?}");
        if !self.algs.contains(&header.alg) {
            return Ok(Err(ClientError::AlgNotAllowed { alg: header.alg, allowed: self.algs.clone() }));
        }

        // Find the key that supposedly signed it
        debug!("Resolving key in keystore...");
        let jwk: Jwk = match self.keys.resolve(header.kid.as_deref()).await {
            Ok(Ok(jwk)) => jwk,
            Ok(Err(err)) => return Ok(Err(ClientError::KeyResolve { err })),
            Err(err) => return Err(ServerError::KeyResolve { err }),
        };
        let key: DecodingKey = match DecodingKey::from_jwk(&jwk) {
            Ok(key) => key,
            Err(err) => return Err(ServerError::KeyDecode { kid: jwk.common.key_id.clone(), err }),
        };

        // Validate the token against it
        let mut validation = Validation::new(header.alg);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.set_issuer(&[&self.issuer_url]);
        validation.set_audience(&[&self.client_id]);
        debug!("Validating JWT with {:?}...", header.alg);
        let result = match jsonwebtoken::decode::<HashMap<String, Value>>(token, &key, &validation) {
            Ok(result) => result,
            Err(err) => return Ok(Err(ClientError::JwtValidate { err })),
        };
        debug!("Validating OK");

        // All that's left is to read the identity off the claims
        Ok(resolve_identity(&result.claims, &self.username_claim, &self.username_prefix, &self.groups_claim, &self.groups_prefix))
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Shorthand for building a claim map from a JSON object.
    fn claims(value: Value) -> HashMap<String, Value> { serde_json::from_value(value).unwrap() }


    #[test]
    fn test_resolve_identity_applies_prefixes() {
        let claims = claims(json!({ "email": "amy@example.com", "groups": ["dev", "ops"] }));
        let id: Identity = resolve_identity(&claims, "email", "oidc:", "groups", "oidc:").unwrap();
        assert_eq!(id.username, "oidc:amy@example.com");
        assert_eq!(id.groups, vec!["oidc:dev".to_string(), "oidc:ops".to_string()]);
    }

    #[test]
    fn test_resolve_identity_accepts_numeric_usernames() {
        let claims = claims(json!({ "sub": 42 }));
        let id: Identity = resolve_identity(&claims, "sub", "user-", "", "").unwrap();
        assert_eq!(id.username, "user-42");
        assert!(id.groups.is_empty());
    }

    #[test]
    fn test_resolve_identity_accepts_a_single_string_group() {
        let claims = claims(json!({ "sub": "amy", "groups": "dev" }));
        let id: Identity = resolve_identity(&claims, "sub", "", "groups", "grp:").unwrap();
        assert_eq!(id.groups, vec!["grp:dev".to_string()]);
    }

    #[test]
    fn test_resolve_identity_without_groups() {
        // An empty claim name disables group resolution altogether...
        let with_groups = claims(json!({ "sub": "amy", "groups": ["dev"] }));
        let id: Identity = resolve_identity(&with_groups, "sub", "", "", "grp:").unwrap();
        assert!(id.groups.is_empty());

        // ...and a token without the claim simply has none
        let without_groups = claims(json!({ "sub": "amy" }));
        let id: Identity = resolve_identity(&without_groups, "sub", "", "groups", "grp:").unwrap();
        assert!(id.groups.is_empty());
    }

    #[test]
    fn test_resolve_identity_requires_the_username_claim() {
        let claims = claims(json!({ "email": "amy@example.com" }));
        let err: ClientError = resolve_identity(&claims, "sub", "", "", "").unwrap_err();
        assert!(matches!(err, ClientError::JwtMissingUsernameClaim { .. }));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_resolve_identity_rejects_odd_types() {
        let bool_username = claims(json!({ "sub": true }));
        assert!(matches!(resolve_identity(&bool_username, "sub", "", "", "").unwrap_err(), ClientError::JwtIllegalType { .. }));

        let object_groups = claims(json!({ "sub": "amy", "groups": { "dev": true } }));
        assert!(matches!(resolve_identity(&object_groups, "sub", "", "groups", "").unwrap_err(), ClientError::JwtIllegalGroupsType { .. }));

        let mixed_groups = claims(json!({ "sub": "amy", "groups": ["dev", 1] }));
        assert!(matches!(resolve_identity(&mixed_groups, "sub", "", "groups", "").unwrap_err(), ClientError::JwtIllegalGroupsType { .. }));
    }

    #[test]
    fn test_parse_signing_algs_defaults_to_rs256() {
        assert_eq!(parse_signing_algs(&[]).unwrap(), vec![Algorithm::RS256]);
    }

    #[test]
    fn test_parse_signing_algs_keeps_order() {
        let raw: Vec<String> = vec!["ES256".into(), "RS512".into(), "HS256".into()];
        assert_eq!(parse_signing_algs(&raw).unwrap(), vec![Algorithm::ES256, Algorithm::RS512, Algorithm::HS256]);
    }

    #[test]
    fn test_parse_signing_algs_rejects_unknown_names() {
        let raw: Vec<String> = vec!["RS256".into(), "ROT13".into()];
        assert!(matches!(parse_signing_algs(&raw).unwrap_err(), NewError::UnknownAlgorithm { raw, .. } if raw == "ROT13"));
    }
}
