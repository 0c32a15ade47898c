//  KEYS.rs
//    by Lut99
//
//  Created:
//    14 Jan 2025, 11:02:36
//  Last edited:
//    18 Feb 2025, 13:27:44
//  Auto updated?
//    Yes
//
//  Description:
//!   Fetches and caches the JSON Web Key set that an issuer publishes.
//

use std::sync::RwLock;
use std::time::{Duration, Instant};

use http::StatusCode;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use reqwest::Client;
use specifications::requestauthn::HttpError;
use thiserror::Error;
use tracing::{Level, debug, span};


/***** CONSTANTS *****/
/// Minimum time between two refetches of the key set that are triggered by unknown keys.
const REFRESH_COOLDOWN: Duration = Duration::from_secs(30);





/***** ERRORS *****/
/// Defines the errors originating from the [`KeyStore`] which are the server's fault.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The lock protecting the cached set was poisoned by a panicking thread.
    #[error("Internal JWK set lock was poisoned")]
    LockPoisoned,
    /// Failed to deserialize what the endpoint returned as a JWK set.
    #[error("Failed to deserialize contents of {url:?} as a JWK set")]
    SetDeserialize {
        url: String,
        #[source]
        err: reqwest::Error,
    },
    /// Failed to reach the JWK set endpoint.
    #[error("Failed to fetch JWK set from {url:?}")]
    SetFetch {
        url: String,
        #[source]
        err: reqwest::Error,
    },
    /// The JWK set endpoint answered, but not with a success status.
    #[error("JWK set endpoint {url:?} returned status {status}")]
    SetFetchStatus { url: String, status: StatusCode },
}

/// Defines the errors originating from the [`KeyStore`] which are the client's fault.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The JWT names no key ID while the issuer publishes more than one key.
    #[error("JWT has no key ID, which is only accepted when the issuer publishes exactly one key (it publishes {keys})")]
    MissingKeyId { keys: usize },
    /// The suggested key ID wasn't found in the (possibly refreshed) set.
    #[error("Unknown key with ID {kid:?}")]
    UnknownKeyId { kid: String },
}
impl HttpError for ClientError {
    #[inline]
    fn status_code(&self) -> StatusCode {
        use ClientError::*;
        match self {
            MissingKeyId { .. } => StatusCode::BAD_REQUEST,
            UnknownKeyId { .. } => StatusCode::NOT_FOUND,
        }
    }
}





/***** HELPER FUNCTIONS *****/
/// Finds the key matching the given key ID in the given set.
///
/// # Arguments
/// - `keys`: The [`JwkSet`] to search.
/// - `kid`: The key ID named by the JWT header, if any. A token without one is only matched when
///   the set holds exactly one key.
///
/// # Returns
/// A clone of the matching [`Jwk`], or [`None`] if there is no (unambiguous) match.
fn find_in(keys: &JwkSet, kid: Option<&str>) -> Option<Jwk> {
    match kid {
        Some(kid) => keys.find(kid).cloned(),
        None => {
            if keys.keys.len() == 1 {
                keys.keys.first().cloned()
            } else {
                None
            }
        },
    }
}





/***** LIBRARY *****/
/// Caches the key set published by an issuer, refreshing it when an unknown key shows up.
#[derive(Debug)]
pub struct KeyStore {
    /// The client used to fetch the set. Carries whatever root store was configured at setup.
    client:       Client,
    /// The endpoint that publishes the set (the `jwks_uri` of the discovery document).
    url:          String,
    /// The set as we last saw it.
    keys:         RwLock<JwkSet>,
    /// When an unknown key last forced a refetch, if ever. The initial fetch does not count.
    last_refresh: RwLock<Option<Instant>>,
}
impl KeyStore {
    /// Constructor for the KeyStore that pulls in the initial key set.
    ///
    /// # Arguments
    /// - `client`: The [`Client`] to fetch the set with, now and on later refreshes.
    /// - `url`: The endpoint that publishes the set.
    ///
    /// # Returns
    /// A new KeyStore with a freshly fetched set.
    ///
    /// # Errors
    /// This function errors if the initial fetch fails, for the same reasons
    /// [`KeyStore::refresh()`] can fail.
    pub async fn new(client: Client, url: impl Into<String>) -> Result<Self, ServerError> {
        let this = Self { client, url: url.into(), keys: RwLock::new(JwkSet { keys: Vec::new() }), last_refresh: RwLock::new(None) };
        this.refresh().await?;
        Ok(this)
    }

    /// Resolves the given key ID to a key, refreshing the cached set if it is unknown.
    ///
    /// Such miss-triggered refetches run at most once per cooldown window; within the window,
    /// unknown keys are reported without touching the network again.
    ///
    /// # Arguments
    /// - `kid`: The key ID named by the JWT header, if any. A token without one is only accepted
    ///   when the issuer publishes exactly one key.
    ///
    /// # Returns
    /// A clone of the matching [`Jwk`].
    ///
    /// # Errors
    /// There are two levels at which this function can fail:
    /// - The _outer_ [`Result`] carries fetch failures while refreshing the set; and
    /// - The _inner_ [`Result`] carries keys that the (possibly refreshed) set does not hold.
    pub async fn resolve(&self, kid: Option<&str>) -> Result<Result<Jwk, ClientError>, ServerError> {
        let _span = span!(Level::INFO, "KeyStore::resolve");

        // Serve from the cached set if we can
        {
            let keys = self.keys.read().map_err(|_| ServerError::LockPoisoned)?;
            if let Some(key) = find_in(&keys, kid) {
                return Ok(Ok(key));
            }
        }

        // The issuer may have rotated its keys since we last looked; fetch once more and retry.
        // Unknown keys may trigger such a refetch at most once per cooldown window.
        let refresh_due: bool = {
            let last = self.last_refresh.read().map_err(|_| ServerError::LockPoisoned)?;
            last.map_or(true, |at| at.elapsed() >= REFRESH_COOLDOWN)
        };
        if refresh_due {
            debug!("Key {kid:?} is not in the cached JWK set, refreshing...");
            self.refresh().await?;
            *self.last_refresh.write().map_err(|_| ServerError::LockPoisoned)? = Some(Instant::now());
        } else {
            debug!("Key {kid:?} is not in the cached JWK set, but it was refreshed recently; not refreshing");
        }

        let keys = self.keys.read().map_err(|_| ServerError::LockPoisoned)?;
        match find_in(&keys, kid) {
            Some(key) => Ok(Ok(key)),
            None => match kid {
                Some(kid) => Ok(Err(ClientError::UnknownKeyId { kid: kid.into() })),
                None => Ok(Err(ClientError::MissingKeyId { keys: keys.keys.len() })),
            },
        }
    }

    /// Replaces the cached set with whatever the endpoint currently publishes.
    ///
    /// # Errors
    /// This function errors if the endpoint could not be reached, answered a non-success status
    /// or answered something that does not parse as a JWK set.
    pub async fn refresh(&self) -> Result<(), ServerError> {
        debug!("Fetching JWK set from {:?}...", self.url);
        let res = self.client.get(&self.url).send().await.map_err(|err| ServerError::SetFetch { url: self.url.clone(), err })?;
        if !res.status().is_success() {
            return Err(ServerError::SetFetchStatus { url: self.url.clone(), status: res.status() });
        }
        let set: JwkSet = res.json().await.map_err(|err| ServerError::SetDeserialize { url: self.url.clone(), err })?;
        debug!("Fetched {} key(s) from {:?}", set.keys.len(), self.url);

        // Swap in the new set; the lock is never held across an await
        let mut keys = self.keys.write().map_err(|_| ServerError::LockPoisoned)?;
        *keys = set;
        Ok(())
    }
}
