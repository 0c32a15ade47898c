//  LIB.rs
//    by Lut99
//
//  Created:
//    15 Jan 2025, 11:02:44
//  Last edited:
//    18 Feb 2025, 13:58:21
//  Auto updated?
//    Yes
//
//  Description:
//!   Lifts any [`TokenAuthenticator`] into a [`RequestAuthenticator`] by
//!   reading bearer tokens from the HTTP `Authorization`-header.
//

use std::error::Error;

use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue, StatusCode};
use specifications::requestauthn::HttpError;
use specifications::{RequestAuthenticator, TokenAuthenticator};
use thiserror::Error;
use tracing::{Level, debug, info, span};


/***** ERRORS *****/
/// Represents server-side errors which the client can't fix.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The wrapped [`TokenAuthenticator`] failed in a way the client cannot fix.
    #[error("Failed to authenticate bearer token")]
    TokenAuthenticate { err: Box<dyn 'static + Send + Error> },
}

/// Represents client-side errors which the server can't fix.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The given 'Authorization'-header did not contain valid UTF-8.
    #[error("Value of header {header:?} in request is non-UTF-8")]
    AuthHeaderNonUtf8 {
        header: &'static str,
        #[source]
        err:    http::header::ToStrError,
    },
    /// No 'Authorization' header found in request.
    #[error("Missing header {header:?} in request")]
    AuthHeaderNotFound { header: &'static str },
    /// The given 'Authorization'-header was missing the 'Bearer '-part.
    #[error("Missing \"Bearer \" in header {header:?} in request (raw value: {raw:?})")]
    MissingBearer { header: &'static str, raw: String },
    /// The wrapped [`TokenAuthenticator`] rejected the token.
    #[error("Failed to authenticate bearer token")]
    TokenAuthenticate { err: Box<dyn 'static + Send + HttpError> },
}
impl HttpError for ClientError {
    #[inline]
    fn status_code(&self) -> StatusCode {
        use ClientError::*;
        match self {
            AuthHeaderNonUtf8 { .. } | AuthHeaderNotFound { .. } | MissingBearer { .. } => StatusCode::BAD_REQUEST,
            TokenAuthenticate { err } => err.status_code(),
        }
    }
}





/***** HELPER FUNCTIONS *****/
/// Given a (potentially present) `Authorization`-header, attempts to extract the bearer token
/// from it.
///
/// # Arguments
/// - `name`: The name of the Authorization header. Only used for error reporting in this
///   function.
/// - `value`: The [`HeaderValue`] representing what is in the header (or [`None`] if it isn't
///   present).
///
/// # Returns
/// The token carried in the header, without the `Bearer `-prefix.
///
/// # Errors
/// This function may error if the header isn't present, or doesn't bear a valid token (e.g.,
/// missing "Bearer" in the token field).
fn extract_token<'h>(name: &'static str, value: Option<&'h HeaderValue>) -> Result<&'h str, ClientError> {
    // Get the header value as a string
    let header_val: &str = match value {
        Some(v) => match v.to_str() {
            Ok(v) => v,
            Err(err) => return Err(ClientError::AuthHeaderNonUtf8 { header: name, err }),
        },
        None => {
            return Err(ClientError::AuthHeaderNotFound { header: name });
        },
    };

    // Split on the bearer thingy
    if header_val.len() < 7 || &header_val[..7] != "Bearer " {
        return Err(ClientError::MissingBearer { header: name, raw: header_val.into() });
    }

    // OK, let's go
    Ok(&header_val[7..])
}





/***** LIBRARY *****/
/// Authenticates HTTP requests by the bearer token in their `Authorization`-header.
///
/// The actual token verification is delegated to the wrapped [`TokenAuthenticator`]. This type
/// only concerns itself with finding the token in the request.
#[derive(Debug)]
pub struct BearerResolver<T> {
    /// Verifies the tokens found in incoming requests.
    auth: T,
}
impl<T> BearerResolver<T> {
    /// Constructor for the BearerResolver.
    ///
    /// # Arguments
    /// - `auth`: The [`TokenAuthenticator`] that verifies the tokens found in incoming requests.
    ///
    /// # Returns
    /// A new instance of Self, ready to rumble.
    #[inline]
    pub fn new(auth: T) -> Self { Self { auth } }
}
impl<T> RequestAuthenticator for BearerResolver<T>
where
    T: Sync + TokenAuthenticator,
    T::Context: Send,
    T::ClientError: 'static + Send,
    T::ServerError: 'static + Send,
{
    type ClientError = ClientError;
    type Context = T::Context;
    type ServerError = ServerError;


    async fn authenticate(&self, headers: &HeaderMap) -> Result<Result<Self::Context, Self::ClientError>, Self::ServerError> {
        let _span = span!(Level::INFO, "BearerResolver::authenticate");
        info!("Handling bearer token authentication for incoming request");

        // Fetch the token from the header
        let token: &str = match extract_token(AUTHORIZATION.as_str(), headers.get(AUTHORIZATION.as_str())) {
            Ok(token) => token,
            Err(err) => return Ok(Err(err)),
        };
        debug!("Received bearer token {token:?}");

        // The rest is the token authenticator's call
        match self.auth.authenticate_token(token).await {
            Ok(Ok(context)) => Ok(Ok(context)),
            Ok(Err(err)) => Ok(Err(ClientError::TokenAuthenticate { err: Box::new(err) })),
            Err(err) => Err(ServerError::TokenAuthenticate { err: Box::new(err) }),
        }
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::fmt::{Display, Formatter, Result as FResult};

    use super::*;

    /// A [`TokenAuthenticator`] that accepts every token and echoes it back as context.
    struct Echo;
    impl TokenAuthenticator for Echo {
        type ClientError = Infallible;
        type Context = String;
        type ServerError = Infallible;

        async fn authenticate_token(&self, token: &str) -> Result<Result<Self::Context, Self::ClientError>, Self::ServerError> { Ok(Ok(token.into())) }
    }

    /// The error returned by [`Teapot`].
    #[derive(Debug)]
    struct TeapotError;
    impl Display for TeapotError {
        fn fmt(&self, f: &mut Formatter<'_>) -> FResult { write!(f, "token refused") }
    }
    impl Error for TeapotError {}
    impl HttpError for TeapotError {
        fn status_code(&self) -> StatusCode { StatusCode::IM_A_TEAPOT }
    }

    /// A [`TokenAuthenticator`] that refuses every token with its own status code.
    struct Teapot;
    impl TokenAuthenticator for Teapot {
        type ClientError = TeapotError;
        type Context = String;
        type ServerError = Infallible;

        async fn authenticate_token(&self, _token: &str) -> Result<Result<Self::Context, Self::ClientError>, Self::ServerError> { Ok(Err(TeapotError)) }
    }

    /// The error returned by [`Broken`].
    #[derive(Debug)]
    struct BrokenError;
    impl Display for BrokenError {
        fn fmt(&self, f: &mut Formatter<'_>) -> FResult { write!(f, "keystore unreachable") }
    }
    impl Error for BrokenError {}

    /// A [`TokenAuthenticator`] that fails internally on every token.
    struct Broken;
    impl TokenAuthenticator for Broken {
        type ClientError = Infallible;
        type Context = String;
        type ServerError = BrokenError;

        async fn authenticate_token(&self, _token: &str) -> Result<Result<Self::Context, Self::ClientError>, Self::ServerError> { Err(BrokenError) }
    }


    /// Builds a [`HeaderMap`] carrying the given `Authorization` value.
    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }


    #[tokio::test]
    async fn test_extracts_the_bearer_token() {
        let auth = BearerResolver::new(Echo);
        let context: String = auth.authenticate(&headers("Bearer abc.def.ghi")).await.unwrap().unwrap();
        assert_eq!(context, "abc.def.ghi");
    }

    #[tokio::test]
    async fn test_rejects_requests_without_the_header() {
        let auth = BearerResolver::new(Echo);
        let err: ClientError = auth.authenticate(&HeaderMap::new()).await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::AuthHeaderNotFound { .. }));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejects_headers_without_the_bearer_prefix() {
        let auth = BearerResolver::new(Echo);
        for raw in ["Basic dXNlcjpwYXNz", "Bearer", "bearer abc.def.ghi", ""] {
            let err: ClientError = auth.authenticate(&headers(raw)).await.unwrap().unwrap_err();
            assert!(matches!(err, ClientError::MissingBearer { .. }), "accepted {raw:?}");
        }
    }

    #[tokio::test]
    async fn test_rejects_non_utf8_headers() {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_bytes(b"Bearer \xFF\xFE").unwrap());

        let auth = BearerResolver::new(Echo);
        let err: ClientError = auth.authenticate(&map).await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::AuthHeaderNonUtf8 { .. }));
    }

    #[tokio::test]
    async fn test_wraps_token_rejections_with_their_status() {
        let auth = BearerResolver::new(Teapot);
        let err: ClientError = auth.authenticate(&headers("Bearer abc.def.ghi")).await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::TokenAuthenticate { .. }));
        assert_eq!(err.status_code(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn test_propagates_internal_failures() {
        let auth = BearerResolver::new(Broken);
        let err: ServerError = auth.authenticate(&headers("Bearer abc.def.ghi")).await.unwrap_err();
        assert!(matches!(err, ServerError::TokenAuthenticate { .. }));
    }
}
