//  MIDDLEWARE.rs
//    by Lut99
//
//  Created:
//    17 Jan 2025, 13:44:21
//  Last edited:
//    18 Feb 2025, 15:40:57
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the authentication middleware itself.
//

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use error_trace::ErrorTrace as _;
use specifications::RequestAuthenticator;
use specifications::requestauthn::HttpError;
use thiserror::Error;
use tracing::{Level, error, info, span};


/***** ERRORS *****/
/// Simple wrapper for erroring and freezing the result.
#[derive(Debug, Error)]
enum Error<E> {
    #[error("Failed to authenticate incoming request")]
    AuthenticateFailed {
        #[source]
        err: E,
    },
}
impl<E: 'static + HttpError> HttpError for Error<E> {
    #[inline]
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticateFailed { err } => err.status_code(),
        }
    }
}





/***** LIBRARY *****/
/// Authenticates every request before it reaches its handler.
///
/// On success, the resolved [`Context`](RequestAuthenticator::Context) is injected into the
/// request's extensions for handlers to pick up. On failure, the request is answered directly and
/// never reaches its handler.
#[derive(Debug)]
pub struct AuthMiddleware<A> {
    /// The authenticator that decides who is behind each request.
    auth: A,
}
impl<A> AuthMiddleware<A> {
    /// Constructor for the AuthMiddleware.
    ///
    /// # Arguments
    /// - `auth`: The [`RequestAuthenticator`] that decides who is behind each request.
    ///
    /// # Returns
    /// A new AuthMiddleware, to be wrapped in an [`Arc`] and hung before the routes to protect
    /// (see [`AuthMiddleware::check()`]).
    #[inline]
    pub fn new(auth: A) -> Self { Self { auth } }
}
impl<A> AuthMiddleware<A>
where
    A: RequestAuthenticator,
    A::Context: 'static + Send + Sync + Clone,
    A::ClientError: 'static,
    A::ServerError: 'static,
{
    /// The middleware function itself.
    ///
    /// Hang it before the routes to protect with
    /// `axum::middleware::from_fn_with_state(middleware, AuthMiddleware::check)`, where
    /// `middleware` is an [`Arc`]-wrapped [`AuthMiddleware`].
    ///
    /// # Arguments
    /// - `context`: The [`AuthMiddleware`] wrapping the authenticator to run requests by.
    /// - `request`: The incoming [`Request`].
    /// - `next`: The [`Next`] middleware or handler to run if the request authenticates.
    ///
    /// # Returns
    /// The [`Response`] of the rest of the chain if the request authenticated, or else a response
    /// describing what went wrong. Client-side failures answer with the error's own status code
    /// and a JSON rendering of its trace; server-side failures answer with a plain
    /// 500 INTERNAL SERVER ERROR and keep the details in the logs.
    pub async fn check(State(context): State<Arc<Self>>, mut request: Request, next: Next) -> Response {
        let _span = span!(Level::INFO, "AuthMiddleware::check");

        // Do the auth thingy
        let identity: A::Context = match context.auth.authenticate(request.headers()).await {
            Ok(Ok(identity)) => identity,
            Ok(Err(err)) => {
                let err = Error::AuthenticateFailed { err };
                info!("{}", err.trace());
                let mut res =
                    Response::new(Body::from(serde_json::to_string(&err.freeze()).unwrap_or_else(|err| panic!("Failed to serialize Trace: {err}"))));
                *res.status_mut() = err.status_code();
                return res;
            },
            Err(err) => {
                let err = Error::AuthenticateFailed { err };
                error!("{}", err.trace());
                let mut res = Response::new(Body::from(err.to_string()));
                *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                return res;
            },
        };

        // If we found an identity, then inject it in the request as an extension; then continue
        request.extensions_mut().insert(identity);
        next.run(request).await
    }
}





/***** TESTS *****/
