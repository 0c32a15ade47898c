//  REQUESTAUTHN.rs
//    by Lut99
//
//  Created:
//    13 Jan 2025, 14:09:15
//  Last edited:
//    17 Feb 2025, 09:51:20
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the [`RequestAuthenticator`] trait, which can take an HTTP
//!   request and use it to establish who sent it.
//

use std::convert::Infallible;
use std::error::Error;
use std::future::Future;

use http::{HeaderMap, StatusCode};


/***** AUXILLARY *****/
/// Extends an [`Error`] with the ability to associate status codes with it.
pub trait HttpError: Error {
    /// Returns the status code associated with this error.
    ///
    /// # Returns
    /// A [`StatusCode`].
    fn status_code(&self) -> StatusCode;
}

// Authenticators that cannot fail still need to name an error type.
impl HttpError for Infallible {
    #[inline]
    fn status_code(&self) -> StatusCode { match *self {} }
}





/***** LIBRARY *****/
/// An authenticator that takes an HTTP request and (hopefully) establishes the identity behind it.
///
/// Note that the RequestAuthenticator is intended to be used in a distributed context. As such,
/// any reference to `self` is done immutably only.
pub trait RequestAuthenticator {
    /// Something produced by the authenticator that can later be used to identify the user (e.g.,
    /// some identifier).
    type Context;
    /// Client-side errors produced by the RequestAuthenticator.
    type ClientError: HttpError;
    /// Server-side errors produced by the RequestAuthenticator.
    type ServerError: Error;


    /// Authenticates the given HTTP request by its headers.
    ///
    /// # Arguments
    /// - `headers`: The headers of the HTTP request to authenticate.
    ///
    /// # Returns
    /// A [`RequestAuthenticator::Context`] that can be used to identify the user later.
    ///
    /// # Errors
    /// This function can error when it fails to authenticate the user. There are two levels at
    /// which it can do so:
    /// - The _outer_ [`Result`] is used to indicate _server_ errors (e.g., identity provider
    ///   unreachable, etc); and
    /// - The _inner_ [`Result`] is used to indicate _user_ errors (e.g., no token, bad token,
    ///   etc).
    ///
    /// The first will always result in a (vague) 500 INTERNAL SERVER ERROR to the user, whereas
    /// the second may communicate custom status codes.
    fn authenticate(&self, headers: &HeaderMap) -> impl Send + Future<Output = Result<Result<Self::Context, Self::ClientError>, Self::ServerError>>;
}
