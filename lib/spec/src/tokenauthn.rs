//  TOKENAUTHN.rs
//    by Lut99
//
//  Created:
//    13 Jan 2025, 14:21:48
//  Last edited:
//    17 Feb 2025, 09:52:41
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the [`TokenAuthenticator`] trait, which can take a bearer
//!   token that was already lifted out of a request and establish the
//!   identity it asserts.
//

use std::error::Error;
use std::future::Future;

use crate::requestauthn::HttpError;


/***** LIBRARY *****/
/// An authenticator that takes a raw bearer token and (hopefully) establishes the identity it
/// asserts.
///
/// This is one level below the [`RequestAuthenticator`](crate::RequestAuthenticator): something
/// else has already found the token in the request, and this trait decides what it means. Like
/// its parent, it is intended to be used in a distributed context, and as such any reference to
/// `self` is done immutably only.
pub trait TokenAuthenticator {
    /// Something produced by the authenticator that can later be used to identify the user (e.g.,
    /// some identifier).
    type Context;
    /// Client-side errors produced by the TokenAuthenticator.
    type ClientError: HttpError;
    /// Server-side errors produced by the TokenAuthenticator.
    type ServerError: Error;


    /// Authenticates the given bearer token.
    ///
    /// # Arguments
    /// - `token`: The raw token as it appeared in the request, without any scheme prefix.
    ///
    /// # Returns
    /// A [`TokenAuthenticator::Context`] that can be used to identify the user later.
    ///
    /// # Errors
    /// This function can error when it fails to authenticate the token. There are two levels at
    /// which it can do so:
    /// - The _outer_ [`Result`] is used to indicate _server_ errors (e.g., identity provider
    ///   unreachable, etc); and
    /// - The _inner_ [`Result`] is used to indicate _user_ errors (e.g., expired token, unknown
    ///   key, etc).
    ///
    /// The first will always result in a (vague) 500 INTERNAL SERVER ERROR to the user, whereas
    /// the second may communicate custom status codes.
    fn authenticate_token(&self, token: &str) -> impl Send + Future<Output = Result<Result<Self::Context, Self::ClientError>, Self::ServerError>>;
}
