//  LIB.rs
//    by Lut99
//
//  Created:
//    15 Jan 2025, 10:22:10
//  Last edited:
//    15 Jan 2025, 10:41:56
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements a [`RequestAuthenticator`] that treats everybody as the
//!   anonymous user.
//

use std::convert::Infallible;

use http::HeaderMap;
use specifications::{Identity, RequestAuthenticator};
use tracing::debug;


/***** CONSTANTS *****/
/// The username assigned to every request.
pub const ANONYMOUS_USERNAME: &str = "system:anonymous";

/// The single group that every request is made a member of.
pub const ANONYMOUS_GROUP: &str = "system:unauthenticated";





/***** LIBRARY *****/
/// Defines a [`RequestAuthenticator`] that doesn't look at the request at all.
///
/// Every request resolves to the [anonymous user](ANONYMOUS_USERNAME), member of the
/// [unauthenticated group](ANONYMOUS_GROUP) only. Useful as the final fallback in an
/// authentication chain, or to run a server without authentication altogether.
#[derive(Clone, Copy, Debug)]
pub struct AnonymousResolver;
impl Default for AnonymousResolver {
    #[inline]
    fn default() -> Self { Self::new() }
}
impl AnonymousResolver {
    /// Constructor for the AnonymousResolver.
    ///
    /// # Returns
    /// A new AnonymousResolver that will happily let everybody through.
    #[inline]
    pub const fn new() -> Self { Self }
}
impl RequestAuthenticator for AnonymousResolver {
    type Context = Identity;
    type ClientError = Infallible;
    type ServerError = Infallible;

    #[inline]
    async fn authenticate(&self, _headers: &HeaderMap) -> Result<Result<Self::Context, Self::ClientError>, Self::ServerError> {
        debug!("Resolving request as the anonymous user");
        Ok(Ok(Identity { username: ANONYMOUS_USERNAME.into(), groups: vec![ANONYMOUS_GROUP.into()] }))
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_everybody_as_anonymous() {
        let auth = AnonymousResolver::new();
        let id: Identity = auth.authenticate(&HeaderMap::new()).await.unwrap().unwrap();
        assert_eq!(id.username, ANONYMOUS_USERNAME);
        assert_eq!(id.groups, vec![ANONYMOUS_GROUP.to_string()]);
    }
}
