//  LIB.rs
//    by Lut99
//
//  Created:
//    13 Jan 2025, 13:57:04
//  Last edited:
//    17 Feb 2025, 10:20:13
//  Auto updated?
//    Yes
//
//  Description:
//!   Establishes who is behind incoming HTTP requests, for use in an API
//!   server's authentication chain.
//

// Import the libraries
pub mod middleware {
    #[cfg(feature = "axum-middleware")]
    pub use axum_middleware as axum;
}

pub mod auth {
    #[cfg(feature = "anonymous-auth")]
    pub use anonymous_auth as anonymous;
    #[cfg(feature = "oidc-auth")]
    pub use oidc_auth as oidc;
}

pub mod request {
    #[cfg(feature = "bearer-token")]
    pub use bearer_token as bearer;
}

pub mod token {
    #[cfg(feature = "oidc-token")]
    pub use oidc_token as oidc;
}

pub use specifications as spec;
