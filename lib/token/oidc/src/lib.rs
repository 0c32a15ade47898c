//  LIB.rs
//    by Lut99
//
//  Created:
//    14 Jan 2025, 10:44:57
//  Last edited:
//    14 Jan 2025, 11:19:02
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements an OIDC-backed scheme for the `TokenAuthenticator`:
//!   bearer tokens are verified as JWTs against a preconfigured issuer.
//

// Modules
mod authenticator;
pub mod keys;

// Use some of it into the main namespace
pub use authenticator::*;
