//  LIB.rs
//    by Lut99
//
//  Created:
//    16 Jan 2025, 09:28:55
//  Last edited:
//    16 Jan 2025, 09:44:10
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements an OpenID Connect (OIDC)-based scheme for the
//!   `RequestAuthenticator`.
//

// Modules
mod cabundle;
mod config;
mod factory;

// Use some of it into the main namespace
pub use cabundle::*;
pub use config::*;
pub use factory::*;
