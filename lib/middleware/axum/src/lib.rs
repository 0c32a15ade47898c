//  LIB.rs
//    by Lut99
//
//  Created:
//    17 Jan 2025, 13:41:33
//  Last edited:
//    17 Jan 2025, 13:50:22
//  Auto updated?
//    Yes
//
//  Description:
//!   Hooks any [`RequestAuthenticator`](specifications::RequestAuthenticator)
//!   into an `axum` server as a middleware layer.
//

// Modules
mod middleware;

// Use local parts
pub use middleware::*;
