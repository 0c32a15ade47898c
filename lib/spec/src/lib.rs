//  LIB.rs
//    by Lut99
//
//  Created:
//    13 Jan 2025, 14:02:51
//  Last edited:
//    17 Feb 2025, 09:48:33
//  Auto updated?
//    Yes
//
//  Description:
//!   Provides public interfaces for things to be compatible with the
//!   request authentication library.
//

// Declare modules
pub mod cacontent;
pub mod identity;
pub mod requestauthn;
pub mod tokenauthn;

// Import some things into the main scope
pub use cacontent::CaContentProvider;
pub use identity::Identity;
pub use requestauthn::RequestAuthenticator;
pub use tokenauthn::TokenAuthenticator;
