//  IDENTITY.rs
//    by Lut99
//
//  Created:
//    13 Jan 2025, 14:42:09
//  Last edited:
//    14 Jan 2025, 10:11:55
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the identity that authenticators establish for a request.
//

use serde::{Deserialize, Serialize};


/***** LIBRARY *****/
/// Defines what is known about whoever sent an authenticated request.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Identity {
    /// The name of the user, as asserted by the identity provider.
    pub username: String,
    /// The groups the user belongs to. May be empty if the authenticator doesn't do groups.
    pub groups:   Vec<String>,
}
