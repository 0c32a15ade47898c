//  CACONTENT.rs
//    by Lut99
//
//  Created:
//    13 Jan 2025, 14:35:27
//  Last edited:
//    13 Jan 2025, 15:04:10
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the [`CaContentProvider`] trait, which hands out the root
//!   certificates to trust when talking to an identity provider.
//


/***** LIBRARY *****/
/// Hands out the CA bundle to trust when connecting to an identity provider.
///
/// Implementers are expected to return the same bytes on every call for as long as they live.
/// Whoever needs fresher contents builds a new provider; there is no reload going through this
/// trait.
pub trait CaContentProvider {
    /// Returns the CA bundle as a raw PEM byte sequence.
    ///
    /// This is a pure accessor. It performs no I/O, cannot fail, and returns content identical to
    /// what it returned on any earlier call.
    ///
    /// # Returns
    /// The cached bytes of the bundle.
    fn current_ca_bundle(&self) -> &[u8];
}
