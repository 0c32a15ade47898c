//  CABUNDLE.rs
//    by Lut99
//
//  Created:
//    16 Jan 2025, 09:31:02
//  Last edited:
//    18 Feb 2025, 14:44:57
//  Auto updated?
//    Yes
//
//  Description:
//!   Provides a [`CaContentProvider`] that reads a PEM bundle from disk
//!   once and serves it from memory afterwards.
//

use std::path::Path;
use std::{fs, io};

use specifications::CaContentProvider;
use tracing::debug;


/***** LIBRARY *****/
/// The contents of a CA bundle file, read once at load time.
///
/// Whatever was in the file at that moment is what
/// [`current_ca_bundle()`](CaBundle::current_ca_bundle()) serves for the rest of this value's
/// life. Changes to the file on disk are never observed.
#[derive(Clone, Debug)]
pub struct CaBundle {
    /// The raw bytes of the bundle as they were on disk.
    pem: Vec<u8>,
}
impl CaBundle {
    /// Reads the bundle at the given path.
    ///
    /// This is a blocking read. It is intended to be done once, at startup.
    ///
    /// # Arguments
    /// - `path`: The file to read.
    ///
    /// # Returns
    /// A new CaBundle serving a snapshot of the file's contents.
    ///
    /// # Errors
    /// This function errors if the file could not be read. The error is returned exactly as the
    /// underlying read produced it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let path: &Path = path.as_ref();
        debug!("Reading CA bundle from '{}'...", path.display());
        let pem: Vec<u8> = fs::read(path)?;
        debug!("Read {} byte(s) of CA bundle", pem.len());
        Ok(Self { pem })
    }
}
impl CaContentProvider for CaBundle {
    #[inline]
    fn current_ca_bundle(&self) -> &[u8] { &self.pem }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::path::PathBuf;
    use std::{env, process};

    use super::*;

    /// Creates a scratch file with the given contents, returning its path.
    fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
        let path: PathBuf = env::temp_dir().join(format!("oidc-auth-cabundle-{}-{name}", process::id()));
        fs::write(&path, contents).unwrap();
        path
    }


    #[test]
    fn test_serves_the_file_contents() {
        let path: PathBuf = scratch_file("contents.pem", b"DUMMY-CERT");
        let bundle: CaBundle = CaBundle::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(bundle.current_ca_bundle(), b"DUMMY-CERT");
    }

    #[test]
    fn test_serves_the_same_bytes_every_call() {
        let path: PathBuf = scratch_file("stable.pem", b"DUMMY-CERT");
        let bundle: CaBundle = CaBundle::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let first: Vec<u8> = bundle.current_ca_bundle().to_vec();
        for _ in 0..16 {
            assert_eq!(bundle.current_ca_bundle(), first.as_slice());
        }
    }

    #[test]
    fn test_is_a_snapshot_not_a_live_view() {
        let path: PathBuf = scratch_file("snapshot.pem", b"OLD");
        let bundle: CaBundle = CaBundle::from_file(&path).unwrap();

        // Neither rewriting nor deleting the file is visible in the loaded bundle
        fs::write(&path, b"NEW").unwrap();
        assert_eq!(bundle.current_ca_bundle(), b"OLD");
        fs::remove_file(&path).unwrap();
        assert_eq!(bundle.current_ca_bundle(), b"OLD");
    }

    #[test]
    fn test_propagates_read_errors_verbatim() {
        let path: PathBuf = env::temp_dir().join(format!("oidc-auth-cabundle-{}-does-not-exist.pem", process::id()));
        let err: io::Error = CaBundle::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
