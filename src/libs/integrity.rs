//! SHA-256 content hashing for artifacts.
//!
//! An artifact's identity is its digest; nothing inside the blob says which
//! version it is. Both the publisher (when writing the descriptor) and the
//! checker (after download and after install) go through these helpers.

use super::error::{UpdateError, UpdateResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const READ_BLOCK: usize = 8192;

/// Lowercase hex SHA-256 of the file's exact bytes.
pub fn file_sha256(path: &Path) -> UpdateResult<String> {
    let file = File::open(path).map_err(|e| UpdateError::fs(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();

    let mut buffer = [0u8; READ_BLOCK];
    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| UpdateError::fs(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Lowercase hex SHA-256 of an in-memory buffer.
pub fn bytes_sha256(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// True iff `expected` is the digest of the file. Unreadable files are `false`.
pub fn verify_file_hash(path: &Path, expected: &str) -> bool {
    match file_sha256(path) {
        Ok(actual) => hashes_match(&actual, expected),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "hash verification could not read file");
            false
        }
    }
}

/// Like [`verify_file_hash`] but reports both digests on mismatch.
pub fn ensure_file_hash(path: &Path, expected: &str) -> UpdateResult<()> {
    let actual = file_sha256(path)?;
    if !hashes_match(&actual, expected) {
        return Err(UpdateError::Integrity {
            path: path.to_path_buf(),
            expected: expected.to_owned(),
            actual,
        });
    }
    Ok(())
}

// Hex case is not significant; whitespace from hand-edited descriptors is dropped.
fn hashes_match(actual: &str, expected: &str) -> bool {
    actual.eq_ignore_ascii_case(expected.trim())
}
