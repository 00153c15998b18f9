//! # quarry-blob — Content-Addressed Blob Store
//!
//! Store and retrieve operations for the binary artifacts owned by block
//! records: uploaded photos and rendered QR labels. Blobs are named by
//! their content digest: `{kind}/{digest}.{ext}`.
//!
//! ## Security Invariant
//!
//! Stored blobs are verified at retrieval time — the digest of the
//! retrieved content must match the reference. This catches both disk
//! corruption and substitution.
//!
//! References are validated on parse: only the two known kinds and
//! hex-digit names are accepted, so a reference can never traverse
//! outside the store root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// The two blob families the registry owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    /// Uploaded block photos.
    Image,
    /// Rendered QR identity artifacts.
    Artifact,
}

impl BlobKind {
    /// Directory name for this kind under the store root.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Artifact => "artifacts",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "images" => Some(Self::Image),
            "artifacts" => Some(Self::Artifact),
            _ => None,
        }
    }
}

/// A validated reference to a stored blob, e.g. `images/3fa4….png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    /// Parse and validate a reference string.
    ///
    /// Accepts exactly `{kind}/{hex-digest}.{alnum-ext}`; anything else —
    /// unknown kind, non-hex name, path separators in the name — is
    /// rejected, which makes references safe to join onto the store root.
    pub fn parse(raw: &str) -> Result<Self, BlobError> {
        let (kind, name) = raw
            .split_once('/')
            .ok_or_else(|| BlobError::InvalidRef(raw.to_string()))?;
        BlobKind::parse(kind).ok_or_else(|| BlobError::InvalidRef(raw.to_string()))?;

        let (stem, ext) = name
            .split_once('.')
            .ok_or_else(|| BlobError::InvalidRef(raw.to_string()))?;
        let valid_stem = !stem.is_empty() && stem.chars().all(|c| c.is_ascii_hexdigit());
        let valid_ext = !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid_stem || !valid_ext {
            return Err(BlobError::InvalidRef(raw.to_string()));
        }

        Ok(Self(raw.to_string()))
    }

    /// The reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex digest portion of the reference.
    fn digest_hex(&self) -> &str {
        // Validated on construction: kind/stem.ext
        let name = self.0.split_once('/').map(|(_, n)| n).unwrap_or(&self.0);
        name.split_once('.').map(|(s, _)| s).unwrap_or(name)
    }
}

impl std::fmt::Display for BlobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from blob store operations.
#[derive(Error, Debug)]
pub enum BlobError {
    /// The reference string is malformed or names an unknown kind.
    #[error("invalid blob reference: {0}")]
    InvalidRef(String),

    /// No blob exists for the reference.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// Retrieved content does not match the reference digest.
    #[error("blob content does not match its digest: {0}")]
    Corrupt(String),

    /// Underlying filesystem failure.
    #[error("blob io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A content-addressed blob store backed by the filesystem.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create a blob store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store bytes under their content digest, returning the reference.
    ///
    /// Re-storing identical content is a no-op that returns the same
    /// reference (content addressing makes writes idempotent).
    pub async fn store(
        &self,
        kind: BlobKind,
        bytes: &[u8],
        ext: &str,
    ) -> Result<BlobRef, BlobError> {
        let digest = hex_digest(bytes);
        let reference = BlobRef(format!("{}/{digest}.{ext}", kind.as_str()));
        // The constructed reference must satisfy its own validation.
        debug_assert!(BlobRef::parse(reference.as_str()).is_ok());

        let path = self.path_for(&reference);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(blob = %reference, size = bytes.len(), "stored blob");
        Ok(reference)
    }

    /// Retrieve a blob's bytes, verifying the content digest.
    pub async fn retrieve(&self, reference: &BlobRef) -> Result<Vec<u8>, BlobError> {
        let path = self.path_for(reference);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlobError::NotFound(reference.to_string()));
            }
            Err(e) => return Err(BlobError::Io(e)),
        };

        if hex_digest(&bytes) != reference.digest_hex() {
            return Err(BlobError::Corrupt(reference.to_string()));
        }
        Ok(bytes)
    }

    /// Delete a blob. Deleting an absent blob returns `NotFound`.
    pub async fn delete(&self, reference: &BlobRef) -> Result<(), BlobError> {
        let path = self.path_for(reference);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(blob = %reference, "deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(reference.to_string()))
            }
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    fn path_for(&self, reference: &BlobRef) -> PathBuf {
        self.root.join(reference.as_str())
    }
}

/// Hex-encoded SHA-256 digest of the bytes.
fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, BlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn store_and_retrieve_roundtrip() {
        let (_dir, store) = store();
        let reference = store
            .store(BlobKind::Image, b"fake-photo-bytes", "png")
            .await
            .unwrap();
        assert!(reference.as_str().starts_with("images/"));
        assert!(reference.as_str().ends_with(".png"));

        let bytes = store.retrieve(&reference).await.unwrap();
        assert_eq!(bytes, b"fake-photo-bytes");
    }

    #[tokio::test]
    async fn identical_content_gets_identical_reference() {
        let (_dir, store) = store();
        let a = store.store(BlobKind::Artifact, b"qr", "png").await.unwrap();
        let b = store.store(BlobKind::Artifact, b"qr", "png").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn retrieve_missing_blob_is_not_found() {
        let (_dir, store) = store();
        let reference = BlobRef::parse("images/abcdef.png").unwrap();
        let err = store.retrieve(&reference).await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
    }

    #[tokio::test]
    async fn corrupted_blob_is_detected() {
        let (dir, store) = store();
        let reference = store.store(BlobKind::Image, b"original", "png").await.unwrap();
        std::fs::write(dir.path().join(reference.as_str()), b"tampered").unwrap();

        let err = store.retrieve(&reference).await.unwrap_err();
        assert!(matches!(err, BlobError::Corrupt(_)));
    }

    #[tokio::test]
    async fn delete_then_retrieve_is_not_found() {
        let (_dir, store) = store();
        let reference = store.store(BlobKind::Image, b"bytes", "jpg").await.unwrap();
        store.delete(&reference).await.unwrap();

        let err = store.retrieve(&reference).await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_missing_blob_reports_not_found() {
        let (_dir, store) = store();
        let reference = BlobRef::parse("artifacts/00ff.png").unwrap();
        let err = store.delete(&reference).await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
    }

    #[test]
    fn blob_ref_rejects_traversal_and_unknown_kinds() {
        assert!(BlobRef::parse("images/../secrets.png").is_err());
        assert!(BlobRef::parse("images/..%2f.png").is_err());
        assert!(BlobRef::parse("uploads/abcd.png").is_err());
        assert!(BlobRef::parse("images/abcd").is_err());
        assert!(BlobRef::parse("abcd.png").is_err());
        assert!(BlobRef::parse("images/xyz!.png").is_err());
    }

    #[test]
    fn blob_ref_accepts_digest_names() {
        let r = BlobRef::parse("artifacts/0123456789abcdef.png").unwrap();
        assert_eq!(r.as_str(), "artifacts/0123456789abcdef.png");
    }
}
