use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Shared-secret check applied before any report is produced
///
/// Both sides are hashed first so the comparison runs over equal-length
/// digests and in constant time.
pub struct AccessGate {
    secret_digest: [u8; 32],
}

impl AccessGate {
    pub fn new(secret: &str) -> Self {
        Self {
            secret_digest: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    pub fn check(&self, supplied: &str) -> bool {
        let supplied_digest: [u8; 32] = Sha256::digest(supplied.as_bytes()).into();
        self.secret_digest[..].ct_eq(&supplied_digest[..]).into()
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate").finish_non_exhaustive()
    }
}
