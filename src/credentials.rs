//! Password hashing and verification.
//!
//! Passwords are hashed with Argon2id and a random salt. The resulting PHC
//! string (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`) carries everything
//! needed to verify a candidate later, so no salt is stored elsewhere.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password does not match")]
    Mismatch,
    #[error("stored password digest is unreadable: {0}")]
    Digest(argon2::password_hash::Error),
    #[error("failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
}

/// A hashed password as persisted with the user record.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap a digest read back from storage.
    #[must_use]
    pub fn from_stored(digest: String) -> Self {
        Self(digest)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordDigest(***)")
    }
}

#[derive(Debug, Clone, Default)]
pub struct CredentialVerifier {
    params: Params,
}

impl CredentialVerifier {
    /// Use explicit Argon2 cost parameters for new hashes. Existing digests
    /// are always verified with the parameters they were created with.
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh salt.
    ///
    /// # Errors
    /// Returns [`CredentialError::Hash`] if Argon2 rejects the input.
    pub fn hash(&self, plaintext: &str) -> Result<PasswordDigest, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(CredentialError::Hash)?;

        Ok(PasswordDigest(hash.to_string()))
    }

    /// Verify a candidate against a stored digest.
    ///
    /// # Errors
    /// Returns [`CredentialError::Mismatch`] when the candidate is wrong and
    /// [`CredentialError::Digest`] when the stored digest cannot be parsed.
    pub fn verify(&self, candidate: &str, digest: &PasswordDigest) -> Result<(), CredentialError> {
        let parsed = PasswordHash::new(digest.as_str()).map_err(CredentialError::Digest)?;

        match self.argon2().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(()),
            Err(argon2::password_hash::Error::Password) => Err(CredentialError::Mismatch),
            Err(e) => Err(CredentialError::Digest(e)),
        }
    }

    /// Reject a candidate for a user that does not exist, after spending the
    /// same Argon2 work a real verification would.
    ///
    /// # Errors
    /// Always returns [`CredentialError::Mismatch`].
    pub fn verify_absent(&self, candidate: &str) -> Result<(), CredentialError> {
        // result unused; only the cost matters
        let _ = self.hash(candidate);
        Err(CredentialError::Mismatch)
    }
}
