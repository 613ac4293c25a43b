//! Pluggable crypto/TLS abstraction (spec §4.3).
//!
//! Exactly one back-end is compiled in via Cargo feature: `backend-openssl`
//! (default) sources RSA/AES/PBKDF2/RNG from OpenSSL, mirroring the
//! original's `pssl-openssl.c`; `backend-rustls` sources the same contract
//! from independent RustCrypto crates, mirroring the original's second,
//! non-OpenSSL back-end. Both additionally implement [`crate::tls::TlsProvider`].

use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Categorize, Category};

#[cfg(feature = "backend-openssl")]
pub mod openssl_backend;
#[cfg(feature = "backend-rustls")]
pub mod rustls_backend;

pub mod aes_cbc;

pub const AES256_BLOCK_SIZE: usize = 16;
pub const AES256_KEY_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("crypto backend init failed")]
    InitFailed,
    #[error("RSA key generation failed")]
    RsaKeygenFailed,
    #[error("invalid RSA key encoding")]
    InvalidRsaEncoding,
    #[error("RSA operation failed")]
    RsaOperationFailed,
    #[error("AES block cipher rejected input of length {0} (expected {AES256_BLOCK_SIZE})")]
    BadBlockLength(usize),
    #[error("PBKDF2 key derivation failed")]
    KdfFailed,
}

impl CryptoError {
    pub fn category(&self) -> Category {
        match self {
            CryptoError::InitFailed | CryptoError::KdfFailed => Category::TempFail,
            _ => Category::PermFail,
        }
    }
}

impl Categorize for CryptoError {
    fn category(&self) -> Category {
        CryptoError::category(self)
    }
}

/// The fixed composition spec §4.3 mandates for deriving the login password
/// from a passphrase: lowercase the username, concatenate the passphrase,
/// hash the result. Shared by both backends since the composition itself
/// isn't backend-specific, only the primitives feeding it are.
pub(crate) fn hash_password_composition(username: &str, passphrase: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.to_lowercase().as_bytes());
    hasher.update(passphrase.as_bytes());
    hex::encode(hasher.finalize())
}

/// A symmetric key, zeroized on drop (spec §3 "contents sensitive").
/// Mirrors the original's `psync_symmetric_key_t` / `psync_ssl_free_symmetric_key`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey(Vec<u8>);

impl SymmetricKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        SymmetricKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SymmetricKey").field(&"<redacted>").finish()
    }
}

/// A length-prefixed opaque byte blob: either an RSA-encrypted symmetric key
/// or a serialized RSA key half (spec §3 — both share this shape in the
/// original's `psync_encrypted_data_struct_t`).
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedBlob(Vec<u8>);

impl EncryptedBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        EncryptedBlob(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl std::fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EncryptedBlob").field(&self.0.len()).finish()
    }
}

/// A single raw AES-256 block cipher operation, 16 bytes at a time; chaining
/// is explicitly the caller's job (spec §4.3 non-goal). See [`aes_cbc`] for
/// a CBC layer built on top.
pub trait Aes256Block {
    fn encode_block(&self, block: &[u8; AES256_BLOCK_SIZE]) -> [u8; AES256_BLOCK_SIZE];
    fn decode_block(&self, block: &[u8; AES256_BLOCK_SIZE]) -> [u8; AES256_BLOCK_SIZE];
}

/// An opaque RSA key pair, generated or loaded by a [`CryptoBackend`].
pub trait RsaKeyPair {
    fn to_public_blob(&self) -> Result<EncryptedBlob, CryptoError>;
    fn to_private_blob(&self) -> Result<EncryptedBlob, CryptoError>;
}

/// The back-end-independent contract of spec §4.3.
pub trait CryptoBackend {
    type KeyPair: RsaKeyPair;
    type Encoder: Aes256Block;

    /// One-time process-wide initialization; idempotent.
    fn init() -> Result<(), CryptoError>;

    /// Best-effort secure-erase of a buffer no longer needed, matching
    /// `psync_ssl_memclean`. `zeroize` already covers `SymmetricKey`; this is
    /// for ad hoc buffers a caller wants wiped early.
    fn mem_clean(buf: &mut [u8]) {
        buf.zeroize();
    }

    fn rand_strong(buf: &mut [u8]);
    fn rand_weak(buf: &mut [u8]);

    fn gen_rsa(bits: u32) -> Result<Self::KeyPair, CryptoError>;
    fn rsa_load_public(der: &[u8]) -> Result<Self::KeyPair, CryptoError>;
    fn rsa_load_private(der: &[u8]) -> Result<Self::KeyPair, CryptoError>;

    /// Derives a symmetric key from a password via PBKDF2, per
    /// `psync_ssl_gen_symmetric_key_from_pass`.
    fn symmetric_key_from_pass(
        password: &str,
        keylen: usize,
        salt: &[u8],
        iterations: u32,
    ) -> Result<SymmetricKey, CryptoError>;

    /// Derives the login password from `username + passphrase`, matching
    /// `psync_ssl_derive_password_from_passphrase`'s composition.
    fn derive_password_from_passphrase(username: &str, passphrase: &str) -> String;

    fn aes256_encoder(key: &SymmetricKey) -> Result<Self::Encoder, CryptoError>;
    fn aes256_decoder(key: &SymmetricKey) -> Result<Self::Encoder, CryptoError>;

    fn rsa_encrypt_symmetric_key(
        public: &Self::KeyPair,
        key: &SymmetricKey,
    ) -> Result<EncryptedBlob, CryptoError>;
    fn rsa_decrypt_symmetric_key(
        private: &Self::KeyPair,
        enc: &EncryptedBlob,
    ) -> Result<SymmetricKey, CryptoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_key_debug_does_not_leak_bytes() {
        let key = SymmetricKey::new(vec![1, 2, 3, 4]);
        let rendered = format!("{key:?}");
        assert!(!rendered.contains('1'));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn password_composition_is_case_insensitive_on_username() {
        let a = hash_password_composition("Alice", "hunter2");
        let b = hash_password_composition("alice", "hunter2");
        assert_eq!(a, b);
        let different_passphrase = hash_password_composition("alice", "hunter3");
        assert_ne!(a, different_passphrase);
    }

    #[test]
    fn bad_block_length_is_a_perm_fail() {
        assert_eq!(CryptoError::BadBlockLength(5).category(), Category::PermFail);
        assert_eq!(CryptoError::InitFailed.category(), Category::TempFail);
    }
}
