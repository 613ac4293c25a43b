//! OpenSSL-sourced crypto backend (mirrors the original's `pssl-openssl.c`).
//!
//! RSA, AES, PBKDF2 and both RNGs are all sourced from the `openssl` crate,
//! matching the original back-end's choice to let one library cover the
//! whole contract rather than composing several.

use std::io::{self, Read, Write};

use mio::net::TcpStream;
use openssl::hash::MessageDigest;
use openssl::pkcs5::pbkdf2_hmac;
use openssl::rand::rand_bytes;
use openssl::rsa::{Padding, Rsa};
use openssl::ssl::{HandshakeError, MidHandshakeSslStream, SslConnector, SslMethod, SslStream};
use openssl::symm::{Cipher, Crypter, Mode};

use super::{
    Aes256Block, CryptoBackend, CryptoError, EncryptedBlob, RsaKeyPair, SymmetricKey,
    AES256_BLOCK_SIZE,
};
use crate::error::SslSignal;
use crate::tls::{Signal, TlsError, TlsProvider};

pub struct OpenSslBackend;

pub struct OpenSslKeyPair {
    rsa: Rsa<openssl::pkey::Private>,
    has_private: bool,
}

impl RsaKeyPair for OpenSslKeyPair {
    fn to_public_blob(&self) -> Result<EncryptedBlob, CryptoError> {
        let der = self
            .rsa
            .public_key_to_der()
            .map_err(|_| CryptoError::InvalidRsaEncoding)?;
        Ok(EncryptedBlob::new(der))
    }

    fn to_private_blob(&self) -> Result<EncryptedBlob, CryptoError> {
        if !self.has_private {
            return Err(CryptoError::InvalidRsaEncoding);
        }
        let der = self
            .rsa
            .private_key_to_der()
            .map_err(|_| CryptoError::InvalidRsaEncoding)?;
        Ok(EncryptedBlob::new(der))
    }
}

pub struct OpenSslAes256 {
    key: Vec<u8>,
}

impl Aes256Block for OpenSslAes256 {
    fn encode_block(&self, block: &[u8; AES256_BLOCK_SIZE]) -> [u8; AES256_BLOCK_SIZE] {
        crypt_one_block(&self.key, Mode::Encrypt, block)
    }

    fn decode_block(&self, block: &[u8; AES256_BLOCK_SIZE]) -> [u8; AES256_BLOCK_SIZE] {
        crypt_one_block(&self.key, Mode::Decrypt, block)
    }
}

fn crypt_one_block(
    key: &[u8],
    mode: Mode,
    block: &[u8; AES256_BLOCK_SIZE],
) -> [u8; AES256_BLOCK_SIZE] {
    // ECB with padding disabled gives us the raw single-block primitive; the
    // crate has no narrower "just run the cipher once" entry point.
    let cipher = Cipher::aes_256_ecb();
    let mut crypter = Crypter::new(cipher, mode, key, None).expect("valid key length");
    crypter.pad(false);
    let mut out = vec![0u8; AES256_BLOCK_SIZE + cipher.block_size()];
    let mut count = crypter.update(block, &mut out).expect("single block update");
    count += crypter.finalize(&mut out[count..]).expect("no padding to flush");
    out.truncate(count);
    let mut result = [0u8; AES256_BLOCK_SIZE];
    result.copy_from_slice(&out[..AES256_BLOCK_SIZE]);
    result
}

impl CryptoBackend for OpenSslBackend {
    type KeyPair = OpenSslKeyPair;
    type Encoder = OpenSslAes256;

    fn init() -> Result<(), CryptoError> {
        openssl::init();
        Ok(())
    }

    fn rand_strong(buf: &mut [u8]) {
        rand_bytes(buf).expect("OpenSSL strong RNG failure is not recoverable");
    }

    fn rand_weak(buf: &mut [u8]) {
        // OpenSSL exposes one CSPRNG; there is no separate "weak" generator
        // to fall back to, so the strong path is reused (spec §4.3 only
        // requires the two APIs be distinct call sites, not distinct
        // algorithms).
        Self::rand_strong(buf);
    }

    fn gen_rsa(bits: u32) -> Result<Self::KeyPair, CryptoError> {
        let rsa = Rsa::generate(bits).map_err(|_| CryptoError::RsaKeygenFailed)?;
        Ok(OpenSslKeyPair { rsa, has_private: true })
    }

    fn rsa_load_public(der: &[u8]) -> Result<Self::KeyPair, CryptoError> {
        let rsa = Rsa::public_key_from_der(der).map_err(|_| CryptoError::InvalidRsaEncoding)?;
        Ok(OpenSslKeyPair { rsa, has_private: false })
    }

    fn rsa_load_private(der: &[u8]) -> Result<Self::KeyPair, CryptoError> {
        let rsa = Rsa::private_key_from_der(der).map_err(|_| CryptoError::InvalidRsaEncoding)?;
        Ok(OpenSslKeyPair { rsa, has_private: true })
    }

    fn symmetric_key_from_pass(
        password: &str,
        keylen: usize,
        salt: &[u8],
        iterations: u32,
    ) -> Result<SymmetricKey, CryptoError> {
        let mut key = vec![0u8; keylen];
        pbkdf2_hmac(
            password.as_bytes(),
            salt,
            iterations as usize,
            MessageDigest::sha256(),
            &mut key,
        )
        .map_err(|_| CryptoError::KdfFailed)?;
        Ok(SymmetricKey::new(key))
    }

    fn derive_password_from_passphrase(username: &str, passphrase: &str) -> String {
        super::hash_password_composition(username, passphrase)
    }

    fn aes256_encoder(key: &SymmetricKey) -> Result<Self::Encoder, CryptoError> {
        if key.len() != super::AES256_KEY_SIZE {
            return Err(CryptoError::BadBlockLength(key.len()));
        }
        Ok(OpenSslAes256 { key: key.as_bytes().to_vec() })
    }

    fn aes256_decoder(key: &SymmetricKey) -> Result<Self::Encoder, CryptoError> {
        if key.len() != super::AES256_KEY_SIZE {
            return Err(CryptoError::BadBlockLength(key.len()));
        }
        Ok(OpenSslAes256 { key: key.as_bytes().to_vec() })
    }

    fn rsa_encrypt_symmetric_key(
        public: &Self::KeyPair,
        key: &SymmetricKey,
    ) -> Result<EncryptedBlob, CryptoError> {
        let mut out = vec![0u8; public.rsa.size() as usize];
        let written = public
            .rsa
            .public_encrypt(key.as_bytes(), &mut out, Padding::PKCS1_OAEP)
            .map_err(|_| CryptoError::RsaOperationFailed)?;
        out.truncate(written);
        Ok(EncryptedBlob::new(out))
    }

    fn rsa_decrypt_symmetric_key(
        private: &Self::KeyPair,
        enc: &EncryptedBlob,
    ) -> Result<SymmetricKey, CryptoError> {
        let mut out = vec![0u8; private.rsa.size() as usize];
        let written = private
            .rsa
            .private_decrypt(enc.as_bytes(), &mut out, Padding::PKCS1_OAEP)
            .map_err(|_| CryptoError::RsaOperationFailed)?;
        out.truncate(written);
        Ok(SymmetricKey::new(out))
    }
}

/// Handshake state for a non-blocking OpenSSL client connection: either
/// still negotiating (the `WouldBlock` arm of `SslConnector::connect`) or
/// fully established. `Poisoned` only appears transiently inside
/// `connect_finish` while the enum is being rebuilt.
pub enum OpenSslSession {
    Handshaking(MidHandshakeSslStream<TcpStream>),
    Established(SslStream<TcpStream>),
    Poisoned,
}

impl TlsProvider for OpenSslBackend {
    type Session = OpenSslSession;

    fn connect(socket: TcpStream, hostname: &str) -> Result<Self::Session, TlsError> {
        let connector = SslConnector::builder(SslMethod::tls())
            .map_err(|_| TlsError::TlsFailure(SslSignal::Unknown))?
            .build();
        match connector.connect(hostname, socket) {
            Ok(stream) => Ok(OpenSslSession::Established(stream)),
            Err(HandshakeError::WouldBlock(mid)) => Ok(OpenSslSession::Handshaking(mid)),
            Err(_) => Err(TlsError::TlsFailure(SslSignal::Unknown)),
        }
    }

    fn connect_finish(session: &mut Self::Session, _hostname: &str) -> Result<Signal, TlsError> {
        match std::mem::replace(session, OpenSslSession::Poisoned) {
            OpenSslSession::Established(stream) => {
                *session = OpenSslSession::Established(stream);
                Ok(Signal::Ok(0))
            }
            OpenSslSession::Handshaking(mid) => match mid.handshake() {
                Ok(stream) => {
                    *session = OpenSslSession::Established(stream);
                    Ok(Signal::Ok(0))
                }
                Err(HandshakeError::WouldBlock(mid)) => {
                    *session = OpenSslSession::Handshaking(mid);
                    Ok(Signal::WantRead)
                }
                Err(_) => Err(TlsError::TlsFailure(SslSignal::Unknown)),
            },
            OpenSslSession::Poisoned => Err(TlsError::TlsFailure(SslSignal::Unknown)),
        }
    }

    fn read(session: &mut Self::Session, buf: &mut [u8]) -> Signal {
        match session {
            OpenSslSession::Established(stream) => match stream.read(buf) {
                Ok(n) => Signal::Ok(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => Signal::WantRead,
                Err(_) => Signal::Fail,
            },
            _ => Signal::Fail,
        }
    }

    fn write(session: &mut Self::Session, buf: &[u8]) -> Signal {
        match session {
            OpenSslSession::Established(stream) => match stream.write(buf) {
                Ok(n) => Signal::Ok(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => Signal::WantWrite,
                Err(_) => Signal::Fail,
            },
            _ => Signal::Fail,
        }
    }

    fn pending_data(session: &Self::Session) -> usize {
        match session {
            OpenSslSession::Established(stream) => stream.ssl().pending(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsa_round_trips_a_symmetric_key() {
        OpenSslBackend::init().unwrap();
        let pair = OpenSslBackend::gen_rsa(2048).unwrap();
        let key = SymmetricKey::new(vec![0x42; 32]);
        let enc = OpenSslBackend::rsa_encrypt_symmetric_key(&pair, &key).unwrap();
        let dec = OpenSslBackend::rsa_decrypt_symmetric_key(&pair, &enc).unwrap();
        assert_eq!(dec.as_bytes(), key.as_bytes());
    }

    #[test]
    fn aes_block_round_trips() {
        let key = SymmetricKey::new(vec![0x11; 32]);
        let encoder = OpenSslBackend::aes256_encoder(&key).unwrap();
        let decoder = OpenSslBackend::aes256_decoder(&key).unwrap();
        let block = [7u8; AES256_BLOCK_SIZE];
        let cipher_block = encoder.encode_block(&block);
        assert_ne!(cipher_block, block);
        assert_eq!(decoder.decode_block(&cipher_block), block);
    }

    #[test]
    fn pbkdf2_derivation_is_deterministic() {
        let salt = b"static-salt";
        let k1 = OpenSslBackend::symmetric_key_from_pass("pw", 32, salt, 1000).unwrap();
        let k2 = OpenSslBackend::symmetric_key_from_pass("pw", 32, salt, 1000).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }
}
