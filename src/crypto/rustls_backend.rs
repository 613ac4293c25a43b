//! RustCrypto-sourced crypto backend (mirrors the original's second,
//! non-OpenSSL back-end, `pssl-mbedtls.c`, conceptually — no specific C
//! library is bound here, only the same division of responsibilities).

use std::io::{self, Read, Write};
use std::sync::Arc;

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use mio::net::TcpStream;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use rustls::{ClientConfig, ClientConnection, RootCertStore, ServerName, StreamOwned};
use sha2::Sha256;

use super::{
    Aes256Block, CryptoBackend, CryptoError, EncryptedBlob, RsaKeyPair, SymmetricKey,
    AES256_BLOCK_SIZE,
};
use crate::error::SslSignal;
use crate::tls::{Signal, TlsError, TlsProvider};

pub struct RustlsBackend;

pub enum RustlsKeyPair {
    Public(RsaPublicKey),
    Private(RsaPrivateKey),
}

impl RustlsKeyPair {
    fn public(&self) -> Option<RsaPublicKey> {
        match self {
            RustlsKeyPair::Public(k) => Some(k.clone()),
            RustlsKeyPair::Private(k) => Some(k.to_public_key()),
        }
    }
}

impl RsaKeyPair for RustlsKeyPair {
    fn to_public_blob(&self) -> Result<EncryptedBlob, CryptoError> {
        let public = self.public().ok_or(CryptoError::InvalidRsaEncoding)?;
        let der = public
            .to_pkcs1_der()
            .map_err(|_| CryptoError::InvalidRsaEncoding)?;
        Ok(EncryptedBlob::new(der.as_bytes().to_vec()))
    }

    fn to_private_blob(&self) -> Result<EncryptedBlob, CryptoError> {
        match self {
            RustlsKeyPair::Private(k) => {
                let der = k
                    .to_pkcs1_der()
                    .map_err(|_| CryptoError::InvalidRsaEncoding)?;
                Ok(EncryptedBlob::new(der.as_bytes().to_vec()))
            }
            RustlsKeyPair::Public(_) => Err(CryptoError::InvalidRsaEncoding),
        }
    }
}

pub struct RustlsAes256 {
    cipher: Aes256,
}

impl Aes256Block for RustlsAes256 {
    fn encode_block(&self, block: &[u8; AES256_BLOCK_SIZE]) -> [u8; AES256_BLOCK_SIZE] {
        let mut buf = GenericArray::clone_from_slice(block);
        self.cipher.encrypt_block(&mut buf);
        let mut out = [0u8; AES256_BLOCK_SIZE];
        out.copy_from_slice(buf.as_slice());
        out
    }

    fn decode_block(&self, block: &[u8; AES256_BLOCK_SIZE]) -> [u8; AES256_BLOCK_SIZE] {
        let mut buf = GenericArray::clone_from_slice(block);
        self.cipher.decrypt_block(&mut buf);
        let mut out = [0u8; AES256_BLOCK_SIZE];
        out.copy_from_slice(buf.as_slice());
        out
    }
}

impl CryptoBackend for RustlsBackend {
    type KeyPair = RustlsKeyPair;
    type Encoder = RustlsAes256;

    fn init() -> Result<(), CryptoError> {
        Ok(())
    }

    fn rand_strong(buf: &mut [u8]) {
        OsRng.fill_bytes(buf);
    }

    fn rand_weak(buf: &mut [u8]) {
        // RustCrypto's `rand` exposes one OS-backed CSPRNG; as with the
        // OpenSSL backend, there's no separate weaker generator to use.
        Self::rand_strong(buf);
    }

    fn gen_rsa(bits: u32) -> Result<Self::KeyPair, CryptoError> {
        let key =
            RsaPrivateKey::new(&mut OsRng, bits as usize).map_err(|_| CryptoError::RsaKeygenFailed)?;
        Ok(RustlsKeyPair::Private(key))
    }

    fn rsa_load_public(der: &[u8]) -> Result<Self::KeyPair, CryptoError> {
        let key = RsaPublicKey::from_pkcs1_der(der).map_err(|_| CryptoError::InvalidRsaEncoding)?;
        Ok(RustlsKeyPair::Public(key))
    }

    fn rsa_load_private(der: &[u8]) -> Result<Self::KeyPair, CryptoError> {
        let key = RsaPrivateKey::from_pkcs1_der(der).map_err(|_| CryptoError::InvalidRsaEncoding)?;
        Ok(RustlsKeyPair::Private(key))
    }

    fn symmetric_key_from_pass(
        password: &str,
        keylen: usize,
        salt: &[u8],
        iterations: u32,
    ) -> Result<SymmetricKey, CryptoError> {
        let mut key = vec![0u8; keylen];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
        Ok(SymmetricKey::new(key))
    }

    fn derive_password_from_passphrase(username: &str, passphrase: &str) -> String {
        super::hash_password_composition(username, passphrase)
    }

    fn aes256_encoder(key: &SymmetricKey) -> Result<Self::Encoder, CryptoError> {
        let cipher = Aes256::new_from_slice(key.as_bytes())
            .map_err(|_| CryptoError::BadBlockLength(key.len()))?;
        Ok(RustlsAes256 { cipher })
    }

    fn aes256_decoder(key: &SymmetricKey) -> Result<Self::Encoder, CryptoError> {
        Self::aes256_encoder(key)
    }

    fn rsa_encrypt_symmetric_key(
        public: &Self::KeyPair,
        key: &SymmetricKey,
    ) -> Result<EncryptedBlob, CryptoError> {
        let public = public.public().ok_or(CryptoError::InvalidRsaEncoding)?;
        let mut rng = OsRng;
        let ciphertext = public
            .encrypt(&mut rng, Oaep::new::<Sha256>(), key.as_bytes())
            .map_err(|_| CryptoError::RsaOperationFailed)?;
        Ok(EncryptedBlob::new(ciphertext))
    }

    fn rsa_decrypt_symmetric_key(
        private: &Self::KeyPair,
        enc: &EncryptedBlob,
    ) -> Result<SymmetricKey, CryptoError> {
        let private = match private {
            RustlsKeyPair::Private(k) => k,
            RustlsKeyPair::Public(_) => return Err(CryptoError::RsaOperationFailed),
        };
        let plaintext = private
            .decrypt(Oaep::new::<Sha256>(), enc.as_bytes())
            .map_err(|_| CryptoError::RsaOperationFailed)?;
        Ok(SymmetricKey::new(plaintext))
    }
}

/// Handshake + established state for a non-blocking rustls client
/// connection. Unlike the OpenSSL session, rustls drives its own handshake
/// state machine internally on every `read`/`write`/`complete_io` call
/// rather than exposing a distinct "mid-handshake" type, so one variant
/// covers both phases; `Poisoned` only appears transiently.
pub enum RustlsSession {
    Active(StreamOwned<ClientConnection, TcpStream>),
    Poisoned,
}

fn root_store() -> RootCertStore {
    let mut store = RootCertStore::empty();
    if let Ok(certs) = rustls_native_certs::load_native_certs() {
        for cert in certs {
            let _ = store.add(&rustls::Certificate(cert.0));
        }
    }
    store
}

impl TlsProvider for RustlsBackend {
    type Session = RustlsSession;

    fn connect(socket: TcpStream, hostname: &str) -> Result<Self::Session, TlsError> {
        let config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(root_store())
            .with_no_client_auth();
        let server_name = ServerName::try_from(hostname)
            .map_err(|_| TlsError::TlsFailure(SslSignal::Unknown))?;
        let conn = ClientConnection::new(Arc::new(config), server_name)
            .map_err(|_| TlsError::TlsFailure(SslSignal::Unknown))?;
        Ok(RustlsSession::Active(StreamOwned::new(conn, socket)))
    }

    fn connect_finish(session: &mut Self::Session, _hostname: &str) -> Result<Signal, TlsError> {
        let stream = match session {
            RustlsSession::Active(stream) => stream,
            RustlsSession::Poisoned => return Err(TlsError::TlsFailure(SslSignal::Unknown)),
        };
        if !stream.conn.is_handshaking() {
            return Ok(Signal::Ok(0));
        }
        let result = stream.complete_io();
        let still_handshaking = stream.conn.is_handshaking();
        match result {
            Ok(_) if !still_handshaking => Ok(Signal::Ok(0)),
            Ok(_) => Ok(if stream.conn.wants_write() { Signal::WantWrite } else { Signal::WantRead }),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                Ok(if stream.conn.wants_write() { Signal::WantWrite } else { Signal::WantRead })
            }
            Err(_) => Err(TlsError::TlsFailure(SslSignal::Unknown)),
        }
    }

    fn read(session: &mut Self::Session, buf: &mut [u8]) -> Signal {
        match session {
            RustlsSession::Active(stream) => match stream.read(buf) {
                Ok(n) => Signal::Ok(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => Signal::WantRead,
                Err(_) => Signal::Fail,
            },
            RustlsSession::Poisoned => Signal::Fail,
        }
    }

    fn write(session: &mut Self::Session, buf: &[u8]) -> Signal {
        match session {
            RustlsSession::Active(stream) => match stream.write(buf) {
                Ok(n) => Signal::Ok(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => Signal::WantWrite,
                Err(_) => Signal::Fail,
            },
            RustlsSession::Poisoned => Signal::Fail,
        }
    }

    fn pending_data(_session: &Self::Session) -> usize {
        // rustls doesn't expose a public "decrypted bytes already buffered"
        // count the way OpenSSL's `SSL_pending` does; callers fall back to
        // an extra poll cycle, which is correct, just not latency-optimal.
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsa_round_trips_a_symmetric_key() {
        let pair = RustlsBackend::gen_rsa(2048).unwrap();
        let key = SymmetricKey::new(vec![0x42; 32]);
        let enc = RustlsBackend::rsa_encrypt_symmetric_key(&pair, &key).unwrap();
        let dec = RustlsBackend::rsa_decrypt_symmetric_key(&pair, &enc).unwrap();
        assert_eq!(dec.as_bytes(), key.as_bytes());
    }

    #[test]
    fn aes_block_round_trips() {
        let key = SymmetricKey::new(vec![0x11; 32]);
        let encoder = RustlsBackend::aes256_encoder(&key).unwrap();
        let decoder = RustlsBackend::aes256_decoder(&key).unwrap();
        let block = [7u8; AES256_BLOCK_SIZE];
        let cipher_block = encoder.encode_block(&block);
        assert_ne!(cipher_block, block);
        assert_eq!(decoder.decode_block(&cipher_block), block);
    }
}
