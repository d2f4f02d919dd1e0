//! Length-prefixed, optionally-encrypted framing (spec §4.11, §6).
//!
//! Plaintext frame: `[4-byte big-endian length][JSON bytes]`.
//! Encrypted frame: `[4-byte big-endian length][16-byte IV][ciphertext]
//! [32-byte HMAC-SHA256 tag]`, where length covers everything after itself.
//! The HMAC covers `IV || ciphertext` and is verified in constant time
//! before decryption (AES-256-CBC, PKCS#7 padding), per spec §4.11.
//!
//! Grounded on the teacher's `http-request` framing conventions for
//! length-prefixed reads and on the `solisoft-solidb`/`HautlyS-Housaky`
//! manifests (see DESIGN.md) for the ECDH + AES-CBC + HMAC crate choices.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use x25519_dalek::{EphemeralSecret, PublicKey};

use replidb_core::CoreError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

const IV_LEN: usize = 16;
const TAG_LEN: usize = 32;
const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

/// One side of an ECDH-derived session: `encrypt_key` / `decrypt_key` are
/// already swapped per spec §4.11 ("initiator encrypts with key1 / decrypts
/// with key2; responder swaps").
#[derive(Clone)]
pub struct SessionKeys {
    pub encrypt_key: [u8; 32],
    pub decrypt_key: [u8; 32],
}

pub struct EphemeralKeyExchange {
    secret: EphemeralSecret,
    pub public_key: [u8; 32],
}

impl EphemeralKeyExchange {
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(rand::rngs::OsRng);
        let public_key = PublicKey::from(&secret).to_bytes();
        Self { secret, public_key }
    }

    /// Derives session keys from the peer's ephemeral public key. `key1 =
    /// SHA256(secret || 0)`, `key2 = SHA256(secret || 1)` per spec §4.11.
    pub fn derive_session_keys(self, peer_public_key: [u8; 32], is_initiator: bool) -> SessionKeys {
        use sha2::Digest;
        let shared = self.secret.diffie_hellman(&PublicKey::from(peer_public_key));
        let shared = shared.to_bytes();

        let mut hasher = Sha256::new();
        hasher.update(shared);
        hasher.update([0u8]);
        let key1: [u8; 32] = hasher.finalize().into();

        let mut hasher = Sha256::new();
        hasher.update(shared);
        hasher.update([1u8]);
        let key2: [u8; 32] = hasher.finalize().into();

        if is_initiator {
            SessionKeys { encrypt_key: key1, decrypt_key: key2 }
        } else {
            SessionKeys { encrypt_key: key2, decrypt_key: key1 }
        }
    }
}

/// Encrypts `plaintext` under `key`, returning the `[iv][ciphertext][tag]`
/// body (length prefix is added by the caller at the I/O boundary).
pub fn encrypt_frame(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, CoreError> {
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    let ciphertext = Aes256CbcEnc::new(key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(&iv);
    mac.update(&ciphertext);
    let tag = mac.finalize().into_bytes();

    let mut body = Vec::with_capacity(IV_LEN + ciphertext.len() + TAG_LEN);
    body.extend_from_slice(&iv);
    body.extend_from_slice(&ciphertext);
    body.extend_from_slice(&tag);
    Ok(body)
}

/// Verifies the HMAC tag in constant time, then decrypts. Spec §4.11:
/// "verified in constant time before decryption".
pub fn decrypt_frame(key: &[u8; 32], body: &[u8]) -> Result<Vec<u8>, CoreError> {
    if body.len() < IV_LEN + TAG_LEN {
        return Err(CoreError::Crypto("frame shorter than iv+tag".into()));
    }
    let (iv_and_ciphertext, tag) = body.split_at(body.len() - TAG_LEN);
    let (iv, ciphertext) = iv_and_ciphertext.split_at(IV_LEN);

    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(iv);
    mac.update(ciphertext);
    mac.verify_slice(tag).map_err(|_| CoreError::Crypto("hmac verification failed".into()))?;

    let iv: [u8; IV_LEN] = iv.try_into().expect("checked length above");
    Aes256CbcDec::new(key.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|e| CoreError::Crypto(format!("decrypt failed: {e}")))
}

/// Writes a plaintext length-prefixed frame.
pub async fn write_plain_frame<W: AsyncWriteExt + Unpin>(writer: &mut W, payload: &[u8]) -> Result<(), CoreError> {
    write_length_prefixed(writer, payload).await
}

/// Reads a plaintext length-prefixed frame.
pub async fn read_plain_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Vec<u8>, CoreError> {
    read_length_prefixed(reader).await
}

/// Encrypts and writes a frame under `key`.
pub async fn write_encrypted_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    key: &[u8; 32],
    payload: &[u8],
) -> Result<(), CoreError> {
    let body = encrypt_frame(key, payload)?;
    write_length_prefixed(writer, &body).await
}

/// Reads and decrypts a frame under `key`.
pub async fn read_encrypted_frame<R: AsyncReadExt + Unpin>(reader: &mut R, key: &[u8; 32]) -> Result<Vec<u8>, CoreError> {
    let body = read_length_prefixed(reader).await?;
    decrypt_frame(key, &body)
}

async fn write_length_prefixed<W: AsyncWriteExt + Unpin>(writer: &mut W, body: &[u8]) -> Result<(), CoreError> {
    let len = u32::try_from(body.len()).map_err(|_| CoreError::Network("frame too large".into()))?;
    writer.write_all(&len.to_be_bytes()).await.map_err(|e| CoreError::Network(format!("frame write: {e}")))?;
    writer.write_all(body).await.map_err(|e| CoreError::Network(format!("frame write: {e}")))?;
    Ok(())
}

async fn read_length_prefixed<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Vec<u8>, CoreError> {
    let mut len_bytes = [0u8; 4];
    reader
        .read_exact(&mut len_bytes)
        .await
        .map_err(|e| CoreError::Network(format!("frame length read: {e}")))?;
    let len = u32::from_be_bytes(len_bytes);
    if len > MAX_FRAME_LEN {
        return Err(CoreError::Network(format!("frame length {len} exceeds max {MAX_FRAME_LEN}")));
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await.map_err(|e| CoreError::Network(format!("frame body read: {e}")))?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_exchange_derives_matching_swapped_session_keys() {
        let initiator = EphemeralKeyExchange::generate();
        let responder = EphemeralKeyExchange::generate();
        let initiator_public = initiator.public_key;
        let responder_public = responder.public_key;

        let initiator_keys = initiator.derive_session_keys(responder_public, true);
        let responder_keys = responder.derive_session_keys(initiator_public, false);

        assert_eq!(initiator_keys.encrypt_key, responder_keys.decrypt_key);
        assert_eq!(initiator_keys.decrypt_key, responder_keys.encrypt_key);
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let key = [7u8; 32];
        let plaintext = b"PullChanges since=42";
        let frame = encrypt_frame(&key, plaintext).unwrap();
        let decrypted = decrypt_frame(&key, &frame).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn tampered_frame_fails_hmac_check() {
        let key = [7u8; 32];
        let mut frame = encrypt_frame(&key, b"hello").unwrap();
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        assert!(decrypt_frame(&key, &frame).is_err());
    }

    #[tokio::test]
    async fn plain_frame_round_trips_over_an_in_memory_duplex() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_plain_frame(&mut client, b"hello").await.unwrap();
        let received = read_plain_frame(&mut server).await.unwrap();
        assert_eq!(received, b"hello");
    }
}
