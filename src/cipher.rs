use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use md5::{Digest, Md5};

use crate::error::{Error, Result};
use crate::inflate::{decode_hex_text, inflate, latin1_bytes};

/// Fixed IV baked into the device firmware, shared by the key-derivation
/// step and the payload decryption step. Changing it breaks interoperability
/// with real devices.
const IV: &[u8; 16] = b"ABCDEF1234123412";

/// Upper bound on an accepted encrypted payload. Real maps are a few hundred
/// KiB; anything bigger is rejected before any cipher or inflate work.
pub const MAX_ENCRYPTED_SIZE: usize = 16 * 1024 * 1024;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES-CBC encrypt with PKCS7 padding. Key must be 16, 24 or 32 bytes.
///
/// Public because the key-derivation step below is an encryption, and tests
/// author fixtures with it.
pub fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8; 16]) -> Result<Vec<u8>> {
    let ciphertext = match key.len() {
        16 => Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(|_| Error::DecryptionFailed)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => Aes192CbcEnc::new_from_slices(key, iv)
            .map_err(|_| Error::DecryptionFailed)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(|_| Error::DecryptionFailed)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        _ => return Err(Error::DecryptionFailed),
    };
    Ok(ciphertext)
}

fn cbc_decrypt(data: &[u8], key: &[u8], iv: &[u8; 16]) -> Result<Vec<u8>> {
    let plaintext = match key.len() {
        16 => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(|_| Error::DecryptionFailed)?
            .decrypt_padded_vec_mut::<Pkcs7>(data),
        24 => Aes192CbcDec::new_from_slices(key, iv)
            .map_err(|_| Error::DecryptionFailed)?
            .decrypt_padded_vec_mut::<Pkcs7>(data),
        32 => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(|_| Error::DecryptionFailed)?
            .decrypt_padded_vec_mut::<Pkcs7>(data),
        _ => return Err(Error::DecryptionFailed),
    };
    plaintext.map_err(|_| Error::DecryptionFailed)
}

/// Derive the 16-byte payload key for a device.
///
/// The firmware scheme: CBC-encrypt `model_key + device_id` under the raw
/// bytes of `model_key` with the fixed IV, then MD5 the ciphertext.
pub fn derive_key(model_key: &str, device_id: &str) -> Result<[u8; 16]> {
    let key = latin1_bytes(model_key).ok_or(Error::DecryptionFailed)?;
    let mut seed = key.clone();
    seed.extend_from_slice(&latin1_bytes(device_id).ok_or(Error::DecryptionFailed)?);

    let ciphertext = encrypt(&seed, &key, IV)?;
    Ok(Md5::digest(&ciphertext).into())
}

/// Decrypt a raw map ciphertext with the key derived from `model_key` and
/// `device_id`. All cipher and padding failures collapse into
/// [`Error::DecryptionFailed`].
pub fn decrypt(payload: &[u8], model_key: &str, device_id: &str) -> Result<Vec<u8>> {
    let key = derive_key(model_key, device_id)?;
    cbc_decrypt(payload, &key, IV)
}

/// Unpack an encrypted map payload as transmitted by the device into the
/// decrypted JSON text: hex-decode (devices send the ciphertext hex-encoded,
/// raw bytes are accepted too), decrypt, inflate.
pub fn unpack_map(raw: &[u8], model_key: &str, device_id: &str) -> Result<String> {
    if raw.len() > MAX_ENCRYPTED_SIZE {
        return Err(Error::PayloadTooLarge { len: raw.len(), max: MAX_ENCRYPTED_SIZE });
    }

    let ciphertext = match std::str::from_utf8(raw).ok().and_then(decode_hex_text) {
        Some(bytes) => bytes,
        None => raw.to_vec(),
    };

    let decrypted = decrypt(&ciphertext, model_key, device_id)?;
    inflate(&decrypted)
}
