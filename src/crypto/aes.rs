//! AES decryption provider backed by the RustCrypto block-mode crates.

use super::{CipherError, Decryptor, Mode};
use crate::error::{ConfigError, Result};
use ::aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyInit, KeyIvInit};

const BLOCK_SIZE: usize = 16;

macro_rules! cbc_decrypt {
    ($cipher:ty, $key:expr, $iv:expr, $data:expr) => {
        cbc::Decryptor::<$cipher>::new_from_slices($key, $iv)
            .map_err(|e| CipherError(format!("invalid key or IV: {}", e)))?
            .decrypt_padded_vec_mut::<Pkcs7>($data)
            .map_err(|_| CipherError("bad padding or truncated ciphertext".to_string()))
    };
}

macro_rules! ecb_decrypt {
    ($cipher:ty, $key:expr, $data:expr) => {
        ecb::Decryptor::<$cipher>::new_from_slice($key)
            .map_err(|e| CipherError(format!("invalid key: {}", e)))?
            .decrypt_padded_vec_mut::<Pkcs7>($data)
            .map_err(|_| CipherError("bad padding or truncated ciphertext".to_string()))
    };
}

/// AES with PKCS#7 padding in CBC or ECB mode.
///
/// The key length picks the variant: 16 bytes for AES-128, 24 for AES-192,
/// 32 for AES-256. In CBC mode the IV is either the first 16 key bytes or,
/// with `random_iv`, the first 16 bytes of each ciphertext.
pub struct AesDecryptor {
    key: Vec<u8>,
    mode: Mode,
    random_iv: bool,
}

impl AesDecryptor {
    /// Create a decryptor for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Configuration`] if the key is not 16, 24 or 32 bytes
    /// long, or if `random_iv` is requested for a mode without an IV.
    pub fn new(key: &[u8], mode: Mode, random_iv: bool) -> Result<Self> {
        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(ConfigError::Configuration(format!(
                "AES key must be 16, 24 or 32 bytes, got {}",
                key.len()
            )));
        }

        if random_iv && mode == Mode::Ecb {
            return Err(ConfigError::Configuration(
                "Random IVs require CBC mode".to_string(),
            ));
        }

        Ok(Self {
            key: key.to_vec(),
            mode,
            random_iv,
        })
    }

    fn decrypt_cbc(&self, data: &[u8]) -> std::result::Result<Vec<u8>, CipherError> {
        let (iv, body) = if self.random_iv {
            if data.len() < BLOCK_SIZE {
                return Err(CipherError("ciphertext shorter than its IV".to_string()));
            }
            data.split_at(BLOCK_SIZE)
        } else {
            (&self.key[..BLOCK_SIZE], data)
        };

        match self.key.len() {
            16 => cbc_decrypt!(Aes128, &self.key, iv, body),
            24 => cbc_decrypt!(Aes192, &self.key, iv, body),
            _ => cbc_decrypt!(Aes256, &self.key, iv, body),
        }
    }

    fn decrypt_ecb(&self, data: &[u8]) -> std::result::Result<Vec<u8>, CipherError> {
        match self.key.len() {
            16 => ecb_decrypt!(Aes128, &self.key, data),
            24 => ecb_decrypt!(Aes192, &self.key, data),
            _ => ecb_decrypt!(Aes256, &self.key, data),
        }
    }
}

impl Decryptor for AesDecryptor {
    fn decrypt(&self, ciphertext: &[u8]) -> std::result::Result<Vec<u8>, CipherError> {
        match self.mode {
            Mode::Cbc => self.decrypt_cbc(ciphertext),
            Mode::Ecb => self.decrypt_ecb(ciphertext),
        }
    }
}
