//! Decryption of `![...]` property values.
//!
//! The crate never implements a cipher itself. A [`Decryptor`] reverses a symmetric
//! encryption of a byte sequence; [`DecryptionContext`] binds one to the configured
//! algorithm, mode and key, and [`filter`] applies it to merged properties.

#[cfg(feature = "aes")]
mod aes;
pub mod filter;

#[cfg(feature = "aes")]
pub use self::aes::AesDecryptor;

use crate::error::{ConfigError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::str::FromStr;

/// Failure reported by a [`Decryptor`].
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CipherError(pub String);

/// A component able to reverse a symmetric encryption.
///
/// Implementations are stateless per call and may be shared across threads.
pub trait Decryptor: Send + Sync {
    /// Decrypt `ciphertext`, returning the raw plaintext bytes.
    fn decrypt(&self, ciphertext: &[u8]) -> std::result::Result<Vec<u8>, CipherError>;
}

impl<F> Decryptor for F
where
    F: Fn(&[u8]) -> std::result::Result<Vec<u8>, CipherError> + Send + Sync,
{
    fn decrypt(&self, ciphertext: &[u8]) -> std::result::Result<Vec<u8>, CipherError> {
        self(ciphertext)
    }
}

/// Symmetric encryption algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// AES-128/192/256, selected by key length.
    #[default]
    Aes,
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AES" => Ok(Self::Aes),
            other => Err(ConfigError::Configuration(format!(
                "Unsupported encryption algorithm: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aes => write!(f, "AES"),
        }
    }
}

/// Block cipher mode of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Cipher block chaining.
    #[default]
    Cbc,
    /// Electronic codebook.
    Ecb,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CBC" => Ok(Self::Cbc),
            "ECB" => Ok(Self::Ecb),
            other => Err(ConfigError::Configuration(format!(
                "Unsupported encryption mode: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cbc => write!(f, "CBC"),
            Self::Ecb => write!(f, "ECB"),
        }
    }
}

/// Settings that enable decryption of marked values.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionSettings {
    /// Cipher algorithm.
    pub algorithm: Algorithm,
    /// Cipher mode.
    pub mode: Mode,
    /// Secret key; its UTF-8 bytes are the cipher key.
    pub key: String,
    /// When true, each ciphertext starts with its own IV block.
    /// Otherwise the IV is the first block of the key.
    pub random_iv: bool,
}

impl EncryptionSettings {
    /// Settings with the default algorithm (`AES`) and mode (`CBC`).
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            algorithm: Algorithm::default(),
            mode: Mode::default(),
            key: key.into(),
            random_iv: false,
        }
    }
}

impl fmt::Debug for EncryptionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionSettings")
            .field("algorithm", &self.algorithm)
            .field("mode", &self.mode)
            .field("key", &"****")
            .field("random_iv", &self.random_iv)
            .finish()
    }
}

/// A decryptor bound to its algorithm and mode, built once per client.
pub struct DecryptionContext {
    algorithm: String,
    mode: String,
    decryptor: Box<dyn Decryptor>,
}

impl DecryptionContext {
    /// Build the provider matching `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Configuration`] for an unusable key and
    /// [`ConfigError::FeatureNotEnabled`] when the provider is compiled out.
    pub fn new(settings: &EncryptionSettings) -> Result<Self> {
        match settings.algorithm {
            #[cfg(feature = "aes")]
            Algorithm::Aes => {
                let decryptor =
                    AesDecryptor::new(settings.key.as_bytes(), settings.mode, settings.random_iv)?;
                Ok(Self::with_decryptor(
                    settings.algorithm.to_string(),
                    settings.mode.to_string(),
                    decryptor,
                ))
            }
            #[cfg(not(feature = "aes"))]
            Algorithm::Aes => Err(ConfigError::FeatureNotEnabled("aes")),
        }
    }

    /// Wrap a custom decryptor.
    pub fn with_decryptor<D: Decryptor + 'static>(
        algorithm: impl Into<String>,
        mode: impl Into<String>,
        decryptor: D,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            mode: mode.into(),
            decryptor: Box::new(decryptor),
        }
    }

    /// Algorithm label, for diagnostics.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Mode label, for diagnostics.
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Decode and decrypt a marker payload (the text between `![` and `]`).
    ///
    /// `key` only names the property in errors.
    pub fn decrypt_payload(&self, key: &str, payload: &str) -> Result<String> {
        let ciphertext = STANDARD
            .decode(payload.trim())
            .map_err(|e| ConfigError::decryption(key, format!("invalid base64 payload: {}", e)))?;

        let plaintext = self
            .decryptor
            .decrypt(&ciphertext)
            .map_err(|e| ConfigError::decryption(key, e.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| ConfigError::decryption(key, "plaintext is not valid UTF-8"))
    }
}

impl fmt::Debug for DecryptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionContext")
            .field("algorithm", &self.algorithm)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
