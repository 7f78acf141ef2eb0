/// RSA key pair provisioning
///
/// A single idempotent routine decides whether key material has to be created:
///
/// - private key file missing or empty: generate a fresh 2048-bit pair and
///   write both PEM files
/// - private key present, public key missing or empty: derive the public key
///   and write it
/// - both present: load both and make sure they belong together
///
/// Files are PKCS#8 (`BEGIN PRIVATE KEY`) and X.509 SubjectPublicKeyInfo
/// (`BEGIN PUBLIC KEY`). Reading only looks at the base64 body, so files whose
/// armor labels are off (e.g. a public key closed by `END PRIVATE KEY`) still load.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const RSA_KEY_BITS: usize = 2048;

pub const DEFAULT_PRIVATE_KEY_FILE: &str = "privateKey.pem";
pub const DEFAULT_PUBLIC_KEY_FILE: &str = "publicKey.pem";

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to read key file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write key file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid key in {path}: {reason}")]
    InvalidKey { path: PathBuf, reason: String },

    #[error("RSA key generation failed: {0}")]
    Generation(String),

    #[error("key encoding failed: {0}")]
    Encoding(String),

    #[error("public key does not match private key")]
    Mismatch,
}

/// Where the key files live. Unset paths fall back to the system temp dir.
#[derive(Debug, Clone, Default)]
pub struct KeyConfig {
    pub private_key_path: Option<PathBuf>,
    pub public_key_path: Option<PathBuf>,
}

impl KeyConfig {
    pub fn new(private_key_path: impl Into<PathBuf>, public_key_path: impl Into<PathBuf>) -> Self {
        Self {
            private_key_path: Some(private_key_path.into()),
            public_key_path: Some(public_key_path.into()),
        }
    }

    pub fn private_key_path(&self) -> PathBuf {
        resolve(self.private_key_path.as_deref(), DEFAULT_PRIVATE_KEY_FILE)
    }

    pub fn public_key_path(&self) -> PathBuf {
        resolve(self.public_key_path.as_deref(), DEFAULT_PUBLIC_KEY_FILE)
    }
}

fn resolve(configured: Option<&Path>, default_file: &str) -> PathBuf {
    match configured {
        Some(path) if !path.as_os_str().is_empty() => path.to_path_buf(),
        _ => std::env::temp_dir().join(default_file),
    }
}

/// Matching RSA private/public keys.
#[derive(Clone)]
pub struct KeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl KeyPair {
    pub fn new(private_key: RsaPrivateKey, public_key: RsaPublicKey) -> Result<Self, KeyError> {
        if private_key.to_public_key() != public_key {
            return Err(KeyError::Mismatch);
        }
        Ok(Self {
            private_key,
            public_key,
        })
    }

    pub fn generate() -> Result<Self, KeyError> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
            .map_err(|e| KeyError::Generation(e.to_string()))?;
        let public_key = private_key.to_public_key();
        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Parse PEM text for both halves (armor labels are not checked).
    pub fn from_pem(private_pem: &str, public_pem: &str) -> Result<Self, KeyError> {
        let private_key = decode_private_key(Path::new("<memory>"), private_pem)?;
        let public_key = decode_public_key(Path::new("<memory>"), public_pem)?;
        Self::new(private_key, public_key)
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn private_key_pem(&self) -> Result<String, KeyError> {
        self.private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| KeyError::Encoding(e.to_string()))
    }

    pub fn public_key_pem(&self) -> Result<String, KeyError> {
        encode_public_key(&self.public_key)
    }

    pub fn encoding_key(&self) -> Result<EncodingKey, KeyError> {
        let pem = self.private_key_pem()?;
        EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| KeyError::Encoding(e.to_string()))
    }

    pub fn decoding_key(&self) -> Result<DecodingKey, KeyError> {
        let pem = self.public_key_pem()?;
        DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| KeyError::Encoding(e.to_string()))
    }
}

/// Generate the key pair on first run, load it on every run after that.
pub fn provision(config: &KeyConfig) -> Result<KeyPair, KeyError> {
    let private_path = config.private_key_path();
    let public_path = config.public_key_path();

    if is_missing_or_empty(&private_path) {
        let pair = KeyPair::generate()?;
        write_key_file(&private_path, &pair.private_key_pem()?, true)?;
        write_key_file(&public_path, &pair.public_key_pem()?, false)?;
        info!(
            private_key = %private_path.display(),
            public_key = %public_path.display(),
            "Generated RSA key pair"
        );
        return Ok(pair);
    }

    let private_key = decode_private_key(&private_path, &read_key_file(&private_path)?)?;

    let public_key = if is_missing_or_empty(&public_path) {
        let public_key = private_key.to_public_key();
        write_key_file(&public_path, &encode_public_key(&public_key)?, false)?;
        info!(public_key = %public_path.display(), "Derived public key from private key");
        public_key
    } else {
        decode_public_key(&public_path, &read_key_file(&public_path)?)?
    };

    let pair = KeyPair::new(private_key, public_key)?;
    info!(
        private_key = %private_path.display(),
        public_key = %public_path.display(),
        "Loaded RSA key pair"
    );
    Ok(pair)
}

fn is_missing_or_empty(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true)
}

fn read_key_file(path: &Path) -> Result<String, KeyError> {
    fs::read_to_string(path).map_err(|source| KeyError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write_key_file(path: &Path, pem: &str, private: bool) -> Result<(), KeyError> {
    let write_err = |source| KeyError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        if private {
            options.mode(0o600);
        }
        let mut file = options.open(path).map_err(write_err)?;
        // `mode` only applies on creation; tighten a pre-existing file too
        if private {
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        file.write_all(pem.as_bytes()).map_err(write_err)?;
    }
    #[cfg(not(unix))]
    {
        let _ = private;
        let mut file = options.open(path).map_err(write_err)?;
        file.write_all(pem.as_bytes()).map_err(write_err)?;
    }

    Ok(())
}

/// Base64 body of a PEM document with armor lines and line breaks removed.
fn pem_body(pem: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let body: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("-----"))
        .collect();
    STANDARD.decode(body)
}

fn decode_private_key(path: &Path, pem: &str) -> Result<RsaPrivateKey, KeyError> {
    let invalid = |reason: String| KeyError::InvalidKey {
        path: path.to_path_buf(),
        reason,
    };
    let der = pem_body(pem).map_err(|e| invalid(e.to_string()))?;
    RsaPrivateKey::from_pkcs8_der(&der).map_err(|e| invalid(e.to_string()))
}

fn decode_public_key(path: &Path, pem: &str) -> Result<RsaPublicKey, KeyError> {
    let invalid = |reason: String| KeyError::InvalidKey {
        path: path.to_path_buf(),
        reason,
    };
    let der = pem_body(pem).map_err(|e| invalid(e.to_string()))?;
    RsaPublicKey::from_public_key_der(&der).map_err(|e| invalid(e.to_string()))
}

fn encode_public_key(public_key: &RsaPublicKey) -> Result<String, KeyError> {
    public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyError::Encoding(e.to_string()))
}
