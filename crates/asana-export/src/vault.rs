//! Credential vault.
//!
//! Keeps the Asana access token encrypted at rest with AES-256-GCM. The key
//! lives next to it in a plaintext key file; losing that file makes the
//! stored token unrecoverable and the operator has to enter it again.
//!
//! Stored ciphertext layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use tracing::{debug, info, warn};

use crate::error::{ExportError, ExportResult};

/// Default key file name, relative to the working directory.
pub const KEY_FILE: &str = "secret.key";

/// Default encrypted-secret file name, relative to the working directory.
pub const SECRET_FILE: &str = "api_key.txt";

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// A secret value (the access token). `Debug` never prints the contents.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Wrap raw bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw bytes.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// The secret as UTF-8 text.
    ///
    /// # Errors
    /// Returns [`ExportError::Integrity`] if the bytes are not valid UTF-8.
    pub fn expose_str(&self) -> ExportResult<&str> {
        std::str::from_utf8(&self.0).map_err(|_| ExportError::Integrity)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Symmetric key used to seal the stored secret.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Generate a fresh key from the OS random number generator.
    #[must_use]
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&key);
        Self(bytes)
    }

    /// Build a key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

/// Encrypt a secret under `key`.
///
/// Each call draws a fresh nonce, so encrypting the same secret twice yields
/// different ciphertexts.
///
/// # Errors
/// Returns [`ExportError::Encryption`] if the cipher fails.
pub fn encrypt(secret: &[u8], key: &EncryptionKey) -> ExportResult<Vec<u8>> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = key
        .cipher()
        .encrypt(&nonce, secret)
        .map_err(|_| ExportError::Encryption)?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypt a secret sealed by [`encrypt`].
///
/// # Errors
/// Returns [`ExportError::Integrity`] if the data is truncated, was modified,
/// or was encrypted under a different key.
pub fn decrypt(ciphertext: &[u8], key: &EncryptionKey) -> ExportResult<Secret> {
    if ciphertext.len() < NONCE_LEN {
        return Err(ExportError::Integrity);
    }

    let (nonce, sealed) = ciphertext.split_at(NONCE_LEN);
    key.cipher()
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map(Secret)
        .map_err(|_| ExportError::Integrity)
}

/// Load the key at `path`, generating and persisting one if it is missing.
///
/// # Errors
/// Returns error if the key file cannot be read or written, or holds the
/// wrong number of bytes.
pub fn ensure_key_exists(path: &Path) -> ExportResult<EncryptionKey> {
    match fs::read(path) {
        Ok(bytes) => {
            let found = bytes.len();
            let bytes: [u8; KEY_LEN] =
                bytes.try_into().map_err(|_| ExportError::InvalidKey {
                    path: path.to_path_buf(),
                    expected: KEY_LEN,
                    found,
                })?;
            debug!(path = %path.display(), "Loaded encryption key");
            Ok(EncryptionKey::from_bytes(bytes))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let key = EncryptionKey::generate();
            write_private(path, key.as_bytes())?;
            info!(path = %path.display(), "Generated new encryption key");
            Ok(key)
        }
        Err(e) => Err(ExportError::io(path, e)),
    }
}

/// Write `bytes` to `path`, readable by the owner only on Unix.
fn write_private(path: &Path, bytes: &[u8]) -> ExportResult<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| ExportError::io(path, e))?;

    // `mode` only applies on creation; tighten files that already existed.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| ExportError::io(path, e))?;
    }

    file.write_all(bytes).map_err(|e| ExportError::io(path, e))
}

/// Source of operator decisions the vault cannot make on its own.
pub trait SecretPrompt {
    /// Ask whether the stored secret should be reused.
    ///
    /// # Errors
    /// Returns error if the prompt cannot be shown or answered.
    fn confirm_reuse(&mut self) -> ExportResult<bool>;

    /// Ask for a new secret without echoing it.
    ///
    /// # Errors
    /// Returns error if the prompt cannot be shown or answered.
    fn read_secret(&mut self) -> ExportResult<String>;
}

/// Key file and encrypted-secret file pair.
#[derive(Debug, Clone)]
pub struct Vault {
    key_path: PathBuf,
    secret_path: PathBuf,
}

impl Default for Vault {
    fn default() -> Self {
        Self::new(KEY_FILE, SECRET_FILE)
    }
}

impl Vault {
    /// Vault backed by the given files.
    pub fn new(key_path: impl Into<PathBuf>, secret_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
            secret_path: secret_path.into(),
        }
    }

    /// Vault using the default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(KEY_FILE), dir.join(SECRET_FILE))
    }

    /// Path of the key file.
    #[must_use]
    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Path of the encrypted-secret file.
    #[must_use]
    pub fn secret_path(&self) -> &Path {
        &self.secret_path
    }

    /// Whether an encrypted secret is on disk.
    #[must_use]
    pub fn has_stored_secret(&self) -> bool {
        self.secret_path.exists()
    }

    /// Encrypt and persist `secret`, replacing any stored one.
    ///
    /// # Errors
    /// Returns error if the key cannot be loaded or the file cannot be written.
    pub fn store(&self, secret: &Secret) -> ExportResult<()> {
        let key = ensure_key_exists(&self.key_path)?;
        let sealed = encrypt(secret.expose(), &key)?;
        write_private(&self.secret_path, &sealed)?;
        info!(path = %self.secret_path.display(), "Saved encrypted access token");
        Ok(())
    }

    /// Load and decrypt the stored secret.
    ///
    /// # Errors
    /// Returns [`ExportError::Integrity`] if decryption fails, or an I/O error
    /// if either file cannot be read.
    pub fn load(&self) -> ExportResult<Secret> {
        let key = ensure_key_exists(&self.key_path)?;
        let sealed =
            fs::read(&self.secret_path).map_err(|e| ExportError::io(&self.secret_path, e))?;
        decrypt(&sealed, &key)
    }

    /// Delete the stored secret. Returns whether a file was removed.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be removed.
    pub fn forget(&self) -> ExportResult<bool> {
        match fs::remove_file(&self.secret_path) {
            Ok(()) => {
                info!(path = %self.secret_path.display(), "Removed stored access token");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ExportError::io(&self.secret_path, e)),
        }
    }

    /// Reuse the stored secret or ask for a new one.
    ///
    /// If a secret is stored, `prompt` decides whether to reuse it. Replacing
    /// deletes the old file, reads a new secret and stores it encrypted.
    ///
    /// # Errors
    /// Returns [`ExportError::Integrity`] if the reused secret cannot be
    /// decrypted; the vault does not fall back to prompting.
    pub fn load_or_prompt_secret(&self, prompt: &mut dyn SecretPrompt) -> ExportResult<Secret> {
        ensure_key_exists(&self.key_path)?;

        if self.has_stored_secret() {
            if prompt.confirm_reuse()? {
                return self.load();
            }
            self.forget()?;
        }

        let entered = prompt.read_secret()?;
        let entered = entered.trim();
        if entered.is_empty() {
            warn!("Empty access token entered");
            return Err(ExportError::Prompt("access token must not be empty".into()));
        }

        let secret = Secret::new(entered.as_bytes());
        self.store(&secret)?;
        Ok(secret)
    }
}
