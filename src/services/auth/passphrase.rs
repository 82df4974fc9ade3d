//! Shared HMAC passphrase: load it from disk or generate and persist a new one.
//!
//! The store is built once at startup and handed to `AuthGate` by `Arc`.
//! `init` must complete before the listener accepts traffic; after that the
//! passphrase is read-only and needs no locking. Concurrent `init` calls are
//! serialized, so the file on disk always matches the published secret.

use std::fs::{self, DirBuilder};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const PASSPHRASE_FILE_NAME: &str = "passPhraseJWT.txt";
pub const PASSPHRASE_LEN: usize = 16;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
// Largest multiple of the alphabet size that fits in a byte; higher bytes are dropped.
const SAMPLE_LIMIT: usize = 256 - 256 % ALPHABET.len();

#[derive(Debug, Error)]
pub enum PassphraseError {
    #[error("failed to create passphrase directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("os entropy source failed: {0}")]
    Entropy(String),

    #[error("passphrase store is already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassphraseSource {
    LoadedFromFile,
    Generated,
}

/// Verification secret. Key material is intentionally not printable via Debug.
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase {
    value: Vec<u8>,
    source: PassphraseSource,
}

impl std::fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Passphrase")
            .field("len", &self.value.len())
            .field("source", &self.source)
            .finish()
    }
}

impl Passphrase {
    pub fn expose(&self) -> &[u8] {
        &self.value
    }

    pub fn source(&self) -> PassphraseSource {
        self.source
    }
}

#[derive(Debug, Default)]
pub struct PassphraseStore {
    // Set exactly once; doubles as the initialization flag.
    passphrase: OnceLock<Passphrase>,
    // Held for the whole of `init` so only one caller ever touches the file.
    init_lock: Mutex<()>,
}

impl PassphraseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Establish the passphrase from `dir`.
    ///
    /// - A missing `dir` is created (owner-only on unix); failure is fatal.
    /// - An existing non-empty `passPhraseJWT.txt` is used byte-for-byte.
    /// - Otherwise a fresh secret is generated and written back. A write
    ///   failure is only logged: the secret then lives in memory until restart.
    pub fn init(&self, dir: impl AsRef<Path>) -> Result<&Passphrase, PassphraseError> {
        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_initialized() {
            return Err(PassphraseError::AlreadyInitialized);
        }

        let dir = dir.as_ref();
        if fs::metadata(dir).is_err() {
            create_private_dir(dir).map_err(|source| PassphraseError::DirectoryCreation {
                path: dir.to_path_buf(),
                source,
            })?;
            info!(path = %dir.display(), "created passphrase directory");
        }

        let file_path = dir.join(PASSPHRASE_FILE_NAME);
        let passphrase = match fs::read(&file_path) {
            Ok(value) if !value.is_empty() => {
                debug!(path = %file_path.display(), "loaded passphrase from file");
                Passphrase {
                    value,
                    source: PassphraseSource::LoadedFromFile,
                }
            }
            read => {
                match read {
                    Ok(_) => warn!(path = %file_path.display(), "passphrase file is empty"),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!(path = %file_path.display(), error = %e, "cannot read passphrase file")
                    }
                }

                let value = generate_passphrase()?;
                if let Err(e) = write_private_file(&file_path, &value) {
                    warn!(
                        path = %file_path.display(),
                        error = %e,
                        "cannot persist passphrase; it will be regenerated on restart"
                    );
                } else {
                    info!(path = %file_path.display(), "generated new passphrase");
                }
                Passphrase {
                    value,
                    source: PassphraseSource::Generated,
                }
            }
        };

        self.passphrase
            .set(passphrase)
            .map_err(|_| PassphraseError::AlreadyInitialized)?;
        self.passphrase
            .get()
            .ok_or(PassphraseError::AlreadyInitialized)
    }

    pub fn secret(&self) -> Option<&Passphrase> {
        self.passphrase.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.passphrase.get().is_some()
    }
}

fn generate_passphrase() -> Result<Vec<u8>, PassphraseError> {
    let mut out = Vec::with_capacity(PASSPHRASE_LEN);
    let mut buf = [0u8; 32];

    while out.len() < PASSPHRASE_LEN {
        getrandom::fill(&mut buf).map_err(|e| PassphraseError::Entropy(e.to_string()))?;
        let missing = PASSPHRASE_LEN - out.len();
        out.extend(
            buf.iter()
                .map(|&b| usize::from(b))
                .filter(|&b| b < SAMPLE_LIMIT)
                .map(|b| ALPHABET[b % ALPHABET.len()])
                .take(missing),
        );
    }

    Ok(out)
}

fn create_private_dir(dir: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

// Written next to the target and renamed over it, so a crash never leaves a
// truncated passphrase behind. The temp file is created 0o600 on unix.
fn write_private_file(path: &Path, value: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(value)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
