//! The registry of known payload types.
//!
//! Archives identify the type of each payload by a 31-bit hash of its type name (see [`hash_type`]). A registry is
//! loaded from a plain text table, one type per line:
//!
//! ```text
//! # hash    extension  name
//! 241F5DEB  .tex       rTexture
//! 58A15856  .mod       rModel
//! ????????             rSomethingNew   # hash not verified
//! ```
//!
//! The hash may be given as `????????` to skip verification, and the extension, which includes its leading dot, is
//! optional. Everything following a `#` is ignored.
//!
//! ```rust
//! use mtarc::file_types::FileTypes;
//!
//! fn example() -> Option<()> {
//!     let types: FileTypes = "241F5DEB .tex rTexture".parse().ok()?;
//!     assert_eq!(types.name(0x241F5DEB), Some("rTexture"));
//!     assert_eq!(types.file_name("stage\\s101".into(), 0x241F5DEB), "stage\\s101.tex");
//!     Some(())
//! }
//! ```

pub use crate::hashing::hash_type;

use bstr::{BStr, BString, ByteVec as _};
use std::{collections::BTreeMap, fs, io, path::Path, str::FromStr};

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("type {name} is listed with the hash {existing_hash:08X}, which is already taken by {existing}")]
    DuplicateHash {
        name: String,
        existing: String,
        existing_hash: u32,
    },

    #[error("extension {extension} of type {name} is already used by {existing}")]
    DuplicateExtension {
        extension: String,
        name: String,
        existing: String,
    },

    #[error("given hash does not match actual hash for {name} ({given:08X} vs {actual:08X})")]
    HashMismatch {
        name: String,
        given: u32,
        actual: u32,
    },

    #[error("failed to parse hash on line {line}: {text}")]
    InvalidHash { line: usize, text: String },

    #[error("line {line} has more fields than expected: {text}")]
    InvalidLine { line: usize, text: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

mod constants {
    pub const UNVERIFIED_HASH: &str = "????????";
    pub const UNKNOWN_PREFIX: &str = ".UNK#";
}

/// Maps type hashes to their names and file extensions, and back.
#[derive(Clone, Debug, Default)]
pub struct FileTypes {
    names: BTreeMap<u32, String>,
    extensions: BTreeMap<u32, String>,
    hashes: BTreeMap<String, u32>,
}

impl FileTypes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents of the registry with the given table.
    ///
    /// On failure, the registry is left untouched.
    pub fn load(&mut self, text: &str) -> Result<()> {
        *self = text.parse()?;
        Ok(())
    }

    pub fn load_from_path(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)?;
        self.load(&text)
    }

    #[must_use]
    pub fn contains(&self, hash: u32) -> bool {
        self.names.contains_key(&hash)
    }

    #[must_use]
    pub fn name(&self, hash: u32) -> Option<&str> {
        self.names.get(&hash).map(String::as_str)
    }

    #[must_use]
    pub fn extension(&self, hash: u32) -> Option<&str> {
        self.extensions.get(&hash).map(String::as_str)
    }

    #[must_use]
    pub fn hash_from_extension(&self, extension: &str) -> Option<u32> {
        self.hashes.get(extension).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Builds the file name an entry is extracted to.
    ///
    /// Known types append their extension, or a dot and their type name if they have none. Unknown types append
    /// `.UNK#` followed by the hash in hex, which [`Self::resolve_extension`] understands when packing.
    #[must_use]
    pub fn file_name(&self, name: &BStr, hash: u32) -> BString {
        let mut result = BString::from(name);
        match (self.extension(hash), self.name(hash)) {
            (Some(extension), _) => result.push_str(extension),
            (None, Some(type_name)) => {
                result.push_byte(b'.');
                result.push_str(type_name);
            }
            (None, None) => result.push_str(format!("{}{hash:08X}", constants::UNKNOWN_PREFIX)),
        }
        result
    }

    /// Resolves a file extension, including its leading dot, back to a type hash.
    #[must_use]
    pub fn resolve_extension(&self, extension: &str) -> Option<u32> {
        if let Some(hash) = self.hash_from_extension(extension) {
            return Some(hash);
        }

        if let Some(hex) = extension.strip_prefix(constants::UNKNOWN_PREFIX) {
            return u32::from_str_radix(hex, 16).ok();
        }

        let type_name = extension.strip_prefix('.')?;
        let hash = hash_type(type_name);
        (self.name(hash) == Some(type_name)).then_some(hash)
    }

    fn insert(&mut self, name: &str, extension: Option<&str>) -> Result<()> {
        let hash = hash_type(name);
        if let Some(existing) = self.names.get(&hash) {
            return Err(Error::DuplicateHash {
                name: name.into(),
                existing: existing.clone(),
                existing_hash: hash,
            });
        }

        if let Some(extension) = extension {
            if let Some(owner) = self.hashes.get(extension) {
                return Err(Error::DuplicateExtension {
                    extension: extension.into(),
                    name: name.into(),
                    existing: self.names.get(owner).cloned().unwrap_or_default(),
                });
            }
            self.extensions.insert(hash, extension.into());
            self.hashes.insert(extension.into(), hash);
        }

        self.names.insert(hash, name.into());
        Ok(())
    }
}

fn parse_hash(line: usize, text: &str) -> Result<u32> {
    u32::from_str_radix(text, 16).map_err(|_| Error::InvalidHash {
        line,
        text: text.into(),
    })
}

impl FromStr for FileTypes {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let mut result = Self::new();
        for (idx, line) in text.lines().enumerate() {
            let number = idx + 1;
            let line = line.split_once('#').map_or(line, |(x, _)| x);
            let parts: Vec<_> = line.split_whitespace().collect();
            let (hash_text, extension, name) = match parts[..] {
                [] => continue,
                [hash_text] => {
                    parse_hash(number, hash_text)?;
                    continue;
                }
                [hash_text, name] => (hash_text, None, name),
                [hash_text, extension, name] => (hash_text, Some(extension), name),
                _ => {
                    return Err(Error::InvalidLine {
                        line: number,
                        text: line.trim().into(),
                    })
                }
            };

            if hash_text != constants::UNVERIFIED_HASH {
                let given = parse_hash(number, hash_text)?;
                let actual = hash_type(name);
                if given != actual {
                    return Err(Error::HashMismatch {
                        name: name.into(),
                        given,
                        actual,
                    });
                }
            }

            result.insert(name, extension)?;
        }

        tracing::debug!(count = result.len(), "loaded file types");
        Ok(result)
    }
}
