//! MT Framework resource archives (`.arc`)
//!
//! An archive is a fixed header, a table of 80-byte entry records (the index), and the payloads those records point
//! at. The byte order of the whole container is detected from its magic, and the `ARCC` variant protects the index
//! with [`Blowfish`](crate::blowfish::Blowfish).
//!
//! Two codecs are provided:
//! * [`Archive`] reads and writes plain and encrypted archives. The layout of each entry's packed size/flags word
//!   follows from the detected byte order.
//! * [`LegacyArchive`] is a read-only codec for older archives whose flags layout must be chosen explicitly, since
//!   those were shipped with either layout regardless of byte order.
//!
//! # Reading
//! ```rust
//! use mtarc::{
//!     archive::{Archive, ArchiveOptions},
//!     blowfish::Blowfish,
//!     prelude::*,
//! };
//! use std::{fs, path::Path};
//!
//! fn example() -> Option<()> {
//!     let path = Path::new("path/to/nativePC/arc/game.arc");
//!     let options = ArchiveOptions::builder()
//!         .cipher(Blowfish::new(b"key from the project settings").ok()?)
//!         .build();
//!     let archive = Archive::read(path, &options).ok()?;
//!     let mut stream = fs::File::open(path).ok()?;
//!     for entry in &archive.entries {
//!         let data = archive.read_entry(&mut stream, entry, &options).ok()?;
//!         println!("{}: {} bytes", entry.name, data.len());
//!     }
//!     Some(())
//! }
//! ```
//!
//! # Writing
//! ```rust
//! use mtarc::archive::{Archive, ArchiveEntry, ArchiveOptions, CompressionScheme};
//! use std::io::{Cursor, Seek as _, SeekFrom, Write as _};
//!
//! fn example() -> Option<()> {
//!     let options = ArchiveOptions::builder()
//!         .compression(CompressionScheme::Zlib)
//!         .build();
//!     let mut archive = Archive::new();
//!     let mut stream = Cursor::new(Vec::new());
//!     stream.seek(SeekFrom::Start(Archive::header_size(1) as u64)).ok()?;
//!
//!     let data = b"Hello world!\n";
//!     let stored = archive.pack_entry(data, &options).ok()?;
//!     archive.entries.push(ArchiveEntry {
//!         name: "text\\hello".into(),
//!         type_hash: 0x2A4F96A8,
//!         offset: stream.position().try_into().ok()?,
//!         compressed_size: stored.len().try_into().ok()?,
//!         uncompressed_size: data.len().try_into().ok()?,
//!         ..Default::default()
//!     });
//!     stream.write_all(&stored).ok()?;
//!
//!     stream.seek(SeekFrom::Start(0)).ok()?;
//!     archive.write(&mut stream, &options).ok()?;
//!     Some(())
//! }
//! ```

#[allow(clippy::module_inception)]
mod archive;
mod entry;
mod legacy;
mod payload;

pub use self::{
    archive::{Archive, Options as ArchiveOptions, OptionsBuilder as ArchiveOptionsBuilder},
    entry::{Entry as ArchiveEntry, FlagsLayout, Quality},
    legacy::{
        LegacyArchive, Options as LegacyOptions, OptionsBuilder as LegacyOptionsBuilder,
        LEGACY_FLAGS,
    },
    payload::{compress, decompress, CompressionScheme},
};

use crate::{blowfish, io::Endian};
use bstr::BString;
use core::num::TryFromIntError;
use std::io;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Cipher(#[from] blowfish::Error),

    #[error("buffer failed to decompress to the expected size... expected {expected} bytes, but got {actual} bytes")]
    DecompressionSizeMismatch { expected: usize, actual: usize },

    #[error("an operation on an integer would have truncated and corrupted data")]
    IntegralTruncation,

    #[error("entry {name} has flags {flags:#x}, but this archive revision only uses {expected:#x}", expected = LEGACY_FLAGS)]
    InvalidFlags { name: BString, flags: u8 },

    #[error("invalid magic read from archive header: {0:#010x}")]
    InvalidMagic(u32),

    #[error("invalid version read from archive header: {0}")]
    InvalidVersion(u16),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("the archive is encrypted, but no cipher key was configured")]
    MissingKey,

    #[error("entry name contains non-ascii characters: {0}")]
    NonAsciiName(BString),

    #[error("entry name is longer than {max} bytes: {0}", max = entry::NAME_SIZE)]
    NameTooLong(BString),

    #[error("the compression scheme {0:?} is not supported")]
    UnsupportedCompression(CompressionScheme),

    #[error("uncompressed size {0:#x} does not fit in the 29 bits available to it")]
    UncompressedSizeTooLarge(u64),
}

impl From<TryFromIntError> for Error {
    fn from(_: TryFromIntError) -> Self {
        Self::IntegralTruncation
    }
}

pub type Result<T> = core::result::Result<T, Error>;

/// The index record format revision.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub enum Version {
    #[default]
    v7 = 7,
    v8 = 8,
    v17 = 17,
}

impl TryFrom<u16> for Version {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            7 => Ok(Self::v7),
            8 => Ok(Self::v8),
            17 => Ok(Self::v17),
            _ => Err(Error::InvalidVersion(value)),
        }
    }
}

impl From<Version> for u16 {
    fn from(value: Version) -> Self {
        value as Self
    }
}

mod constants {
    use crate::cc;

    pub const ARC: u32 = cc::make_four(b"ARC\0");
    pub const ARCC: u32 = cc::make_four(b"ARCC");

    pub const HEADER_SIZE: usize = 0x8;
    pub const ENTRY_SIZE: usize = 0x50;

    pub const MAX_UNCOMPRESSED_SIZE: u32 = 0x1FFF_FFFF;
}

/// Classifies a magic read as little-endian, yielding the byte order and whether the index is encrypted.
#[must_use]
pub(crate) fn sniff_magic(magic: u32) -> Option<(Endian, bool)> {
    match magic {
        constants::ARC => Some((Endian::Little, false)),
        constants::ARCC => Some((Endian::Little, true)),
        x if x.swap_bytes() == constants::ARC => Some((Endian::Big, false)),
        x if x.swap_bytes() == constants::ARCC => Some((Endian::Big, true)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        archive::{sniff_magic, Error, Version},
        io::Endian,
    };

    #[test]
    fn magic_detection() {
        let le = |bytes: [u8; 4]| u32::from_le_bytes(bytes);
        assert_eq!(sniff_magic(le(*b"ARC\0")), Some((Endian::Little, false)));
        assert_eq!(sniff_magic(le(*b"\0CRA")), Some((Endian::Big, false)));
        assert_eq!(sniff_magic(le(*b"ARCC")), Some((Endian::Little, true)));
        assert_eq!(sniff_magic(le(*b"CCRA")), Some((Endian::Big, true)));
        assert_eq!(sniff_magic(le(*b"BSA\0")), None);
    }

    #[test]
    fn supported_versions() {
        assert_eq!(Version::try_from(7).ok(), Some(Version::v7));
        assert_eq!(Version::try_from(8).ok(), Some(Version::v8));
        assert_eq!(Version::try_from(17).ok(), Some(Version::v17));
        assert!(matches!(
            Version::try_from(9),
            Err(Error::InvalidVersion(9))
        ));
        assert_eq!(u16::from(Version::v17), 17);
    }
}
