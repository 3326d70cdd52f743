use crate::{
    archive::{constants, Error, Result},
    io::{Endian, Sink, Source},
    strings::FixedString,
};
use bstr::BString;
use std::io::{Read, Write};

pub(crate) const NAME_SIZE: usize = 0x40;

/// A compression profile hint stored alongside each entry.
///
/// The codec only preserves this value; it has no bearing on how payloads are stored.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Quality {
    Lowest = 0,
    Low = 1,
    #[default]
    Normal = 2,
    High = 3,
    Highest = 4,
    StreamLow = 5,
    StreamHigh = 6,
    Invalid = 7,
}

impl Quality {
    /// Decodes the low 3 bits of `bits`.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x7 {
            0 => Self::Lowest,
            1 => Self::Low,
            2 => Self::Normal,
            3 => Self::High,
            4 => Self::Highest,
            5 => Self::StreamLow,
            6 => Self::StreamHigh,
            _ => Self::Invalid,
        }
    }

    #[must_use]
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Where the 3 flag bits sit within an entry's packed size/flags word.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FlagsLayout {
    /// Flags in bits 0-2, uncompressed size in bits 3-31.
    #[default]
    Lower,
    /// Uncompressed size in bits 0-28, flags in bits 29-31.
    Upper,
}

impl FlagsLayout {
    /// The layout used by the encryption-capable codec: little-endian archives keep their flags in the upper bits,
    /// big-endian archives in the lower bits.
    #[must_use]
    pub fn for_endian(endian: Endian) -> Self {
        match endian {
            Endian::Little => Self::Upper,
            Endian::Big => Self::Lower,
        }
    }

    /// Packs a size and flags into one word. The size must already have been checked to fit in 29 bits.
    #[must_use]
    pub fn pack(self, size: u32, flags: u8) -> u32 {
        let size = size & constants::MAX_UNCOMPRESSED_SIZE;
        let flags = u32::from(flags & 0x7);
        match self {
            Self::Lower => (size << 3) | flags,
            Self::Upper => size | (flags << 29),
        }
    }

    /// Splits a packed word into its size and flags.
    #[must_use]
    pub fn unpack(self, word: u32) -> (u32, u8) {
        match self {
            Self::Lower => (word >> 3, (word & 0x7) as u8),
            Self::Upper => (word & constants::MAX_UNCOMPRESSED_SIZE, (word >> 29) as u8),
        }
    }
}

/// A single record from an archive's index.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Entry {
    /// The entry's path, without an extension, using back slashes as separators.
    pub name: BString,
    /// The hash of the payload's type name. See [`FileTypes`](crate::file_types::FileTypes).
    pub type_hash: u32,
    /// The absolute position of the payload within the archive.
    pub offset: u32,
    /// The size of the payload as stored.
    pub compressed_size: u32,
    /// The size of the payload once decompressed. Must fit in 29 bits.
    pub uncompressed_size: u32,
    pub quality: Quality,
}

impl Entry {
    pub(crate) fn read<I>(source: &mut Source<I>, endian: Endian, layout: FlagsLayout) -> Result<Self>
    where
        I: ?Sized + Read,
    {
        let name = source.read_protocol::<FixedString<NAME_SIZE>>(endian)?;
        let (type_hash, compressed_size, flags, offset): (u32, u32, u32, u32) =
            source.read(endian)?;
        let (uncompressed_size, quality) = layout.unpack(flags);
        Ok(Self {
            name,
            type_hash,
            offset,
            compressed_size,
            uncompressed_size,
            quality: Quality::from_bits(quality),
        })
    }

    pub(crate) fn write<O>(&self, sink: &mut Sink<O>, endian: Endian, layout: FlagsLayout) -> Result<()>
    where
        O: ?Sized + Write,
    {
        self.validate()?;
        let flags = layout.pack(self.uncompressed_size, self.quality.bits());
        sink.write_protocol::<FixedString<NAME_SIZE>>(&self.name, endian)?;
        sink.write(
            &(self.type_hash, self.compressed_size, flags, self.offset),
            endian,
        )?;
        Ok(())
    }

    /// Checks that the entry can be written without losing data.
    pub fn validate(&self) -> Result<()> {
        if self.uncompressed_size > constants::MAX_UNCOMPRESSED_SIZE {
            Err(Error::UncompressedSizeTooLarge(self.uncompressed_size.into()))
        } else if self.name.len() > NAME_SIZE {
            Err(Error::NameTooLong(self.name.clone()))
        } else if !self.name.is_ascii() {
            Err(Error::NonAsciiName(self.name.clone()))
        } else {
            Ok(())
        }
    }
}
