use crate::{
    archive::{
        constants, payload, ArchiveEntry as Entry, CompressionScheme, Error, FlagsLayout, Result,
        Version,
    },
    blowfish::Blowfish,
    derive,
    io::{Endian, Sink, Source},
};
use std::io::{Cursor, Read, Seek, Write};

#[derive(Debug, Default)]
#[repr(transparent)]
pub struct OptionsBuilder(Options);

impl OptionsBuilder {
    #[must_use]
    pub fn build(self) -> Options {
        self.0
    }

    /// The keyed cipher used for encrypted archives.
    #[must_use]
    pub fn cipher(mut self, cipher: Blowfish) -> Self {
        self.0.cipher = Some(cipher);
        self
    }

    #[must_use]
    pub fn cipher_endian(mut self, cipher_endian: Endian) -> Self {
        self.0.cipher_endian = cipher_endian;
        self
    }

    #[must_use]
    pub fn compression(mut self, compression: CompressionScheme) -> Self {
        self.0.compression = compression;
        self
    }

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Common parameters to configure how archives are read/written.
///
/// ```rust
/// use mtarc::{
///     archive::{ArchiveOptions, CompressionScheme},
///     blowfish::Blowfish,
///     Endian,
/// };
///
/// fn example() -> Option<()> {
///     // Dragon's Dogma, PC
///     let _ = ArchiveOptions::builder()
///         .cipher(Blowfish::new(b"QZHaM;-5:)dV#").ok()?)
///         .cipher_endian(Endian::Little)
///         .compression(CompressionScheme::Zlib)
///         .build();
///
///     // Xbox 360 titles
///     let _ = ArchiveOptions::builder()
///         .compression(CompressionScheme::XCompress)
///         .build();
///     Some(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Options {
    cipher: Option<Blowfish>,
    cipher_endian: Endian,
    compression: CompressionScheme,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cipher: None,
            cipher_endian: Endian::Big,
            compression: CompressionScheme::default(),
        }
    }
}

impl Options {
    #[must_use]
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// Returns an independent copy of the configured cipher, if any.
    #[must_use]
    pub fn cipher(&self) -> Option<Blowfish> {
        self.cipher.clone()
    }

    /// The byte order of the two words in each cipher block. Defaults to [`Endian::Big`].
    #[must_use]
    pub fn cipher_endian(&self) -> Endian {
        self.cipher_endian
    }

    #[must_use]
    pub fn compression(&self) -> CompressionScheme {
        self.compression
    }

    fn require_cipher(&self) -> Result<&Blowfish> {
        self.cipher.as_ref().ok_or(Error::MissingKey)
    }
}

/// An archive readable and writable by the encryption-capable codec.
///
/// The packed size/flags word of each entry uses [`FlagsLayout::for_endian`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Archive {
    pub endian: Endian,
    pub version: Version,
    /// Whether the index is protected by the cipher. Payloads written with [`Archive::pack_entry`] are encrypted too.
    pub encrypted: bool,
    pub entries: Vec<Entry>,
}

derive::reader_with_options!(Archive: Options);

impl Archive {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of bytes occupied by the header and index of an archive with `count` entries.
    ///
    /// Writers reserve this much space at the front of the stream before writing payloads.
    #[must_use]
    pub fn header_size(count: usize) -> usize {
        constants::HEADER_SIZE + constants::ENTRY_SIZE * count
    }

    #[must_use]
    pub fn flags_layout(&self) -> FlagsLayout {
        FlagsLayout::for_endian(self.endian)
    }

    /// Writes the header and index. Entries are emitted in ascending order of their offsets.
    pub fn write<O>(&self, stream: &mut O, options: &Options) -> Result<()>
    where
        O: ?Sized + Write,
    {
        let cipher = if self.encrypted {
            Some(options.require_cipher()?)
        } else {
            None
        };

        let count: u16 = self.entries.len().try_into()?;
        let mut index = Vec::with_capacity(constants::ENTRY_SIZE * self.entries.len());
        self.write_index(&mut Sink::new(&mut index))?;
        if let Some(cipher) = cipher {
            cipher.encrypt_with_endian(&mut index, options.cipher_endian);
        }

        let magic = if self.encrypted {
            constants::ARCC
        } else {
            constants::ARC
        };

        tracing::debug!(
            endian = ?self.endian,
            version = ?self.version,
            encrypted = self.encrypted,
            count,
            "writing archive header"
        );

        let mut sink = Sink::new(stream);
        sink.write(&(magic, u16::from(self.version), count), self.endian)?;
        sink.write_bytes(&index)?;
        Ok(())
    }

    /// Reads and decodes the payload of `entry` from the archive's stream.
    pub fn read_entry<I>(&self, stream: &mut I, entry: &Entry, options: &Options) -> Result<Vec<u8>>
    where
        I: ?Sized + Read + Seek,
    {
        let mut source = Source::new(stream);
        source.seek_absolute(entry.offset.into())?;
        let mut data = source.read_vec(entry.compressed_size.try_into()?)?;
        if self.encrypted {
            options
                .require_cipher()?
                .decrypt_with_endian(&mut data, options.cipher_endian);
        }

        tracing::trace!(name = %entry.name, len = data.len(), "read entry payload");
        payload::decompress(
            options.compression,
            &data,
            entry.uncompressed_size.try_into()?,
        )
    }

    /// Encodes `data` the way it should be stored in this archive.
    ///
    /// The payload is compressed, then zero padded to whole cipher blocks and encrypted if the archive is encrypted.
    /// The length of the result is the entry's compressed size.
    pub fn pack_entry(&self, data: &[u8], options: &Options) -> Result<Vec<u8>> {
        if data.len() > constants::MAX_UNCOMPRESSED_SIZE as usize {
            return Err(Error::UncompressedSizeTooLarge(data.len().try_into()?));
        }

        let mut stored = payload::compress(options.compression, data)?;
        if self.encrypted {
            let cipher = options.require_cipher()?;
            stored.resize(stored.len().next_multiple_of(Blowfish::BLOCK_SIZE), 0);
            cipher.encrypt_with_endian(&mut stored, options.cipher_endian);
        }

        Ok(stored)
    }

    fn do_read<I>(source: &mut Source<I>, options: &Options) -> Result<Self>
    where
        I: ?Sized + Read,
    {
        let magic: u32 = source.read(Endian::Little)?;
        let (endian, encrypted) = super::sniff_magic(magic).ok_or(Error::InvalidMagic(magic))?;
        let (version, count): (u16, u16) = source.read(endian)?;
        let version = Version::try_from(version)?;

        tracing::debug!(?endian, ?version, encrypted, count, "read archive header");

        let cipher = if encrypted {
            Some(options.require_cipher()?)
        } else {
            None
        };

        let mut index = source.read_vec(constants::ENTRY_SIZE * usize::from(count))?;
        if let Some(cipher) = cipher {
            cipher.decrypt_with_endian(&mut index, options.cipher_endian);
        }

        let layout = FlagsLayout::for_endian(endian);
        let mut cursor = Cursor::new(&index[..]);
        let mut records = Source::new(&mut cursor);
        let mut entries = Vec::with_capacity(count.into());
        for _ in 0..count {
            let entry = Entry::read(&mut records, endian, layout)?;
            tracing::trace!(name = %entry.name, offset = entry.offset, "read entry");
            entries.push(entry);
        }

        Ok(Self {
            endian,
            version,
            encrypted,
            entries,
        })
    }

    fn write_index<O>(&self, sink: &mut Sink<O>) -> Result<()>
    where
        O: ?Sized + Write,
    {
        let layout = self.flags_layout();
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by_key(|x| x.offset);
        for entry in sorted {
            entry.write(sink, self.endian, layout)?;
        }

        Ok(())
    }
}
