use crate::{
    archive::{
        constants, payload, ArchiveEntry as Entry, CompressionScheme, Error, FlagsLayout, Result,
        Version,
    },
    derive,
    io::{Endian, Source},
};
use std::io::{Read, Seek};

/// The only flags value this archive revision ever stores.
pub const LEGACY_FLAGS: u8 = 2;

#[derive(Debug, Default)]
#[repr(transparent)]
pub struct OptionsBuilder(Options);

impl OptionsBuilder {
    #[must_use]
    pub fn build(self) -> Options {
        self.0
    }

    #[must_use]
    pub fn compression(mut self, compression: CompressionScheme) -> Self {
        self.0.compression = compression;
        self
    }

    #[must_use]
    pub fn flags_layout(mut self, flags_layout: FlagsLayout) -> Self {
        self.0.flags_layout = flags_layout;
        self
    }

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Parameters for the legacy codec.
///
/// Archives of this revision were shipped with either flags layout regardless of their byte order, so the layout is
/// always chosen by the caller.
///
/// ```rust
/// use mtarc::archive::{FlagsLayout, LegacyOptions};
///
/// let _ = LegacyOptions::builder()
///     .flags_layout(FlagsLayout::Upper)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    flags_layout: FlagsLayout,
    compression: CompressionScheme,
}

impl Options {
    #[must_use]
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    #[must_use]
    pub fn compression(&self) -> CompressionScheme {
        self.compression
    }

    #[must_use]
    pub fn flags_layout(&self) -> FlagsLayout {
        self.flags_layout
    }
}

/// A read-only view of an unencrypted archive from the older format revision.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LegacyArchive {
    pub endian: Endian,
    pub version: Version,
    pub entries: Vec<Entry>,
}

derive::reader_with_options!(LegacyArchive: Options);

impl LegacyArchive {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and decompresses the payload of `entry` from the archive's stream.
    pub fn read_entry<I>(&self, stream: &mut I, entry: &Entry, options: &Options) -> Result<Vec<u8>>
    where
        I: ?Sized + Read + Seek,
    {
        let mut source = Source::new(stream);
        source.seek_absolute(entry.offset.into())?;
        let data = source.read_vec(entry.compressed_size.try_into()?)?;
        payload::decompress(
            options.compression,
            &data,
            entry.uncompressed_size.try_into()?,
        )
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    fn do_read<I>(source: &mut Source<I>, options: &Options) -> Result<Self>
    where
        I: ?Sized + Read,
    {
        let magic: u32 = source.read(Endian::Little)?;
        let endian = match magic {
            constants::ARC => Endian::Little,
            x if x.swap_bytes() == constants::ARC => Endian::Big,
            _ => return Err(Error::InvalidMagic(magic)),
        };

        let (version, count): (u16, u16) = source.read(endian)?;
        let version = Version::try_from(version)?;
        tracing::debug!(
            ?endian,
            ?version,
            count,
            layout = ?options.flags_layout,
            "read legacy archive header"
        );

        let mut entries = Vec::with_capacity(count.into());
        for _ in 0..count {
            let entry = Entry::read(source, endian, options.flags_layout)?;
            if entry.quality.bits() != LEGACY_FLAGS {
                return Err(Error::InvalidFlags {
                    name: entry.name,
                    flags: entry.quality.bits(),
                });
            }
            entries.push(entry);
        }

        Ok(Self {
            endian,
            version,
            entries,
        })
    }
}
