use crate::{
    bitfield::PlanCache,
    derive,
    io::{Endian, Source},
    resource::{Error, Item, ResourceReader, Result},
};
use std::{
    io::{Read, Seek},
    sync::Arc,
};

mod constants {
    use crate::cc;

    pub const MAGIC: u32 = cc::make_four(b"ITL2");
    pub const VERSION: u32 = 20_121_105;
}

#[derive(Debug, Default)]
#[repr(transparent)]
pub struct OptionsBuilder(Options);

impl OptionsBuilder {
    #[must_use]
    pub fn build(self) -> Options {
        self.0
    }

    /// Plans compiled while reading are stored in, and looked up from, `cache`.
    #[must_use]
    pub fn cache(mut self, cache: Arc<PlanCache>) -> Self {
        self.0.cache = cache;
        self
    }

    /// Forces a byte order instead of detecting it from the magic.
    #[must_use]
    pub fn endian(mut self, endian: Endian) -> Self {
        self.0.endian = Some(endian);
        self
    }

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Parameters to configure how item lists are read.
///
/// ```rust
/// use mtarc::{resource::ItemListOptions, Endian};
///
/// // Dragon's Dogma, Xbox 360
/// let _ = ItemListOptions::builder().endian(Endian::Big).build();
/// ```
#[derive(Clone, Debug, Default)]
pub struct Options {
    cache: Arc<PlanCache>,
    endian: Option<Endian>,
}

impl Options {
    #[must_use]
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<PlanCache> {
        &self.cache
    }

    #[must_use]
    pub fn endian(&self) -> Option<Endian> {
        self.endian
    }
}

/// The item definitions table (`ITL2`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ItemList {
    pub endian: Endian,
    pub items: Vec<Item>,
}

derive::reader_with_options!(ItemList: Options);

impl ItemList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Peeks at the magic to find the byte order of an item list, leaving the stream where it was.
    ///
    /// Yields `None` if the stream does not start with an item list magic.
    pub fn detect_endian<I>(stream: &mut I) -> Result<Option<Endian>>
    where
        I: ?Sized + Read + Seek,
    {
        let mut source = Source::new(stream);
        let magic = source.save_restore_position(|x| x.read::<u32>(Endian::Little))??;
        Ok(Self::sniff_magic(magic))
    }

    pub(crate) fn sniff_magic(magic: u32) -> Option<Endian> {
        match magic {
            constants::MAGIC => Some(Endian::Little),
            x if x.swap_bytes() == constants::MAGIC => Some(Endian::Big),
            _ => None,
        }
    }

    fn do_read<I>(source: &mut Source<I>, options: &Options) -> Result<Self>
    where
        I: ?Sized + Read,
    {
        let magic: u32 = source.read(Endian::Little)?;
        let endian = match options.endian {
            Some(endian) => endian,
            None => Self::sniff_magic(magic).ok_or(Error::InvalidMagic(magic))?,
        };
        let magic = match endian {
            Endian::Little => magic,
            Endian::Big => magic.swap_bytes(),
        };
        if magic != constants::MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let (version, count, _reserved): (u32, u32, u32) = source.read(endian)?;
        if version != constants::VERSION {
            return Err(Error::InvalidVersion(version));
        }

        tracing::debug!(?endian, count, "read item list header");

        let mut reader =
            ResourceReader::with_cache(source.get_mut(), endian, Arc::clone(&options.cache));
        let items = (0..count)
            .map(|_| Item::read(&mut reader))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { endian, items })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        bitfield::PlanCache,
        io::{Endian, Sink},
        prelude::*,
        resource::{item, Error, ItemList, ItemListOptions},
        Borrowed,
    };
    use std::{io::Cursor, sync::Arc};

    fn make_list(endian: Endian, count: u32, record: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let mut sink = Sink::new(&mut bytes);
        sink.write(&(u32::from_le_bytes(*b"ITL2"), 20_121_105u32), endian)?;
        sink.write(&(count, 0u32), endian)?;
        for _ in 0..count {
            sink.write_bytes(record)?;
        }
        Ok(bytes)
    }

    #[test]
    fn read_detects_byte_order() -> anyhow::Result<()> {
        for (endian, record) in [
            (Endian::Little, &item::tests::LITTLE),
            (Endian::Big, &item::tests::BIG),
        ] {
            let bytes = make_list(endian, 2, record)?;
            let list = ItemList::read(Borrowed(&bytes), &ItemListOptions::default())?;
            assert_eq!(list.endian, endian);
            assert_eq!(list.items.len(), 2);
            for item in &list.items {
                item::tests::assert_sample(item);
            }
        }
        Ok(())
    }

    #[test]
    fn readers_share_the_cache() -> anyhow::Result<()> {
        let cache = Arc::new(PlanCache::new());
        let options = ItemListOptions::builder()
            .cache(Arc::clone(&cache))
            .build();

        let bytes = make_list(Endian::Little, 1, &item::tests::LITTLE)?;
        ItemList::read(Borrowed(&bytes), &options)?;
        let compiled = cache.len();
        assert_eq!(compiled, 9);

        let bytes = make_list(Endian::Big, 3, &item::tests::BIG)?;
        ItemList::read(Borrowed(&bytes), &options)?;
        assert_eq!(cache.len(), compiled);
        Ok(())
    }

    #[test]
    fn empty_list() -> anyhow::Result<()> {
        let bytes = make_list(Endian::Big, 0, &[])?;
        let list = ItemList::read(Borrowed(&bytes), &ItemListOptions::default())?;
        assert_eq!(list.endian, Endian::Big);
        assert!(list.items.is_empty());
        Ok(())
    }

    #[test]
    fn forced_byte_order_must_match() -> anyhow::Result<()> {
        let bytes = make_list(Endian::Little, 0, &[])?;
        let options = ItemListOptions::builder().endian(Endian::Big).build();
        let result = ItemList::read(Borrowed(&bytes), &options);
        assert!(matches!(result, Err(Error::InvalidMagic(_))));

        let options = ItemListOptions::builder().endian(Endian::Little).build();
        assert!(ItemList::read(Borrowed(&bytes), &options).is_ok());
        Ok(())
    }

    #[test]
    fn invalid_header() -> anyhow::Result<()> {
        let result = ItemList::read(Borrowed(b"ARC\0\x07\x00\x00\x00"), &ItemListOptions::default());
        assert!(matches!(result, Err(Error::InvalidMagic(_))));

        let mut bytes = make_list(Endian::Little, 0, &[])?;
        bytes[4] ^= 1;
        let result = ItemList::read(Borrowed(&bytes), &ItemListOptions::default());
        assert!(matches!(result, Err(Error::InvalidVersion(20_121_104))));
        Ok(())
    }

    #[test]
    fn truncated_items() -> anyhow::Result<()> {
        let mut bytes = make_list(Endian::Little, 2, &item::tests::LITTLE)?;
        bytes.truncate(bytes.len() - 1);
        let result = ItemList::read(Borrowed(&bytes), &ItemListOptions::default());
        assert!(matches!(result, Err(Error::Io(_))));
        Ok(())
    }

    #[test]
    fn detect_endian_restores_position() -> anyhow::Result<()> {
        let bytes = make_list(Endian::Big, 0, &[])?;
        let mut cursor = Cursor::new(&bytes[..]);
        assert_eq!(ItemList::detect_endian(&mut cursor)?, Some(Endian::Big));
        assert_eq!(cursor.position(), 0);

        let mut cursor = Cursor::new(&b"ARCC"[..]);
        assert_eq!(ItemList::detect_endian(&mut cursor)?, None);

        let mut cursor = Cursor::new(&b"IT"[..]);
        assert!(ItemList::detect_endian(&mut cursor).is_err());
        Ok(())
    }
}
