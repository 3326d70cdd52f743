use crate::{
    bitfield::{PlanCache, SchemaBuilder},
    io::{Endian, Source},
    resource::Result,
};
use std::{io::Read, sync::Arc};

macro_rules! make_read {
    ($name:ident: $t:ty) => {
        pub fn $name(&mut self) -> Result<$t> {
            Ok(self.source.read(self.endian)?)
        }
    };
}

/// Reads the primitives of a resource record in a fixed byte order.
///
/// Bitfields are decoded through plans held by a [`PlanCache`], which may be shared by several readers.
pub struct ResourceReader<'a, R>
where
    R: ?Sized + Read,
{
    source: Source<'a, R>,
    endian: Endian,
    cache: Arc<PlanCache>,
}

impl<'a, R> ResourceReader<'a, R>
where
    R: ?Sized + Read,
{
    /// Makes a reader with a cache of its own.
    pub fn new(stream: &'a mut R, endian: Endian) -> Self {
        Self::with_cache(stream, endian, Arc::default())
    }

    pub fn with_cache(stream: &'a mut R, endian: Endian, cache: Arc<PlanCache>) -> Self {
        Self {
            source: Source::new(stream),
            endian,
            cache,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<PlanCache> {
        &self.cache
    }

    #[must_use]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    make_read!(read_u8: u8);
    make_read!(read_i8: i8);
    make_read!(read_u16: u16);
    make_read!(read_i16: i16);
    make_read!(read_u32: u32);
    make_read!(read_i32: i32);
    make_read!(read_u64: u64);
    make_read!(read_i64: i64);
    make_read!(read_f32: f32);
    make_read!(read_f64: f64);

    /// Fills `bytes` as is, regardless of byte order.
    pub fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        Ok(self.source.read_bytes(bytes)?)
    }

    /// Reads one packed word and decodes it into `target`.
    ///
    /// `name` identifies the schema within `T`: the schema is only built the first time `name` is seen.
    pub fn read_bitfield<T, F>(&mut self, target: &mut T, name: &'static str, build: F) -> Result<()>
    where
        T: 'static,
        F: FnOnce(SchemaBuilder<T>) -> SchemaBuilder<T>,
    {
        let plan = self.cache.get_or_compile(name, build)?;
        let word = plan.container().read(&mut self.source, self.endian)?;
        plan.apply(word, self.endian, target);
        Ok(())
    }
}
