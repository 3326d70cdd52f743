use core::mem;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// The byte order of every multi-byte value in a stream.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Endian {
    #[default]
    Little,
    Big,
}

pub trait BinaryStreamable {
    type Item;

    fn from_be_stream<R: Read>(stream: &mut R) -> io::Result<Self::Item>;
    fn from_le_stream<R: Read>(stream: &mut R) -> io::Result<Self::Item>;
    fn from_stream<R: Read>(stream: &mut R, endian: Endian) -> io::Result<Self::Item> {
        match endian {
            Endian::Big => Self::from_be_stream(stream),
            Endian::Little => Self::from_le_stream(stream),
        }
    }

    fn to_be_stream<W: Write>(stream: &mut W, item: &Self::Item) -> io::Result<()>;
    fn to_le_stream<W: Write>(stream: &mut W, item: &Self::Item) -> io::Result<()>;
    fn to_stream<W: Write>(stream: &mut W, item: &Self::Item, endian: Endian) -> io::Result<()>
    where
        Self: Sized,
    {
        match endian {
            Endian::Big => Self::to_be_stream(stream, item),
            Endian::Little => Self::to_le_stream(stream, item),
        }
    }
}

macro_rules! make_binary_streamable {
    ($t:ty) => {
        impl BinaryStreamable for $t {
            type Item = $t;

            fn from_be_stream<R: Read>(stream: &mut R) -> io::Result<Self::Item> {
                let mut bytes = [0u8; mem::size_of::<Self::Item>()];
                stream.read_exact(&mut bytes)?;
                Ok(Self::from_be_bytes(bytes))
            }

            fn from_le_stream<R: Read>(stream: &mut R) -> io::Result<Self::Item> {
                let mut bytes = [0u8; mem::size_of::<Self::Item>()];
                stream.read_exact(&mut bytes)?;
                Ok(Self::from_le_bytes(bytes))
            }

            fn to_be_stream<W: Write>(stream: &mut W, item: &Self::Item) -> io::Result<()> {
                stream.write_all(&item.to_be_bytes())
            }

            fn to_le_stream<W: Write>(stream: &mut W, item: &Self::Item) -> io::Result<()> {
                stream.write_all(&item.to_le_bytes())
            }
        }
    };
}

make_binary_streamable!(u8);
make_binary_streamable!(u16);
make_binary_streamable!(u32);
make_binary_streamable!(u64);

make_binary_streamable!(i8);
make_binary_streamable!(i16);
make_binary_streamable!(i32);
make_binary_streamable!(i64);

make_binary_streamable!(f32);
make_binary_streamable!(f64);

macro_rules! make_binary_streamable_tuple {
    ($($idx:tt $t:ident),+) => {
        impl<$($t,)+> BinaryStreamable for ($($t,)+)
        where
            $($t: BinaryStreamable,)+
        {
            type Item = ($($t::Item,)+);

            fn from_be_stream<R: Read>(stream: &mut R) -> io::Result<Self::Item> {
                Ok(($(
                    $t::from_be_stream(stream)?,
                )+))
            }

            fn from_le_stream<R: Read>(stream: &mut R) -> io::Result<Self::Item> {
                Ok(($(
                    $t::from_le_stream(stream)?,
                )+))
            }

            fn to_be_stream<W: Write>(stream: &mut W, item: &Self::Item) -> io::Result<()> {
                $(
                    $t::to_be_stream(stream, &item.$idx)?;
                )+
                Ok(())
            }

            fn to_le_stream<W: Write>(stream: &mut W, item: &Self::Item) -> io::Result<()> {
                $(
                    $t::to_le_stream(stream, &item.$idx)?;
                )+
                Ok(())
            }
        }
    };
}

make_binary_streamable_tuple!(0 T0, 1 T1);
make_binary_streamable_tuple!(0 T0, 1 T1, 2 T2);
make_binary_streamable_tuple!(0 T0, 1 T1, 2 T2, 3 T3);

pub struct Source<'a, R>
where
    R: ?Sized + Read,
{
    stream: &'a mut R,
}

impl<'a, R> Source<'a, R>
where
    R: ?Sized + Read,
{
    pub fn new(stream: &'a mut R) -> Self {
        Self { stream }
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut *self.stream
    }

    pub fn read<T>(&mut self, endian: Endian) -> io::Result<T>
    where
        T: BinaryStreamable<Item = T>,
    {
        T::from_stream(&mut self.stream, endian)
    }

    pub fn read_protocol<T>(&mut self, endian: Endian) -> io::Result<T::Item>
    where
        T: BinaryStreamable,
    {
        T::from_stream(&mut self.stream, endian)
    }

    pub fn read_bytes(&mut self, bytes: &mut [u8]) -> io::Result<()> {
        self.stream.read_exact(bytes)
    }

    /// Reads exactly `len` bytes, growing the buffer only as data actually arrives.
    pub fn read_vec(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        (&mut *self.stream).take(len as u64).read_to_end(&mut bytes)?;
        if bytes.len() == len {
            Ok(bytes)
        } else {
            Err(io::ErrorKind::UnexpectedEof.into())
        }
    }
}

impl<'a, R> Source<'a, R>
where
    R: ?Sized + Read + Seek,
{
    pub fn save_restore_position<F, T>(&mut self, f: F) -> io::Result<T>
    where
        F: FnOnce(&mut Self) -> T,
    {
        let position = self.stream.stream_position()?;
        let result = f(self);
        self.stream.seek(SeekFrom::Start(position))?;
        Ok(result)
    }

    pub fn seek_absolute(&mut self, pos: u64) -> io::Result<()> {
        self.stream.seek(SeekFrom::Start(pos)).map(|_| ())
    }
}

pub struct Sink<'a, W>
where
    W: ?Sized + Write,
{
    stream: &'a mut W,
}

impl<'a, W> Sink<'a, W>
where
    W: ?Sized + Write,
{
    pub fn new(stream: &'a mut W) -> Self {
        Self { stream }
    }

    pub fn write<T>(&mut self, item: &T, endian: Endian) -> io::Result<()>
    where
        T: BinaryStreamable<Item = T>,
    {
        T::to_stream(&mut self.stream, item, endian)
    }

    pub fn write_protocol<T>(&mut self, item: &T::Item, endian: Endian) -> io::Result<()>
    where
        T: BinaryStreamable,
    {
        T::to_stream(&mut self.stream, item, endian)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)
    }
}

#[cfg(test)]
mod tests {
    use crate::io::{Endian, Sink, Source};
    use std::io::Cursor;

    #[test]
    fn endian_controls_byte_order() -> anyhow::Result<()> {
        let bytes = [0x41u8, 0x52, 0x43, 0x00];
        let mut cursor = Cursor::new(&bytes[..]);
        let little: u32 = Source::new(&mut cursor).read(Endian::Little)?;
        assert_eq!(little, 0x0043_5241);

        let mut cursor = Cursor::new(&bytes[..]);
        let big: u32 = Source::new(&mut cursor).read(Endian::Big)?;
        assert_eq!(big, 0x4152_4300);

        Ok(())
    }

    #[test]
    fn tuples_stream_in_order() -> anyhow::Result<()> {
        let mut out = Vec::new();
        Sink::new(&mut out).write(&(7u16, 3u16), Endian::Big)?;
        assert_eq!(out, [0x00, 0x07, 0x00, 0x03]);

        let mut cursor = Cursor::new(&out[..]);
        let (version, count): (u16, u16) = Source::new(&mut cursor).read(Endian::Big)?;
        assert_eq!((version, count), (7, 3));

        Ok(())
    }

    #[test]
    fn short_reads_are_errors() {
        let bytes = [0u8; 3];
        let mut cursor = Cursor::new(&bytes[..]);
        let result = Source::new(&mut cursor).read::<u32>(Endian::Little);
        assert!(result.is_err());
    }

    #[test]
    fn oversized_vec_reads_fail_without_allocating() -> anyhow::Result<()> {
        let bytes = [1u8, 2, 3, 4];
        let mut cursor = Cursor::new(&bytes[..]);
        let mut source = Source::new(&mut cursor);
        let error = source
            .read_vec(usize::MAX)
            .err()
            .ok_or_else(|| anyhow::anyhow!("read past the end of the stream"))?;
        assert_eq!(error.kind(), std::io::ErrorKind::UnexpectedEof);

        let mut cursor = Cursor::new(&bytes[..]);
        assert_eq!(Source::new(&mut cursor).read_vec(3)?, [1, 2, 3]);
        Ok(())
    }
}
