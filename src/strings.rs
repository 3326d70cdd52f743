use crate::io::BinaryStreamable;
use bstr::BString;
use std::io::{self, Read, Write};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("a string is too large to fit its fixed-width slot without data loss")]
    StringTooLarge,
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        Self::new(io::ErrorKind::InvalidData, value)
    }
}

/// A string stored in a fixed-width slot of `N` bytes, cut at the first null and padded with nulls.
pub(crate) struct FixedString<const N: usize>;

impl<const N: usize> FixedString<N> {
    fn from_ne_stream<R: Read>(stream: &mut R) -> io::Result<BString> {
        let mut buffer = [0u8; N];
        stream.read_exact(&mut buffer)?;
        let len = buffer.iter().position(|&x| x == 0).unwrap_or(N);
        Ok(BString::from(&buffer[..len]))
    }

    fn to_ne_stream<W: Write>(stream: &mut W, item: &BString) -> io::Result<()> {
        if item.len() > N {
            return Err(Error::StringTooLarge.into());
        }

        let mut buffer = [0u8; N];
        buffer[..item.len()].copy_from_slice(item);
        stream.write_all(&buffer)
    }
}

impl<const N: usize> BinaryStreamable for FixedString<N> {
    type Item = BString;

    fn from_be_stream<R: Read>(stream: &mut R) -> io::Result<Self::Item> {
        Self::from_ne_stream(stream)
    }

    fn from_le_stream<R: Read>(stream: &mut R) -> io::Result<Self::Item> {
        Self::from_ne_stream(stream)
    }

    fn to_be_stream<W: Write>(stream: &mut W, item: &Self::Item) -> io::Result<()> {
        Self::to_ne_stream(stream, item)
    }

    fn to_le_stream<W: Write>(stream: &mut W, item: &Self::Item) -> io::Result<()> {
        Self::to_ne_stream(stream, item)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        io::{Endian, Sink, Source},
        strings::FixedString,
    };
    use bstr::BString;
    use std::io::{self, Cursor};

    #[test]
    fn pads_and_trims_nulls() -> anyhow::Result<()> {
        let name = BString::from("stage\\s101\\model");
        let mut out = Vec::new();
        Sink::new(&mut out).write_protocol::<FixedString<64>>(&name, Endian::Little)?;
        assert_eq!(out.len(), 64);
        assert!(out[name.len()..].iter().all(|&x| x == 0));

        let mut cursor = Cursor::new(&out[..]);
        let read = Source::new(&mut cursor).read_protocol::<FixedString<64>>(Endian::Big)?;
        assert_eq!(read, name);
        Ok(())
    }

    #[test]
    fn full_slot_has_no_terminator() -> anyhow::Result<()> {
        let bytes = [b'a'; 8];
        let mut cursor = Cursor::new(&bytes[..]);
        let read = Source::new(&mut cursor).read_protocol::<FixedString<8>>(Endian::Little)?;
        assert_eq!(read, BString::from("aaaaaaaa"));
        Ok(())
    }

    #[test]
    fn oversized_strings_are_rejected() {
        let mut out = Vec::new();
        let result = Sink::new(&mut out)
            .write_protocol::<FixedString<4>>(&BString::from("hello"), Endian::Little);
        assert!(matches!(result, Err(e) if e.kind() == io::ErrorKind::InvalidData));
    }
}
