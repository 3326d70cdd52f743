use crate::archive::{Error, Result};
use flate2::{
    read::{DeflateDecoder, ZlibDecoder},
    write::{DeflateEncoder, ZlibEncoder},
    Compression,
};
use std::io::{Read, Write};

/// How entry payloads are stored in an archive.
///
/// The scheme is not recorded in the archive itself; it is a property of the game that shipped it.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CompressionScheme {
    /// Payloads are stored as-is.
    #[default]
    None,
    /// A zlib stream, with its 2-byte header and adler32 trailer.
    Zlib,
    /// A raw deflate stream.
    ZlibHeaderless,
    /// The Xbox 360 block codec. Recognized, but not supported.
    XCompress,
}

/// Compresses `data` using the given scheme.
pub fn compress(scheme: CompressionScheme, data: &[u8]) -> Result<Vec<u8>> {
    match scheme {
        CompressionScheme::None => Ok(data.to_vec()),
        CompressionScheme::Zlib => {
            let mut e = ZlibEncoder::new(Vec::new(), Compression::best());
            e.write_all(data)?;
            Ok(e.finish()?)
        }
        CompressionScheme::ZlibHeaderless => {
            let mut e = DeflateEncoder::new(Vec::new(), Compression::best());
            e.write_all(data)?;
            Ok(e.finish()?)
        }
        CompressionScheme::XCompress => Err(Error::UnsupportedCompression(scheme)),
    }
}

/// Decompresses `data` using the given scheme, which must yield exactly `expected_len` bytes.
///
/// A payload whose stored length already equals `expected_len` was stored raw and is copied through, whatever the
/// scheme. Bytes trailing the end of a compressed stream, such as cipher padding, are ignored.
pub fn decompress(scheme: CompressionScheme, data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    if data.len() == expected_len {
        return Ok(data.to_vec());
    }

    let out = match scheme {
        CompressionScheme::None => {
            if data.len() < expected_len {
                return Err(Error::DecompressionSizeMismatch {
                    expected: expected_len,
                    actual: data.len(),
                });
            }
            data[..expected_len].to_vec()
        }
        CompressionScheme::Zlib => read_limited(ZlibDecoder::new(data), expected_len)?,
        CompressionScheme::ZlibHeaderless => read_limited(DeflateDecoder::new(data), expected_len)?,
        CompressionScheme::XCompress => return Err(Error::UnsupportedCompression(scheme)),
    };

    if out.len() == expected_len {
        Ok(out)
    } else {
        Err(Error::DecompressionSizeMismatch {
            expected: expected_len,
            actual: out.len(),
        })
    }
}

fn read_limited<R: Read>(decoder: R, expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    let limit = u64::try_from(expected_len)? + 1;
    decoder.take(limit).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::archive::{compress, decompress, CompressionScheme, Error};

    const TEXT: &[u8] = b"The quick brown fox jumps over the lazy dog. \
        The quick brown fox jumps over the lazy dog. \
        The quick brown fox jumps over the lazy dog.";

    #[test]
    fn zlib_keeps_its_header() -> anyhow::Result<()> {
        let packed = compress(CompressionScheme::Zlib, TEXT)?;
        assert_eq!(packed[0], 0x78);
        assert!(packed.len() < TEXT.len());
        assert_eq!(decompress(CompressionScheme::Zlib, &packed, TEXT.len())?, TEXT);
        Ok(())
    }

    #[test]
    fn headerless_streams() -> anyhow::Result<()> {
        let packed = compress(CompressionScheme::ZlibHeaderless, TEXT)?;
        assert_ne!(packed, compress(CompressionScheme::Zlib, TEXT)?);
        let unpacked = decompress(CompressionScheme::ZlibHeaderless, &packed, TEXT.len())?;
        assert_eq!(unpacked, TEXT);
        Ok(())
    }

    #[test]
    fn trailing_padding_is_ignored() -> anyhow::Result<()> {
        let mut packed = compress(CompressionScheme::Zlib, TEXT)?;
        packed.resize(packed.len() + 7, 0);
        assert_eq!(decompress(CompressionScheme::Zlib, &packed, TEXT.len())?, TEXT);
        Ok(())
    }

    #[test]
    fn equal_sizes_are_copied_raw() -> anyhow::Result<()> {
        let raw = b"not a zlib stream";
        let copied = decompress(CompressionScheme::Zlib, raw, raw.len())?;
        assert_eq!(copied, raw);
        Ok(())
    }

    #[test]
    fn uncompressed_payloads_are_truncated() -> anyhow::Result<()> {
        let padded = b"hello\0\0\0";
        assert_eq!(decompress(CompressionScheme::None, padded, 5)?, b"hello");
        assert!(matches!(
            decompress(CompressionScheme::None, b"hi", 5),
            Err(Error::DecompressionSizeMismatch {
                expected: 5,
                actual: 2
            })
        ));
        Ok(())
    }

    #[test]
    fn size_mismatch_is_reported() -> anyhow::Result<()> {
        let packed = compress(CompressionScheme::Zlib, TEXT)?;
        let result = decompress(CompressionScheme::Zlib, &packed, TEXT.len() - 1);
        assert!(matches!(
            result,
            Err(Error::DecompressionSizeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn xcompress_is_unsupported() {
        assert!(matches!(
            compress(CompressionScheme::XCompress, TEXT),
            Err(Error::UnsupportedCompression(CompressionScheme::XCompress))
        ));
        assert!(matches!(
            decompress(CompressionScheme::XCompress, TEXT, 1),
            Err(Error::UnsupportedCompression(CompressionScheme::XCompress))
        ));
    }
}
