use crate::{archive, io::Endian, resource::ItemList};
use core::mem;
use std::io::Read;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileFormat {
    Archive,
    EncryptedArchive,
    ItemList,
}

/// Identifies a file by its leading magic, along with the byte order it was written in.
///
/// Consumes the first four bytes of `source`.
#[allow(clippy::module_name_repetitions)]
pub fn guess_format<In>(source: &mut In) -> Option<(FileFormat, Endian)>
where
    In: ?Sized + Read,
{
    let mut buf = [0u8; mem::size_of::<u32>()];
    source.read_exact(&mut buf).ok()?;
    let magic = u32::from_le_bytes(buf);
    if let Some((endian, encrypted)) = archive::sniff_magic(magic) {
        let format = if encrypted {
            FileFormat::EncryptedArchive
        } else {
            FileFormat::Archive
        };
        Some((format, endian))
    } else {
        ItemList::sniff_magic(magic).map(|endian| (FileFormat::ItemList, endian))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Endian, FileFormat};

    #[test]
    fn guess() {
        let tests = [
            (b"ARC\0", Some((FileFormat::Archive, Endian::Little))),
            (b"\0CRA", Some((FileFormat::Archive, Endian::Big))),
            (b"ARCC", Some((FileFormat::EncryptedArchive, Endian::Little))),
            (b"CCRA", Some((FileFormat::EncryptedArchive, Endian::Big))),
            (b"ITL2", Some((FileFormat::ItemList, Endian::Little))),
            (b"2LTI", Some((FileFormat::ItemList, Endian::Big))),
            (b"BTDX", None),
        ];

        for (magic, expected) in tests {
            let guess = crate::guess_format(&mut &magic[..]);
            assert_eq!(guess, expected, "{}", String::from_utf8_lossy(magic));
        }
    }

    #[test]
    fn short_input() {
        assert_eq!(crate::guess_format(&mut &b"AR"[..]), None);
    }
}
