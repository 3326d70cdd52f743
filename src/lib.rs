//! Readers and writers for MT Framework game data.
//!
//! * [`archive`] handles the `.arc` resource container, in both its plain and encrypted flavors.
//! * [`blowfish`] is the cipher protecting encrypted archives.
//! * [`file_types`] maps the type hashes stored in archives to names and file extensions.
//! * [`bitfield`] decodes the bit-packed words found in resource records.
//! * [`resource`] reads the records themselves, such as the item list.
//!
//! Use [`guess_format`] to find out which of these a file is.

#![warn(
    clippy::pedantic,
    clippy::single_char_lifetime_names,
    clippy::std_instead_of_core
)]
#![allow(
    unknown_lints,
    clippy::enum_glob_use,
    clippy::missing_errors_doc,
    clippy::struct_field_names
)]

pub mod archive;
pub mod bitfield;
pub mod blowfish;
mod cc;
mod derive;
pub mod file_types;
mod guess;
pub mod hashing;
mod io;
pub mod resource;
mod strings;

pub use guess::{guess_format, FileFormat};
pub use io::Endian;

/// Reads from an in-memory buffer.
///
/// Readers always produce owned results, so the buffer may be dropped as soon as the read returns.
pub struct Borrowed<'borrow>(pub &'borrow [u8]);

mod private {
    pub trait Sealed {}
}

use private::Sealed;

/// A trait that enables reading from various sources, with configuration options.
pub trait ReaderWithOptions<T>: Sealed {
    type Error;
    type Item;
    type Options;

    /// Reads an instance of `Self::Item` from the given source, using the given options.
    fn read(source: T, options: &Self::Options) -> core::result::Result<Self::Item, Self::Error>;
}

pub use bstr::{BStr, BString, ByteSlice, ByteVec};

/// Convenience using statements for traits that are needed to work with the library.
pub mod prelude {
    pub use crate::ReaderWithOptions as _;
}
