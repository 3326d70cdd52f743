//! Game resource records
//!
//! Resources are the typed files stored inside an archive. Their records are a mix of plain integers and
//! bit-packed words, all in the byte order of the platform the resource was built for. A [`ResourceReader`] reads
//! both, and decodes the packed words through compiled [bitfield plans](crate::bitfield::Plan) that are shared between
//! readers.
//!
//! ```rust
//! use mtarc::{
//!     resource::{ItemList, ItemListOptions},
//!     prelude::*,
//! };
//! use std::path::Path;
//!
//! fn example() -> Option<()> {
//!     let path = Path::new("path/to/nativePC/rom/etc/item/item_list.ipa");
//!     let list = ItemList::read(path, &ItemListOptions::default()).ok()?;
//!     for item in &list.items {
//!         println!("{}: {} gold, {:?}", item.id, item.price, item.required_vocations());
//!     }
//!     Some(())
//! }
//! ```

mod item;
mod item_list;
mod reader;
mod vocations;

pub use self::{
    item::Item,
    item_list::{ItemList, Options as ItemListOptions, OptionsBuilder as ItemListOptionsBuilder},
    reader::ResourceReader,
    vocations::Vocations,
};

use crate::bitfield;
use core::num::TryFromIntError;
use std::io;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Bitfield(#[from] bitfield::Error),

    #[error("an operation on an integer would have truncated and corrupted data")]
    IntegralTruncation,

    #[error("invalid magic read from resource header: {0:#010x}")]
    InvalidMagic(u32),

    #[error("invalid version read from resource header: {0}")]
    InvalidVersion(u32),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<TryFromIntError> for Error {
    fn from(_: TryFromIntError) -> Self {
        Self::IntegralTruncation
    }
}

pub type Result<T> = core::result::Result<T, Error>;
