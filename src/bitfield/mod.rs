//! Decoding of bit-packed record fields.
//!
//! Resource records often pack several small fields into a single 8, 16, 32, or 64-bit word. A [`Schema`] lists
//! those fields in order, each with a width and a setter that stores the extracted value into a record. A schema is
//! compiled once into a [`Plan`], which can then decode any number of words.
//!
//! Field 0 starts at the least significant bit of a little-endian word, and at the most significant bit of a
//! big-endian word. Signed fields are sign extended from their width.
//!
//! ```rust
//! use mtarc::{bitfield::{Plan, SchemaBuilder}, Endian};
//!
//! #[derive(Default)]
//! struct Record {
//!     kind: u8,
//!     delta: i8,
//! }
//!
//! fn example() -> Option<()> {
//!     let schema = SchemaBuilder::<Record>::new()
//!         .u8(3, |x, v| x.kind = v)
//!         .i8(5, |x, v| x.delta = v)
//!         .build();
//!     let plan = Plan::compile(&schema).ok()?;
//!
//!     let mut record = Record::default();
//!     plan.apply(0b1011_0011, Endian::Little, &mut record);
//!     assert_eq!((record.kind, record.delta), (3, -10));
//!     Some(())
//! }
//! ```
//!
//! Plans are usually shared through a [`PlanCache`], keyed by the record type and a stable schema name.

mod cache;
mod plan;
mod schema;

pub use self::{
    cache::PlanCache,
    plan::{Container, Plan},
    schema::{Field, Schema, SchemaBuilder, Setter},
};

use std::io;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("bitfield fields add up to {0} bits, but a container must be 8, 16, 32, or 64 bits wide")]
    InvalidContainerWidth(u32),

    #[error("bitfield field {index} is {bits} bits wide, but its type holds between 1 and {max} bits")]
    InvalidFieldWidth { index: usize, bits: u32, max: u32 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
