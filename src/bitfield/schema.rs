use core::fmt;

/// Stores an extracted value into a record.
///
/// The variant decides how the field is extracted: booleans test a single bit, unsigned types are masked, and signed
/// types are sign extended from the field's width.
pub enum Setter<T> {
    Bool(fn(&mut T, bool)),
    U8(fn(&mut T, u8)),
    I8(fn(&mut T, i8)),
    U16(fn(&mut T, u16)),
    I16(fn(&mut T, i16)),
    U32(fn(&mut T, u32)),
    I32(fn(&mut T, i32)),
    U64(fn(&mut T, u64)),
    I64(fn(&mut T, i64)),
}

impl<T> Setter<T> {
    /// The width of the setter's value type, in bits.
    #[must_use]
    pub fn native_bits(&self) -> u32 {
        match self {
            Self::Bool(_) => 1,
            Self::U8(_) | Self::I8(_) => u8::BITS,
            Self::U16(_) | Self::I16(_) => u16::BITS,
            Self::U32(_) | Self::I32(_) => u32::BITS,
            Self::U64(_) | Self::I64(_) => u64::BITS,
        }
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            Self::I8(_) | Self::I16(_) | Self::I32(_) | Self::I64(_)
        )
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Setter<T> {}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool(_) => "Bool",
            Self::U8(_) => "U8",
            Self::I8(_) => "I8",
            Self::U16(_) => "U16",
            Self::I16(_) => "I16",
            Self::U32(_) => "U32",
            Self::I32(_) => "I32",
            Self::U64(_) => "U64",
            Self::I64(_) => "I64",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct Field<T> {
    pub bits: u32,
    pub setter: Setter<T>,
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

/// An ordered list of fields packed into one word.
#[derive(Debug)]
pub struct Schema<T> {
    fields: Vec<Field<T>>,
}

impl<T> Schema<T> {
    #[must_use]
    pub fn builder() -> SchemaBuilder<T> {
        SchemaBuilder::new()
    }

    #[must_use]
    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// The sum of every field's width.
    #[must_use]
    pub fn total_bits(&self) -> u32 {
        self.fields.iter().map(|x| x.bits).sum()
    }
}

#[derive(Debug)]
#[repr(transparent)]
pub struct SchemaBuilder<T>(Schema<T>);

impl<T> Default for SchemaBuilder<T> {
    fn default() -> Self {
        Self(Schema { fields: Vec::new() })
    }
}

macro_rules! make_field {
    ($name:ident: $t:ty => $variant:ident) => {
        #[must_use]
        pub fn $name(self, bits: u32, setter: fn(&mut T, $t)) -> Self {
            self.field(bits, Setter::$variant(setter))
        }
    };
}

impl<T> SchemaBuilder<T> {
    #[must_use]
    pub fn build(self) -> Schema<T> {
        self.0
    }

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single bit flag.
    #[must_use]
    pub fn boolean(self, setter: fn(&mut T, bool)) -> Self {
        self.field(1, Setter::Bool(setter))
    }

    #[must_use]
    pub fn field(mut self, bits: u32, setter: Setter<T>) -> Self {
        self.0.fields.push(Field { bits, setter });
        self
    }

    make_field!(u8: u8 => U8);
    make_field!(i8: i8 => I8);
    make_field!(u16: u16 => U16);
    make_field!(i16: i16 => I16);
    make_field!(u32: u32 => U32);
    make_field!(i32: i32 => I32);
    make_field!(u64: u64 => U64);
    make_field!(i64: i64 => I64);
}

#[cfg(test)]
mod tests {
    use crate::bitfield::{SchemaBuilder, Setter};

    #[derive(Default)]
    struct Record {
        flag: bool,
        small: u8,
        wide: i64,
    }

    #[test]
    fn fields_keep_declaration_order() {
        let schema = SchemaBuilder::<Record>::new()
            .boolean(|x, v| x.flag = v)
            .u8(7, |x, v| x.small = v)
            .i64(56, |x, v| x.wide = v)
            .build();

        let widths: Vec<_> = schema.fields().iter().map(|x| x.bits).collect();
        assert_eq!(widths, [1, 7, 56]);
        assert_eq!(schema.total_bits(), 64);
        assert!(matches!(schema.fields()[0].setter, Setter::Bool(_)));
        assert!(schema.fields()[2].setter.is_signed());
        assert!(!schema.fields()[1].setter.is_signed());
    }

    #[test]
    fn native_widths() {
        let schema = SchemaBuilder::<Record>::new()
            .boolean(|x, v| x.flag = v)
            .u8(1, |x, v| x.small = v)
            .i64(1, |x, v| x.wide = v)
            .build();
        let native: Vec<_> = schema
            .fields()
            .iter()
            .map(|x| x.setter.native_bits())
            .collect();
        assert_eq!(native, [1, 8, 64]);
    }
}
