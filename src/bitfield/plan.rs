use crate::{
    bitfield::{Error, Result, Schema, Setter},
    io::{Endian, Source},
};
use std::io::Read;

/// The integer a plan's fields are packed into.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Container {
    U8,
    U16,
    U32,
    U64,
}

impl Container {
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::U8 => u8::BITS,
            Self::U16 => u16::BITS,
            Self::U32 => u32::BITS,
            Self::U64 => u64::BITS,
        }
    }

    fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(Self::U8),
            16 => Ok(Self::U16),
            32 => Ok(Self::U32),
            64 => Ok(Self::U64),
            _ => Err(Error::InvalidContainerWidth(bits)),
        }
    }

    /// Reads one container's worth of bits, widened to 64 bits.
    pub(crate) fn read<I>(self, source: &mut Source<I>, endian: Endian) -> std::io::Result<u64>
    where
        I: ?Sized + Read,
    {
        Ok(match self {
            Self::U8 => source.read::<u8>(endian)?.into(),
            Self::U16 => source.read::<u16>(endian)?.into(),
            Self::U32 => source.read::<u32>(endian)?.into(),
            Self::U64 => source.read::<u64>(endian)?,
        })
    }
}

#[derive(Debug)]
struct Step<T> {
    start: u32,
    bits: u32,
    setter: Setter<T>,
}

/// A compiled [`Schema`], ready to decode words.
///
/// Plans are immutable, and may be shared freely between threads.
#[derive(Debug)]
pub struct Plan<T> {
    container: Container,
    steps: Vec<Step<T>>,
}

impl<T> Plan<T> {
    /// Validates the schema and computes where each field starts.
    pub fn compile(schema: &Schema<T>) -> Result<Self> {
        let mut start = 0;
        let mut steps = Vec::with_capacity(schema.fields().len());
        for (index, field) in schema.fields().iter().enumerate() {
            let max = field.setter.native_bits();
            if field.bits == 0 || field.bits > max {
                return Err(Error::InvalidFieldWidth {
                    index,
                    bits: field.bits,
                    max,
                });
            }

            steps.push(Step {
                start,
                bits: field.bits,
                setter: field.setter,
            });
            start += field.bits;
        }

        Ok(Self {
            container: Container::from_bits(start)?,
            steps,
        })
    }

    #[must_use]
    pub fn container(&self) -> Container {
        self.container
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Reads one container word from the stream and decodes it into `target`.
    pub fn decode<I>(&self, stream: &mut I, endian: Endian, target: &mut T) -> Result<()>
    where
        I: ?Sized + Read,
    {
        let word = self.container.read(&mut Source::new(stream), endian)?;
        self.apply(word, endian, target);
        Ok(())
    }

    /// Decodes an already read word into `target`, visiting fields in declaration order.
    ///
    /// Bits of `word` above the container's width are ignored.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn apply(&self, word: u64, endian: Endian, target: &mut T) {
        let width = self.container.bits();
        for step in &self.steps {
            if let Setter::Bool(set) = step.setter {
                let bit = match endian {
                    Endian::Little => step.start,
                    Endian::Big => width - step.start - 1,
                };
                set(target, (word >> bit) & 1 != 0);
                continue;
            }

            let shift = match endian {
                Endian::Little => step.start,
                Endian::Big => width - step.start - step.bits,
            };
            let mask = match step.bits {
                64 => u64::MAX,
                bits => (1u64 << bits) - 1,
            };
            let mut value = (word >> shift) & mask;
            if step.setter.is_signed() && (value >> (step.bits - 1)) & 1 != 0 {
                value |= !mask;
            }

            match step.setter {
                Setter::Bool(_) => {}
                Setter::U8(set) => set(target, value as u8),
                Setter::I8(set) => set(target, value as i8),
                Setter::U16(set) => set(target, value as u16),
                Setter::I16(set) => set(target, value as i16),
                Setter::U32(set) => set(target, value as u32),
                Setter::I32(set) => set(target, value as i32),
                Setter::U64(set) => set(target, value),
                Setter::I64(set) => set(target, value as i64),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        bitfield::{Container, Error, Plan, Schema, SchemaBuilder},
        io::Endian,
    };
    use std::io::Cursor;

    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        first: u8,
        second: i8,
    }

    fn pair_schema() -> Schema<Pair> {
        SchemaBuilder::<Pair>::new()
            .u8(3, |x, v| x.first = v)
            .i8(5, |x, v| x.second = v)
            .build()
    }

    #[test]
    fn little_endian_packs_from_the_bottom() -> anyhow::Result<()> {
        let plan = Plan::compile(&pair_schema())?;
        assert_eq!(plan.container(), Container::U8);

        let mut pair = Pair::default();
        plan.apply(0b1011_0011, Endian::Little, &mut pair);
        assert_eq!(pair, Pair { first: 3, second: -10 });
        Ok(())
    }

    #[test]
    fn big_endian_packs_from_the_top() -> anyhow::Result<()> {
        let plan = Plan::compile(&pair_schema())?;
        let mut pair = Pair::default();
        plan.apply(0b1011_0011, Endian::Big, &mut pair);
        assert_eq!(pair, Pair { first: 5, second: -13 });
        Ok(())
    }

    #[test]
    fn booleans_follow_bit_order() -> anyhow::Result<()> {
        #[derive(Default)]
        struct Flags([bool; 16]);

        let mut builder = SchemaBuilder::<Flags>::new();
        let setters: [fn(&mut Flags, bool); 16] = [
            |x, v| x.0[0] = v,
            |x, v| x.0[1] = v,
            |x, v| x.0[2] = v,
            |x, v| x.0[3] = v,
            |x, v| x.0[4] = v,
            |x, v| x.0[5] = v,
            |x, v| x.0[6] = v,
            |x, v| x.0[7] = v,
            |x, v| x.0[8] = v,
            |x, v| x.0[9] = v,
            |x, v| x.0[10] = v,
            |x, v| x.0[11] = v,
            |x, v| x.0[12] = v,
            |x, v| x.0[13] = v,
            |x, v| x.0[14] = v,
            |x, v| x.0[15] = v,
        ];
        for setter in setters {
            builder = builder.boolean(setter);
        }
        let plan = Plan::compile(&builder.build())?;
        assert_eq!(plan.container(), Container::U16);
        assert_eq!(plan.len(), 16);

        let mut flags = Flags::default();
        plan.apply(0x0001, Endian::Little, &mut flags);
        assert!(flags.0[0]);
        assert!(flags.0[1..].iter().all(|x| !x));

        let mut flags = Flags::default();
        plan.apply(0x8000, Endian::Big, &mut flags);
        assert!(flags.0[0]);
        assert!(flags.0[1..].iter().all(|x| !x));
        Ok(())
    }

    #[test]
    fn full_width_fields() -> anyhow::Result<()> {
        #[derive(Default)]
        struct Wide {
            unsigned: u64,
            signed: i64,
        }

        let unsigned = Plan::compile(
            &SchemaBuilder::<Wide>::new()
                .u64(64, |x, v| x.unsigned = v)
                .build(),
        )?;
        let signed = Plan::compile(
            &SchemaBuilder::<Wide>::new()
                .i64(64, |x, v| x.signed = v)
                .build(),
        )?;

        let mut wide = Wide::default();
        unsigned.apply(u64::MAX, Endian::Big, &mut wide);
        signed.apply(u64::MAX, Endian::Little, &mut wide);
        assert_eq!(wide.unsigned, u64::MAX);
        assert_eq!(wide.signed, -1);
        Ok(())
    }

    #[test]
    fn signed_fields_widen_before_narrowing() -> anyhow::Result<()> {
        #[derive(Default)]
        struct Record {
            low: i32,
            high: u8,
        }

        let plan = Plan::compile(
            &SchemaBuilder::<Record>::new()
                .i32(24, |x, v| x.low = v)
                .u8(8, |x, v| x.high = v)
                .build(),
        )?;

        let mut record = Record::default();
        plan.apply(0x07FF_FFFE, Endian::Little, &mut record);
        assert_eq!(record.low, -2);
        assert_eq!(record.high, 7);

        plan.apply(0x0700_0002, Endian::Little, &mut record);
        assert_eq!(record.low, 2);
        Ok(())
    }

    #[test]
    fn decoding_does_not_leak_state() -> anyhow::Result<()> {
        let plan = Plan::compile(&pair_schema())?;
        let mut a = Pair::default();
        let mut b = Pair::default();
        plan.apply(0xFF, Endian::Little, &mut a);
        plan.apply(0x00, Endian::Little, &mut b);
        assert_eq!(a, Pair { first: 7, second: -1 });
        assert_eq!(b, Pair { first: 0, second: 0 });
        Ok(())
    }

    #[test]
    fn decode_reads_one_word() -> anyhow::Result<()> {
        #[derive(Default)]
        struct Record {
            a: u16,
            b: u16,
        }

        let plan = Plan::compile(
            &SchemaBuilder::<Record>::new()
                .u16(4, |x, v| x.a = v)
                .u16(12, |x, v| x.b = v)
                .build(),
        )?;

        let bytes = [0x34u8, 0x12, 0xFF];
        let mut cursor = Cursor::new(&bytes[..]);
        let mut record = Record::default();
        plan.decode(&mut cursor, Endian::Little, &mut record)?;
        assert_eq!((record.a, record.b), (0x4, 0x123));
        assert_eq!(cursor.position(), 2);

        let mut cursor = Cursor::new(&bytes[..]);
        plan.decode(&mut cursor, Endian::Big, &mut record)?;
        assert_eq!((record.a, record.b), (0x3, 0x412));
        Ok(())
    }

    #[test]
    fn invalid_container_width() {
        let schema = SchemaBuilder::<Pair>::new()
            .u8(3, |x, v| x.first = v)
            .i8(4, |x, v| x.second = v)
            .build();
        assert!(matches!(
            Plan::compile(&schema),
            Err(Error::InvalidContainerWidth(7))
        ));

        let empty = SchemaBuilder::<Pair>::new().build();
        assert!(matches!(
            Plan::compile(&empty),
            Err(Error::InvalidContainerWidth(0))
        ));
    }

    #[test]
    fn invalid_field_width() {
        let schema = SchemaBuilder::<Pair>::new()
            .u8(0, |x, v| x.first = v)
            .i8(8, |x, v| x.second = v)
            .build();
        assert!(matches!(
            Plan::compile(&schema),
            Err(Error::InvalidFieldWidth {
                index: 0,
                bits: 0,
                max: 8
            })
        ));

        let schema = SchemaBuilder::<Pair>::new()
            .u8(9, |x, v| x.first = v)
            .i8(7, |x, v| x.second = v)
            .build();
        assert!(matches!(
            Plan::compile(&schema),
            Err(Error::InvalidFieldWidth { index: 0, bits: 9, .. })
        ));
    }
}
