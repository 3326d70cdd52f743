use crate::resource::{ResourceReader, Result, Vocations};
use std::io::Read;

mod constants {
    pub const SIZE: usize = 0x80;

    pub const UNKNOWN36_0: u16 = 1;
    pub const VOCATIONS_SHIFT: u16 = 1;
    pub const VOCATIONS_MASK: u16 = 0x1FF;
    pub const GENDER_SHIFT: u16 = 10;
    pub const GENDER_MASK: u16 = 0x3;

    pub const MODEL_ID_MASK: u32 = 0x00FF_FFFF;
    pub const MODEL_TYPE_SHIFT: u32 = 24;
}

/// One 128-byte record of an item list.
///
/// Most field names mirror the offset (and bit, for packed words) they were read from, since their meaning is not
/// known yet.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Item {
    pub strength: i16,
    pub magick: i16,
    pub unknown00_22: i16,
    pub defenses: i16,
    pub magick_defenses: i16,
    pub unknown04_20: u8,
    pub unknown04_27: u8,
    pub stagger_power: i16,
    pub knockdown_power: i16,
    pub unknown08_20: u8,
    pub unknown08_27: u8,
    pub unknown0c_0: u32,
    pub unknown0c_20: i16,
    pub unknown0c_30: u8,
    pub unknown10_0: u8,
    pub unknown10_5: u8,
    pub oil: i16,
    pub unknown10_20: i16,
    pub unknown10_30: bool,
    pub unknown10_31: bool,
    pub slash_strength: i8,
    pub bludgeoning_strength: i8,
    pub piercing_resistance: i8,
    pub striking_resistance: i8,
    pub fire: i8,
    pub ice: i8,
    pub lightning: i8,
    pub holy: i8,
    pub dark: i8,
    pub unknown1d: u8,
    pub unknown1e: u8,
    pub unknown1f: u8,
    pub unknown20: u8,
    pub unknown21: u8,
    pub knockdown_resistance: i8,
    pub stagger_resistance: i8,
    pub unknown24: u8,
    pub poison_resistance: i8,
    pub torpor_resistance: i8,
    pub blindness_resistance: i8,
    pub sleep_resistance: i8,
    pub unknown29: u8,
    pub unknown2a: u8,
    pub possession_resistance: i8,
    pub silence_resistance: i8,
    pub skill_stifling_resistance: i8,
    pub curse_resistance: i8,
    pub petrification_resistance: i8,
    pub lowered_strength_resistance: i8,
    pub lowered_defense_resistance: i8,
    pub lowered_magick_resistance: i8,
    pub lowered_magick_defense_resistance: i8,
    pub unknown34: u16,
    /// Packs `unknown36_0`, the required vocations, and the required gender. See the accessors.
    pub requirement_flags: u16,
    pub unknown36_12: u8,
    pub category: u8,
    pub subcategory: u8,
    pub unknown38_10: i16,
    pub element: u8,
    pub unknown38_26: u8,
    pub id: i16,
    pub unknown3c_13: i16,
    pub unknown3c_26: u8,
    /// Packs the model id and the model type. See the accessors.
    pub model_flags: u32,
    pub weight: f32,
    pub price: i32,
    pub value: i32,
    pub unknown50: u32,
    pub unknown54: f32,
    pub unknown58: [bool; 32],
    pub unknown5c: u32,
    pub unknown60: u16,
    pub unknown62: u16,
    pub unknown64: u16,
    pub expected_level: u16,
    pub unknown68: [u8; 8],
    pub recover_health: u16,
    pub recover_stamina: u16,
    pub unknown74: f32,
    pub unknown78: u32,
    pub unknown7c: u16,
    pub unknown7e: u8,
    pub unknown7f: u8,
}

macro_rules! flags_schema {
    ($builder:ident: $($index:literal)+) => {
        $builder$(.boolean(|x: &mut Item, v| x.unknown58[$index] = v))+
    };
}

impl Item {
    /// The size of one record, in bytes.
    pub const SIZE: usize = constants::SIZE;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one record, leaving the reader positioned at the next.
    pub fn read<R>(reader: &mut ResourceReader<R>) -> Result<Self>
    where
        R: ?Sized + Read,
    {
        let mut item = Self::default();

        reader.read_bitfield(&mut item, "raw00", |x| {
            x.i16(11, |x, v| x.strength = v)
                .i16(11, |x, v| x.magick = v)
                .i16(10, |x, v| x.unknown00_22 = v)
        })?;
        reader.read_bitfield(&mut item, "raw04", |x| {
            x.i16(10, |x, v| x.defenses = v)
                .i16(10, |x, v| x.magick_defenses = v)
                .u8(7, |x, v| x.unknown04_20 = v)
                .u8(5, |x, v| x.unknown04_27 = v)
        })?;
        reader.read_bitfield(&mut item, "raw08", |x| {
            x.i16(10, |x, v| x.stagger_power = v)
                .i16(10, |x, v| x.knockdown_power = v)
                .u8(7, |x, v| x.unknown08_20 = v)
                .u8(5, |x, v| x.unknown08_27 = v)
        })?;
        reader.read_bitfield(&mut item, "raw0C", |x| {
            x.u32(20, |x, v| x.unknown0c_0 = v)
                .i16(10, |x, v| x.unknown0c_20 = v)
                .u8(2, |x, v| x.unknown0c_30 = v)
        })?;
        reader.read_bitfield(&mut item, "raw10", |x| {
            x.u8(5, |x, v| x.unknown10_0 = v)
                .u8(5, |x, v| x.unknown10_5 = v)
                .i16(10, |x, v| x.oil = v)
                .i16(10, |x, v| x.unknown10_20 = v)
                .boolean(|x, v| x.unknown10_30 = v)
                .boolean(|x, v| x.unknown10_31 = v)
        })?;

        item.slash_strength = reader.read_i8()?;
        item.bludgeoning_strength = reader.read_i8()?;
        item.piercing_resistance = reader.read_i8()?;
        item.striking_resistance = reader.read_i8()?;
        item.fire = reader.read_i8()?;
        item.ice = reader.read_i8()?;
        item.lightning = reader.read_i8()?;
        item.holy = reader.read_i8()?;
        item.dark = reader.read_i8()?;
        item.unknown1d = reader.read_u8()?;
        item.unknown1e = reader.read_u8()?;
        item.unknown1f = reader.read_u8()?;
        item.unknown20 = reader.read_u8()?;
        item.unknown21 = reader.read_u8()?;
        item.knockdown_resistance = reader.read_i8()?;
        item.stagger_resistance = reader.read_i8()?;
        item.unknown24 = reader.read_u8()?;
        item.poison_resistance = reader.read_i8()?;
        item.torpor_resistance = reader.read_i8()?;
        item.blindness_resistance = reader.read_i8()?;
        item.sleep_resistance = reader.read_i8()?;
        item.unknown29 = reader.read_u8()?;
        item.unknown2a = reader.read_u8()?;
        item.possession_resistance = reader.read_i8()?;
        item.silence_resistance = reader.read_i8()?;
        item.skill_stifling_resistance = reader.read_i8()?;
        item.curse_resistance = reader.read_i8()?;
        item.petrification_resistance = reader.read_i8()?;
        item.lowered_strength_resistance = reader.read_i8()?;
        item.lowered_defense_resistance = reader.read_i8()?;
        item.lowered_magick_resistance = reader.read_i8()?;
        item.lowered_magick_defense_resistance = reader.read_i8()?;
        item.unknown34 = reader.read_u16()?;

        reader.read_bitfield(&mut item, "raw36", |x| {
            x.u16(12, |x, v| x.requirement_flags = v)
                .u8(4, |x, v| x.unknown36_12 = v)
        })?;
        reader.read_bitfield(&mut item, "raw38", |x| {
            x.u8(5, |x, v| x.category = v)
                .u8(5, |x, v| x.subcategory = v)
                .i16(9, |x, v| x.unknown38_10 = v)
                .u8(7, |x, v| x.element = v)
                .u8(6, |x, v| x.unknown38_26 = v)
        })?;
        reader.read_bitfield(&mut item, "raw3C", |x| {
            x.i16(13, |x, v| x.id = v)
                .i16(13, |x, v| x.unknown3c_13 = v)
                .u8(6, |x, v| x.unknown3c_26 = v)
        })?;

        item.model_flags = reader.read_u32()?;
        item.weight = reader.read_f32()?;
        item.price = reader.read_i32()?;
        item.value = reader.read_i32()?;
        item.unknown50 = reader.read_u32()?;
        item.unknown54 = reader.read_f32()?;

        reader.read_bitfield(&mut item, "raw58", |x| {
            flags_schema!(x: 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31)
        })?;

        item.unknown5c = reader.read_u32()?;
        item.unknown60 = reader.read_u16()?;
        item.unknown62 = reader.read_u16()?;
        item.unknown64 = reader.read_u16()?;
        item.expected_level = reader.read_u16()?;
        reader.read_bytes(&mut item.unknown68)?;
        item.recover_health = reader.read_u16()?;
        item.recover_stamina = reader.read_u16()?;
        item.unknown74 = reader.read_f32()?;
        item.unknown78 = reader.read_u32()?;
        item.unknown7c = reader.read_u16()?;
        item.unknown7e = reader.read_u8()?;
        item.unknown7f = reader.read_u8()?;

        Ok(item)
    }

    #[must_use]
    pub fn unknown36_0(&self) -> bool {
        self.requirement_flags & constants::UNKNOWN36_0 != 0
    }

    pub fn set_unknown36_0(&mut self, value: bool) {
        if value {
            self.requirement_flags |= constants::UNKNOWN36_0;
        } else {
            self.requirement_flags &= !constants::UNKNOWN36_0;
        }
    }

    #[must_use]
    pub fn required_vocations(&self) -> Vocations {
        Vocations::from_bits_truncate(
            (self.requirement_flags >> constants::VOCATIONS_SHIFT) & constants::VOCATIONS_MASK,
        )
    }

    pub fn set_required_vocations(&mut self, value: Vocations) {
        self.requirement_flags &= !(constants::VOCATIONS_MASK << constants::VOCATIONS_SHIFT);
        self.requirement_flags |=
            (value.bits() & constants::VOCATIONS_MASK) << constants::VOCATIONS_SHIFT;
    }

    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn required_gender(&self) -> u8 {
        ((self.requirement_flags >> constants::GENDER_SHIFT) & constants::GENDER_MASK) as u8
    }

    pub fn set_required_gender(&mut self, value: u8) {
        self.requirement_flags &= !(constants::GENDER_MASK << constants::GENDER_SHIFT);
        self.requirement_flags |=
            (u16::from(value) & constants::GENDER_MASK) << constants::GENDER_SHIFT;
    }

    /// The low 24 bits of the model flags, sign extended.
    #[allow(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn model_id(&self) -> i32 {
        (((self.model_flags & constants::MODEL_ID_MASK) << 8) as i32) >> 8
    }

    /// Stores the low 24 bits of `value`.
    #[allow(clippy::cast_sign_loss)]
    pub fn set_model_id(&mut self, value: i32) {
        self.model_flags &= !constants::MODEL_ID_MASK;
        self.model_flags |= value as u32 & constants::MODEL_ID_MASK;
    }

    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn model_type(&self) -> u8 {
        (self.model_flags >> constants::MODEL_TYPE_SHIFT) as u8
    }

    pub fn set_model_type(&mut self, value: u8) {
        self.model_flags &= constants::MODEL_ID_MASK;
        self.model_flags |= u32::from(value) << constants::MODEL_TYPE_SHIFT;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::{
        io::Endian,
        resource::{Item, ResourceReader, Vocations},
    };
    use std::io::Cursor;

    #[rustfmt::skip]
    pub(crate) const LITTLE: [u8; Item::SIZE] = [
        0xFB, 0x67, 0xC9, 0xFF, 0x00, 0xFE, 0x47, 0xFE, 0x07, 0xE4, 0x1F, 0x10, 0xDE, 0xBC, 0xDA, 0xFF,
        0x31, 0x41, 0xC6, 0x79, 0x00, 0x00, 0x00, 0x00, 0xEC, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0xFF, 0xEF, 0xBE, 0x03, 0x9A, 0x83, 0xE1, 0x2C, 0xFC, 0xD2, 0xE4, 0xFF, 0x0B,
        0xFE, 0xFF, 0xFF, 0x05, 0x00, 0x00, 0x20, 0x40, 0xDC, 0x05, 0x00, 0x00, 0xF9, 0xFF, 0xFF, 0xFF,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2A, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        0xFA, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x7F,
    ];

    #[rustfmt::skip]
    pub(crate) const BIG: [u8; Item::SIZE] = [
        0xFF, 0x64, 0xB3, 0xFF, 0x80, 0x1F, 0xFC, 0x9F, 0x01, 0xFF, 0x90, 0x22, 0xAB, 0xCD, 0xEF, 0xF7,
        0x8A, 0x59, 0x0E, 0x72, 0x00, 0x00, 0x00, 0x00, 0xEC, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0xFF, 0xBE, 0xEF, 0xA0, 0x39, 0x1B, 0x27, 0x01, 0x7F, 0x26, 0x97, 0xFF, 0xC2,
        0x05, 0xFF, 0xFF, 0xFE, 0x40, 0x20, 0x00, 0x00, 0x00, 0x00, 0x05, 0xDC, 0xFF, 0xFF, 0xFF, 0xF9,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2A, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        0x00, 0xFA, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x7F,
    ];

    pub(crate) fn assert_sample(item: &Item) {
        assert_eq!((item.strength, item.magick, item.unknown00_22), (-5, 300, -1));
        assert_eq!((item.defenses, item.magick_defenses), (-512, 511));
        assert_eq!((item.unknown04_20, item.unknown04_27), (100, 31));
        assert_eq!((item.stagger_power, item.knockdown_power), (7, -7));
        assert_eq!((item.unknown08_20, item.unknown08_27), (1, 2));
        assert_eq!(item.unknown0c_0, 0xABCDE);
        assert_eq!((item.unknown0c_20, item.unknown0c_30), (-3, 3));
        assert_eq!((item.unknown10_0, item.unknown10_5), (17, 9));
        assert_eq!((item.oil, item.unknown10_20), (400, -100));
        assert!(item.unknown10_30);
        assert!(!item.unknown10_31);
        assert_eq!(item.fire, -20);
        assert_eq!(item.lowered_magick_defense_resistance, -1);
        assert_eq!(item.unknown34, 0xBEEF);
        assert_eq!(item.requirement_flags, 0xA03);
        assert_eq!(item.unknown36_12, 9);
        assert_eq!((item.category, item.subcategory), (3, 12));
        assert_eq!((item.unknown38_10, item.element, item.unknown38_26), (-200, 5, 63));
        assert_eq!((item.id, item.unknown3c_13, item.unknown3c_26), (1234, -1, 2));
        assert_eq!(item.model_flags, 0x05FF_FFFE);
        assert_eq!(item.weight, 2.5);
        assert_eq!((item.price, item.value), (1500, -7));
        assert!(item.unknown58[0]);
        assert!(item.unknown58[31]);
        assert!(item.unknown58[1..31].iter().all(|x| !x));
        assert_eq!(item.expected_level, 42);
        assert_eq!(item.unknown68, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(item.recover_health, 250);
        assert_eq!(item.unknown7f, 0x7F);
    }

    #[test]
    fn read_little_endian() -> anyhow::Result<()> {
        let mut cursor = Cursor::new(&LITTLE[..]);
        let mut reader = ResourceReader::new(&mut cursor, Endian::Little);
        let item = Item::read(&mut reader)?;
        assert_sample(&item);
        assert_eq!(cursor.position(), 0x80);
        Ok(())
    }

    #[test]
    fn read_big_endian() -> anyhow::Result<()> {
        let mut cursor = Cursor::new(&BIG[..]);
        let mut reader = ResourceReader::new(&mut cursor, Endian::Big);
        let item = Item::read(&mut reader)?;
        assert_sample(&item);
        Ok(())
    }

    #[test]
    fn truncated_record() {
        let mut cursor = Cursor::new(&LITTLE[..0x7F]);
        let mut reader = ResourceReader::new(&mut cursor, Endian::Little);
        assert!(Item::read(&mut reader).is_err());
    }

    #[test]
    fn requirement_accessors() -> anyhow::Result<()> {
        let mut cursor = Cursor::new(&LITTLE[..]);
        let mut item = Item::read(&mut ResourceReader::new(&mut cursor, Endian::Little))?;
        assert!(item.unknown36_0());
        assert_eq!(
            item.required_vocations(),
            Vocations::FIGHTER | Vocations::SORCERER
        );
        assert_eq!(item.required_gender(), 2);

        item.set_required_vocations(Vocations::MAGE);
        assert_eq!(item.required_vocations(), Vocations::MAGE);
        assert!(item.unknown36_0());
        assert_eq!(item.required_gender(), 2);

        item.set_unknown36_0(false);
        item.set_required_gender(1);
        assert!(!item.unknown36_0());
        assert_eq!(item.required_gender(), 1);
        assert_eq!(item.required_vocations(), Vocations::MAGE);
        assert_eq!(item.requirement_flags, 0x408);
        Ok(())
    }

    #[test]
    fn model_accessors() {
        let mut item = Item {
            model_flags: 0x05FF_FFFE,
            ..Default::default()
        };
        assert_eq!(item.model_id(), -2);
        assert_eq!(item.model_type(), 5);

        item.set_model_id(0x12_3456);
        assert_eq!(item.model_id(), 0x12_3456);
        assert_eq!(item.model_type(), 5);

        item.set_model_type(0xAB);
        item.set_model_id(-1);
        assert_eq!(item.model_flags, 0xABFF_FFFF);
        assert_eq!(item.model_id(), -1);

        item.set_model_id(0x7F_FFFF);
        assert_eq!(item.model_id(), 0x7F_FFFF);
        item.set_model_id(0x80_0000);
        assert_eq!(item.model_id(), -0x80_0000);
    }
}
