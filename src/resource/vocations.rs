bitflags::bitflags! {
    /// The vocations allowed to equip an item.
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct Vocations: u16 {
        const FIGHTER = 1 << 0;
        const STRIDER = 1 << 1;
        const MAGE = 1 << 2;
        const MYSTIC_KNIGHT = 1 << 3;
        const ASSASSIN = 1 << 4;
        const MAGICK_ARCHER = 1 << 5;
        const WARRIOR = 1 << 6;
        const RANGER = 1 << 7;
        const SORCERER = 1 << 8;
    }
}

#[cfg(test)]
mod tests {
    use crate::resource::Vocations;

    #[test]
    fn nine_vocations() {
        assert_eq!(Vocations::all().bits(), 0x1FF);
        assert_eq!(Vocations::from_bits_truncate(0xFFFF), Vocations::all());
        assert!(Vocations::default().is_empty());
    }
}
