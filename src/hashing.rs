use bstr::BString;

/// Produces the 31-bit type hash for the given type name.
///
/// This is a standard CRC-32 with the final inversion left off, masked to 31 bits. The top bit of a type hash is
/// therefore always clear.
#[must_use]
pub fn hash_type(name: &str) -> u32 {
    !crc32fast::hash(name.as_bytes()) & 0x7FFF_FFFF
}

#[must_use]
const fn build_lookup_table() -> [u8; 256] {
    let mut table = [0u8; u8::MAX as usize + 1];
    let mut i: u8 = 0;
    loop {
        table[i as usize] = i;
        match i {
            u8::MAX => break,
            _ => i += 1,
        };
    }

    table['/' as usize] = b'\\';
    table
}

#[must_use]
fn map_byte(b: u8) -> u8 {
    const LUT: [u8; 256] = build_lookup_table();
    LUT[b as usize]
}

/// Rewrites an entry name to use the archive's path separator.
///
/// Forward slashes become back slashes, and leading or trailing separators are dropped. Case is preserved.
pub fn normalize_name(name: &mut BString) {
    for b in name.iter_mut() {
        *b = map_byte(*b);
    }

    while name.last().is_some_and(|&x| x == b'\\') {
        name.pop();
    }

    while name.first().is_some_and(|&x| x == b'\\') {
        name.remove(0);
    }
}
