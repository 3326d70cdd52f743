//! The Blowfish block cipher, used to protect the index of encrypted archives.
//!
//! This is a faithful implementation of Bruce Schneier's 64-bit block cipher, kept around for format compatibility. It
//! is not a security boundary.
//!
//! ```rust
//! use mtarc::blowfish::Blowfish;
//!
//! fn example() -> Option<()> {
//!     let cipher = Blowfish::new(b"a key from the project settings").ok()?;
//!     let mut buffer = *b"8 bytes!";
//!     cipher.encrypt(&mut buffer);
//!     cipher.decrypt(&mut buffer);
//!     assert_eq!(&buffer, b"8 bytes!");
//!     Some(())
//! }
//! ```

mod constants;

use crate::io::Endian;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("a blowfish key may be at most {max} bytes long, but got {0} bytes", max = Blowfish::MAX_KEY_LEN)]
    KeyTooLong(usize),
}

pub type Result<T> = core::result::Result<T, Error>;

/// A keyed Blowfish cipher.
///
/// The tables are only mutated while keying, so a single instance may be shared between threads for encryption and
/// decryption. Use [`Clone`] to hand out fully independent copies.
#[derive(Clone)]
pub struct Blowfish {
    p: [u32; 18],
    s: [[u32; 256]; 4],
}

impl Default for Blowfish {
    fn default() -> Self {
        Self {
            p: constants::P,
            s: constants::S,
        }
    }
}

impl core::fmt::Debug for Blowfish {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Blowfish").finish_non_exhaustive()
    }
}

impl Blowfish {
    pub const BLOCK_SIZE: usize = 8;
    pub const MAX_KEY_LEN: usize = 56;

    /// Runs the key schedule for the given key.
    ///
    /// An empty key leaves the cipher in its default state.
    pub fn new(key: &[u8]) -> Result<Self> {
        let mut result = Self::default();
        result.rekey(key)?;
        Ok(result)
    }

    /// Resets the cipher and runs the key schedule again for the given key.
    pub fn rekey(&mut self, key: &[u8]) -> Result<()> {
        if key.len() > Self::MAX_KEY_LEN {
            return Err(Error::KeyTooLong(key.len()));
        }

        *self = Self::default();
        if key.is_empty() {
            return Ok(());
        }

        let mut bytes = key.iter().copied().cycle();
        for p in &mut self.p {
            let mut build = 0u32;
            for _ in 0..4 {
                build = (build << 8) | u32::from(bytes.next().unwrap_or_default());
            }
            *p ^= build;
        }

        let (mut hi, mut lo) = (0u32, 0u32);
        for i in (0..self.p.len()).step_by(2) {
            (hi, lo) = self.encrypt_block(hi, lo);
            self.p[i] = hi;
            self.p[i + 1] = lo;
        }

        for sbox in 0..self.s.len() {
            for i in (0..256).step_by(2) {
                (hi, lo) = self.encrypt_block(hi, lo);
                self.s[sbox][i] = hi;
                self.s[sbox][i + 1] = lo;
            }
        }

        Ok(())
    }

    #[must_use]
    fn f(&self, x: u32) -> u32 {
        let [a, b, c, d] = x.to_be_bytes();
        let s = &self.s;
        (s[0][usize::from(a)].wrapping_add(s[1][usize::from(b)]) ^ s[2][usize::from(c)])
            .wrapping_add(s[3][usize::from(d)])
    }

    /// Encrypts a single block, given as its high and low words.
    #[must_use]
    pub fn encrypt_block(&self, mut hi: u32, mut lo: u32) -> (u32, u32) {
        let p = &self.p;
        hi ^= p[0];
        for i in (1..=16).step_by(2) {
            lo ^= self.f(hi) ^ p[i];
            hi ^= self.f(lo) ^ p[i + 1];
        }
        lo ^= p[17];
        (lo, hi)
    }

    /// Decrypts a single block, given as its high and low words.
    #[must_use]
    pub fn decrypt_block(&self, mut hi: u32, mut lo: u32) -> (u32, u32) {
        let p = &self.p;
        hi ^= p[17];
        for i in (1..=16).rev().step_by(2) {
            lo ^= self.f(hi) ^ p[i];
            hi ^= self.f(lo) ^ p[i - 1];
        }
        lo ^= p[0];
        (lo, hi)
    }

    /// Encrypts the buffer in place, reading each block as two big-endian words.
    ///
    /// Only whole blocks are processed; the number of bytes transformed is returned. Callers are expected to pad their
    /// input to a multiple of [`Self::BLOCK_SIZE`].
    pub fn encrypt(&self, buffer: &mut [u8]) -> usize {
        self.encrypt_with_endian(buffer, Endian::Big)
    }

    /// Decrypts the buffer in place, reading each block as two big-endian words.
    pub fn decrypt(&self, buffer: &mut [u8]) -> usize {
        self.decrypt_with_endian(buffer, Endian::Big)
    }

    /// Like [`Self::encrypt`], but with the byte order of each block's words given explicitly.
    pub fn encrypt_with_endian(&self, buffer: &mut [u8], endian: Endian) -> usize {
        Self::transform(buffer, endian, |hi, lo| self.encrypt_block(hi, lo))
    }

    /// Like [`Self::decrypt`], but with the byte order of each block's words given explicitly.
    pub fn decrypt_with_endian(&self, buffer: &mut [u8], endian: Endian) -> usize {
        Self::transform(buffer, endian, |hi, lo| self.decrypt_block(hi, lo))
    }

    fn transform<F>(buffer: &mut [u8], endian: Endian, f: F) -> usize
    where
        F: Fn(u32, u32) -> (u32, u32),
    {
        let (read, write): (fn([u8; 4]) -> u32, fn(u32) -> [u8; 4]) = match endian {
            Endian::Big => (u32::from_be_bytes, u32::to_be_bytes),
            Endian::Little => (u32::from_le_bytes, u32::to_le_bytes),
        };

        let mut len = 0;
        for block in buffer.chunks_exact_mut(Self::BLOCK_SIZE) {
            let (first, second) = block.split_at_mut(4);
            let hi = read([first[0], first[1], first[2], first[3]]);
            let lo = read([second[0], second[1], second[2], second[3]]);
            let (hi, lo) = f(hi, lo);
            first.copy_from_slice(&write(hi));
            second.copy_from_slice(&write(lo));
            len += Self::BLOCK_SIZE;
        }

        len
    }
}
