use core::ops::{BitXor, BitXorAssign};
use std::fmt;

use rand::TryCryptoRng;
use serde::{Deserialize, Serialize};

/// A 128-bit value, used for wire keys and OT pads.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block([u8; 16]);

impl Block {
    /// The length of a block in bytes.
    pub const LEN: usize = 16;

    /// A block with all bits set to zero.
    pub const ZERO: Self = Self([0; 16]);

    /// Creates a new block.
    #[inline]
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Samples a uniformly random block.
    pub fn random<R: TryCryptoRng + ?Sized>(rng: &mut R) -> Result<Self, R::Error> {
        let mut bytes = [0u8; 16];
        rng.try_fill_bytes(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Returns the bytes of the block.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns the bytes of the block.
    #[inline]
    pub fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// Returns the least significant bit of the block.
    #[inline]
    pub fn lsb(&self) -> bool {
        self.0[15] & 1 == 1
    }
}

impl From<[u8; 16]> for Block {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl From<Block> for [u8; 16] {
    fn from(block: Block) -> Self {
        block.0
    }
}

impl AsRef<[u8]> for Block {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl BitXor for Block {
    type Output = Self;

    #[inline]
    fn bitxor(mut self, other: Self) -> Self::Output {
        self ^= other;
        self
    }
}

impl BitXorAssign for Block {
    #[inline]
    fn bitxor_assign(&mut self, other: Self) {
        self.0
            .iter_mut()
            .zip(other.0)
            .for_each(|(a, b)| *a ^= b);
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsb() {
        let mut bytes = [0u8; 16];
        assert!(!Block::new(bytes).lsb());
        bytes[15] = 1;
        assert!(Block::new(bytes).lsb());
        bytes[15] = 2;
        assert!(!Block::new(bytes).lsb());
    }

    #[test]
    fn test_bitxor() {
        let a = Block::new([0xff; 16]);
        let b = Block::new([0x0f; 16]);

        assert_eq!(a ^ b, Block::new([0xf0; 16]));
        assert_eq!(a ^ a, Block::ZERO);
        assert_eq!(b ^ Block::ZERO, b);
    }

    #[test]
    fn test_random() {
        let mut rng = rand::rng();
        let a = Block::random(&mut rng).unwrap();
        let b = Block::random(&mut rng).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_debug_is_hex() {
        let block = Block::new([0xab; 16]);
        assert_eq!(format!("{block:?}"), format!("Block({})", "ab".repeat(16)));
    }
}
