// SPDX-License-Identifier: Apache-2.0

use core::ops::{BitAnd, BitOr, Not, Shl};

/// Bit set recording which members of a record were seen or set.
///
/// Implemented for the unsigned integer types and for arrays of them, for
/// records with more members than one integer has bits.
pub trait PresenceBits: Default {
    /// Number of bits available.
    const CAPACITY: usize;

    /// Reads bit `index`. Bits past the capacity read as clear.
    fn bit(&self, index: usize) -> bool;

    /// Sets or clears bit `index`. Bits past the capacity are ignored.
    fn set_bit(&mut self, index: usize, value: bool);
}

impl<T> PresenceBits for T
where
    T: Shl<u32, Output = T>
        + BitAnd<T, Output = T>
        + BitOr<Output = T>
        + Not<Output = T>
        + PartialEq
        + Copy
        + Default
        + From<u8>,
{
    const CAPACITY: usize = core::mem::size_of::<T>() * 8;

    fn bit(&self, index: usize) -> bool {
        index < Self::CAPACITY && (*self & (T::from(1) << index as u32)) != T::from(0)
    }

    fn set_bit(&mut self, index: usize, value: bool) {
        if index >= Self::CAPACITY {
            return;
        }
        let mask = T::from(1) << index as u32;
        *self = if value { *self | mask } else { *self & !mask };
    }
}

/// Presence bits spread over `N` integers, lowest indices in the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WideBits<const N: usize, T>(pub [T; N]);

impl<const N: usize, T: Default + Copy> Default for WideBits<N, T> {
    fn default() -> Self {
        WideBits([T::default(); N])
    }
}

impl<const N: usize, T> PresenceBits for WideBits<N, T>
where
    T: PresenceBits + Copy,
{
    const CAPACITY: usize = T::CAPACITY * N;

    fn bit(&self, index: usize) -> bool {
        self.0
            .get(index / T::CAPACITY)
            .is_some_and(|word| word.bit(index % T::CAPACITY))
    }

    fn set_bit(&mut self, index: usize, value: bool) {
        if let Some(word) = self.0.get_mut(index / T::CAPACITY) {
            word.set_bit(index % T::CAPACITY, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_bits() {
        let mut bits = 0u8;
        bits.set_bit(0, true);
        bits.set_bit(7, true);
        assert_eq!(bits, 0b1000_0001);
        assert!(bits.bit(7));
        assert!(!bits.bit(3));
        bits.set_bit(0, false);
        assert_eq!(bits, 0b1000_0000);
        // Out of range is ignored
        bits.set_bit(8, true);
        assert!(!bits.bit(8));
        assert_eq!(bits, 0b1000_0000);
    }

    #[test]
    fn test_wide_bits() {
        let mut bits = WideBits::<3, u8>::default();
        assert_eq!(WideBits::<3, u8>::CAPACITY, 24);
        bits.set_bit(9, true);
        bits.set_bit(23, true);
        assert_eq!(bits.0, [0, 0b10, 0b1000_0000]);
        assert!(bits.bit(9));
        assert!(!bits.bit(8));
        assert!(!bits.bit(24));
        bits.set_bit(9, false);
        assert_eq!(bits.0, [0, 0, 0b1000_0000]);
    }
}
