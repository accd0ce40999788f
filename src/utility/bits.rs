//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


//! Bit-twiddling helpers shared by liveness and register allocation.

/// Returns a mask with the low `count` bits set, saturating at 8 bits.
///
/// ```
/// # use bir::utility::mask_u8;
/// assert_eq!(mask_u8(0), 0b0000_0000);
/// assert_eq!(mask_u8(3), 0b0000_0111);
/// assert_eq!(mask_u8(8), 0b1111_1111);
/// assert_eq!(mask_u8(9), 0b1111_1111);
/// ```
#[inline]
pub const fn mask_u8(count: u32) -> u8 {
    if count >= 8 {
        u8::MAX
    } else {
        (1u8 << count) - 1
    }
}

/// Returns a mask with the low `count` bits set, saturating at 64 bits.
///
/// ```
/// # use bir::utility::mask_u64;
/// assert_eq!(mask_u64(16), 0xFFFF);
/// assert_eq!(mask_u64(64), u64::MAX);
/// ```
#[inline]
pub const fn mask_u64(count: u32) -> u64 {
    if count >= 64 {
        u64::MAX
    } else {
        (1u64 << count) - 1
    }
}

/// Iterates over the indices of every set bit in `bits`, lowest first.
///
/// ```
/// # use bir::utility::set_bits;
/// assert_eq!(set_bits(0b1010_0001).collect::<Vec<_>>(), vec![0, 5, 7]);
/// ```
pub fn set_bits(mut bits: u64) -> impl Iterator<Item = u32> {
    std::iter::from_fn(move || {
        if bits == 0 {
            return None;
        }

        let bit = bits.trailing_zeros();
        bits &= bits - 1;

        Some(bit)
    })
}
