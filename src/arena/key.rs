//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::fmt::Debug;

/// Models a type that can act as a key for an [`ArenaMap`](crate::arena::ArenaMap).
///
/// Prefer the [`arena_key`](crate::arena_key) macro over implementing this by hand.
pub trait ArenaKey: Copy + Eq + Debug {
    /// Creates a key from an arena slot index.
    ///
    /// Panics if the index cannot be represented by the key's storage type.
    fn new(index: usize) -> Self;

    /// Gets the arena slot index this key refers to.
    fn index(self) -> usize;
}

/// Creates a type-safe `u32` key for an [`ArenaMap`](crate::arena::ArenaMap).
///
/// ```
/// # use bir::arena_key;
/// # use bir::arena::ArenaMap;
/// arena_key! {
///     /// Doc comments are forwarded to the generated type.
///     pub struct Node;
///
///     struct PrivateNode;
/// }
///
/// type NodeMap<V> = ArenaMap<Node, V>;
/// ```
#[macro_export(local_inner_macros)]
macro_rules! arena_key {
    ( $(#[$outer:meta])* $vis:vis struct $name:ident; $($rest:tt)* ) => {
        $(#[$outer])*
        #[repr(transparent)]
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "enable-serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(u32);

        impl $crate::arena::ArenaKey for $name {
            #[inline]
            fn new(index: usize) -> Self {
                use std::convert::TryFrom;

                Self(u32::try_from(index).expect("index is not representable with key type"))
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
                std::write!(f, "{}({})", std::stringify!($name), self.0)
            }
        }

        arena_key!($($rest)*);
    };

    () => {}
}

#[cfg(test)]
mod tests {
    use crate::arena::*;
    use crate::arena_key;
    use static_assertions::assert_eq_size;

    #[test]
    fn arena_key_is_u32() {
        arena_key! { struct Key; }

        assert_eq_size!(Key, u32);
    }

    #[test]
    fn keys_round_trip_through_index() {
        arena_key! { struct Key; }

        let key = Key::new(17);

        assert_eq!(key.index(), 17);
        assert_eq!(format!("{key:?}"), "Key(17)");
    }

    #[test]
    #[should_panic(expected = "index is not representable with key type")]
    fn oversized_index_panics() {
        arena_key! { struct Key; }

        let _ = Key::new(u32::MAX as usize + 1);
    }
}
