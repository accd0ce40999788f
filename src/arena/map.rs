//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::ArenaKey;
use std::fmt::{Debug, Formatter};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A primary mapping of `K -> V`, where every key is handed out by [`Self::insert`].
///
/// This is a typed wrapper around `Vec<V>` that only allows indexing with
/// the right key type. Keys are handed out in increasing order, and iteration
/// always happens in that same order.
///
/// ```
/// # use bir::arena_key;
/// # use bir::arena::ArenaMap;
/// arena_key! {
///     struct Name;
/// }
///
/// let mut names = ArenaMap::new();
/// let name: Name = names.insert("Hello!");
///
/// assert_eq!(names[name], "Hello!");
/// ```
#[derive(Clone)]
pub struct ArenaMap<K: ArenaKey, V> {
    slots: Vec<V>,
    _unused: PhantomData<fn() -> K>,
}

impl<K: ArenaKey, V> ArenaMap<K, V> {
    /// Creates a new, empty arena.
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: Vec::default(),
            _unused: PhantomData,
        }
    }

    /// Inserts a value and returns the key that now refers to it.
    pub fn insert(&mut self, value: V) -> K {
        let key = K::new(self.slots.len());

        self.slots.push(value);

        key
    }

    /// Gets the value for `key`, if `key` came from this arena.
    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.slots.get(key.index())
    }

    /// Gets the value for `key` mutably, if `key` came from this arena.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.slots.get_mut(key.index())
    }

    /// The number of values that have been inserted.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Checks if nothing has been inserted yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns every key in insertion order.
    ///
    /// The iterator does not borrow the arena, so it can be used to drive
    /// a loop that mutates the values.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = K> + ExactSizeIterator {
        (0..self.slots.len()).map(K::new)
    }

    /// Returns every value in insertion order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.slots.iter()
    }

    /// Returns every value mutably, in insertion order.
    pub fn values_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut V> + '_ {
        self.slots.iter_mut()
    }

    /// Returns every `(key, value)` pair in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (K, &V)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, value)| (K::new(i), value))
    }
}

impl<K: ArenaKey, V> Default for ArenaMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, V> Index<K> for ArenaMap<K, V> {
    type Output = V;

    #[inline]
    fn index(&self, key: K) -> &V {
        &self.slots[key.index()]
    }
}

impl<K: ArenaKey, V> IndexMut<K> for ArenaMap<K, V> {
    #[inline]
    fn index_mut(&mut self, key: K) -> &mut V {
        &mut self.slots[key.index()]
    }
}

impl<K: ArenaKey, V: Debug> Debug for ArenaMap<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaMap ")?;

        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::*;
    use crate::arena_key;

    arena_key! { struct Key; }

    #[test]
    fn insert_hands_out_increasing_keys() {
        let mut map = ArenaMap::new();
        let k1: Key = map.insert(1);
        let k2: Key = map.insert(2);
        let k3: Key = map.insert(3);

        assert_eq!(map[k1], 1);
        assert_eq!(map[k2], 2);
        assert_eq!(map[k3], 3);
        assert!(k1 < k2 && k2 < k3);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn keys_do_not_borrow() {
        let mut map = ArenaMap::<Key, i32>::new();

        for i in 0..4 {
            map.insert(i);
        }

        for key in map.keys() {
            map[key] *= 10;
        }

        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![0, 10, 20, 30]);
    }

    #[test]
    fn get_out_of_range_is_none() {
        let mut map = ArenaMap::<Key, i32>::new();
        let k = map.insert(5);

        assert_eq!(map.get(k), Some(&5));
        assert_eq!(map.get(Key::new(1)), None);
    }
}
