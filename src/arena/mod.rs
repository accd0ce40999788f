//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! A small typed arena used to store the blocks of a shader.
//!
//! Keys are dense `u32` indices handed out in insertion order, which
//! doubles as program order for the blocks of a shader. Nothing is ever
//! removed from an arena, so a key stays valid for the lifetime of the map
//! that produced it.
//!
//! ```
//! # use bir::arena_key;
//! # use bir::arena::*;
//! arena_key! {
//!     pub struct Node;
//! }
//!
//! let mut arena = ArenaMap::new();
//! let first: Node = arena.insert("first");
//! let second = arena.insert("second");
//!
//! assert_eq!(arena[first], "first");
//! assert_eq!(arena.keys().collect::<Vec<_>>(), vec![first, second]);
//! ```

mod key;
mod map;

pub use key::ArenaKey;
pub use map::ArenaMap;
