//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use ahash::RandomState;
use std::collections::{HashMap, HashSet};

/// Map used for the value-numbering table, keyed by whole instructions.
pub type FastMap<K, V> = HashMap<K, V, RandomState>;

/// Set of blocks, e.g. the terminal blocks of a shader.
pub type FastSet<V> = HashSet<V, RandomState>;
