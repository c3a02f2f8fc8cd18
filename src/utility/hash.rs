//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::collections::HashMap;

/// `HashMap` using `ahash`. The maps in the compiler are keyed on small
/// keys and constant values, where the default SipHash is needlessly slow.
pub type SaHashMap<K, V> = HashMap<K, V, ahash::RandomState>;
