//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use smallvec::{smallvec, SmallVec};
use std::any::{Any, TypeId};

struct All;

/// Models the set of analyses that a given transform pass preserved.
///
/// Analyses are identified by the type of their result, e.g. a pass that
/// did not touch control flow preserves [`BlockOrders`] and [`DominatorTree`].
///
/// [`BlockOrders`]: crate::analysis::BlockOrders
/// [`DominatorTree`]: crate::analysis::DominatorTree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreservedAnalyses {
    // sorted so we can binary_search for `contains`
    preserved: SmallVec<[TypeId; 2]>,
}

impl PreservedAnalyses {
    /// Returns a [`PreservedAnalyses`] that marks every analysis as preserved.
    pub fn all() -> Self {
        Self {
            preserved: smallvec![TypeId::of::<All>()],
        }
    }

    /// Returns a [`PreservedAnalyses`] that marks every analysis as invalidated.
    pub fn none() -> Self {
        Self {
            preserved: smallvec![],
        }
    }

    /// Checks if *all* analyses are preserved by a given transformation. If this
    /// is true, the transformation effectively reports to have not changed
    /// *anything* in the graph.
    ///
    /// This cannot be obtained in any way except [`Self::all`].
    pub fn preserves_all(&self) -> bool {
        self.preserved.len() == 1 && self.preserved[0] == TypeId::of::<All>()
    }

    /// Reports that an analysis is preserved by the current transformation.
    pub fn preserve<T: Any>(&mut self) {
        self.insert(TypeId::of::<T>())
    }

    /// Gets the intersection of two sets of preserved analyses, returning
    /// the analyses that are preserved both by `self` and by `other`.
    pub fn intersect(self, other: PreservedAnalyses) -> PreservedAnalyses {
        if self.preserves_all() {
            return other;
        }

        if other.preserves_all() {
            return self;
        }

        let mut new = PreservedAnalyses::none();
        let intersection = self.preserved.into_iter().filter(|id| other.contains(*id));

        for id in intersection {
            new.insert(id)
        }

        new
    }

    /// Checks if the analysis producing `T` is preserved.
    pub fn is_preserved<T: Any>(&self) -> bool {
        self.preserves_all() || self.contains(TypeId::of::<T>())
    }

    fn contains(&self, id: TypeId) -> bool {
        self.preserved.binary_search(&id).is_ok()
    }

    fn insert(&mut self, id: TypeId) {
        if let Err(pos) = self.preserved.binary_search(&id) {
            self.preserved.insert(pos, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{BlockOrders, DominatorTree};

    #[test]
    fn intersection() {
        let mut orders = PreservedAnalyses::none();
        orders.preserve::<BlockOrders>();

        let mut both = PreservedAnalyses::none();
        both.preserve::<DominatorTree>();
        both.preserve::<BlockOrders>();

        let all = PreservedAnalyses::all();

        assert!(all.is_preserved::<DominatorTree>());
        assert_eq!(all.clone().intersect(both.clone()), both);
        assert_eq!(both.clone().intersect(all), both);

        let result = both.intersect(orders);

        assert!(result.is_preserved::<BlockOrders>());
        assert!(!result.is_preserved::<DominatorTree>());
        assert!(!result.preserves_all());
        assert!(!PreservedAnalyses::none().is_preserved::<BlockOrders>());
    }
}
