//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Per-compilation configuration and state.
//!
//! There is no global compiler state: every compilation owns a
//! [`CompilationContext`], and it is threaded through every pass explicitly.

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The machine word size of the target. This only decides which integers
/// fit into a tagged small integer, integer arithmetic itself is always
/// 64-bit two's complement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum WordSize {
    /// 32-bit words, 31-bit small integers.
    W32,
    /// 64-bit words, 63-bit small integers.
    W64,
}

impl WordSize {
    /// The number of payload bits in a small integer.
    #[inline]
    pub const fn smi_bits(self) -> u32 {
        match self {
            WordSize::W32 => 31,
            WordSize::W64 => 63,
        }
    }

    /// The smallest value representable as a small integer.
    #[inline]
    pub const fn smi_min(self) -> i64 {
        -(1i64 << (self.smi_bits() - 1))
    }

    /// The largest value representable as a small integer.
    #[inline]
    pub const fn smi_max(self) -> i64 {
        (1i64 << (self.smi_bits() - 1)) - 1
    }

    /// Whether `value` fits into a small integer.
    #[inline]
    pub const fn is_smi(self, value: i64) -> bool {
        value >= self.smi_min() && value <= self.smi_max()
    }
}

/// Options that change how the optimizer behaves. These are fixed for the
/// duration of a compilation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct CompilerOptions {
    /// Whether phis left with a single input after dead predecessors are
    /// pruned get replaced by that input.
    pub remove_redundant_phis: bool,
    /// Emits `tracing` events describing every decision constant
    /// propagation makes.
    pub trace_constant_propagation: bool,
    /// A phi visited more than `phi_visit_factor * input_count` times in
    /// one analysis run means the lattice is not converging.
    pub phi_visit_factor: usize,
    /// The target word size.
    pub word_size: WordSize,
    /// Whether the pass manager runs the verifier after every pass.
    pub verify_after_passes: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            remove_redundant_phis: true,
            trace_constant_propagation: false,
            phi_visit_factor: 5,
            word_size: WordSize::W64,
            verify_after_passes: false,
        }
    }
}

/// A deoptimization id, identifying a point in the unoptimized code that
/// optimized code can fall back to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct DeoptId(pub u32);

/// The state owned by a single compilation.
#[derive(Clone, Debug, Default)]
pub struct CompilationContext {
    options: CompilerOptions,
    next_deopt_id: u32,
}

impl CompilationContext {
    /// Creates a context with the given options.
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            next_deopt_id: 0,
        }
    }

    /// The options for this compilation.
    #[inline]
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Allocates a fresh deoptimization id.
    pub fn next_deopt_id(&mut self) -> DeoptId {
        let id = DeoptId(self.next_deopt_id);

        self.next_deopt_id += 1;

        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smi_ranges() {
        assert_eq!(WordSize::W32.smi_max(), (1 << 30) - 1);
        assert_eq!(WordSize::W32.smi_min(), -(1 << 30));
        assert!(WordSize::W64.is_smi(1 << 40));
        assert!(!WordSize::W32.is_smi(1 << 40));
        assert!(!WordSize::W64.is_smi(i64::MAX));
    }

    #[test]
    fn deopt_ids_are_monotonic() {
        let mut ctx = CompilationContext::new(CompilerOptions::default());
        let a = ctx.next_deopt_id();
        let b = ctx.next_deopt_id();

        assert!(a < b);
        assert_eq!(ctx.options().phi_visit_factor, 5);
    }
}
