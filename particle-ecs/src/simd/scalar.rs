// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Scalar fallback for bulk updates
//!
//! Always available. Also handles the remainder left over by the wide
//! backends when the buffer length is not a multiple of their width.

use super::SimdBackend;

/// Scalar backend that processes one element at a time
pub struct ScalarBackend;

/// `state[i] += derivative[i] * dt` over the common prefix of both slices
pub(crate) fn scale_add(state: &mut [f64], derivative: &[f64], dt: f64) {
    for (x, d) in state.iter_mut().zip(derivative) {
        *x += d * dt;
    }
}

impl SimdBackend for ScalarBackend {
    fn name(&self) -> &str {
        "Scalar"
    }

    fn width(&self) -> usize {
        1
    }

    fn is_supported(&self) -> bool {
        true
    }

    unsafe fn scale_add(&self, state: &mut [f64], derivative: &[f64], dt: f64) {
        debug_assert_eq!(state.len(), derivative.len());
        scale_add(state, derivative, dt);
    }
}
