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
//! AVX2 bulk updates, 4 × f64 per instruction

use super::{scalar, SimdBackend, AVX2_WIDTH};

use std::arch::x86_64::*;

/// AVX2 backend for x86_64 CPUs
pub struct Avx2Backend;

#[target_feature(enable = "avx2")]
unsafe fn scale_add_avx2(state: &mut [f64], derivative: &[f64], dt: f64) {
    let dt_vec = _mm256_set1_pd(dt);

    let mut state_chunks = state.chunks_exact_mut(AVX2_WIDTH);
    let mut derivative_chunks = derivative.chunks_exact(AVX2_WIDTH);
    for (x_chunk, d_chunk) in (&mut state_chunks).zip(&mut derivative_chunks) {
        let x = _mm256_loadu_pd(x_chunk.as_ptr());
        let d = _mm256_loadu_pd(d_chunk.as_ptr());
        // Separate mul and add to match the scalar rounding
        let x_new = _mm256_add_pd(x, _mm256_mul_pd(d, dt_vec));
        _mm256_storeu_pd(x_chunk.as_mut_ptr(), x_new);
    }

    scalar::scale_add(state_chunks.into_remainder(), derivative_chunks.remainder(), dt);
}

impl SimdBackend for Avx2Backend {
    fn name(&self) -> &str {
        "AVX2"
    }

    fn width(&self) -> usize {
        AVX2_WIDTH
    }

    fn is_supported(&self) -> bool {
        is_x86_feature_detected!("avx2")
    }

    unsafe fn scale_add(&self, state: &mut [f64], derivative: &[f64], dt: f64) {
        debug_assert_eq!(state.len(), derivative.len());
        scale_add_avx2(state, derivative, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avx2_matches_scalar_with_tail() {
        if !Avx2Backend.is_supported() {
            return;
        }

        let derivative: Vec<f64> = (0..11).map(|i| (i as f64).sin()).collect();
        let mut expected: Vec<f64> = (0..11).map(|i| i as f64 * 1.5).collect();
        let mut actual = expected.clone();

        unsafe {
            super::super::ScalarBackend.scale_add(&mut expected, &derivative, 0.016);
            Avx2Backend.scale_add(&mut actual, &derivative, 0.016);
        }

        assert_eq!(expected, actual);
    }
}
