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
//! Vectorized bulk updates for flat state buffers
//!
//! Used by [`FlatEulerIntegrator`](crate::integration::FlatEulerIntegrator)
//! to advance a whole particle population with one `state += derivative * dt`
//! pass. The backend is picked at runtime from the detected CPU features,
//! with a scalar fallback that every platform supports.
//!
//! All backends compute `x + d * dt` with a separate multiply and add, so
//! results are bit-identical across backends.

mod dispatch;
mod scalar;

#[cfg(target_arch = "x86_64")]
mod avx2;

pub use dispatch::{detect_cpu_features, CpuFeatures};
pub use scalar::ScalarBackend;

#[cfg(target_arch = "x86_64")]
pub use avx2::Avx2Backend;

/// Number of f64 lanes in a 256-bit AVX2 register
pub const AVX2_WIDTH: usize = 4;

/// Backend for vectorized state updates
pub trait SimdBackend {
    /// Backend name, for logging
    fn name(&self) -> &str;

    /// Number of f64 values processed per instruction
    fn width(&self) -> usize;

    /// Check if this backend is supported on the current CPU
    fn is_supported(&self) -> bool;

    /// Euler update `state[i] += derivative[i] * dt`
    ///
    /// # Safety
    ///
    /// - `state` and `derivative` must have the same length
    /// - The current CPU must support the backend's instructions
    unsafe fn scale_add(&self, state: &mut [f64], derivative: &[f64], dt: f64);
}

/// Select the best available backend for the current CPU
pub fn select_backend() -> Box<dyn SimdBackend> {
    #[cfg(target_arch = "x86_64")]
    {
        if detect_cpu_features().has_avx2 {
            return Box::new(Avx2Backend);
        }
    }

    Box::new(ScalarBackend)
}
