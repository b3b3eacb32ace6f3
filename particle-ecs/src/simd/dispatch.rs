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
//! CPU feature detection
//!
//! Queried once through CPUID and cached for the life of the process.

use std::sync::OnceLock;

/// CPU feature flags relevant to the bulk update backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuFeatures {
    /// CPU supports SSE2
    pub has_sse2: bool,
    /// CPU supports AVX
    pub has_avx: bool,
    /// CPU supports AVX2
    pub has_avx2: bool,
}

static CPU_FEATURES: OnceLock<CpuFeatures> = OnceLock::new();

/// Detect CPU features at runtime
///
/// Non-x86_64 platforms report no features and use the scalar backend.
pub fn detect_cpu_features() -> CpuFeatures {
    *CPU_FEATURES.get_or_init(|| {
        let features = detect_cpu_features_impl();
        log::debug!("detected CPU features: {:?}", features);
        features
    })
}

#[cfg(target_arch = "x86_64")]
fn detect_cpu_features_impl() -> CpuFeatures {
    use raw_cpuid::CpuId;

    let cpuid = CpuId::new();
    let mut features = CpuFeatures::default();

    if let Some(info) = cpuid.get_feature_info() {
        features.has_sse2 = info.has_sse2();
        features.has_avx = info.has_avx();
    }
    if let Some(extended) = cpuid.get_extended_feature_info() {
        features.has_avx2 = extended.has_avx2();
    }

    features
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_cpu_features_impl() -> CpuFeatures {
    CpuFeatures::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_detection() {
        let _features = detect_cpu_features();
        #[cfg(target_arch = "x86_64")]
        assert!(_features.has_sse2, "x86_64 requires SSE2");
    }

    #[test]
    fn test_feature_caching() {
        assert_eq!(detect_cpu_features(), detect_cpu_features());
    }

    #[test]
    fn test_default_features() {
        let features = CpuFeatures::default();
        assert!(!features.has_avx2);
        assert!(!features.has_sse2);
    }
}
