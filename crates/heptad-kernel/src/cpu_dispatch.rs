//! Runtime CPU feature detection, cached for the process lifetime.

use std::sync::OnceLock;

/// CPU feature detection results.
#[derive(Debug, Clone, Copy)]
pub struct CpuFeatures {
    pub has_neon: bool,
    pub has_avx2: bool,
    pub arch_name: &'static str,
}

static CPU_FEATURES: OnceLock<CpuFeatures> = OnceLock::new();

impl CpuFeatures {
    fn detect() -> Self {
        #[cfg(target_arch = "aarch64")]
        {
            let has_neon = std::arch::is_aarch64_feature_detected!("neon");
            CpuFeatures {
                has_neon,
                has_avx2: false,
                arch_name: if has_neon { "aarch64-neon" } else { "aarch64-scalar" },
            }
        }

        #[cfg(target_arch = "x86_64")]
        {
            let has_avx2 = std::arch::is_x86_feature_detected!("avx2");
            CpuFeatures {
                has_neon: false,
                has_avx2,
                arch_name: if has_avx2 { "x86_64-avx2" } else { "x86_64-scalar" },
            }
        }

        #[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
        {
            CpuFeatures {
                has_neon: false,
                has_avx2: false,
                arch_name: "generic-scalar",
            }
        }
    }

    /// Cached CPU feature set, detected once per process.
    pub fn get() -> &'static CpuFeatures {
        CPU_FEATURES.get_or_init(Self::detect)
    }
}
