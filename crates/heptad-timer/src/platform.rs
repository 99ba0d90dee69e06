// Platform-specific unsafe operations.
// This module contains ONLY unavoidable unsafe code that has no safe alternative.

/// SAFETY JUSTIFICATION:
/// - RDTSC/CNTVCT intrinsics: no safe alternative exists for cycle-accurate timing.
/// - CPU affinity: no safe alternative exists for thread pinning.
#[allow(unsafe_code)]
pub mod unsafe_ops {
    /// Read Time Stamp Counter (x86-64).
    /// SAFETY: RDTSC is a read-only instruction with no side effects.
    #[cfg(target_arch = "x86_64")]
    #[inline(always)]
    pub fn read_cycles() -> u64 {
        unsafe { std::arch::x86_64::_rdtsc() }
    }

    /// Read TSC with CPUID serialization (more precise, higher overhead).
    /// SAFETY: CPUID and RDTSC are both read-only instructions.
    #[cfg(target_arch = "x86_64")]
    #[inline(always)]
    pub fn read_cycles_serialized() -> u64 {
        unsafe {
            std::arch::x86_64::__cpuid(0);
            std::arch::x86_64::_rdtsc()
        }
    }

    /// Read TSC fenced on both sides.
    /// SAFETY: memory fence and RDTSC are both safe read-only operations.
    #[cfg(target_arch = "x86_64")]
    #[inline(always)]
    pub fn read_cycles_fenced() -> u64 {
        unsafe {
            std::arch::x86_64::_mm_mfence();
            let tsc = std::arch::x86_64::_rdtsc();
            std::arch::x86_64::_mm_mfence();
            tsc
        }
    }

    /// Read the virtual counter register (aarch64).
    /// SAFETY: `mrs` from `cntvct_el0` is a read-only system register access.
    #[cfg(target_arch = "aarch64")]
    #[inline(always)]
    pub fn read_cycles() -> u64 {
        let val: u64;
        unsafe {
            std::arch::asm!("mrs {}, cntvct_el0", out(reg) val, options(nomem, nostack));
        }
        val
    }

    #[cfg(target_arch = "aarch64")]
    #[inline(always)]
    pub fn read_cycles_serialized() -> u64 {
        read_cycles_fenced()
    }

    /// SAFETY: `dsb sy` is a data synchronization barrier with no memory effects
    /// beyond ordering; `mrs` is a read-only register access.
    #[cfg(target_arch = "aarch64")]
    #[inline(always)]
    pub fn read_cycles_fenced() -> u64 {
        unsafe {
            std::arch::asm!("dsb sy", options(nostack, nomem));
            let val: u64;
            std::arch::asm!("mrs {}, cntvct_el0", out(reg) val);
            std::arch::asm!("dsb sy", options(nostack, nomem));
            val
        }
    }

    /// Fallback for platforms without a direct cycle counter: a monotonic clock.
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    #[inline(always)]
    pub fn read_cycles() -> u64 {
        std::time::Instant::now().elapsed().as_nanos() as u64
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    #[inline(always)]
    pub fn read_cycles_serialized() -> u64 {
        read_cycles()
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    #[inline(always)]
    pub fn read_cycles_fenced() -> u64 {
        read_cycles()
    }

    /// Pin the calling thread to a CPU core.
    /// SAFETY: `pthread_setaffinity_np` is a well-defined C FFI call; the zeroed
    /// `cpu_set_t` is a valid starting value per the pthread API contract.
    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    #[inline]
    pub fn pin_to_cpu(cpu_id: usize) -> Result<(), String> {
        unsafe {
            let mut cpu_set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_SET(cpu_id, &mut cpu_set);

            let result = libc::pthread_setaffinity_np(
                libc::pthread_self(),
                std::mem::size_of::<libc::cpu_set_t>(),
                &cpu_set,
            );

            if result == 0 {
                Ok(())
            } else {
                Err(format!("failed to pin to cpu {cpu_id}: errno {result}"))
            }
        }
    }

    #[cfg(not(all(target_os = "linux", target_arch = "x86_64")))]
    #[inline]
    pub fn pin_to_cpu(_cpu_id: usize) -> Result<(), String> {
        Err("CPU pinning not supported on this platform".to_string())
    }
}
