// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! GPU-first arch selection.
//!
//! A runtime needs one concrete [`Arch`] and a device index. The native
//! library reports which arches it was built with; [`select_arch`] walks a
//! preference list and returns the first one available. GPU backends are
//! preferred. Falling back to a CPU arch (x64/arm64) is allowed but triggers a
//! one-time warning, since AOT modules are usually built for GPU targets.
//!
//! ## Example
//!
//! ```rust,no_run
//! use taichi_aot::{Arch, Loader, LoaderConfig, Runtime, RuntimeConfig};
//!
//! let library = Loader::new(LoaderConfig::default()).load()?;
//!
//! // Default: Vulkan, Metal, CUDA, then CPU, on device 0
//! let runtime = Runtime::from_config(library.clone(), &RuntimeConfig::default())?;
//!
//! // Explicit preference
//! let config = RuntimeConfig::new()
//!     .with_preferred_archs([Arch::Cuda, Arch::Vulkan])
//!     .with_device_index(1);
//! let runtime = Runtime::from_config(library, &config)?;
//! # Ok::<(), taichi_aot::TaichiError>(())
//! ```

use std::sync::Once;

use crate::enums::Arch;
use crate::error::{Result, TaichiError};
use crate::loader::TaichiLibrary;
use crate::traits::ValidatableConfig;

/// Configuration for runtime creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Arches to try, most preferred first.
    pub preferred_archs: Vec<Arch>,
    /// Device index passed to `ti_create_runtime`.
    pub device_index: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            preferred_archs: vec![Arch::Vulkan, Arch::Metal, Arch::Cuda, Arch::X64, Arch::Arm64],
            device_index: 0,
        }
    }
}

impl RuntimeConfig {
    /// Create a new runtime configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the arch preference list.
    #[must_use]
    pub fn with_preferred_archs(mut self, archs: impl IntoIterator<Item = Arch>) -> Self {
        self.preferred_archs = archs.into_iter().collect();
        self
    }

    /// Pin a single arch.
    #[must_use]
    pub fn with_arch(self, arch: Arch) -> Self {
        self.with_preferred_archs([arch])
    }

    /// Set the device index.
    #[must_use]
    pub fn with_device_index(mut self, index: u32) -> Self {
        self.device_index = index;
        self
    }
}

impl ValidatableConfig for RuntimeConfig {
    fn validate(&self) -> Result<()> {
        if self.preferred_archs.is_empty() {
            return Err(TaichiError::invalid_config("preferred_archs must not be empty"));
        }
        if self.preferred_archs.contains(&Arch::Reserved) {
            return Err(TaichiError::invalid_config(
                "Arch::Reserved is not a runtime target",
            ));
        }
        Ok(())
    }
}

/// Pick the first preferred arch the library reports as available.
///
/// # Errors
///
/// - `InvalidConfig` if `config` is invalid
/// - `Api` if querying the library fails
/// - `NoAvailableArch` if no preferred arch is available
pub fn select_arch(library: &TaichiLibrary, config: &RuntimeConfig) -> Result<Arch> {
    config.validate()?;
    let available = library.available_archs()?;
    choose_arch(&config.preferred_archs, &available, config.device_index)
}

fn choose_arch(preferred: &[Arch], available: &[Arch], device_index: u32) -> Result<Arch> {
    let Some(arch) = preferred.iter().copied().find(|a| available.contains(a)) else {
        let join = |archs: &[Arch]| archs.iter().map(|a| a.name()).collect::<Vec<_>>().join(", ");
        return Err(TaichiError::NoAvailableArch {
            preferred: join(preferred),
            available: join(available),
        });
    };

    if arch.is_cpu() {
        warn_cpu_fallback(arch);
    } else {
        tracing::info!(target: "taichi_aot::device", %arch, device_index, "selected GPU arch");
    }
    Ok(arch)
}

/// Emit a one-time warning if a runtime will execute on the CPU.
pub fn warn_if_cpu(arch: Arch) {
    if arch.is_cpu() {
        warn_cpu_fallback(arch);
    }
}

fn warn_cpu_fallback(arch: Arch) {
    static WARN_ONCE: Once = Once::new();

    WARN_ONCE.call_once(|| {
        tracing::warn!(
            target: "taichi_aot::device",
            "taichi-aot: CPU arch {arch} in use. AOT modules are usually built for a GPU \
             backend; pin the arch in RuntimeConfig to silence this warning."
        );
    });
}
