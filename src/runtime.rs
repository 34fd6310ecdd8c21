// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Runtime lifecycle.
//!
//! A [`Runtime`] is one native runtime instance bound to an arch and a device
//! index. Every other wrapper borrows it, so no allocation, module or kernel
//! can outlive the runtime it came from.
//!
//! ## Threading
//!
//! `Runtime` holds a raw handle and is neither `Send` nor `Sync`. The native
//! runtime is not safe to drive from several threads at once; callers that
//! need that must synchronize externally and move the handle themselves.

use std::sync::Arc;

use crate::device::{select_arch, RuntimeConfig};
use crate::enums::{Arch, Capability};
use crate::error::{ApiError, ErrorCode, Result, TaichiError};
use crate::loader::TaichiLibrary;
use crate::sys::handles::TiRuntime;
use crate::sys::structs::TiCapabilityLevelInfo;
use crate::traits::RuntimeBound;

/// A capability and the level the device supports (or is told to assume).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityLevel {
    /// Capability.
    pub capability: Capability,
    /// Supported level; 0 means unsupported, 1 supported, larger values are
    /// versions (e.g. the SPIR-V version).
    pub level: u32,
}

impl CapabilityLevel {
    /// Create a capability level.
    #[must_use]
    pub fn new(capability: Capability, level: u32) -> Self {
        Self { capability, level }
    }

    fn to_raw(self) -> TiCapabilityLevelInfo {
        TiCapabilityLevelInfo {
            capability: self.capability.as_raw(),
            level: self.level,
        }
    }
}

/// A native runtime instance.
///
/// Created with [`Runtime::create`] and released with [`Runtime::destroy`].
/// Dropping a `Runtime` without destroying it leaks the native instance.
#[derive(Debug)]
pub struct Runtime {
    library: Arc<TaichiLibrary>,
    handle: TiRuntime,
    arch: Arch,
    device_index: u32,
}

impl Runtime {
    /// Create a runtime on `arch`, device `device_index`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedArch` if the native library reports an error or
    /// returns a null handle.
    pub fn create(library: Arc<TaichiLibrary>, arch: Arch, device_index: u32) -> Result<Self> {
        let unsupported = |source: ApiError| TaichiError::UnsupportedArch {
            arch: arch.name().to_string(),
            device_index,
            source,
        };

        let handle = library
            .checked_api("ti_create_runtime", |api| {
                // SAFETY: plain values in, handle out.
                unsafe { (api.ti_create_runtime)(arch.as_raw(), device_index) }
            })
            .map_err(unsupported)?;

        if handle.is_null() {
            return Err(unsupported(ApiError::synthesized(
                ErrorCode::NotSupported,
                "ti_create_runtime returned a null handle",
            )));
        }

        tracing::debug!(target: "taichi_aot::ffi", %arch, device_index, "runtime created");
        Ok(Self {
            library,
            handle,
            arch,
            device_index,
        })
    }

    /// Select an arch per `config`, then create a runtime on it.
    ///
    /// # Errors
    ///
    /// Propagates [`select_arch`] and [`Runtime::create`] errors.
    pub fn from_config(library: Arc<TaichiLibrary>, config: &RuntimeConfig) -> Result<Self> {
        let arch = select_arch(&library, config)?;
        Self::create(library, arch, config.device_index)
    }

    /// Destroy the runtime.
    ///
    /// # Preconditions
    ///
    /// Every allocation, module and sampler created from this runtime should
    /// already be released; the borrow checker enforces that the safe
    /// wrappers are out of scope, not that they were freed.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn destroy(self) -> Result<()> {
        let handle = self.handle;
        self.library.checked("ti_destroy_runtime", |api| {
            // SAFETY: `handle` is live and consumed here.
            unsafe { (api.ti_destroy_runtime)(handle) }
        })
    }

    /// Submit queued work without blocking.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn flush(&self) -> Result<()> {
        self.library.checked("ti_flush", |api| {
            // SAFETY: `self.handle` is live.
            unsafe { (api.ti_flush)(self.handle) }
        })
    }

    /// Block until all submitted work completes. Implies a flush.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn wait(&self) -> Result<()> {
        self.library.checked("ti_wait", |api| {
            // SAFETY: `self.handle` is live.
            unsafe { (api.ti_wait)(self.handle) }
        })
    }

    /// Device capabilities reported for this runtime.
    ///
    /// Capabilities this binding does not know are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn capabilities(&self) -> Result<Vec<CapabilityLevel>> {
        let mut count = 0u32;
        self.library.checked("ti_get_runtime_capabilities", |api| {
            // SAFETY: null output array requests the count only.
            unsafe { (api.ti_get_runtime_capabilities)(self.handle, &mut count, std::ptr::null_mut()) }
        })?;

        let mut raw = vec![TiCapabilityLevelInfo::default(); count as usize];
        let mut filled = count;
        self.library.checked("ti_get_runtime_capabilities", |api| {
            // SAFETY: `raw` holds `filled` writable slots.
            unsafe { (api.ti_get_runtime_capabilities)(self.handle, &mut filled, raw.as_mut_ptr()) }
        })?;
        raw.truncate(filled.min(count) as usize);

        Ok(raw
            .into_iter()
            .filter_map(|info| {
                let capability = Capability::from_raw(info.capability);
                if capability.is_none() {
                    tracing::debug!(
                        target: "taichi_aot::ffi",
                        capability = info.capability,
                        "skipping unknown capability"
                    );
                }
                capability.map(|c| CapabilityLevel::new(c, info.level))
            })
            .collect())
    }

    /// Override device capabilities before loading modules.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the list is too long for the ABI, or `Api`
    /// if the error channel reports a failure.
    pub fn set_capabilities_ext(&self, capabilities: &[CapabilityLevel]) -> Result<()> {
        let raw: Vec<TiCapabilityLevelInfo> = capabilities.iter().map(|c| c.to_raw()).collect();
        let count = u32::try_from(raw.len())
            .map_err(|_| TaichiError::invalid_argument("too many capabilities"))?;
        self.library.checked("ti_set_runtime_capabilities_ext", |api| {
            // SAFETY: `raw` holds `count` initialised entries for the call.
            unsafe { (api.ti_set_runtime_capabilities_ext)(self.handle, count, raw.as_ptr()) }
        })
    }

    /// Raw runtime handle.
    #[must_use]
    pub fn handle(&self) -> TiRuntime {
        self.handle
    }

    /// The library this runtime was created from.
    #[must_use]
    pub fn library(&self) -> &Arc<TaichiLibrary> {
        &self.library
    }

    /// Arch the runtime executes on.
    #[must_use]
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Device index the runtime was created with.
    #[must_use]
    pub fn device_index(&self) -> u32 {
        self.device_index
    }
}

impl RuntimeBound for Runtime {
    fn runtime_handle(&self) -> TiRuntime {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_level_to_raw() {
        let raw = CapabilityLevel::new(Capability::SpirvVersion, 0x10300).to_raw();
        assert_eq!(raw.capability, 1);
        assert_eq!(raw.level, 0x10300);
    }
}
