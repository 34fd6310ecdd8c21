// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Traits shared by descriptors and runtime-scoped wrappers.
//!
//! [`ValidatableConfig`] is implemented by every descriptor that is checked
//! on the Rust side before it crosses the ABI (`LoaderConfig`,
//! `MemoryAllocateInfo`, `ImageAllocateInfo`, `SamplerCreateInfo`).
//! [`RuntimeBound`] is implemented by every wrapper holding a handle derived
//! from a runtime, so copies and launches can reject mixed runtimes.

use crate::error::{Result, TaichiError};
use crate::sys::handles::TiRuntime;

/// A descriptor that can be checked before it reaches the native library.
///
/// # Example
///
/// ```rust
/// use taichi_aot::{MemoryAllocateInfo, ValidatableConfig};
///
/// let info = MemoryAllocateInfo::new(0);
/// assert!(info.validate().is_err());
/// ```
pub trait ValidatableConfig: Clone + Send + Sync {
    /// Check field ranges and combinations.
    ///
    /// # Errors
    ///
    /// Returns `TaichiError::InvalidConfig` or `TaichiError::InvalidArgument`
    /// if validation fails.
    fn validate(&self) -> Result<()>;
}

/// An object whose native handle belongs to exactly one runtime.
///
/// Handles are meaningless outside the runtime that produced them; passing
/// one to a call bound to a different runtime is undefined behavior on the
/// native side. Lifetimes already tie wrappers to their runtime, and this
/// trait catches the remaining case of two live runtimes mixed in one call.
pub trait RuntimeBound {
    /// Handle of the owning runtime.
    fn runtime_handle(&self) -> TiRuntime;

    /// Fail with `InvalidArgument` unless `other` shares this runtime.
    ///
    /// # Errors
    ///
    /// Returns `TaichiError::InvalidArgument` on a runtime mismatch.
    fn ensure_same_runtime<O: RuntimeBound + ?Sized>(&self, other: &O) -> Result<()> {
        if self.runtime_handle() == other.runtime_handle() {
            Ok(())
        } else {
            Err(TaichiError::invalid_argument(
                "handles belong to different runtimes",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_void;

    #[derive(Clone)]
    struct Extent {
        width: u32,
        height: u32,
    }

    impl ValidatableConfig for Extent {
        fn validate(&self) -> Result<()> {
            if self.width == 0 || self.height == 0 {
                return Err(TaichiError::invalid_config("extent must be non-empty"));
            }
            Ok(())
        }
    }

    struct Handle(usize);

    impl RuntimeBound for Handle {
        fn runtime_handle(&self) -> TiRuntime {
            TiRuntime::from_raw(self.0 as *mut c_void)
        }
    }

    #[test]
    fn test_extent_validation() {
        assert!(Extent { width: 4, height: 4 }.validate().is_ok());
        let err = Extent { width: 4, height: 0 }.validate().unwrap_err();
        assert!(matches!(err, TaichiError::InvalidConfig(_)));
    }

    #[test]
    fn test_runtime_mismatch_rejected() {
        assert!(Handle(0x10).ensure_same_runtime(&Handle(0x10)).is_ok());
        let err = Handle(0x10).ensure_same_runtime(&Handle(0x20)).unwrap_err();
        assert!(matches!(err, TaichiError::InvalidArgument(_)));
    }
}
