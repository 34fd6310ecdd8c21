// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Opaque handle newtypes.
//!
//! The C header declares every handle as a pointer to an incomplete struct.
//! Each one gets its own `#[repr(transparent)]` wrapper so a `TiMemory` can
//! never be passed where a `TiKernel` is expected, while the ABI still sees a
//! single machine word.

use std::ffi::c_void;

macro_rules! opaque_handle {
    ($($(#[$meta:meta])* $name:ident;)+) => {
        $(
            $(#[$meta])*
            #[repr(transparent)]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $name(*mut c_void);

            impl $name {
                /// The null handle (`TI_NULL_HANDLE`).
                #[must_use]
                pub const fn null() -> Self {
                    Self(std::ptr::null_mut())
                }

                /// Wrap a raw pointer returned by the native library.
                #[must_use]
                pub const fn from_raw(raw: *mut c_void) -> Self {
                    Self(raw)
                }

                /// The raw pointer. Never dereference it.
                #[must_use]
                pub const fn as_raw(self) -> *mut c_void {
                    self.0
                }

                /// Whether this is the null handle.
                #[must_use]
                pub fn is_null(self) -> bool {
                    self.0.is_null()
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::null()
                }
            }
        )+
    };
}

opaque_handle! {
    /// A native runtime instance bound to one arch and device.
    TiRuntime;
    /// A loaded AOT module.
    TiAotModule;
    /// A device memory allocation.
    TiMemory;
    /// A device image allocation.
    TiImage;
    /// A texture sampler.
    TiSampler;
    /// A kernel retrieved from an AOT module.
    TiKernel;
    /// A compute graph retrieved from an AOT module.
    TiComputeGraph;
}
