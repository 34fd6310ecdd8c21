// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! AOT module loading and lookups.
//!
//! An AOT module is a precompiled bundle of kernels and compute graphs. The
//! binding never looks inside it: a path or a byte blob goes to the native
//! library as is, and kernels and graphs come back as opaque handles.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use taichi_aot::{Arch, Loader, LoaderConfig, Runtime};
//! use taichi_aot::{AotModule, HostArray};
//!
//! # let library = Loader::new(LoaderConfig::default()).load()?;
//! # let runtime = Runtime::create(library, Arch::Vulkan, 0)?;
//! let module = AotModule::load(&runtime, "assets/copy_module")?;
//! let kernel = module.get_kernel("copy")?;
//!
//! let src = HostArray::from_slice(&[1i32, 2, 3, 4], &[4])?;
//! let dst = HostArray::from_slice(&[0i32; 4], &[4])?;
//! let outputs = kernel.run(vec![src.into(), dst.into()])?;
//! assert_eq!(outputs[1].to_vec::<i32>()?, vec![1, 2, 3, 4]);
//!
//! module.destroy()?;
//! # Ok::<(), taichi_aot::TaichiError>(())
//! ```

use std::ffi::CString;
use std::path::Path;

use crate::compute_graph::ComputeGraph;
use crate::error::{ApiError, ErrorCode, Result, TaichiError};
use crate::kernel::Kernel;
use crate::runtime::Runtime;
use crate::sys::handles::{TiAotModule, TiRuntime};
use crate::traits::RuntimeBound;

/// Origin label for modules created from bytes.
const MEMORY_ORIGIN: &str = "<memory>";

/// A loaded AOT module.
#[derive(Debug)]
pub struct AotModule<'rt> {
    runtime: &'rt Runtime,
    handle: TiAotModule,
    origin: String,
}

impl<'rt> AotModule<'rt> {
    /// Load a module from a path on disk.
    ///
    /// The path is passed through even if it does not exist; the native
    /// library decides and reports.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the path is not UTF-8 or contains a NUL byte
    /// - `ModuleLoad` if the native library rejects the module
    pub fn load(runtime: &'rt Runtime, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let c_path = path
            .to_str()
            .ok_or_else(|| TaichiError::invalid_argument(format!("module path {origin} is not UTF-8")))
            .and_then(|s| {
                CString::new(s).map_err(|_| {
                    TaichiError::invalid_argument(format!("module path {origin} contains a NUL byte"))
                })
            })?;

        let handle = runtime.library().checked_api("ti_load_aot_module", |api| {
            // SAFETY: `c_path` is NUL-terminated and outlives the call.
            unsafe { (api.ti_load_aot_module)(runtime.handle(), c_path.as_ptr()) }
        });
        Self::finish(runtime, handle, origin)
    }

    /// Create a module from an in-memory blob.
    ///
    /// # Errors
    ///
    /// Returns `ModuleLoad` if the native library rejects the blob.
    pub fn create(runtime: &'rt Runtime, bytes: &[u8]) -> Result<Self> {
        let handle = runtime.library().checked_api("ti_create_aot_module", |api| {
            // SAFETY: `bytes` is readable for `len` bytes during the call.
            unsafe {
                (api.ti_create_aot_module)(runtime.handle(), bytes.as_ptr().cast(), bytes.len() as u64)
            }
        });
        Self::finish(runtime, handle, MEMORY_ORIGIN.to_string())
    }

    fn finish(
        runtime: &'rt Runtime,
        handle: std::result::Result<TiAotModule, ApiError>,
        origin: String,
    ) -> Result<Self> {
        let handle = match handle {
            Ok(h) if !h.is_null() => h,
            Ok(_) => {
                return Err(TaichiError::ModuleLoad {
                    origin,
                    source: ApiError::synthesized(ErrorCode::CorruptedData, "module load returned a null handle"),
                })
            }
            Err(source) => return Err(TaichiError::ModuleLoad { origin, source }),
        };
        tracing::debug!(target: "taichi_aot::ffi", %origin, "AOT module loaded");
        Ok(Self {
            runtime,
            handle,
            origin,
        })
    }

    /// Rebuild a module view from a handle obtained earlier.
    ///
    /// `handle` must be a live module created on `runtime`. Used by the
    /// Python bindings, which cannot hold borrowing wrappers across calls.
    #[cfg(feature = "python")]
    pub(crate) fn from_raw_parts(runtime: &'rt Runtime, handle: TiAotModule, origin: String) -> Self {
        Self {
            runtime,
            handle,
            origin,
        }
    }

    /// Release the module.
    ///
    /// # Preconditions
    ///
    /// No launch of one of its kernels or graphs may still be in flight.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn destroy(self) -> Result<()> {
        self.runtime.library().checked("ti_destroy_aot_module", |api| {
            // SAFETY: `self.handle` is live and consumed here.
            unsafe { (api.ti_destroy_aot_module)(self.handle) }
        })
    }

    /// Look up a kernel by name.
    ///
    /// # Errors
    ///
    /// Returns `NameNotFound` if the module has no such kernel, or
    /// `InvalidArgument` if `name` contains a NUL byte.
    pub fn get_kernel(&self, name: &str) -> Result<Kernel<'_>> {
        let c_name = c_name(name)?;
        let handle = self
            .runtime
            .library()
            .checked_api("ti_get_aot_module_kernel", |api| {
                // SAFETY: `c_name` is NUL-terminated and outlives the call.
                unsafe { (api.ti_get_aot_module_kernel)(self.handle, c_name.as_ptr()) }
            })
            .map_err(|source| name_not_found(name, source))?;
        if handle.is_null() {
            return Err(name_not_found(name, null_lookup("kernel", name)));
        }
        Ok(Kernel::new(self, handle, name))
    }

    /// Look up a compute graph by name.
    ///
    /// # Errors
    ///
    /// Returns `NameNotFound` if the module has no such graph, or
    /// `InvalidArgument` if `name` contains a NUL byte.
    pub fn get_compute_graph(&self, name: &str) -> Result<ComputeGraph<'_>> {
        let c_name = c_name(name)?;
        let handle = self
            .runtime
            .library()
            .checked_api("ti_get_aot_module_compute_graph", |api| {
                // SAFETY: `c_name` is NUL-terminated and outlives the call.
                unsafe { (api.ti_get_aot_module_compute_graph)(self.handle, c_name.as_ptr()) }
            })
            .map_err(|source| name_not_found(name, source))?;
        if handle.is_null() {
            return Err(name_not_found(name, null_lookup("compute graph", name)));
        }
        Ok(ComputeGraph::new(self, handle, name))
    }

    /// Raw module handle.
    #[must_use]
    pub fn handle(&self) -> TiAotModule {
        self.handle
    }

    /// Path the module came from, or `<memory>`.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The owning runtime.
    #[must_use]
    pub fn runtime(&self) -> &'rt Runtime {
        self.runtime
    }
}

impl RuntimeBound for AotModule<'_> {
    fn runtime_handle(&self) -> TiRuntime {
        self.runtime.handle()
    }
}

fn c_name(name: &str) -> Result<CString> {
    CString::new(name)
        .map_err(|_| TaichiError::invalid_argument(format!("name {name:?} contains a NUL byte")))
}

fn name_not_found(name: &str, source: ApiError) -> TaichiError {
    TaichiError::NameNotFound {
        name: name.to_string(),
        source,
    }
}

fn null_lookup(kind: &str, name: &str) -> ApiError {
    ApiError::synthesized(
        ErrorCode::NameNotFound,
        format!("{kind} `{name}` lookup returned a null handle"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_name_rejects_nul() {
        assert!(c_name("copy").is_ok());
        assert!(matches!(
            c_name("co\0py").unwrap_err(),
            TaichiError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_null_lookup_is_name_not_found() {
        let err = name_not_found("missing", null_lookup("kernel", "missing"));
        assert_eq!(err.code(), Some(ErrorCode::NameNotFound));
        assert!(err.to_string().contains("missing"));
    }
}
