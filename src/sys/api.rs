// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! ABI descriptor table.
//!
//! Every native entry point is declared exactly once in the `native_api!`
//! invocation below. The macro produces:
//!
//! - [`NativeApi`]: one typed `unsafe extern "C" fn` pointer per entry point
//! - [`SIGNATURES`]: the same declarations as strings, for regression diffs
//! - [`NativeApi::resolve`]: eager, per-symbol resolution against a [`Library`]
//!
//! A signature that disagrees with the C header corrupts memory silently, so
//! the golden test at the bottom of this file pins every declaration.

use std::ffi::{c_char, c_void};

use libloading::Library;

use super::handles::{
    TiAotModule, TiComputeGraph, TiImage, TiKernel, TiMemory, TiRuntime, TiSampler,
};
use super::structs::{
    TiArgument, TiCapabilityLevelInfo, TiImageAllocateInfo, TiImageSlice, TiMemoryAllocateInfo,
    TiMemorySlice, TiNamedArgument, TiSamplerCreateInfo,
};
use super::types::{TiArch, TiError, TiImageLayout};
use crate::error::{Result, TaichiError};

/// Declared signature of one native entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Exported symbol name.
    pub name: &'static str,
    /// Parameter types in declaration order.
    pub params: &'static [&'static str],
    /// Return type, `()` for `void`.
    pub returns: &'static str,
}

impl Signature {
    /// Whitespace-free rendering, e.g. `ti_wait(TiRuntime)->()`.
    #[must_use]
    pub fn normalized(&self) -> String {
        let strip = |s: &str| s.split_whitespace().collect::<String>();
        let params: Vec<String> = self.params.iter().map(|p| strip(p)).collect();
        format!("{}({})->{}", self.name, params.join(","), strip(self.returns))
    }
}

/// Look up one symbol and copy out the function pointer.
///
/// # Safety
///
/// `T` must be the exact function-pointer type of the export.
unsafe fn load_symbol<T: Copy>(library: &Library, name: &str) -> Result<T> {
    let symbol = library
        .get::<T>(name.as_bytes())
        .map_err(|e| TaichiError::symbol_resolution(name, e.to_string()))?;
    Ok(*symbol)
}

macro_rules! native_api {
    (@ret) => { "()" };
    (@ret $ret:ty) => { stringify!($ret) };
    (
        $(
            $(#[$meta:meta])*
            fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?;
        )+
    ) => {
        /// Resolved native entry points.
        ///
        /// Built by [`NativeApi::resolve`] from a loaded library, or directly
        /// from function pointers for statically linked or in-process
        /// implementations.
        #[derive(Debug, Clone, Copy)]
        #[allow(missing_docs)]
        pub struct NativeApi {
            $(
                $(#[$meta])*
                pub $name: unsafe extern "C" fn($($arg: $ty),*) $(-> $ret)?,
            )+
        }

        /// Declared signatures, in header order.
        pub static SIGNATURES: &[Signature] = &[
            $(
                Signature {
                    name: stringify!($name),
                    params: &[$(stringify!($ty)),*],
                    returns: native_api!(@ret $($ret)?),
                },
            )+
        ];

        impl NativeApi {
            /// Resolve every declared symbol from `library`.
            ///
            /// # Errors
            ///
            /// Returns `SymbolResolution` naming the first missing export.
            ///
            /// # Safety
            ///
            /// `library` must export the Taichi C-API with the signatures
            /// declared in this module.
            pub unsafe fn resolve(library: &Library) -> Result<Self> {
                Ok(Self {
                    $(
                        $name: load_symbol(library, stringify!($name))?,
                    )+
                })
            }
        }
    };
}

native_api! {
    fn ti_get_version() -> u32;
    fn ti_get_available_archs(arch_count: *mut u32, archs: *mut TiArch);
    fn ti_get_last_error(message_size: *mut u64, message: *mut c_char) -> TiError;
    fn ti_set_last_error(error: TiError, message: *const c_char);

    fn ti_create_runtime(arch: TiArch, device_index: u32) -> TiRuntime;
    fn ti_destroy_runtime(runtime: TiRuntime);
    fn ti_set_runtime_capabilities_ext(
        runtime: TiRuntime,
        capability_count: u32,
        capabilities: *const TiCapabilityLevelInfo,
    );
    fn ti_get_runtime_capabilities(
        runtime: TiRuntime,
        capability_count: *mut u32,
        capabilities: *mut TiCapabilityLevelInfo,
    );

    fn ti_allocate_memory(runtime: TiRuntime, allocate_info: *const TiMemoryAllocateInfo) -> TiMemory;
    fn ti_free_memory(runtime: TiRuntime, memory: TiMemory);
    fn ti_map_memory(runtime: TiRuntime, memory: TiMemory) -> *mut c_void;
    fn ti_unmap_memory(runtime: TiRuntime, memory: TiMemory);

    fn ti_allocate_image(runtime: TiRuntime, allocate_info: *const TiImageAllocateInfo) -> TiImage;
    fn ti_free_image(runtime: TiRuntime, image: TiImage);

    fn ti_create_sampler(runtime: TiRuntime, create_info: *const TiSamplerCreateInfo) -> TiSampler;
    fn ti_destroy_sampler(runtime: TiRuntime, sampler: TiSampler);

    /// Destination first, as in the C header.
    fn ti_copy_memory_device_to_device(
        runtime: TiRuntime,
        dst_memory: *const TiMemorySlice,
        src_memory: *const TiMemorySlice,
    );
    /// Destination first, as in the C header.
    fn ti_copy_image_device_to_device(
        runtime: TiRuntime,
        dst_image: *const TiImageSlice,
        src_image: *const TiImageSlice,
    );
    fn ti_track_image_ext(runtime: TiRuntime, image: TiImage, layout: TiImageLayout);
    fn ti_transition_image(runtime: TiRuntime, image: TiImage, layout: TiImageLayout);

    fn ti_launch_kernel(
        runtime: TiRuntime,
        kernel: TiKernel,
        arg_count: u32,
        args: *const TiArgument,
    );
    fn ti_launch_compute_graph(
        runtime: TiRuntime,
        compute_graph: TiComputeGraph,
        arg_count: u32,
        args: *const TiNamedArgument,
    );
    fn ti_flush(runtime: TiRuntime);
    fn ti_wait(runtime: TiRuntime);

    fn ti_load_aot_module(runtime: TiRuntime, module_path: *const c_char) -> TiAotModule;
    fn ti_create_aot_module(runtime: TiRuntime, tcm: *const c_void, size: u64) -> TiAotModule;
    fn ti_destroy_aot_module(aot_module: TiAotModule);
    fn ti_get_aot_module_kernel(aot_module: TiAotModule, name: *const c_char) -> TiKernel;
    fn ti_get_aot_module_compute_graph(
        aot_module: TiAotModule,
        name: *const c_char,
    ) -> TiComputeGraph;
}

/// Look up the declared signature of `name`.
#[must_use]
pub fn signature(name: &str) -> Option<&'static Signature> {
    SIGNATURES.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const GOLDEN: &[(&str, &str)] = &[
        ("ti_get_version", "()->u32"),
        ("ti_get_available_archs", "(*mutu32,*mutTiArch)->()"),
        ("ti_get_last_error", "(*mutu64,*mutc_char)->TiError"),
        ("ti_set_last_error", "(TiError,*constc_char)->()"),
        ("ti_create_runtime", "(TiArch,u32)->TiRuntime"),
        ("ti_destroy_runtime", "(TiRuntime)->()"),
        (
            "ti_set_runtime_capabilities_ext",
            "(TiRuntime,u32,*constTiCapabilityLevelInfo)->()",
        ),
        (
            "ti_get_runtime_capabilities",
            "(TiRuntime,*mutu32,*mutTiCapabilityLevelInfo)->()",
        ),
        (
            "ti_allocate_memory",
            "(TiRuntime,*constTiMemoryAllocateInfo)->TiMemory",
        ),
        ("ti_free_memory", "(TiRuntime,TiMemory)->()"),
        ("ti_map_memory", "(TiRuntime,TiMemory)->*mutc_void"),
        ("ti_unmap_memory", "(TiRuntime,TiMemory)->()"),
        (
            "ti_allocate_image",
            "(TiRuntime,*constTiImageAllocateInfo)->TiImage",
        ),
        ("ti_free_image", "(TiRuntime,TiImage)->()"),
        (
            "ti_create_sampler",
            "(TiRuntime,*constTiSamplerCreateInfo)->TiSampler",
        ),
        ("ti_destroy_sampler", "(TiRuntime,TiSampler)->()"),
        (
            "ti_copy_memory_device_to_device",
            "(TiRuntime,*constTiMemorySlice,*constTiMemorySlice)->()",
        ),
        (
            "ti_copy_image_device_to_device",
            "(TiRuntime,*constTiImageSlice,*constTiImageSlice)->()",
        ),
        ("ti_track_image_ext", "(TiRuntime,TiImage,TiImageLayout)->()"),
        ("ti_transition_image", "(TiRuntime,TiImage,TiImageLayout)->()"),
        (
            "ti_launch_kernel",
            "(TiRuntime,TiKernel,u32,*constTiArgument)->()",
        ),
        (
            "ti_launch_compute_graph",
            "(TiRuntime,TiComputeGraph,u32,*constTiNamedArgument)->()",
        ),
        ("ti_flush", "(TiRuntime)->()"),
        ("ti_wait", "(TiRuntime)->()"),
        ("ti_load_aot_module", "(TiRuntime,*constc_char)->TiAotModule"),
        (
            "ti_create_aot_module",
            "(TiRuntime,*constc_void,u64)->TiAotModule",
        ),
        ("ti_destroy_aot_module", "(TiAotModule)->()"),
        (
            "ti_get_aot_module_kernel",
            "(TiAotModule,*constc_char)->TiKernel",
        ),
        (
            "ti_get_aot_module_compute_graph",
            "(TiAotModule,*constc_char)->TiComputeGraph",
        ),
    ];

    #[test]
    fn test_signatures_match_golden_list() {
        let declared: BTreeMap<&str, String> = SIGNATURES
            .iter()
            .map(|s| {
                let rendered = s.normalized();
                let body = rendered[s.name.len()..].to_string();
                (s.name, body)
            })
            .collect();
        let golden: BTreeMap<&str, String> = GOLDEN
            .iter()
            .map(|(name, body)| (*name, (*body).to_string()))
            .collect();

        let missing: Vec<_> = golden.keys().filter(|k| !declared.contains_key(*k)).collect();
        let extra: Vec<_> = declared.keys().filter(|k| !golden.contains_key(*k)).collect();
        let changed: Vec<_> = golden
            .iter()
            .filter(|(k, v)| declared.get(*k).is_some_and(|d| d != *v))
            .collect();

        assert!(missing.is_empty(), "missing declarations: {missing:?}");
        assert!(extra.is_empty(), "undeclared in golden list: {extra:?}");
        assert!(changed.is_empty(), "signature drift: {changed:?}");
    }

    #[test]
    fn test_signature_names_are_unique() {
        let mut names: Vec<_> = SIGNATURES.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SIGNATURES.len());
    }

    #[test]
    fn test_signature_lookup() {
        let sig = signature("ti_wait").unwrap();
        assert_eq!(sig.normalized(), "ti_wait(TiRuntime)->()");
        assert!(signature("ti_does_not_exist").is_none());
    }
}
