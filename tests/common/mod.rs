// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! In-process implementation of the Taichi C-API for integration tests.
//!
//! State is thread-local, so every test thread sees its own device. Like the
//! real library, every entry point except `ti_get_last_error` and
//! `ti_set_last_error` resets the error channel on entry.
//!
//! Contents:
//!
//! - archs `vulkan` and `x64` (`cuda` reports `NOT_SUPPORTED`)
//! - module `copy_module` (by path suffix, or the bytes `b"copy_module"`)
//! - kernel `copy(src, dst)`, kernel `fill(dst, value)`
//! - compute graph `copy_graph(src=, dst=)`

#![allow(dead_code)]
#![allow(clippy::missing_safety_doc)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ffi::{c_char, c_void, CStr};
use std::sync::Arc;

use taichi_aot::sys::*;
use taichi_aot::TaichiLibrary;

/// `1.7.0` in the packed `major * 1_000_000 + minor * 1000 + patch` form.
pub const MOCK_VERSION: u32 = 1_007_000;

/// Allocations above this size fail with a null handle and no error report.
pub const MOCK_MEMORY_LIMIT: u64 = 1 << 30;

const MOCK_ARCHS: [TiArch; 3] = [TI_ARCH_VULKAN, TI_ARCH_X64, TI_ARCH_CUDA];

#[derive(Default)]
struct MockState {
    error: (TiError, String),
    next_id: usize,
    runtimes: HashMap<usize, Vec<TiCapabilityLevelInfo>>,
    memories: HashMap<usize, Vec<u8>>,
    mapped: HashSet<usize>,
    images: HashMap<usize, TiImageLayout>,
    samplers: HashSet<usize>,
    modules: HashSet<usize>,
    kernels: HashMap<usize, &'static str>,
    graphs: HashMap<usize, &'static str>,
    launches: usize,
    waits: usize,
}

impl MockState {
    fn fresh(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    fn fail(&mut self, code: TiError, message: impl Into<String>) {
        self.error = (code, message.into());
    }
}

thread_local! {
    static STATE: RefCell<MockState> = RefCell::new(MockState::default());
}

fn with_state<R>(f: impl FnOnce(&mut MockState) -> R) -> R {
    STATE.with(|s| f(&mut s.borrow_mut()))
}

/// Entry point prologue: reset the error channel, then run `f`.
fn entry<R>(f: impl FnOnce(&mut MockState) -> R) -> R {
    with_state(|s| {
        s.error = (TI_ERROR_SUCCESS, String::new());
        f(s)
    })
}

fn id_of(raw: *mut c_void) -> usize {
    raw as usize
}

fn ptr_of(id: usize) -> *mut c_void {
    id as *mut c_void
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

unsafe extern "C" fn get_version() -> u32 {
    entry(|_| MOCK_VERSION)
}

unsafe extern "C" fn get_available_archs(arch_count: *mut u32, archs: *mut TiArch) {
    entry(|_| {
        if archs.is_null() {
            *arch_count = MOCK_ARCHS.len() as u32;
            return;
        }
        let n = (*arch_count as usize).min(MOCK_ARCHS.len());
        std::ptr::copy_nonoverlapping(MOCK_ARCHS.as_ptr(), archs, n);
        *arch_count = n as u32;
    });
}

unsafe extern "C" fn get_last_error(message_size: *mut u64, message: *mut c_char) -> TiError {
    with_state(|s| {
        let (code, text) = &s.error;
        if !message_size.is_null() {
            let capacity = *message_size as usize;
            if !message.is_null() && capacity > 0 {
                let n = text.len().min(capacity - 1);
                std::ptr::copy_nonoverlapping(text.as_ptr().cast::<c_char>(), message, n);
                *message.add(n) = 0;
            }
            *message_size = text.len() as u64 + 1;
        }
        *code
    })
}

unsafe extern "C" fn set_last_error(error: TiError, message: *const c_char) {
    let text = if message.is_null() {
        String::new()
    } else {
        CStr::from_ptr(message).to_string_lossy().into_owned()
    };
    with_state(|s| s.error = (error, text));
}

unsafe extern "C" fn create_runtime(arch: TiArch, device_index: u32) -> TiRuntime {
    entry(|s| match arch {
        TI_ARCH_VULKAN | TI_ARCH_X64 if device_index == 0 => {
            let id = s.fresh();
            let caps = if arch == TI_ARCH_VULKAN {
                vec![
                    TiCapabilityLevelInfo {
                        capability: TI_CAPABILITY_SPIRV_VERSION,
                        level: 0x10300,
                    },
                    TiCapabilityLevelInfo {
                        capability: TI_CAPABILITY_SPIRV_HAS_INT64,
                        level: 1,
                    },
                    // Unknown to the binding; must be skipped.
                    TiCapabilityLevelInfo {
                        capability: 4096,
                        level: 1,
                    },
                ]
            } else {
                Vec::new()
            };
            s.runtimes.insert(id, caps);
            TiRuntime::from_raw(ptr_of(id))
        }
        TI_ARCH_CUDA => {
            s.fail(TI_ERROR_NOT_SUPPORTED, "cuda is not available on this machine");
            TiRuntime::null()
        }
        // Silent failure: the binding has to synthesize the error.
        _ => TiRuntime::null(),
    })
}

unsafe extern "C" fn destroy_runtime(runtime: TiRuntime) {
    entry(|s| {
        if s.runtimes.remove(&id_of(runtime.as_raw())).is_none() {
            s.fail(TI_ERROR_ARGUMENT_NULL, "unknown runtime");
        }
    });
}

unsafe extern "C" fn set_runtime_capabilities_ext(
    runtime: TiRuntime,
    capability_count: u32,
    capabilities: *const TiCapabilityLevelInfo,
) {
    entry(|s| {
        let caps = if capability_count == 0 {
            Vec::new()
        } else {
            std::slice::from_raw_parts(capabilities, capability_count as usize).to_vec()
        };
        match s.runtimes.get_mut(&id_of(runtime.as_raw())) {
            Some(slot) => *slot = caps,
            None => s.fail(TI_ERROR_ARGUMENT_NULL, "unknown runtime"),
        }
    });
}

unsafe extern "C" fn get_runtime_capabilities(
    runtime: TiRuntime,
    capability_count: *mut u32,
    capabilities: *mut TiCapabilityLevelInfo,
) {
    entry(|s| {
        let Some(caps) = s.runtimes.get(&id_of(runtime.as_raw())).cloned() else {
            s.fail(TI_ERROR_ARGUMENT_NULL, "unknown runtime");
            return;
        };
        if capabilities.is_null() {
            *capability_count = caps.len() as u32;
            return;
        }
        let n = (*capability_count as usize).min(caps.len());
        std::ptr::copy_nonoverlapping(caps.as_ptr(), capabilities, n);
        *capability_count = n as u32;
    });
}

unsafe extern "C" fn allocate_memory(
    _runtime: TiRuntime,
    allocate_info: *const TiMemoryAllocateInfo,
) -> TiMemory {
    entry(|s| {
        if allocate_info.is_null() {
            s.fail(TI_ERROR_ARGUMENT_NULL, "allocate_info");
            return TiMemory::null();
        }
        let size = (*allocate_info).size;
        if size > MOCK_MEMORY_LIMIT {
            return TiMemory::null();
        }
        let id = s.fresh();
        s.memories.insert(id, vec![0u8; size as usize]);
        TiMemory::from_raw(ptr_of(id))
    })
}

unsafe extern "C" fn free_memory(_runtime: TiRuntime, memory: TiMemory) {
    entry(|s| {
        if s.memories.remove(&id_of(memory.as_raw())).is_none() {
            s.fail(TI_ERROR_ARGUMENT_NULL, "unknown memory");
        }
    });
}

unsafe extern "C" fn map_memory(_runtime: TiRuntime, memory: TiMemory) -> *mut c_void {
    let id = id_of(memory.as_raw());
    entry(|s| match s.memories.get_mut(&id) {
        Some(bytes) => {
            let ptr = bytes.as_mut_ptr().cast();
            s.mapped.insert(id);
            ptr
        }
        None => {
            s.fail(TI_ERROR_ARGUMENT_NULL, "unknown memory");
            std::ptr::null_mut()
        }
    })
}

unsafe extern "C" fn unmap_memory(_runtime: TiRuntime, memory: TiMemory) {
    let id = id_of(memory.as_raw());
    entry(|s| {
        if !s.memories.contains_key(&id) {
            s.fail(TI_ERROR_ARGUMENT_NULL, "unknown memory");
        }
        s.mapped.remove(&id);
    });
}

unsafe extern "C" fn allocate_image(
    _runtime: TiRuntime,
    _allocate_info: *const TiImageAllocateInfo,
) -> TiImage {
    entry(|s| {
        let id = s.fresh();
        s.images.insert(id, TI_IMAGE_LAYOUT_UNDEFINED);
        TiImage::from_raw(ptr_of(id))
    })
}

unsafe extern "C" fn free_image(_runtime: TiRuntime, image: TiImage) {
    entry(|s| {
        if s.images.remove(&id_of(image.as_raw())).is_none() {
            s.fail(TI_ERROR_ARGUMENT_NULL, "unknown image");
        }
    });
}

unsafe extern "C" fn create_sampler(
    _runtime: TiRuntime,
    _create_info: *const TiSamplerCreateInfo,
) -> TiSampler {
    entry(|s| {
        let id = s.fresh();
        s.samplers.insert(id);
        TiSampler::from_raw(ptr_of(id))
    })
}

unsafe extern "C" fn destroy_sampler(_runtime: TiRuntime, sampler: TiSampler) {
    entry(|s| {
        if !s.samplers.remove(&id_of(sampler.as_raw())) {
            s.fail(TI_ERROR_ARGUMENT_NULL, "unknown sampler");
        }
    });
}

unsafe extern "C" fn copy_memory_device_to_device(
    _runtime: TiRuntime,
    dst_memory: *const TiMemorySlice,
    src_memory: *const TiMemorySlice,
) {
    entry(|s| {
        let (dst, src) = (*dst_memory, *src_memory);
        let source = s
            .memories
            .get(&id_of(src.memory.as_raw()))
            .and_then(|m| m.get(src.offset as usize..(src.offset + src.size) as usize))
            .map(<[u8]>::to_vec);
        let Some(source) = source else {
            s.fail(TI_ERROR_ARGUMENT_OUT_OF_RANGE, "source slice");
            return;
        };
        let target = s
            .memories
            .get_mut(&id_of(dst.memory.as_raw()))
            .and_then(|m| m.get_mut(dst.offset as usize..(dst.offset + dst.size) as usize));
        match target {
            Some(target) if target.len() == source.len() => target.copy_from_slice(&source),
            _ => s.fail(TI_ERROR_ARGUMENT_OUT_OF_RANGE, "destination slice"),
        }
    });
}

unsafe extern "C" fn copy_image_device_to_device(
    _runtime: TiRuntime,
    dst_image: *const TiImageSlice,
    src_image: *const TiImageSlice,
) {
    entry(|s| {
        let known = |slice: &TiImageSlice| s.images.contains_key(&id_of(slice.image.as_raw()));
        if !known(&*dst_image) || !known(&*src_image) {
            s.fail(TI_ERROR_ARGUMENT_NULL, "unknown image");
        }
    });
}

unsafe extern "C" fn track_image_ext(_runtime: TiRuntime, image: TiImage, layout: TiImageLayout) {
    set_layout(image, layout);
}

unsafe extern "C" fn transition_image(_runtime: TiRuntime, image: TiImage, layout: TiImageLayout) {
    set_layout(image, layout);
}

fn set_layout(image: TiImage, layout: TiImageLayout) {
    entry(|s| match s.images.get_mut(&id_of(image.as_raw())) {
        Some(slot) => *slot = layout,
        None => s.fail(TI_ERROR_ARGUMENT_NULL, "unknown image"),
    });
}

unsafe extern "C" fn launch_kernel(
    _runtime: TiRuntime,
    kernel: TiKernel,
    arg_count: u32,
    args: *const TiArgument,
) {
    let args = if arg_count == 0 {
        &[][..]
    } else {
        std::slice::from_raw_parts(args, arg_count as usize)
    };
    entry(|s| {
        s.launches += 1;
        match s.kernels.get(&id_of(kernel.as_raw())).copied() {
            Some("copy") => copy_kernel(
                s,
                args.first().and_then(TiArgument::value_ndarray),
                args.get(1).and_then(TiArgument::value_ndarray),
            ),
            Some("fill") => fill_kernel(
                s,
                args.first().and_then(TiArgument::value_ndarray),
                args.get(1).and_then(TiArgument::value_i32),
            ),
            _ => s.fail(TI_ERROR_ARGUMENT_NULL, "unknown kernel"),
        }
    });
}

unsafe extern "C" fn launch_compute_graph(
    _runtime: TiRuntime,
    compute_graph: TiComputeGraph,
    arg_count: u32,
    args: *const TiNamedArgument,
) {
    let args = if arg_count == 0 {
        &[][..]
    } else {
        std::slice::from_raw_parts(args, arg_count as usize)
    };
    let find = |name: &str| {
        args.iter()
            .find(|a| CStr::from_ptr(a.name).to_str() == Ok(name))
            .and_then(|a| a.argument.value_ndarray())
    };
    let (src, dst) = (find("src"), find("dst"));
    entry(|s| {
        s.launches += 1;
        if s.graphs.contains_key(&id_of(compute_graph.as_raw())) {
            copy_kernel(s, src, dst);
        } else {
            s.fail(TI_ERROR_ARGUMENT_NULL, "unknown compute graph");
        }
    });
}

fn copy_kernel(s: &mut MockState, src: Option<TiNdArray>, dst: Option<TiNdArray>) {
    let (Some(src), Some(dst)) = (src, dst) else {
        s.fail(TI_ERROR_ARGUMENT_NOT_FOUND, "copy expects (src, dst) ND-arrays");
        return;
    };
    if src.elem_type != dst.elem_type || src.shape != dst.shape {
        s.fail(TI_ERROR_INVALID_ARGUMENT, "copy operands differ in shape or type");
        return;
    }
    let Some(source) = s.memories.get(&id_of(src.memory.as_raw())).cloned() else {
        s.fail(TI_ERROR_ARGUMENT_NULL, "unknown source memory");
        return;
    };
    match s.memories.get_mut(&id_of(dst.memory.as_raw())) {
        Some(target) if target.len() == source.len() => target.copy_from_slice(&source),
        _ => s.fail(TI_ERROR_ARGUMENT_OUT_OF_RANGE, "destination memory"),
    }
}

fn fill_kernel(s: &mut MockState, dst: Option<TiNdArray>, value: Option<i32>) {
    let (Some(dst), Some(value)) = (dst, value) else {
        s.fail(TI_ERROR_ARGUMENT_NOT_FOUND, "fill expects (dst, i32)");
        return;
    };
    if dst.elem_type != TI_DATA_TYPE_I32 {
        s.fail(TI_ERROR_INVALID_ARGUMENT, "fill expects an i32 ND-array");
        return;
    }
    match s.memories.get_mut(&id_of(dst.memory.as_raw())) {
        Some(target) => {
            for chunk in target.chunks_exact_mut(4) {
                chunk.copy_from_slice(&value.to_le_bytes());
            }
        }
        None => s.fail(TI_ERROR_ARGUMENT_NULL, "unknown memory"),
    }
}

unsafe extern "C" fn flush(_runtime: TiRuntime) {
    entry(|_| ());
}

unsafe extern "C" fn wait(_runtime: TiRuntime) {
    entry(|s| s.waits += 1);
}

unsafe extern "C" fn load_aot_module(_runtime: TiRuntime, module_path: *const c_char) -> TiAotModule {
    let path = CStr::from_ptr(module_path).to_string_lossy().into_owned();
    entry(|s| {
        if path.ends_with("copy_module") {
            let id = s.fresh();
            s.modules.insert(id);
            TiAotModule::from_raw(ptr_of(id))
        } else {
            s.fail(TI_ERROR_CORRUPTED_DATA, format!("no AOT module at {path}"));
            TiAotModule::null()
        }
    })
}

unsafe extern "C" fn create_aot_module(_runtime: TiRuntime, tcm: *const c_void, size: u64) -> TiAotModule {
    let bytes = std::slice::from_raw_parts(tcm.cast::<u8>(), size as usize);
    entry(|s| {
        if bytes == b"copy_module" {
            let id = s.fresh();
            s.modules.insert(id);
            TiAotModule::from_raw(ptr_of(id))
        } else {
            TiAotModule::null()
        }
    })
}

unsafe extern "C" fn destroy_aot_module(aot_module: TiAotModule) {
    entry(|s| {
        if !s.modules.remove(&id_of(aot_module.as_raw())) {
            s.fail(TI_ERROR_ARGUMENT_NULL, "unknown module");
        }
    });
}

unsafe extern "C" fn get_aot_module_kernel(aot_module: TiAotModule, name: *const c_char) -> TiKernel {
    let name = CStr::from_ptr(name).to_str().ok();
    entry(|s| {
        if !s.modules.contains(&id_of(aot_module.as_raw())) {
            s.fail(TI_ERROR_ARGUMENT_NULL, "unknown module");
            return TiKernel::null();
        }
        let name = match name {
            Some("copy") => "copy",
            Some("fill") => "fill",
            // Silent miss: the binding has to synthesize NAME_NOT_FOUND.
            _ => return TiKernel::null(),
        };
        let id = s.fresh();
        s.kernels.insert(id, name);
        TiKernel::from_raw(ptr_of(id))
    })
}

unsafe extern "C" fn get_aot_module_compute_graph(
    aot_module: TiAotModule,
    name: *const c_char,
) -> TiComputeGraph {
    let name = CStr::from_ptr(name).to_string_lossy().into_owned();
    entry(|s| {
        if !s.modules.contains(&id_of(aot_module.as_raw())) {
            s.fail(TI_ERROR_ARGUMENT_NULL, "unknown module");
            return TiComputeGraph::null();
        }
        if name != "copy_graph" {
            s.fail(TI_ERROR_NAME_NOT_FOUND, format!("no compute graph named {name}"));
            return TiComputeGraph::null();
        }
        let id = s.fresh();
        s.graphs.insert(id, "copy_graph");
        TiComputeGraph::from_raw(ptr_of(id))
    })
}

// =============================================================================
// TEST HELPERS
// =============================================================================

/// Entry-point table backed by this module.
pub fn mock_api() -> NativeApi {
    NativeApi {
        ti_get_version: get_version,
        ti_get_available_archs: get_available_archs,
        ti_get_last_error: get_last_error,
        ti_set_last_error: set_last_error,
        ti_create_runtime: create_runtime,
        ti_destroy_runtime: destroy_runtime,
        ti_set_runtime_capabilities_ext: set_runtime_capabilities_ext,
        ti_get_runtime_capabilities: get_runtime_capabilities,
        ti_allocate_memory: allocate_memory,
        ti_free_memory: free_memory,
        ti_map_memory: map_memory,
        ti_unmap_memory: unmap_memory,
        ti_allocate_image: allocate_image,
        ti_free_image: free_image,
        ti_create_sampler: create_sampler,
        ti_destroy_sampler: destroy_sampler,
        ti_copy_memory_device_to_device: copy_memory_device_to_device,
        ti_copy_image_device_to_device: copy_image_device_to_device,
        ti_track_image_ext: track_image_ext,
        ti_transition_image: transition_image,
        ti_launch_kernel: launch_kernel,
        ti_launch_compute_graph: launch_compute_graph,
        ti_flush: flush,
        ti_wait: wait,
        ti_load_aot_module: load_aot_module,
        ti_create_aot_module: create_aot_module,
        ti_destroy_aot_module: destroy_aot_module,
        ti_get_aot_module_kernel: get_aot_module_kernel,
        ti_get_aot_module_compute_graph: get_aot_module_compute_graph,
    }
}

/// A library handle whose entry points run in-process.
pub fn mock_library() -> Arc<TaichiLibrary> {
    // SAFETY: every pointer in `mock_api` implements its C-API counterpart.
    Arc::new(unsafe { TaichiLibrary::from_api(mock_api()) })
}

/// Live device allocations on this thread.
pub fn live_memory_count() -> usize {
    with_state(|s| s.memories.len())
}

/// Allocations currently mapped into host memory on this thread.
pub fn mapped_memory_count() -> usize {
    with_state(|s| s.mapped.len())
}

/// Live runtimes on this thread.
pub fn live_runtime_count() -> usize {
    with_state(|s| s.runtimes.len())
}

/// Live images and samplers on this thread.
pub fn live_texture_objects() -> (usize, usize) {
    with_state(|s| (s.images.len(), s.samplers.len()))
}

/// Current layout of `image`.
pub fn image_layout(image: TiImage) -> Option<TiImageLayout> {
    with_state(|s| s.images.get(&id_of(image.as_raw())).copied())
}

/// Kernel and graph launches on this thread.
pub fn launch_count() -> usize {
    with_state(|s| s.launches)
}
