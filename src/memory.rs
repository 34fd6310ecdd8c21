// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Device memory allocations.
//!
//! ## Lifecycle
//!
//! A [`Memory`] is allocated from a [`Runtime`] and released with
//! [`Memory::free`]. It borrows the runtime, so it cannot outlive it, but it is
//! never freed implicitly: dropping a `Memory` leaks the native allocation.
//!
//! ## Host Access
//!
//! [`Memory::map`] hands out the raw host pointer. The scoped helpers
//! [`Memory::with_mapped`], [`Memory::write_bytes`] and [`Memory::read_bytes`]
//! always pair the map with an unmap and are what the staging path uses.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use taichi_aot::{Arch, Loader, LoaderConfig, Runtime};
//! use taichi_aot::{Memory, MemoryAllocateInfo};
//!
//! # let library = Loader::new(LoaderConfig::default()).load()?;
//! # let runtime = Runtime::create(library, Arch::Vulkan, 0)?;
//! let src = Memory::allocate(&runtime, &MemoryAllocateInfo::staging(1024))?;
//! let dst = Memory::allocate(&runtime, &MemoryAllocateInfo::staging(1024))?;
//! src.write_bytes(&[7u8; 1024])?;
//!
//! Memory::copy_device_to_device(&runtime, &dst.slice(0, 1024)?, &src.slice(0, 1024)?)?;
//! runtime.wait()?;
//! assert_eq!(dst.read_bytes()?, vec![7u8; 1024]);
//!
//! src.free()?;
//! dst.free()?;
//! # Ok::<(), taichi_aot::TaichiError>(())
//! ```

use crate::enums::MemoryUsage;
use crate::error::{ApiError, ErrorCode, Result, TaichiError};
use crate::runtime::Runtime;
use crate::sys::handles::{TiMemory, TiRuntime};
use crate::sys::structs::{TiMemoryAllocateInfo, TiMemorySlice};
use crate::sys::types::{TI_FALSE, TI_TRUE};
use crate::traits::{RuntimeBound, ValidatableConfig};

/// Descriptor for [`Memory::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAllocateInfo {
    /// Size in bytes.
    pub size: u64,
    /// Host may write through a mapping.
    pub host_write: bool,
    /// Host may read through a mapping.
    pub host_read: bool,
    /// Export for interop with other APIs.
    pub export_sharing: bool,
    /// Binding usage.
    pub usage: MemoryUsage,
}

impl MemoryAllocateInfo {
    /// Device-only storage memory of `size` bytes.
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            size,
            host_write: false,
            host_read: false,
            export_sharing: false,
            usage: MemoryUsage::STORAGE,
        }
    }

    /// Host-readable, host-writable storage memory, as used for ND-array
    /// staging.
    #[must_use]
    pub fn staging(size: u64) -> Self {
        Self::new(size).with_host_read(true).with_host_write(true)
    }

    /// Allow host writes.
    #[must_use]
    pub fn with_host_write(mut self, enable: bool) -> Self {
        self.host_write = enable;
        self
    }

    /// Allow host reads.
    #[must_use]
    pub fn with_host_read(mut self, enable: bool) -> Self {
        self.host_read = enable;
        self
    }

    /// Request export sharing.
    #[must_use]
    pub fn with_export_sharing(mut self, enable: bool) -> Self {
        self.export_sharing = enable;
        self
    }

    /// Set usage flags.
    #[must_use]
    pub fn with_usage(mut self, usage: MemoryUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Whether the host can map this memory.
    #[must_use]
    pub fn host_accessible(&self) -> bool {
        self.host_read || self.host_write
    }

    /// The ABI descriptor.
    #[must_use]
    pub fn to_raw(&self) -> TiMemoryAllocateInfo {
        let flag = |b: bool| if b { TI_TRUE } else { TI_FALSE };
        TiMemoryAllocateInfo {
            size: self.size,
            host_write: flag(self.host_write),
            host_read: flag(self.host_read),
            export_sharing: flag(self.export_sharing),
            usage: self.usage.bits(),
        }
    }
}

impl ValidatableConfig for MemoryAllocateInfo {
    fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(TaichiError::invalid_argument("memory size must be > 0"));
        }
        if self.usage.is_empty() {
            return Err(TaichiError::invalid_argument("memory usage must not be empty"));
        }
        Ok(())
    }
}

/// A device memory allocation owned by one runtime.
#[derive(Debug)]
pub struct Memory<'rt> {
    runtime: &'rt Runtime,
    handle: TiMemory,
    info: MemoryAllocateInfo,
}

impl<'rt> Memory<'rt> {
    /// Allocate device memory.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a zero size or empty usage
    /// - `Api` if the native allocation fails (`OUT_OF_MEMORY` when it returns
    ///   a null handle without reporting an error)
    pub fn allocate(runtime: &'rt Runtime, info: &MemoryAllocateInfo) -> Result<Self> {
        info.validate()?;
        let raw = info.to_raw();
        let handle = runtime.library().checked("ti_allocate_memory", |api| {
            // SAFETY: `raw` is a valid descriptor for the duration of the call.
            unsafe { (api.ti_allocate_memory)(runtime.handle(), &raw) }
        })?;
        if handle.is_null() {
            return Err(TaichiError::Api(ApiError::synthesized(
                ErrorCode::OutOfMemory,
                format!("ti_allocate_memory returned a null handle for {} bytes", info.size),
            )));
        }
        Ok(Self {
            runtime,
            handle,
            info: *info,
        })
    }

    /// Rebuild a memory view from a handle obtained earlier.
    ///
    /// `handle` must be a live allocation made on `runtime` with `info`.
    #[cfg(feature = "python")]
    pub(crate) fn from_raw_parts(runtime: &'rt Runtime, handle: TiMemory, info: MemoryAllocateInfo) -> Self {
        Self {
            runtime,
            handle,
            info,
        }
    }

    /// Release the allocation.
    ///
    /// # Preconditions
    ///
    /// The memory must not be mapped, and no in-flight launch may use it.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn free(self) -> Result<()> {
        self.runtime.library().checked("ti_free_memory", |api| {
            // SAFETY: `self.handle` is live and consumed here.
            unsafe { (api.ti_free_memory)(self.runtime.handle(), self.handle) }
        })
    }

    /// Map the allocation into host address space.
    ///
    /// The pointer is valid for `size()` bytes until [`Self::unmap`].
    ///
    /// # Preconditions
    ///
    /// The memory must be host accessible and not already mapped. Double
    /// mapping is not detected.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure or the native
    /// library returns a null pointer.
    pub fn map(&self) -> Result<*mut u8> {
        let ptr = self.runtime.library().checked("ti_map_memory", |api| {
            // SAFETY: `self.handle` is live.
            unsafe { (api.ti_map_memory)(self.runtime.handle(), self.handle) }
        })?;
        if ptr.is_null() {
            return Err(TaichiError::Api(ApiError::synthesized(
                ErrorCode::InvalidState,
                "ti_map_memory returned a null pointer",
            )));
        }
        Ok(ptr.cast::<u8>())
    }

    /// Unmap a previous [`Self::map`].
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn unmap(&self) -> Result<()> {
        self.runtime.library().checked("ti_unmap_memory", |api| {
            // SAFETY: `self.handle` is live.
            unsafe { (api.ti_unmap_memory)(self.runtime.handle(), self.handle) }
        })
    }

    /// Map, run `f` on the whole allocation, then unmap.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the memory is not host accessible or too
    /// large for the host address space, and `Api` on native failures.
    pub fn with_mapped<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        if !self.info.host_accessible() {
            return Err(TaichiError::invalid_argument(
                "memory was not allocated with host read or write access",
            ));
        }
        let len = usize::try_from(self.info.size)
            .map_err(|_| TaichiError::invalid_argument("allocation exceeds host address space"))?;

        let ptr = self.map()?;
        let guard = MappedGuard {
            memory: self,
            armed: true,
        };
        // SAFETY: `map` returned a non-null pointer to `len` bytes that stays
        // valid and exclusively ours until the guard unmaps it.
        let out = f(unsafe { std::slice::from_raw_parts_mut(ptr, len) });
        guard.finish()?;
        Ok(out)
    }

    /// Copy `bytes` into the start of the allocation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `bytes` is longer than the allocation.
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if bytes.len() as u64 > self.info.size {
            return Err(TaichiError::invalid_argument(format!(
                "{} bytes do not fit in a {}-byte allocation",
                bytes.len(),
                self.info.size
            )));
        }
        self.with_mapped(|mapped| mapped[..bytes.len()].copy_from_slice(bytes))
    }

    /// Copy the whole allocation out.
    ///
    /// # Errors
    ///
    /// See [`Self::with_mapped`].
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        self.with_mapped(|mapped| mapped.to_vec())
    }

    /// A bounds-checked byte range of this allocation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `offset + size` exceeds the allocation.
    pub fn slice(&self, offset: u64, size: u64) -> Result<MemorySlice<'_>> {
        if offset.checked_add(size).map_or(true, |end| end > self.info.size) {
            return Err(TaichiError::invalid_argument(format!(
                "slice {offset}+{size} exceeds {}-byte allocation",
                self.info.size
            )));
        }
        Ok(MemorySlice {
            memory: self,
            offset,
            size,
        })
    }

    /// Copy `src` into `dst` on the device.
    ///
    /// The copy is queued; call [`Runtime::wait`] before reading `dst`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the slices belong to another runtime,
    /// differ in size, are empty, or overlap within one allocation. Returns
    /// `Api` if the error channel reports a failure.
    pub fn copy_device_to_device(
        runtime: &Runtime,
        dst: &MemorySlice<'_>,
        src: &MemorySlice<'_>,
    ) -> Result<()> {
        runtime.ensure_same_runtime(dst)?;
        runtime.ensure_same_runtime(src)?;
        if dst.size != src.size {
            return Err(TaichiError::invalid_argument(format!(
                "copy size mismatch: dst {} bytes, src {} bytes",
                dst.size, src.size
            )));
        }
        if dst.size == 0 {
            return Err(TaichiError::invalid_argument("copy of zero bytes"));
        }
        if dst.overlaps(src) {
            return Err(TaichiError::invalid_argument(
                "source and destination ranges overlap",
            ));
        }

        let (dst_raw, src_raw) = (dst.to_raw(), src.to_raw());
        runtime.library().checked("ti_copy_memory_device_to_device", |api| {
            // SAFETY: both descriptors are valid for the call; argument order
            // is destination first, per the C header.
            unsafe { (api.ti_copy_memory_device_to_device)(runtime.handle(), &dst_raw, &src_raw) }
        })
    }

    /// Raw memory handle.
    #[must_use]
    pub fn handle(&self) -> TiMemory {
        self.handle
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.info.size
    }

    /// Descriptor the memory was allocated with.
    #[must_use]
    pub fn info(&self) -> &MemoryAllocateInfo {
        &self.info
    }

    /// The owning runtime.
    #[must_use]
    pub fn runtime(&self) -> &'rt Runtime {
        self.runtime
    }
}

impl RuntimeBound for Memory<'_> {
    fn runtime_handle(&self) -> TiRuntime {
        self.runtime.handle()
    }
}

/// A byte range of one [`Memory`].
#[derive(Debug, Clone, Copy)]
pub struct MemorySlice<'a> {
    memory: &'a Memory<'a>,
    offset: u64,
    size: u64,
}

impl MemorySlice<'_> {
    /// Byte offset into the allocation.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Length in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The ABI descriptor.
    #[must_use]
    pub fn to_raw(&self) -> TiMemorySlice {
        TiMemorySlice {
            memory: self.memory.handle,
            offset: self.offset,
            size: self.size,
        }
    }

    fn overlaps(&self, other: &Self) -> bool {
        ranges_overlap(
            self.memory.handle,
            (self.offset, self.size),
            other.memory.handle,
            (other.offset, other.size),
        )
    }
}

impl RuntimeBound for MemorySlice<'_> {
    fn runtime_handle(&self) -> TiRuntime {
        self.memory.runtime_handle()
    }
}

fn ranges_overlap(a: TiMemory, (a_off, a_len): (u64, u64), b: TiMemory, (b_off, b_len): (u64, u64)) -> bool {
    a == b && a_off < b_off.saturating_add(b_len) && b_off < a_off.saturating_add(a_len)
}

/// Unmaps on drop, so a panicking [`Memory::with_mapped`] closure does not
/// leave the allocation mapped.
struct MappedGuard<'a, 'rt> {
    memory: &'a Memory<'rt>,
    armed: bool,
}

impl MappedGuard<'_, '_> {
    fn finish(mut self) -> Result<()> {
        self.armed = false;
        self.memory.unmap()
    }
}

impl Drop for MappedGuard<'_, '_> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.memory.unmap() {
                tracing::error!(target: "taichi_aot::ffi", error = %e, "unmap after panic failed");
            }
        }
    }
}
