// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Device image allocations.
//!
//! Images follow the same explicit lifecycle as [`crate::Memory`]: allocate,
//! use, [`Image::free`]. Layout transitions are issued by the caller; the
//! binding only forwards them.

use crate::enums::{Format, ImageDimension, ImageLayout, ImageUsage};
use crate::error::{ApiError, ErrorCode, Result, TaichiError};
use crate::runtime::Runtime;
use crate::sys::handles::{TiImage, TiRuntime};
use crate::sys::structs::{TiImageAllocateInfo, TiImageExtent, TiImageOffset, TiImageSlice};
use crate::sys::types::{TI_FALSE, TI_TRUE};
use crate::traits::{RuntimeBound, ValidatableConfig};

/// Descriptor for [`Image::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageAllocateInfo {
    /// Dimensionality.
    pub dimension: ImageDimension,
    /// Size of mip level 0.
    pub extent: TiImageExtent,
    /// Number of mip levels.
    pub mip_level_count: u32,
    /// Texel format.
    pub format: Format,
    /// Export for interop with other APIs.
    pub export_sharing: bool,
    /// Binding usage.
    pub usage: ImageUsage,
}

impl ImageAllocateInfo {
    /// Image with one mip level and storage plus sampled usage.
    #[must_use]
    pub fn new(dimension: ImageDimension, extent: TiImageExtent, format: Format) -> Self {
        Self {
            dimension,
            extent,
            mip_level_count: 1,
            format,
            export_sharing: false,
            usage: ImageUsage::STORAGE | ImageUsage::SAMPLED,
        }
    }

    /// A single-layer 2D image.
    #[must_use]
    pub fn texture_2d(width: u32, height: u32, format: Format) -> Self {
        Self::new(
            ImageDimension::D2,
            TiImageExtent {
                width,
                height,
                depth: 1,
                array_layer_count: 1,
            },
            format,
        )
    }

    /// Set the mip level count.
    #[must_use]
    pub fn with_mip_levels(mut self, count: u32) -> Self {
        self.mip_level_count = count;
        self
    }

    /// Set usage flags.
    #[must_use]
    pub fn with_usage(mut self, usage: ImageUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Request export sharing.
    #[must_use]
    pub fn with_export_sharing(mut self, enable: bool) -> Self {
        self.export_sharing = enable;
        self
    }

    /// The ABI descriptor.
    #[must_use]
    pub fn to_raw(&self) -> TiImageAllocateInfo {
        TiImageAllocateInfo {
            dimension: self.dimension.as_raw(),
            extent: self.extent,
            mip_level_count: self.mip_level_count,
            format: self.format.as_raw(),
            export_sharing: if self.export_sharing { TI_TRUE } else { TI_FALSE },
            usage: self.usage.bits(),
        }
    }
}

impl ValidatableConfig for ImageAllocateInfo {
    fn validate(&self) -> Result<()> {
        let e = self.extent;
        if e.width == 0 || e.height == 0 || e.depth == 0 || e.array_layer_count == 0 {
            return Err(TaichiError::invalid_argument(format!(
                "image extent components must be > 0, got {}x{}x{} ({} layers)",
                e.width, e.height, e.depth, e.array_layer_count
            )));
        }
        if self.mip_level_count == 0 {
            return Err(TaichiError::invalid_argument("mip_level_count must be > 0"));
        }
        if self.usage.is_empty() {
            return Err(TaichiError::invalid_argument("image usage must not be empty"));
        }
        Ok(())
    }
}

/// A device image owned by one runtime.
#[derive(Debug)]
pub struct Image<'rt> {
    runtime: &'rt Runtime,
    handle: TiImage,
    info: ImageAllocateInfo,
}

impl<'rt> Image<'rt> {
    /// Allocate an image.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for zero extents, zero mip count or empty usage
    /// - `Api` if the native allocation fails
    pub fn allocate(runtime: &'rt Runtime, info: &ImageAllocateInfo) -> Result<Self> {
        info.validate()?;
        let raw = info.to_raw();
        let handle = runtime.library().checked("ti_allocate_image", |api| {
            // SAFETY: `raw` is a valid descriptor for the duration of the call.
            unsafe { (api.ti_allocate_image)(runtime.handle(), &raw) }
        })?;
        if handle.is_null() {
            return Err(TaichiError::Api(ApiError::synthesized(
                ErrorCode::OutOfMemory,
                "ti_allocate_image returned a null handle",
            )));
        }
        Ok(Self {
            runtime,
            handle,
            info: *info,
        })
    }

    /// Release the image.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn free(self) -> Result<()> {
        self.runtime.library().checked("ti_free_image", |api| {
            // SAFETY: `self.handle` is live and consumed here.
            unsafe { (api.ti_free_image)(self.runtime.handle(), self.handle) }
        })
    }

    /// Queue a transition to `layout`.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn transition(&self, layout: ImageLayout) -> Result<()> {
        self.runtime.library().checked("ti_transition_image", |api| {
            // SAFETY: `self.handle` is live.
            unsafe { (api.ti_transition_image)(self.runtime.handle(), self.handle, layout.as_raw()) }
        })
    }

    /// Tell the runtime the image is already in `layout`, e.g. after external
    /// interop wrote to it.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn track(&self, layout: ImageLayout) -> Result<()> {
        self.runtime.library().checked("ti_track_image_ext", |api| {
            // SAFETY: `self.handle` is live.
            unsafe { (api.ti_track_image_ext)(self.runtime.handle(), self.handle, layout.as_raw()) }
        })
    }

    /// A bounds-checked region of one mip level.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the mip level does not exist or the region
    /// exceeds that level's extent.
    pub fn slice(
        &self,
        offset: TiImageOffset,
        extent: TiImageExtent,
        mip_level: u32,
    ) -> Result<ImageSlice<'_>> {
        if mip_level >= self.info.mip_level_count {
            return Err(TaichiError::invalid_argument(format!(
                "mip level {mip_level} out of range ({} levels)",
                self.info.mip_level_count
            )));
        }
        let level = mip_extent(self.info.extent, mip_level);
        let fits = |off: u32, len: u32, max: u32| off.checked_add(len).is_some_and(|end| end <= max);
        if !(fits(offset.x, extent.width, level.width)
            && fits(offset.y, extent.height, level.height)
            && fits(offset.z, extent.depth, level.depth)
            && fits(offset.array_layer_offset, extent.array_layer_count, level.array_layer_count))
        {
            return Err(TaichiError::invalid_argument(format!(
                "image region {offset:?}+{extent:?} exceeds mip {mip_level} extent {level:?}"
            )));
        }
        Ok(ImageSlice {
            image: self,
            raw: TiImageSlice {
                image: self.handle,
                offset,
                extent,
                mip_level,
            },
        })
    }

    /// The whole of mip level 0.
    #[must_use]
    pub fn full_slice(&self) -> ImageSlice<'_> {
        ImageSlice {
            image: self,
            raw: TiImageSlice {
                image: self.handle,
                offset: TiImageOffset::default(),
                extent: self.info.extent,
                mip_level: 0,
            },
        }
    }

    /// Copy `src` into `dst` on the device.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the slices belong to another runtime,
    /// differ in extent, or overlap within one image level. Returns `Api` if
    /// the error channel reports a failure.
    pub fn copy_device_to_device(
        runtime: &Runtime,
        dst: &ImageSlice<'_>,
        src: &ImageSlice<'_>,
    ) -> Result<()> {
        runtime.ensure_same_runtime(dst)?;
        runtime.ensure_same_runtime(src)?;
        if dst.raw.extent != src.raw.extent {
            return Err(TaichiError::invalid_argument(format!(
                "copy extent mismatch: dst {:?}, src {:?}",
                dst.raw.extent, src.raw.extent
            )));
        }
        if regions_overlap(&dst.raw, &src.raw) {
            return Err(TaichiError::invalid_argument(
                "source and destination regions overlap",
            ));
        }

        runtime.library().checked("ti_copy_image_device_to_device", |api| {
            // SAFETY: both descriptors are valid for the call; destination
            // first, per the C header.
            unsafe { (api.ti_copy_image_device_to_device)(runtime.handle(), &dst.raw, &src.raw) }
        })
    }

    /// Raw image handle.
    #[must_use]
    pub fn handle(&self) -> TiImage {
        self.handle
    }

    /// Descriptor the image was allocated with.
    #[must_use]
    pub fn info(&self) -> &ImageAllocateInfo {
        &self.info
    }
}

impl RuntimeBound for Image<'_> {
    fn runtime_handle(&self) -> TiRuntime {
        self.runtime.handle()
    }
}

/// A region of one mip level of an [`Image`].
#[derive(Debug, Clone, Copy)]
pub struct ImageSlice<'a> {
    image: &'a Image<'a>,
    raw: TiImageSlice,
}

impl ImageSlice<'_> {
    /// The ABI descriptor.
    #[must_use]
    pub fn to_raw(&self) -> TiImageSlice {
        self.raw
    }
}

impl RuntimeBound for ImageSlice<'_> {
    fn runtime_handle(&self) -> TiRuntime {
        self.image.runtime_handle()
    }
}

fn mip_extent(base: TiImageExtent, level: u32) -> TiImageExtent {
    let shrink = |v: u32| v.checked_shr(level).unwrap_or(0).max(1);
    TiImageExtent {
        width: shrink(base.width),
        height: shrink(base.height),
        depth: shrink(base.depth),
        array_layer_count: base.array_layer_count,
    }
}

fn regions_overlap(a: &TiImageSlice, b: &TiImageSlice) -> bool {
    let axis = |a_off: u32, a_len: u32, b_off: u32, b_len: u32| {
        u64::from(a_off) < u64::from(b_off) + u64::from(b_len)
            && u64::from(b_off) < u64::from(a_off) + u64::from(a_len)
    };
    a.image == b.image
        && a.mip_level == b.mip_level
        && axis(a.offset.x, a.extent.width, b.offset.x, b.extent.width)
        && axis(a.offset.y, a.extent.height, b.offset.y, b.extent.height)
        && axis(a.offset.z, a.extent.depth, b.offset.z, b.extent.depth)
        && axis(
            a.offset.array_layer_offset,
            a.extent.array_layer_count,
            b.offset.array_layer_offset,
            b.extent.array_layer_count,
        )
}
