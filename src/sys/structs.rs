// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! `#[repr(C)]` records and unions exchanged with the native library.
//!
//! Field order, widths and padding reproduce the C header exactly. Layout is
//! pinned by the size and offset tests at the bottom of this file.
//!
//! ## Unions
//!
//! The native unions carry their discriminant out of band (a `type` field on
//! the enclosing struct). Constructors here zero-fill the whole union before
//! writing the active member, and the safe accessors only read the member the
//! tag selects. Reading a different member is possible through the raw union
//! fields but is only meaningful within the same 8/16/32/64-bit width class.

use std::ffi::c_char;
use std::fmt;

use super::handles::{TiImage, TiMemory, TiSampler};
use super::types::{
    TiArgumentType, TiBool, TiCapability, TiDataType, TiFilter, TiFormat, TiImageDimension,
    TiImageUsageFlags, TiMemoryUsageFlags, TiAddressMode, TI_ARGUMENT_TYPE_F32,
    TI_ARGUMENT_TYPE_I32, TI_ARGUMENT_TYPE_NDARRAY, TI_ARGUMENT_TYPE_SCALAR,
    TI_ARGUMENT_TYPE_TENSOR, TI_ARGUMENT_TYPE_TEXTURE, TI_DATA_TYPE_F16, TI_DATA_TYPE_F32,
    TI_DATA_TYPE_F64, TI_DATA_TYPE_I16, TI_DATA_TYPE_I32, TI_DATA_TYPE_I64, TI_DATA_TYPE_I8,
    TI_DATA_TYPE_U1, TI_DATA_TYPE_U16, TI_DATA_TYPE_U32, TI_DATA_TYPE_U64, TI_DATA_TYPE_U8,
    TI_MAX_ND_DIMS,
};
use crate::error::{Result, TaichiError};

/// Byte width of one element of a raw `TiDataType`, if it has a fixed width.
///
/// `U1` is stored in an 8-bit slot.
#[must_use]
pub fn data_type_width(data_type: TiDataType) -> Option<usize> {
    match data_type {
        TI_DATA_TYPE_I8 | TI_DATA_TYPE_U8 | TI_DATA_TYPE_U1 => Some(1),
        TI_DATA_TYPE_F16 | TI_DATA_TYPE_I16 | TI_DATA_TYPE_U16 => Some(2),
        TI_DATA_TYPE_F32 | TI_DATA_TYPE_I32 | TI_DATA_TYPE_U32 => Some(4),
        TI_DATA_TYPE_F64 | TI_DATA_TYPE_I64 | TI_DATA_TYPE_U64 => Some(8),
        _ => None,
    }
}

// =============================================================================
// RUNTIME AND MEMORY
// =============================================================================

/// One `(capability, level)` pair reported or requested for a runtime.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiCapabilityLevelInfo {
    pub capability: TiCapability,
    pub level: u32,
}

/// Descriptor passed to `ti_allocate_memory`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiMemoryAllocateInfo {
    pub size: u64,
    pub host_write: TiBool,
    pub host_read: TiBool,
    pub export_sharing: TiBool,
    pub usage: TiMemoryUsageFlags,
}

/// A byte range within one memory allocation.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiMemorySlice {
    pub memory: TiMemory,
    pub offset: u64,
    pub size: u64,
}

/// Rank plus per-dimension extents. Slots past `dim_count` are zero.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiNdShape {
    pub dim_count: u32,
    pub dims: [u32; TI_MAX_ND_DIMS],
}

impl TiNdShape {
    /// Build a shape from host extents.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the rank exceeds 16 or an extent does not
    /// fit in 32 bits.
    pub fn new(extents: &[usize]) -> Result<Self> {
        if extents.len() > TI_MAX_ND_DIMS {
            return Err(TaichiError::invalid_argument(format!(
                "rank {} exceeds the maximum of {TI_MAX_ND_DIMS} dimensions",
                extents.len()
            )));
        }
        let mut dims = [0u32; TI_MAX_ND_DIMS];
        for (slot, &extent) in dims.iter_mut().zip(extents) {
            *slot = u32::try_from(extent).map_err(|_| {
                TaichiError::invalid_argument(format!("extent {extent} does not fit in u32"))
            })?;
        }
        let dim_count = u32::try_from(extents.len())
            .map_err(|_| TaichiError::invalid_argument("rank does not fit in u32"))?;
        Ok(Self { dim_count, dims })
    }

    /// The live extents, `dims[..dim_count]`.
    #[must_use]
    pub fn extents(&self) -> &[u32] {
        let rank = (self.dim_count as usize).min(TI_MAX_ND_DIMS);
        &self.dims[..rank]
    }

    /// Product of the live extents (1 for rank 0).
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.extents().iter().map(|&d| d as usize).product()
    }
}

/// ND-array argument payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiNdArray {
    pub memory: TiMemory,
    pub shape: TiNdShape,
    pub elem_shape: TiNdShape,
    pub elem_type: TiDataType,
}

// =============================================================================
// IMAGES, SAMPLERS, TEXTURES
// =============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiImageOffset {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub array_layer_offset: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiImageExtent {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub array_layer_count: u32,
}

/// Descriptor passed to `ti_allocate_image`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiImageAllocateInfo {
    pub dimension: TiImageDimension,
    pub extent: TiImageExtent,
    pub mip_level_count: u32,
    pub format: TiFormat,
    pub export_sharing: TiBool,
    pub usage: TiImageUsageFlags,
}

/// A region of one mip level of an image.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiImageSlice {
    pub image: TiImage,
    pub offset: TiImageOffset,
    pub extent: TiImageExtent,
    pub mip_level: u32,
}

/// Descriptor passed to `ti_create_sampler`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TiSamplerCreateInfo {
    pub mag_filter: TiFilter,
    pub min_filter: TiFilter,
    pub address_mode: TiAddressMode,
    pub max_anisotropy: f32,
}

/// Texture argument payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiTexture {
    pub image: TiImage,
    pub sampler: TiSampler,
    pub dimension: TiImageDimension,
    pub extent: TiImageExtent,
    pub format: TiFormat,
}

// =============================================================================
// SCALARS AND TENSORS
// =============================================================================

/// Scalar payload bucketed by width.
#[repr(C)]
#[derive(Clone, Copy)]
pub union TiScalarValue {
    pub x8: u8,
    pub x16: u16,
    pub x32: u32,
    pub x64: u64,
}

impl TiScalarValue {
    fn zeroed() -> Self {
        // SAFETY: every member is a plain integer; all-zero is valid for each.
        unsafe { std::mem::zeroed() }
    }

    #[must_use]
    pub fn from_x8(value: u8) -> Self {
        let mut v = Self::zeroed();
        v.x8 = value;
        v
    }

    #[must_use]
    pub fn from_x16(value: u16) -> Self {
        let mut v = Self::zeroed();
        v.x16 = value;
        v
    }

    #[must_use]
    pub fn from_x32(value: u32) -> Self {
        let mut v = Self::zeroed();
        v.x32 = value;
        v
    }

    #[must_use]
    pub fn from_x64(value: u64) -> Self {
        let mut v = Self::zeroed();
        v.x64 = value;
        v
    }
}

impl fmt::Debug for TiScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiScalarValue").finish_non_exhaustive()
    }
}

/// A typed scalar argument.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct TiScalar {
    pub type_: TiDataType,
    pub value: TiScalarValue,
}

impl TiScalar {
    /// Build a scalar from its raw bits, placed in the bucket `type_` selects.
    ///
    /// Bits above the bucket width are dropped. Returns `None` for a data type
    /// without a fixed width.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_bits(type_: TiDataType, bits: u64) -> Option<Self> {
        let value = match data_type_width(type_)? {
            1 => TiScalarValue::from_x8(bits as u8),
            2 => TiScalarValue::from_x16(bits as u16),
            4 => TiScalarValue::from_x32(bits as u32),
            _ => TiScalarValue::from_x64(bits),
        };
        Some(Self { type_, value })
    }

    /// Read the bucket `type_` selects, zero-extended to 64 bits.
    #[must_use]
    pub fn bits(&self) -> Option<u64> {
        let width = data_type_width(self.type_)?;
        // SAFETY: the union is fully initialised by every constructor and the
        // bucket read matches the tag's width class.
        let bits = unsafe {
            match width {
                1 => u64::from(self.value.x8),
                2 => u64::from(self.value.x16),
                4 => u64::from(self.value.x32),
                _ => self.value.x64,
            }
        };
        Some(bits)
    }
}

impl fmt::Debug for TiScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiScalar")
            .field("type_", &self.type_)
            .field("bits", &self.bits())
            .finish()
    }
}

/// Small inline tensor payload: 128 bytes viewed at four widths.
#[repr(C)]
#[derive(Clone, Copy)]
pub union TiTensorValue {
    pub x8: [u8; 128],
    pub x16: [u16; 64],
    pub x32: [u32; 32],
    pub x64: [u64; 16],
}

impl TiTensorValue {
    /// Capacity in bytes.
    pub const CAPACITY: usize = 128;

    /// Copy up to 128 raw bytes in; the remainder is zero.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > Self::CAPACITY {
            return None;
        }
        let mut x8 = [0u8; 128];
        x8[..bytes.len()].copy_from_slice(bytes);
        Some(Self { x8 })
    }

    /// The payload as raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 128] {
        // SAFETY: all four members span the same 128 initialised bytes and
        // every bit pattern is a valid `u8`.
        unsafe { &self.x8 }
    }
}

impl Default for TiTensorValue {
    fn default() -> Self {
        Self { x8: [0u8; 128] }
    }
}

impl fmt::Debug for TiTensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiTensorValue").finish_non_exhaustive()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TiTensorValueWithLength {
    /// Element count.
    pub length: u32,
    pub data: TiTensorValue,
}

/// A small typed tensor passed by value.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TiTensor {
    pub type_: TiDataType,
    pub contents: TiTensorValueWithLength,
}

impl TiTensor {
    /// Build an inline tensor from raw little-endian element bytes.
    ///
    /// Returns `None` if the data type has no fixed width, the byte count is
    /// not a multiple of it, or the payload exceeds 128 bytes.
    #[must_use]
    pub fn from_bytes(type_: TiDataType, bytes: &[u8]) -> Option<Self> {
        let width = data_type_width(type_)?;
        if bytes.len() % width != 0 {
            return None;
        }
        let data = TiTensorValue::from_bytes(bytes)?;
        let length = u32::try_from(bytes.len() / width).ok()?;
        Some(Self {
            type_,
            contents: TiTensorValueWithLength { length, data },
        })
    }

    /// The live element bytes, `length * width` of them.
    #[must_use]
    pub fn element_bytes(&self) -> Option<&[u8]> {
        let width = data_type_width(self.type_)?;
        let len = (self.contents.length as usize)
            .checked_mul(width)?
            .min(TiTensorValue::CAPACITY);
        Some(&self.contents.data.as_bytes()[..len])
    }
}

// =============================================================================
// ARGUMENTS
// =============================================================================

/// Argument payload; the active member is named by `TiArgument::type_`.
#[repr(C)]
#[derive(Clone, Copy)]
pub union TiArgumentValue {
    pub i32: i32,
    pub f32: f32,
    pub ndarray: TiNdArray,
    pub texture: TiTexture,
    pub scalar: TiScalar,
    pub tensor: TiTensor,
}

impl TiArgumentValue {
    fn zeroed() -> Self {
        // SAFETY: every member is plain data (integers, floats, nullable raw
        // pointers); all-zero is a valid value for each.
        unsafe { std::mem::zeroed() }
    }
}

impl fmt::Debug for TiArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiArgumentValue").finish_non_exhaustive()
    }
}

/// One positional kernel argument.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct TiArgument {
    pub type_: TiArgumentType,
    pub value: TiArgumentValue,
}

impl TiArgument {
    fn tagged(type_: TiArgumentType, write: impl FnOnce(&mut TiArgumentValue)) -> Self {
        let mut value = TiArgumentValue::zeroed();
        write(&mut value);
        Self { type_, value }
    }

    #[must_use]
    pub fn i32(v: i32) -> Self {
        Self::tagged(TI_ARGUMENT_TYPE_I32, |value| value.i32 = v)
    }

    #[must_use]
    pub fn f32(v: f32) -> Self {
        Self::tagged(TI_ARGUMENT_TYPE_F32, |value| value.f32 = v)
    }

    #[must_use]
    pub fn ndarray(v: TiNdArray) -> Self {
        Self::tagged(TI_ARGUMENT_TYPE_NDARRAY, |value| value.ndarray = v)
    }

    #[must_use]
    pub fn texture(v: TiTexture) -> Self {
        Self::tagged(TI_ARGUMENT_TYPE_TEXTURE, |value| value.texture = v)
    }

    #[must_use]
    pub fn scalar(v: TiScalar) -> Self {
        Self::tagged(TI_ARGUMENT_TYPE_SCALAR, |value| value.scalar = v)
    }

    #[must_use]
    pub fn tensor(v: TiTensor) -> Self {
        Self::tagged(TI_ARGUMENT_TYPE_TENSOR, |value| value.tensor = v)
    }

    #[must_use]
    pub fn value_i32(&self) -> Option<i32> {
        // SAFETY: member read only when the tag selects it.
        (self.type_ == TI_ARGUMENT_TYPE_I32).then(|| unsafe { self.value.i32 })
    }

    #[must_use]
    pub fn value_f32(&self) -> Option<f32> {
        // SAFETY: member read only when the tag selects it.
        (self.type_ == TI_ARGUMENT_TYPE_F32).then(|| unsafe { self.value.f32 })
    }

    #[must_use]
    pub fn value_ndarray(&self) -> Option<TiNdArray> {
        // SAFETY: member read only when the tag selects it.
        (self.type_ == TI_ARGUMENT_TYPE_NDARRAY).then(|| unsafe { self.value.ndarray })
    }

    #[must_use]
    pub fn value_texture(&self) -> Option<TiTexture> {
        // SAFETY: member read only when the tag selects it.
        (self.type_ == TI_ARGUMENT_TYPE_TEXTURE).then(|| unsafe { self.value.texture })
    }

    #[must_use]
    pub fn value_scalar(&self) -> Option<TiScalar> {
        // SAFETY: member read only when the tag selects it.
        (self.type_ == TI_ARGUMENT_TYPE_SCALAR).then(|| unsafe { self.value.scalar })
    }

    #[must_use]
    pub fn value_tensor(&self) -> Option<TiTensor> {
        // SAFETY: member read only when the tag selects it.
        (self.type_ == TI_ARGUMENT_TYPE_TENSOR).then(|| unsafe { self.value.tensor })
    }
}

impl fmt::Debug for TiArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("TiArgument");
        s.field("type_", &self.type_);
        match self.type_ {
            TI_ARGUMENT_TYPE_I32 => s.field("i32", &self.value_i32()),
            TI_ARGUMENT_TYPE_F32 => s.field("f32", &self.value_f32()),
            TI_ARGUMENT_TYPE_NDARRAY => s.field("ndarray", &self.value_ndarray()),
            TI_ARGUMENT_TYPE_TEXTURE => s.field("texture", &self.value_texture()),
            TI_ARGUMENT_TYPE_SCALAR => s.field("scalar", &self.value_scalar()),
            TI_ARGUMENT_TYPE_TENSOR => s.field("tensor", &self.value_tensor()),
            _ => s.field("value", &self.value),
        };
        s.finish()
    }
}

/// A compute-graph argument bound by name.
///
/// `name` must point to a NUL-terminated string that outlives the launch call.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TiNamedArgument {
    pub name: *const c_char,
    pub argument: TiArgument,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, offset_of, size_of};

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_record_sizes_match_native_layout() {
        assert_eq!(size_of::<TiCapabilityLevelInfo>(), 8);
        assert_eq!(size_of::<TiMemoryAllocateInfo>(), 24);
        assert_eq!(size_of::<TiMemorySlice>(), 24);
        assert_eq!(size_of::<TiNdShape>(), 68);
        assert_eq!(size_of::<TiNdArray>(), 152);
        assert_eq!(size_of::<TiImageOffset>(), 16);
        assert_eq!(size_of::<TiImageExtent>(), 16);
        assert_eq!(size_of::<TiImageAllocateInfo>(), 36);
        assert_eq!(size_of::<TiImageSlice>(), 48);
        assert_eq!(size_of::<TiSamplerCreateInfo>(), 16);
        assert_eq!(size_of::<TiTexture>(), 40);
        assert_eq!(size_of::<TiScalarValue>(), 8);
        assert_eq!(size_of::<TiScalar>(), 16);
        assert_eq!(size_of::<TiTensorValue>(), 128);
        assert_eq!(size_of::<TiTensorValueWithLength>(), 136);
        assert_eq!(size_of::<TiTensor>(), 144);
        assert_eq!(size_of::<TiArgumentValue>(), 152);
        assert_eq!(size_of::<TiArgument>(), 160);
        assert_eq!(size_of::<TiNamedArgument>(), 168);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_field_offsets() {
        assert_eq!(offset_of!(TiMemoryAllocateInfo, host_write), 8);
        assert_eq!(offset_of!(TiMemoryAllocateInfo, usage), 20);
        assert_eq!(offset_of!(TiNdArray, shape), 8);
        assert_eq!(offset_of!(TiNdArray, elem_shape), 76);
        assert_eq!(offset_of!(TiNdArray, elem_type), 144);
        assert_eq!(offset_of!(TiImageSlice, mip_level), 40);
        assert_eq!(offset_of!(TiTexture, dimension), 16);
        assert_eq!(offset_of!(TiTexture, format), 36);
        assert_eq!(offset_of!(TiScalar, value), 8);
        assert_eq!(offset_of!(TiTensorValueWithLength, data), 8);
        assert_eq!(offset_of!(TiArgument, value), 8);
        assert_eq!(offset_of!(TiNamedArgument, argument), 8);
        assert_eq!(align_of::<TiArgument>(), 8);
    }

    #[test]
    fn test_nd_shape_zero_pads() {
        let shape = TiNdShape::new(&[2, 3, 4]).unwrap();
        assert_eq!(shape.dim_count, 3);
        assert_eq!(shape.extents(), &[2, 3, 4]);
        assert!(shape.dims[3..].iter().all(|&d| d == 0));
        assert_eq!(shape.element_count(), 24);
    }

    #[test]
    fn test_nd_shape_rejects_excess_rank() {
        let extents = [1usize; 17];
        assert!(TiNdShape::new(&extents).is_err());
        assert!(TiNdShape::new(&extents[..16]).is_ok());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_nd_shape_rejects_wide_extent() {
        assert!(TiNdShape::new(&[usize::MAX]).is_err());
    }

    #[test]
    fn test_rank_zero_shape_has_one_element() {
        let shape = TiNdShape::new(&[]).unwrap();
        assert_eq!(shape.dim_count, 0);
        assert_eq!(shape.element_count(), 1);
    }

    #[test]
    fn test_scalar_bucket_round_trip() {
        let s = TiScalar::from_bits(TI_DATA_TYPE_U8, 0xAB).unwrap();
        assert_eq!(s.bits(), Some(0xAB));

        let s = TiScalar::from_bits(TI_DATA_TYPE_F16, u64::from(half::f16::ONE.to_bits())).unwrap();
        assert_eq!(s.bits(), Some(u64::from(half::f16::ONE.to_bits())));

        let s = TiScalar::from_bits(TI_DATA_TYPE_F32, u64::from(1.5f32.to_bits())).unwrap();
        assert_eq!(s.bits(), Some(u64::from(1.5f32.to_bits())));

        let s = TiScalar::from_bits(TI_DATA_TYPE_I64, u64::MAX).unwrap();
        assert_eq!(s.bits(), Some(u64::MAX));
    }

    #[test]
    fn test_scalar_bits_truncate_to_bucket() {
        let s = TiScalar::from_bits(TI_DATA_TYPE_U16, 0x1_2345).unwrap();
        assert_eq!(s.bits(), Some(0x2345));
        // SAFETY: union is zero-filled; wider bucket sees the high bytes as zero.
        let wide = unsafe { s.value.x64 };
        assert_eq!(wide, 0x2345);
    }

    #[test]
    fn test_scalar_rejects_unsized_type() {
        assert!(TiScalar::from_bits(crate::sys::types::TI_DATA_TYPE_GEN, 1).is_none());
    }

    #[test]
    fn test_tensor_payload_round_trip() {
        let values: Vec<u8> = [1.0f32, -2.0, 3.5]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let t = TiTensor::from_bytes(TI_DATA_TYPE_F32, &values).unwrap();
        assert_eq!(t.contents.length, 3);
        assert_eq!(t.element_bytes().unwrap(), values.as_slice());
        // SAFETY: same 32-bit class as the tag.
        let x32 = unsafe { t.contents.data.x32 };
        assert_eq!(x32[1], (-2.0f32).to_bits());
        assert_eq!(x32[3], 0);
    }

    #[test]
    fn test_tensor_rejects_oversize_and_ragged() {
        assert!(TiTensor::from_bytes(TI_DATA_TYPE_U8, &[0u8; 129]).is_none());
        assert!(TiTensor::from_bytes(TI_DATA_TYPE_U32, &[0u8; 6]).is_none());
    }

    #[test]
    fn test_argument_tag_guards_access() {
        let arg = TiArgument::i32(-7);
        assert_eq!(arg.value_i32(), Some(-7));
        assert_eq!(arg.value_f32(), None);
        assert!(arg.value_ndarray().is_none());

        let arg = TiArgument::f32(0.25);
        assert_eq!(arg.value_f32(), Some(0.25));
        assert_eq!(arg.value_i32(), None);
    }

    #[test]
    fn test_argument_ndarray_round_trip() {
        let shape = TiNdShape::new(&[4, 2]).unwrap();
        let nd = TiNdArray {
            memory: TiMemory::null(),
            shape,
            elem_shape: shape,
            elem_type: TI_DATA_TYPE_I32,
        };
        let arg = TiArgument::ndarray(nd);
        assert_eq!(arg.type_, TI_ARGUMENT_TYPE_NDARRAY);
        assert_eq!(arg.value_ndarray(), Some(nd));
    }

    #[test]
    fn test_argument_i32_and_f32_share_storage_width() {
        let arg = TiArgument::f32(1.0);
        // SAFETY: i32 and f32 are the same 32-bit class.
        let bits = unsafe { arg.value.i32 };
        assert_eq!(bits.to_ne_bytes(), 1.0f32.to_bits().to_ne_bytes());
    }
}
