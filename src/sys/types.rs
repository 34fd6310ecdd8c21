// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Scalar ABI types and raw enumeration values.
//!
//! C enums cross the boundary as 32-bit signed integers, so every enum here is
//! a plain `i32` alias plus a set of constants. Typed Rust enums live in
//! [`crate::enums`] and convert to and from these raw values.

/// C boolean (`TiBool`), 32 bits wide.
pub type TiBool = u32;
/// Bitmask type shared by all `*FlagBits` enums.
pub type TiFlags = u32;

pub const TI_FALSE: TiBool = 0;
pub const TI_TRUE: TiBool = 1;
/// Maximum number of arches `ti_get_available_archs` will ever report.
pub const TI_MAX_ARCH_COUNT: usize = 16;
/// Fixed slot count of `TiNdShape::dims`.
pub const TI_MAX_ND_DIMS: usize = 16;

// ---------------------------------------------------------------------------
// TiError
// ---------------------------------------------------------------------------

pub type TiError = i32;
pub const TI_ERROR_SUCCESS: TiError = 0;
pub const TI_ERROR_NOT_SUPPORTED: TiError = -1;
pub const TI_ERROR_CORRUPTED_DATA: TiError = -2;
pub const TI_ERROR_NAME_NOT_FOUND: TiError = -3;
pub const TI_ERROR_INVALID_ARGUMENT: TiError = -4;
pub const TI_ERROR_ARGUMENT_NULL: TiError = -5;
pub const TI_ERROR_ARGUMENT_OUT_OF_RANGE: TiError = -6;
pub const TI_ERROR_ARGUMENT_NOT_FOUND: TiError = -7;
pub const TI_ERROR_INVALID_INTEROP: TiError = -8;
pub const TI_ERROR_INVALID_STATE: TiError = -9;
pub const TI_ERROR_INCOMPATIBLE_MODULE: TiError = -10;
pub const TI_ERROR_OUT_OF_MEMORY: TiError = -11;

// ---------------------------------------------------------------------------
// TiArch
// ---------------------------------------------------------------------------

pub type TiArch = i32;
pub const TI_ARCH_RESERVED: TiArch = 0;
pub const TI_ARCH_VULKAN: TiArch = 1;
pub const TI_ARCH_METAL: TiArch = 2;
pub const TI_ARCH_CUDA: TiArch = 3;
pub const TI_ARCH_X64: TiArch = 4;
pub const TI_ARCH_ARM64: TiArch = 5;
pub const TI_ARCH_OPENGL: TiArch = 6;
pub const TI_ARCH_GLES: TiArch = 7;

// ---------------------------------------------------------------------------
// TiCapability
// ---------------------------------------------------------------------------

pub type TiCapability = i32;
pub const TI_CAPABILITY_RESERVED: TiCapability = 0;
pub const TI_CAPABILITY_SPIRV_VERSION: TiCapability = 1;
pub const TI_CAPABILITY_SPIRV_HAS_INT8: TiCapability = 2;
pub const TI_CAPABILITY_SPIRV_HAS_INT16: TiCapability = 3;
pub const TI_CAPABILITY_SPIRV_HAS_INT64: TiCapability = 4;
pub const TI_CAPABILITY_SPIRV_HAS_FLOAT16: TiCapability = 5;
pub const TI_CAPABILITY_SPIRV_HAS_FLOAT64: TiCapability = 6;
pub const TI_CAPABILITY_SPIRV_HAS_ATOMIC_INT64: TiCapability = 7;
pub const TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT16: TiCapability = 8;
pub const TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT16_ADD: TiCapability = 9;
pub const TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT16_MINMAX: TiCapability = 10;
pub const TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT: TiCapability = 11;
pub const TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT_ADD: TiCapability = 12;
pub const TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT_MINMAX: TiCapability = 13;
pub const TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT64: TiCapability = 14;
pub const TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT64_ADD: TiCapability = 15;
pub const TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT64_MINMAX: TiCapability = 16;
pub const TI_CAPABILITY_SPIRV_HAS_VARIABLE_PTR: TiCapability = 17;
pub const TI_CAPABILITY_SPIRV_HAS_PHYSICAL_STORAGE_BUFFER: TiCapability = 18;
pub const TI_CAPABILITY_SPIRV_HAS_SUBGROUP_BASIC: TiCapability = 19;
pub const TI_CAPABILITY_SPIRV_HAS_SUBGROUP_VOTE: TiCapability = 20;
pub const TI_CAPABILITY_SPIRV_HAS_SUBGROUP_ARITHMETIC: TiCapability = 21;
pub const TI_CAPABILITY_SPIRV_HAS_SUBGROUP_BALLOT: TiCapability = 22;
pub const TI_CAPABILITY_SPIRV_HAS_NON_SEMANTIC_INFO: TiCapability = 23;
pub const TI_CAPABILITY_SPIRV_HAS_NO_INTEGER_WRAP_DECORATION: TiCapability = 24;

// ---------------------------------------------------------------------------
// TiDataType
// ---------------------------------------------------------------------------

pub type TiDataType = i32;
pub const TI_DATA_TYPE_F16: TiDataType = 0;
pub const TI_DATA_TYPE_F32: TiDataType = 1;
pub const TI_DATA_TYPE_F64: TiDataType = 2;
pub const TI_DATA_TYPE_I8: TiDataType = 3;
pub const TI_DATA_TYPE_I16: TiDataType = 4;
pub const TI_DATA_TYPE_I32: TiDataType = 5;
pub const TI_DATA_TYPE_I64: TiDataType = 6;
pub const TI_DATA_TYPE_U1: TiDataType = 7;
pub const TI_DATA_TYPE_U8: TiDataType = 8;
pub const TI_DATA_TYPE_U16: TiDataType = 9;
pub const TI_DATA_TYPE_U32: TiDataType = 10;
pub const TI_DATA_TYPE_U64: TiDataType = 11;
pub const TI_DATA_TYPE_GEN: TiDataType = 12;
pub const TI_DATA_TYPE_UNKNOWN: TiDataType = 13;

// ---------------------------------------------------------------------------
// TiArgumentType
// ---------------------------------------------------------------------------

pub type TiArgumentType = i32;
pub const TI_ARGUMENT_TYPE_I32: TiArgumentType = 0;
pub const TI_ARGUMENT_TYPE_F32: TiArgumentType = 1;
pub const TI_ARGUMENT_TYPE_NDARRAY: TiArgumentType = 2;
pub const TI_ARGUMENT_TYPE_TEXTURE: TiArgumentType = 3;
pub const TI_ARGUMENT_TYPE_SCALAR: TiArgumentType = 4;
pub const TI_ARGUMENT_TYPE_TENSOR: TiArgumentType = 5;

// ---------------------------------------------------------------------------
// Usage flag bits
// ---------------------------------------------------------------------------

pub type TiMemoryUsageFlagBits = i32;
pub const TI_MEMORY_USAGE_STORAGE_BIT: TiMemoryUsageFlagBits = 1;
pub const TI_MEMORY_USAGE_UNIFORM_BIT: TiMemoryUsageFlagBits = 2;
pub const TI_MEMORY_USAGE_VERTEX_BIT: TiMemoryUsageFlagBits = 4;
pub const TI_MEMORY_USAGE_INDEX_BIT: TiMemoryUsageFlagBits = 8;
pub type TiMemoryUsageFlags = TiFlags;

pub type TiImageUsageFlagBits = i32;
pub const TI_IMAGE_USAGE_STORAGE_BIT: TiImageUsageFlagBits = 1;
pub const TI_IMAGE_USAGE_SAMPLED_BIT: TiImageUsageFlagBits = 2;
pub const TI_IMAGE_USAGE_ATTACHMENT_BIT: TiImageUsageFlagBits = 4;
pub type TiImageUsageFlags = TiFlags;

// ---------------------------------------------------------------------------
// Images and samplers
// ---------------------------------------------------------------------------

pub type TiImageDimension = i32;
pub const TI_IMAGE_DIMENSION_1D: TiImageDimension = 0;
pub const TI_IMAGE_DIMENSION_2D: TiImageDimension = 1;
pub const TI_IMAGE_DIMENSION_3D: TiImageDimension = 2;
pub const TI_IMAGE_DIMENSION_1D_ARRAY: TiImageDimension = 3;
pub const TI_IMAGE_DIMENSION_2D_ARRAY: TiImageDimension = 4;
pub const TI_IMAGE_DIMENSION_CUBE: TiImageDimension = 5;

pub type TiImageLayout = i32;
pub const TI_IMAGE_LAYOUT_UNDEFINED: TiImageLayout = 0;
pub const TI_IMAGE_LAYOUT_SHADER_READ: TiImageLayout = 1;
pub const TI_IMAGE_LAYOUT_SHADER_WRITE: TiImageLayout = 2;
pub const TI_IMAGE_LAYOUT_SHADER_READ_WRITE: TiImageLayout = 3;
pub const TI_IMAGE_LAYOUT_COLOR_ATTACHMENT: TiImageLayout = 4;
pub const TI_IMAGE_LAYOUT_COLOR_ATTACHMENT_READ: TiImageLayout = 5;
pub const TI_IMAGE_LAYOUT_DEPTH_ATTACHMENT: TiImageLayout = 6;
pub const TI_IMAGE_LAYOUT_DEPTH_ATTACHMENT_READ: TiImageLayout = 7;
pub const TI_IMAGE_LAYOUT_TRANSFER_DST: TiImageLayout = 8;
pub const TI_IMAGE_LAYOUT_TRANSFER_SRC: TiImageLayout = 9;
pub const TI_IMAGE_LAYOUT_PRESENT_SRC: TiImageLayout = 10;

pub type TiFormat = i32;
pub const TI_FORMAT_UNKNOWN: TiFormat = 0;
pub const TI_FORMAT_R8: TiFormat = 1;
pub const TI_FORMAT_RG8: TiFormat = 2;
pub const TI_FORMAT_RGBA8: TiFormat = 3;
pub const TI_FORMAT_RGBA8SRGB: TiFormat = 4;
pub const TI_FORMAT_BGRA8: TiFormat = 5;
pub const TI_FORMAT_BGRA8SRGB: TiFormat = 6;
pub const TI_FORMAT_R8U: TiFormat = 7;
pub const TI_FORMAT_RG8U: TiFormat = 8;
pub const TI_FORMAT_RGBA8U: TiFormat = 9;
pub const TI_FORMAT_R8I: TiFormat = 10;
pub const TI_FORMAT_RG8I: TiFormat = 11;
pub const TI_FORMAT_RGBA8I: TiFormat = 12;
pub const TI_FORMAT_R16: TiFormat = 13;
pub const TI_FORMAT_RG16: TiFormat = 14;
pub const TI_FORMAT_RGB16: TiFormat = 15;
pub const TI_FORMAT_RGBA16: TiFormat = 16;
pub const TI_FORMAT_R16U: TiFormat = 17;
pub const TI_FORMAT_RG16U: TiFormat = 18;
pub const TI_FORMAT_RGB16U: TiFormat = 19;
pub const TI_FORMAT_RGBA16U: TiFormat = 20;
pub const TI_FORMAT_R16I: TiFormat = 21;
pub const TI_FORMAT_RG16I: TiFormat = 22;
pub const TI_FORMAT_RGB16I: TiFormat = 23;
pub const TI_FORMAT_RGBA16I: TiFormat = 24;
pub const TI_FORMAT_R16F: TiFormat = 25;
pub const TI_FORMAT_RG16F: TiFormat = 26;
pub const TI_FORMAT_RGB16F: TiFormat = 27;
pub const TI_FORMAT_RGBA16F: TiFormat = 28;
pub const TI_FORMAT_R32U: TiFormat = 29;
pub const TI_FORMAT_RG32U: TiFormat = 30;
pub const TI_FORMAT_RGB32U: TiFormat = 31;
pub const TI_FORMAT_RGBA32U: TiFormat = 32;
pub const TI_FORMAT_R32I: TiFormat = 33;
pub const TI_FORMAT_RG32I: TiFormat = 34;
pub const TI_FORMAT_RGB32I: TiFormat = 35;
pub const TI_FORMAT_RGBA32I: TiFormat = 36;
pub const TI_FORMAT_R32F: TiFormat = 37;
pub const TI_FORMAT_RG32F: TiFormat = 38;
pub const TI_FORMAT_RGB32F: TiFormat = 39;
pub const TI_FORMAT_RGBA32F: TiFormat = 40;
pub const TI_FORMAT_DEPTH16: TiFormat = 41;
pub const TI_FORMAT_DEPTH24STENCIL8: TiFormat = 42;
pub const TI_FORMAT_DEPTH32F: TiFormat = 43;

pub type TiFilter = i32;
pub const TI_FILTER_NEAREST: TiFilter = 0;
pub const TI_FILTER_LINEAR: TiFilter = 1;

pub type TiAddressMode = i32;
pub const TI_ADDRESS_MODE_REPEAT: TiAddressMode = 0;
pub const TI_ADDRESS_MODE_MIRRORED_REPEAT: TiAddressMode = 1;
pub const TI_ADDRESS_MODE_CLAMP_TO_EDGE: TiAddressMode = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_contiguous_negatives() {
        let codes = [
            TI_ERROR_NOT_SUPPORTED,
            TI_ERROR_CORRUPTED_DATA,
            TI_ERROR_NAME_NOT_FOUND,
            TI_ERROR_INVALID_ARGUMENT,
            TI_ERROR_ARGUMENT_NULL,
            TI_ERROR_ARGUMENT_OUT_OF_RANGE,
            TI_ERROR_ARGUMENT_NOT_FOUND,
            TI_ERROR_INVALID_INTEROP,
            TI_ERROR_INVALID_STATE,
            TI_ERROR_INCOMPATIBLE_MODULE,
            TI_ERROR_OUT_OF_MEMORY,
        ];
        for (i, code) in codes.iter().enumerate() {
            assert_eq!(*code, -(i as i32) - 1);
        }
    }

    #[test]
    fn test_enum_anchor_values() {
        assert_eq!(TI_ARCH_VULKAN, 1);
        assert_eq!(TI_ARCH_GLES, 7);
        assert_eq!(TI_DATA_TYPE_UNKNOWN, 13);
        assert_eq!(TI_ARGUMENT_TYPE_TENSOR, 5);
        assert_eq!(TI_IMAGE_LAYOUT_PRESENT_SRC, 10);
        assert_eq!(TI_FORMAT_DEPTH32F, 43);
        assert_eq!(TI_CAPABILITY_SPIRV_HAS_NO_INTEGER_WRAP_DECORATION, 24);
        assert_eq!(TI_ADDRESS_MODE_CLAMP_TO_EDGE, 2);
    }

    #[test]
    fn test_flag_bits_are_single_bits() {
        for bit in [
            TI_MEMORY_USAGE_STORAGE_BIT,
            TI_MEMORY_USAGE_UNIFORM_BIT,
            TI_MEMORY_USAGE_VERTEX_BIT,
            TI_MEMORY_USAGE_INDEX_BIT,
            TI_IMAGE_USAGE_STORAGE_BIT,
            TI_IMAGE_USAGE_SAMPLED_BIT,
            TI_IMAGE_USAGE_ATTACHMENT_BIT,
        ] {
            assert_eq!(bit.count_ones(), 1);
        }
    }
}
