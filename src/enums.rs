// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Typed views of the raw ABI enumerations.
//!
//! The raw constants in [`crate::sys::types`] are what crosses the boundary.
//! These enums are what the safe API takes and returns; each converts with
//! `as_raw()` / `from_raw()` and has a stable lowercase `name()`.

use bitflags::bitflags;

use crate::sys::types as raw;

macro_rules! abi_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $raw_ty:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $value:path => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(missing_docs)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every variant, in raw-value order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The raw ABI value.
            #[must_use]
            pub fn as_raw(self) -> $raw_ty {
                match self {
                    $( Self::$variant => $value, )+
                }
            }

            /// Decode a raw ABI value.
            #[must_use]
            pub fn from_raw(value: $raw_ty) -> Option<Self> {
                match value {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Lowercase name.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )+
                }
            }

            /// Parse a name produced by [`Self::name`], case-insensitively.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name().eq_ignore_ascii_case(name))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

abi_enum! {
    /// Backend architecture a runtime executes on.
    Arch: raw::TiArch {
        /// Placeholder; never a valid runtime target.
        Reserved = raw::TI_ARCH_RESERVED => "reserved",
        Vulkan = raw::TI_ARCH_VULKAN => "vulkan",
        Metal = raw::TI_ARCH_METAL => "metal",
        Cuda = raw::TI_ARCH_CUDA => "cuda",
        X64 = raw::TI_ARCH_X64 => "x64",
        Arm64 = raw::TI_ARCH_ARM64 => "arm64",
        OpenGl = raw::TI_ARCH_OPENGL => "opengl",
        Gles = raw::TI_ARCH_GLES => "gles",
    }
}

impl Arch {
    /// Whether the arch executes on the host CPU.
    #[must_use]
    pub fn is_cpu(self) -> bool {
        matches!(self, Self::X64 | Self::Arm64)
    }
}

abi_enum! {
    /// Device capability that can be queried or overridden on a runtime.
    Capability: raw::TiCapability {
        Reserved = raw::TI_CAPABILITY_RESERVED => "reserved",
        SpirvVersion = raw::TI_CAPABILITY_SPIRV_VERSION => "spirv_version",
        SpirvHasInt8 = raw::TI_CAPABILITY_SPIRV_HAS_INT8 => "spirv_has_int8",
        SpirvHasInt16 = raw::TI_CAPABILITY_SPIRV_HAS_INT16 => "spirv_has_int16",
        SpirvHasInt64 = raw::TI_CAPABILITY_SPIRV_HAS_INT64 => "spirv_has_int64",
        SpirvHasFloat16 = raw::TI_CAPABILITY_SPIRV_HAS_FLOAT16 => "spirv_has_float16",
        SpirvHasFloat64 = raw::TI_CAPABILITY_SPIRV_HAS_FLOAT64 => "spirv_has_float64",
        SpirvHasAtomicInt64 = raw::TI_CAPABILITY_SPIRV_HAS_ATOMIC_INT64 => "spirv_has_atomic_int64",
        SpirvHasAtomicFloat16 = raw::TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT16 => "spirv_has_atomic_float16",
        SpirvHasAtomicFloat16Add = raw::TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT16_ADD => "spirv_has_atomic_float16_add",
        SpirvHasAtomicFloat16MinMax = raw::TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT16_MINMAX => "spirv_has_atomic_float16_minmax",
        SpirvHasAtomicFloat = raw::TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT => "spirv_has_atomic_float",
        SpirvHasAtomicFloatAdd = raw::TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT_ADD => "spirv_has_atomic_float_add",
        SpirvHasAtomicFloatMinMax = raw::TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT_MINMAX => "spirv_has_atomic_float_minmax",
        SpirvHasAtomicFloat64 = raw::TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT64 => "spirv_has_atomic_float64",
        SpirvHasAtomicFloat64Add = raw::TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT64_ADD => "spirv_has_atomic_float64_add",
        SpirvHasAtomicFloat64MinMax = raw::TI_CAPABILITY_SPIRV_HAS_ATOMIC_FLOAT64_MINMAX => "spirv_has_atomic_float64_minmax",
        SpirvHasVariablePtr = raw::TI_CAPABILITY_SPIRV_HAS_VARIABLE_PTR => "spirv_has_variable_ptr",
        SpirvHasPhysicalStorageBuffer = raw::TI_CAPABILITY_SPIRV_HAS_PHYSICAL_STORAGE_BUFFER => "spirv_has_physical_storage_buffer",
        SpirvHasSubgroupBasic = raw::TI_CAPABILITY_SPIRV_HAS_SUBGROUP_BASIC => "spirv_has_subgroup_basic",
        SpirvHasSubgroupVote = raw::TI_CAPABILITY_SPIRV_HAS_SUBGROUP_VOTE => "spirv_has_subgroup_vote",
        SpirvHasSubgroupArithmetic = raw::TI_CAPABILITY_SPIRV_HAS_SUBGROUP_ARITHMETIC => "spirv_has_subgroup_arithmetic",
        SpirvHasSubgroupBallot = raw::TI_CAPABILITY_SPIRV_HAS_SUBGROUP_BALLOT => "spirv_has_subgroup_ballot",
        SpirvHasNonSemanticInfo = raw::TI_CAPABILITY_SPIRV_HAS_NON_SEMANTIC_INFO => "spirv_has_non_semantic_info",
        SpirvHasNoIntegerWrapDecoration = raw::TI_CAPABILITY_SPIRV_HAS_NO_INTEGER_WRAP_DECORATION => "spirv_has_no_integer_wrap_decoration",
    }
}

abi_enum! {
    /// Element type of ND-arrays, scalars and inline tensors.
    DataType: raw::TiDataType {
        F16 = raw::TI_DATA_TYPE_F16 => "f16",
        F32 = raw::TI_DATA_TYPE_F32 => "f32",
        F64 = raw::TI_DATA_TYPE_F64 => "f64",
        I8 = raw::TI_DATA_TYPE_I8 => "i8",
        I16 = raw::TI_DATA_TYPE_I16 => "i16",
        I32 = raw::TI_DATA_TYPE_I32 => "i32",
        I64 = raw::TI_DATA_TYPE_I64 => "i64",
        U1 = raw::TI_DATA_TYPE_U1 => "u1",
        U8 = raw::TI_DATA_TYPE_U8 => "u8",
        U16 = raw::TI_DATA_TYPE_U16 => "u16",
        U32 = raw::TI_DATA_TYPE_U32 => "u32",
        U64 = raw::TI_DATA_TYPE_U64 => "u64",
        Gen = raw::TI_DATA_TYPE_GEN => "gen",
        Unknown = raw::TI_DATA_TYPE_UNKNOWN => "unknown",
    }
}

abi_enum! {
    /// Tag of a kernel argument.
    ArgumentType: raw::TiArgumentType {
        I32 = raw::TI_ARGUMENT_TYPE_I32 => "i32",
        F32 = raw::TI_ARGUMENT_TYPE_F32 => "f32",
        NdArray = raw::TI_ARGUMENT_TYPE_NDARRAY => "ndarray",
        Texture = raw::TI_ARGUMENT_TYPE_TEXTURE => "texture",
        Scalar = raw::TI_ARGUMENT_TYPE_SCALAR => "scalar",
        Tensor = raw::TI_ARGUMENT_TYPE_TENSOR => "tensor",
    }
}

abi_enum! {
    /// Image dimensionality.
    ImageDimension: raw::TiImageDimension {
        D1 = raw::TI_IMAGE_DIMENSION_1D => "1d",
        D2 = raw::TI_IMAGE_DIMENSION_2D => "2d",
        D3 = raw::TI_IMAGE_DIMENSION_3D => "3d",
        D1Array = raw::TI_IMAGE_DIMENSION_1D_ARRAY => "1d_array",
        D2Array = raw::TI_IMAGE_DIMENSION_2D_ARRAY => "2d_array",
        Cube = raw::TI_IMAGE_DIMENSION_CUBE => "cube",
    }
}

abi_enum! {
    /// Image layout used by the native library for barrier insertion.
    ImageLayout: raw::TiImageLayout {
        Undefined = raw::TI_IMAGE_LAYOUT_UNDEFINED => "undefined",
        ShaderRead = raw::TI_IMAGE_LAYOUT_SHADER_READ => "shader_read",
        ShaderWrite = raw::TI_IMAGE_LAYOUT_SHADER_WRITE => "shader_write",
        ShaderReadWrite = raw::TI_IMAGE_LAYOUT_SHADER_READ_WRITE => "shader_read_write",
        ColorAttachment = raw::TI_IMAGE_LAYOUT_COLOR_ATTACHMENT => "color_attachment",
        ColorAttachmentRead = raw::TI_IMAGE_LAYOUT_COLOR_ATTACHMENT_READ => "color_attachment_read",
        DepthAttachment = raw::TI_IMAGE_LAYOUT_DEPTH_ATTACHMENT => "depth_attachment",
        DepthAttachmentRead = raw::TI_IMAGE_LAYOUT_DEPTH_ATTACHMENT_READ => "depth_attachment_read",
        TransferDst = raw::TI_IMAGE_LAYOUT_TRANSFER_DST => "transfer_dst",
        TransferSrc = raw::TI_IMAGE_LAYOUT_TRANSFER_SRC => "transfer_src",
        PresentSrc = raw::TI_IMAGE_LAYOUT_PRESENT_SRC => "present_src",
    }
}

abi_enum! {
    /// Texel format.
    Format: raw::TiFormat {
        Unknown = raw::TI_FORMAT_UNKNOWN => "unknown",
        R8 = raw::TI_FORMAT_R8 => "r8",
        Rg8 = raw::TI_FORMAT_RG8 => "rg8",
        Rgba8 = raw::TI_FORMAT_RGBA8 => "rgba8",
        Rgba8Srgb = raw::TI_FORMAT_RGBA8SRGB => "rgba8srgb",
        Bgra8 = raw::TI_FORMAT_BGRA8 => "bgra8",
        Bgra8Srgb = raw::TI_FORMAT_BGRA8SRGB => "bgra8srgb",
        R8U = raw::TI_FORMAT_R8U => "r8u",
        Rg8U = raw::TI_FORMAT_RG8U => "rg8u",
        Rgba8U = raw::TI_FORMAT_RGBA8U => "rgba8u",
        R8I = raw::TI_FORMAT_R8I => "r8i",
        Rg8I = raw::TI_FORMAT_RG8I => "rg8i",
        Rgba8I = raw::TI_FORMAT_RGBA8I => "rgba8i",
        R16 = raw::TI_FORMAT_R16 => "r16",
        Rg16 = raw::TI_FORMAT_RG16 => "rg16",
        Rgb16 = raw::TI_FORMAT_RGB16 => "rgb16",
        Rgba16 = raw::TI_FORMAT_RGBA16 => "rgba16",
        R16U = raw::TI_FORMAT_R16U => "r16u",
        Rg16U = raw::TI_FORMAT_RG16U => "rg16u",
        Rgb16U = raw::TI_FORMAT_RGB16U => "rgb16u",
        Rgba16U = raw::TI_FORMAT_RGBA16U => "rgba16u",
        R16I = raw::TI_FORMAT_R16I => "r16i",
        Rg16I = raw::TI_FORMAT_RG16I => "rg16i",
        Rgb16I = raw::TI_FORMAT_RGB16I => "rgb16i",
        Rgba16I = raw::TI_FORMAT_RGBA16I => "rgba16i",
        R16F = raw::TI_FORMAT_R16F => "r16f",
        Rg16F = raw::TI_FORMAT_RG16F => "rg16f",
        Rgb16F = raw::TI_FORMAT_RGB16F => "rgb16f",
        Rgba16F = raw::TI_FORMAT_RGBA16F => "rgba16f",
        R32U = raw::TI_FORMAT_R32U => "r32u",
        Rg32U = raw::TI_FORMAT_RG32U => "rg32u",
        Rgb32U = raw::TI_FORMAT_RGB32U => "rgb32u",
        Rgba32U = raw::TI_FORMAT_RGBA32U => "rgba32u",
        R32I = raw::TI_FORMAT_R32I => "r32i",
        Rg32I = raw::TI_FORMAT_RG32I => "rg32i",
        Rgb32I = raw::TI_FORMAT_RGB32I => "rgb32i",
        Rgba32I = raw::TI_FORMAT_RGBA32I => "rgba32i",
        R32F = raw::TI_FORMAT_R32F => "r32f",
        Rg32F = raw::TI_FORMAT_RG32F => "rg32f",
        Rgb32F = raw::TI_FORMAT_RGB32F => "rgb32f",
        Rgba32F = raw::TI_FORMAT_RGBA32F => "rgba32f",
        Depth16 = raw::TI_FORMAT_DEPTH16 => "depth16",
        Depth24Stencil8 = raw::TI_FORMAT_DEPTH24STENCIL8 => "depth24stencil8",
        Depth32F = raw::TI_FORMAT_DEPTH32F => "depth32f",
    }
}

abi_enum! {
    /// Sampler filter mode.
    Filter: raw::TiFilter {
        Nearest = raw::TI_FILTER_NEAREST => "nearest",
        Linear = raw::TI_FILTER_LINEAR => "linear",
    }
}

abi_enum! {
    /// Sampler address mode.
    AddressMode: raw::TiAddressMode {
        Repeat = raw::TI_ADDRESS_MODE_REPEAT => "repeat",
        MirroredRepeat = raw::TI_ADDRESS_MODE_MIRRORED_REPEAT => "mirrored_repeat",
        ClampToEdge = raw::TI_ADDRESS_MODE_CLAMP_TO_EDGE => "clamp_to_edge",
    }
}

bitflags! {
    /// How a memory allocation will be bound.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemoryUsage: u32 {
        /// Storage buffer; required for kernel ND-array arguments.
        const STORAGE = raw::TI_MEMORY_USAGE_STORAGE_BIT as u32;
        /// Uniform buffer.
        const UNIFORM = raw::TI_MEMORY_USAGE_UNIFORM_BIT as u32;
        /// Vertex buffer.
        const VERTEX = raw::TI_MEMORY_USAGE_VERTEX_BIT as u32;
        /// Index buffer.
        const INDEX = raw::TI_MEMORY_USAGE_INDEX_BIT as u32;
    }
}

bitflags! {
    /// How an image allocation will be bound.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        /// Storage image.
        const STORAGE = raw::TI_IMAGE_USAGE_STORAGE_BIT as u32;
        /// Sampled texture.
        const SAMPLED = raw::TI_IMAGE_USAGE_SAMPLED_BIT as u32;
        /// Render attachment.
        const ATTACHMENT = raw::TI_IMAGE_USAGE_ATTACHMENT_BIT as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values_round_trip() {
        for arch in Arch::ALL {
            assert_eq!(Arch::from_raw(arch.as_raw()), Some(*arch));
        }
        for format in Format::ALL {
            assert_eq!(Format::from_raw(format.as_raw()), Some(*format));
        }
        assert_eq!(Format::ALL.len(), 44);
        assert_eq!(Capability::ALL.len(), 25);
        assert_eq!(ImageLayout::ALL.len(), 11);
    }

    #[test]
    fn test_raw_values_match_header() {
        assert_eq!(Arch::Vulkan.as_raw(), 1);
        assert_eq!(Arch::Gles.as_raw(), 7);
        assert_eq!(DataType::F16.as_raw(), 0);
        assert_eq!(DataType::U64.as_raw(), 11);
        assert_eq!(ArgumentType::NdArray.as_raw(), 2);
        assert_eq!(ImageDimension::Cube.as_raw(), 5);
        assert_eq!(Format::Rgba32F.as_raw(), 40);
        assert_eq!(AddressMode::MirroredRepeat.as_raw(), 1);
    }

    #[test]
    fn test_unknown_raw_values_rejected() {
        assert_eq!(Arch::from_raw(8), None);
        assert_eq!(Arch::from_raw(-1), None);
        assert_eq!(Filter::from_raw(2), None);
    }

    #[test]
    fn test_names_parse_back() {
        assert_eq!(Arch::from_name("VULKAN"), Some(Arch::Vulkan));
        assert_eq!(DataType::from_name("f32"), Some(DataType::F32));
        assert_eq!(Arch::from_name("tpu"), None);
        assert_eq!(Arch::Cuda.to_string(), "cuda");
    }

    #[test]
    fn test_cpu_arches() {
        assert!(Arch::X64.is_cpu());
        assert!(Arch::Arm64.is_cpu());
        assert!(!Arch::Vulkan.is_cpu());
    }

    #[test]
    fn test_usage_flags_bits() {
        assert_eq!(MemoryUsage::STORAGE.bits(), 1);
        assert_eq!((MemoryUsage::STORAGE | MemoryUsage::INDEX).bits(), 9);
        assert_eq!(ImageUsage::all().bits(), 7);
    }
}
