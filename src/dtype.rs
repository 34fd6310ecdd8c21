// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Element data type utilities.
//!
//! ## Why This Module Exists
//!
//! ND-array arguments carry a native element type tag, and the staging buffer
//! must be sized from the element width. Host arrays arrive either as typed
//! slices or as Candle tensors, so this module owns the one mapping between
//! `candle_core::DType`, the native [`DataType`], and byte widths.
//!
//! ## Design Decisions
//!
//! - **Extension trait pattern**: `DTypeExt` extends `candle_core::DType` rather
//!   than wrapping it.
//! - **No lossy fallbacks**: a host dtype without an exact native counterpart
//!   (bf16, the 8-bit float formats) is an `UnsupportedElementType` error, never
//!   a silent cast. `f16` is 2 bytes wide on both sides.

use candle_core::DType;

use crate::enums::DataType;
use crate::error::{Result, TaichiError};
use crate::sys::structs::data_type_width;

/// Get the size in bytes of one element of `dtype`.
///
/// Returns `None` for `Gen` and `Unknown`, which have no fixed width.
///
/// ## Example
///
/// ```rust
/// use taichi_aot::{bytes_per_element, DataType};
///
/// assert_eq!(bytes_per_element(DataType::F16), Some(2));
/// assert_eq!(bytes_per_element(DataType::I64), Some(8));
/// assert_eq!(bytes_per_element(DataType::Gen), None);
/// ```
#[must_use]
pub fn bytes_per_element(dtype: DataType) -> Option<usize> {
    data_type_width(dtype.as_raw())
}

/// Check if a native data type is a floating-point type.
#[must_use]
pub fn is_floating_point(dtype: DataType) -> bool {
    matches!(dtype, DataType::F16 | DataType::F32 | DataType::F64)
}

/// Map a native data type to the Candle dtype with the same layout.
///
/// Candle has no `i8`, `u16` or `u64`, so those return `None`; use typed
/// slices for them instead.
#[must_use]
pub fn to_candle_dtype(dtype: DataType) -> Option<DType> {
    match dtype {
        DataType::U8 => Some(DType::U8),
        DataType::U32 => Some(DType::U32),
        DataType::I16 => Some(DType::I16),
        DataType::I32 => Some(DType::I32),
        DataType::I64 => Some(DType::I64),
        DataType::F16 => Some(DType::F16),
        DataType::F32 => Some(DType::F32),
        DataType::F64 => Some(DType::F64),
        _ => None,
    }
}

/// Extension trait adding native-type queries to `candle_core::DType`.
///
/// ## Example
///
/// ```rust
/// use taichi_aot::{DTypeExt, DataType};
/// use candle_core::DType;
///
/// assert_eq!(DType::F32.to_data_type().unwrap(), DataType::F32);
/// assert!(DType::BF16.to_data_type().is_err());
/// ```
pub trait DTypeExt {
    /// The native element type with an identical byte layout.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedElementType` if there is no such type.
    fn to_data_type(&self) -> Result<DataType>;

    /// Lowercase name of this dtype, e.g. `"bf16"` or `"f8e4m3"`.
    fn name(&self) -> String;
}

impl DTypeExt for DType {
    fn to_data_type(&self) -> Result<DataType> {
        match self {
            DType::U8 => Ok(DataType::U8),
            DType::U32 => Ok(DataType::U32),
            DType::I16 => Ok(DataType::I16),
            DType::I32 => Ok(DataType::I32),
            DType::I64 => Ok(DataType::I64),
            DType::F16 => Ok(DataType::F16),
            DType::F32 => Ok(DataType::F32),
            DType::F64 => Ok(DataType::F64),
            other => Err(TaichiError::unsupported_element_type(other.name())),
        }
    }

    fn name(&self) -> String {
        format!("{self:?}").to_ascii_lowercase()
    }
}

/// Parse a dtype name such as `"f32"` or `"float32"`.
///
/// Accepts the native names plus NumPy spellings.
#[must_use]
pub fn parse_data_type(name: &str) -> Option<DataType> {
    let canonical = match name.to_ascii_lowercase().as_str() {
        "float16" | "half" => "f16",
        "float32" | "float" => "f32",
        "float64" | "double" => "f64",
        "int8" => "i8",
        "int16" => "i16",
        "int32" | "int" => "i32",
        "int64" | "long" => "i64",
        "uint8" => "u8",
        "uint16" => "u16",
        "uint32" => "u32",
        "uint64" => "u64",
        other => return DataType::from_name(other),
    };
    DataType::from_name(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_element() {
        assert_eq!(bytes_per_element(DataType::F32), Some(4));
        assert_eq!(bytes_per_element(DataType::F16), Some(2));
        assert_eq!(bytes_per_element(DataType::F64), Some(8));
        assert_eq!(bytes_per_element(DataType::U8), Some(1));
        assert_eq!(bytes_per_element(DataType::I16), Some(2));
        assert_eq!(bytes_per_element(DataType::U64), Some(8));
        assert_eq!(bytes_per_element(DataType::Unknown), None);
    }

    #[test]
    fn test_is_floating_point() {
        assert!(is_floating_point(DataType::F16));
        assert!(is_floating_point(DataType::F64));
        assert!(!is_floating_point(DataType::U8));
        assert!(!is_floating_point(DataType::I64));
    }

    #[test]
    fn test_candle_mapping_round_trips() {
        for dtype in [
            DType::U8,
            DType::U32,
            DType::I16,
            DType::I32,
            DType::I64,
            DType::F16,
            DType::F32,
            DType::F64,
        ] {
            let native = dtype.to_data_type().unwrap();
            assert_eq!(to_candle_dtype(native), Some(dtype));
            assert_eq!(bytes_per_element(native), Some(dtype.size_in_bytes()));
        }
    }

    #[test]
    fn test_bf16_is_unsupported() {
        let err = DType::BF16.to_data_type().unwrap_err();
        assert!(matches!(err, TaichiError::UnsupportedElementType { .. }));
        assert!(err.to_string().contains("bf16"));
    }

    #[test]
    fn test_float8_reports_its_name() {
        assert_eq!(DType::F8E4M3.name(), "f8e4m3");
        let err = DType::F8E4M3.to_data_type().unwrap_err();
        assert!(err.to_string().contains("f8e4m3"));
    }

    #[test]
    fn test_parse_data_type() {
        assert_eq!(parse_data_type("float32"), Some(DataType::F32));
        assert_eq!(parse_data_type("F16"), Some(DataType::F16));
        assert_eq!(parse_data_type("uint16"), Some(DataType::U16));
        assert_eq!(parse_data_type("i8"), Some(DataType::I8));
        assert_eq!(parse_data_type("complex64"), None);
    }
}
