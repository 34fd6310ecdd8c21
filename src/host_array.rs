// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Host-side N-dimensional arrays.
//!
//! [`HostArray`] is the byte-level form an ND-array takes on its way to and
//! from a device staging buffer: raw little-endian bytes, a shape, and a
//! native element type. It converts from and to typed slices and Candle
//! tensors.

use candle_core::{Device, Tensor};

use crate::dtype::{bytes_per_element, to_candle_dtype, DTypeExt};
use crate::enums::DataType;
use crate::error::{Result, TaichiError};

/// A host element type with a native counterpart.
pub trait Element: Copy + Send + Sync + 'static {
    /// Native element type.
    const DATA_TYPE: DataType;
    /// Width in bytes.
    const WIDTH: usize;

    /// Append the little-endian encoding of `self`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode from exactly [`Self::WIDTH`] little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident, $width:literal;)+) => {
        $(
            impl Element for $ty {
                const DATA_TYPE: DataType = DataType::$dtype;
                const WIDTH: usize = $width;

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; $width];
                    buf.copy_from_slice(&bytes[..$width]);
                    <$ty>::from_le_bytes(buf)
                }
            }
        )+
    };
}

impl_element! {
    i8 => I8, 1;
    i16 => I16, 2;
    i32 => I32, 4;
    i64 => I64, 8;
    u8 => U8, 1;
    u16 => U16, 2;
    u32 => U32, 4;
    u64 => U64, 8;
    half::f16 => F16, 2;
    f32 => F32, 4;
    f64 => F64, 8;
}

/// Raw bytes plus the shape and element type needed to rebuild an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostArray {
    /// Element data as little-endian bytes, row-major.
    pub bytes: Vec<u8>,
    /// Array shape. An empty shape is a rank-0 (single element) array.
    pub shape: Vec<usize>,
    /// Native element type.
    pub dtype: DataType,
}

impl HostArray {
    /// Create a host array after checking that `bytes` matches `shape`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedElementType` for a dtype without a fixed width and
    /// `InvalidArgument` if the byte count does not equal
    /// `element_count * element_width`.
    pub fn new(bytes: Vec<u8>, shape: Vec<usize>, dtype: DataType) -> Result<Self> {
        let width = element_width(dtype)?;
        let expected = checked_byte_len(&shape, width)?;
        if bytes.len() != expected {
            return Err(TaichiError::invalid_argument(format!(
                "{} bytes do not match shape {shape:?} of {dtype} ({expected} bytes)",
                bytes.len()
            )));
        }
        Ok(Self {
            bytes,
            shape,
            dtype,
        })
    }

    /// Build a host array from a typed slice.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `data.len()` is not the product of `shape`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use taichi_aot::{DataType, HostArray};
    ///
    /// let a = HostArray::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2])?;
    /// assert_eq!(a.dtype, DataType::F32);
    /// assert_eq!(a.size_bytes(), 16);
    /// assert_eq!(a.to_vec::<f32>()?, vec![1.0, 2.0, 3.0, 4.0]);
    /// # Ok::<(), taichi_aot::TaichiError>(())
    /// ```
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        let numel = checked_numel(shape)?;
        if data.len() != numel {
            return Err(TaichiError::invalid_argument(format!(
                "{} elements do not fill shape {shape:?} ({numel} elements)",
                data.len()
            )));
        }
        let mut bytes = Vec::with_capacity(numel * T::WIDTH);
        for &v in data {
            v.write_le(&mut bytes);
        }
        Ok(Self {
            bytes,
            shape: shape.to_vec(),
            dtype: T::DATA_TYPE,
        })
    }

    /// Build a host array from a Candle tensor.
    ///
    /// The tensor is made contiguous and copied to the host if needed.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedElementType` for dtypes without a native
    /// counterpart (bf16 and the sub-16-bit float formats).
    pub fn from_tensor(tensor: &Tensor) -> Result<Self> {
        let dtype = tensor.dtype().to_data_type()?;
        let shape = tensor.dims().to_vec();
        let flat = tensor.contiguous()?.flatten_all()?;

        let bytes = match dtype {
            DataType::U8 => encode(&flat.to_vec1::<u8>()?),
            DataType::U32 => encode(&flat.to_vec1::<u32>()?),
            DataType::I16 => encode(&flat.to_vec1::<i16>()?),
            DataType::I32 => encode(&flat.to_vec1::<i32>()?),
            DataType::I64 => encode(&flat.to_vec1::<i64>()?),
            DataType::F16 => encode(&flat.to_vec1::<half::f16>()?),
            DataType::F32 => encode(&flat.to_vec1::<f32>()?),
            DataType::F64 => encode(&flat.to_vec1::<f64>()?),
            other => return Err(TaichiError::unsupported_element_type(other.name())),
        };

        Ok(Self {
            bytes,
            shape,
            dtype,
        })
    }

    /// Get the total number of elements.
    #[must_use]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Get the size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Decode the elements as `T`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `T` does not match the array's dtype.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DATA_TYPE != self.dtype {
            return Err(TaichiError::invalid_argument(format!(
                "array holds {}, not {}",
                self.dtype,
                T::DATA_TYPE
            )));
        }
        Ok(self.bytes.chunks_exact(T::WIDTH).map(T::read_le).collect())
    }

    /// Convert to a Candle tensor on `device`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedElementType` if Candle has no matching dtype.
    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        let shape = self.shape.as_slice();
        let tensor = match self.dtype {
            DataType::U8 => Tensor::from_vec(self.to_vec::<u8>()?, shape, device)?,
            DataType::U32 => Tensor::from_vec(self.to_vec::<u32>()?, shape, device)?,
            DataType::I16 => Tensor::from_vec(self.to_vec::<i16>()?, shape, device)?,
            DataType::I32 => Tensor::from_vec(self.to_vec::<i32>()?, shape, device)?,
            DataType::I64 => Tensor::from_vec(self.to_vec::<i64>()?, shape, device)?,
            DataType::F16 => Tensor::from_vec(self.to_vec::<half::f16>()?, shape, device)?,
            DataType::F32 => Tensor::from_vec(self.to_vec::<f32>()?, shape, device)?,
            DataType::F64 => Tensor::from_vec(self.to_vec::<f64>()?, shape, device)?,
            other => return Err(TaichiError::unsupported_element_type(other.name())),
        };
        debug_assert_eq!(to_candle_dtype(self.dtype), Some(tensor.dtype()));
        Ok(tensor)
    }
}

fn encode<T: Element>(data: &[T]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(data.len() * T::WIDTH);
    for &v in data {
        v.write_le(&mut bytes);
    }
    bytes
}

pub(crate) fn element_width(dtype: DataType) -> Result<usize> {
    bytes_per_element(dtype).ok_or_else(|| TaichiError::unsupported_element_type(dtype.name()))
}

fn checked_numel(shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| TaichiError::invalid_argument(format!("shape {shape:?} overflows usize")))
}

pub(crate) fn checked_byte_len(shape: &[usize], width: usize) -> Result<usize> {
    checked_numel(shape)?
        .checked_mul(width)
        .ok_or_else(|| TaichiError::invalid_argument(format!("shape {shape:?} overflows usize")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;

    #[test]
    fn test_host_array_from_slice() {
        let a = HostArray::from_slice(&[1i32, -2, 3, -4, 5, -6], &[2, 3]).unwrap();
        assert_eq!(a.numel(), 6);
        assert_eq!(a.size_bytes(), 24);
        assert_eq!(a.dtype, DataType::I32);
        assert_eq!(&a.bytes[4..8], &(-2i32).to_le_bytes());
    }

    #[test]
    fn test_host_array_rejects_ragged_data() {
        let err = HostArray::from_slice(&[1.0f32, 2.0, 3.0], &[2, 2]).unwrap_err();
        assert!(matches!(err, TaichiError::InvalidArgument(_)));
    }

    #[test]
    fn test_host_array_new_checks_byte_count() {
        assert!(HostArray::new(vec![0u8; 8], vec![2], DataType::F32).is_ok());
        assert!(HostArray::new(vec![0u8; 7], vec![2], DataType::F32).is_err());
        assert!(matches!(
            HostArray::new(vec![], vec![0], DataType::Gen).unwrap_err(),
            TaichiError::UnsupportedElementType { .. }
        ));
    }

    #[test]
    fn test_to_vec_checks_dtype() {
        let a = HostArray::from_slice(&[1u16, 2], &[2]).unwrap();
        assert_eq!(a.to_vec::<u16>().unwrap(), vec![1, 2]);
        assert!(a.to_vec::<i16>().is_err());
    }

    #[test]
    fn test_f16_elements_are_two_bytes() {
        let data = [half::f16::from_f32(0.5), half::f16::from_f32(-1.0)];
        let a = HostArray::from_slice(&data, &[2]).unwrap();
        assert_eq!(a.size_bytes(), 4);
        assert_eq!(a.to_vec::<half::f16>().unwrap(), data.to_vec());
    }

    #[test]
    fn test_rank_zero_array() {
        let a = HostArray::from_slice(&[42u64], &[]).unwrap();
        assert_eq!(a.numel(), 1);
        assert_eq!(a.to_vec::<u64>().unwrap(), vec![42]);
    }

    #[test]
    fn test_tensor_conversion() {
        let device = Device::Cpu;
        let tensor = Tensor::arange(0f32, 12f32, &device)
            .unwrap()
            .reshape((3, 4))
            .unwrap();
        let a = HostArray::from_tensor(&tensor).unwrap();
        assert_eq!(a.shape, vec![3, 4]);
        assert_eq!(a.dtype, DataType::F32);

        let back = a.to_tensor(&device).unwrap();
        assert_eq!(back.dims(), &[3, 4]);
        assert_eq!(
            back.flatten_all().unwrap().to_vec1::<f32>().unwrap(),
            tensor.flatten_all().unwrap().to_vec1::<f32>().unwrap()
        );
    }

    #[test]
    fn test_bf16_tensor_is_rejected() {
        let tensor = Tensor::zeros((2, 2), DType::BF16, &Device::Cpu).unwrap();
        assert!(matches!(
            HostArray::from_tensor(&tensor).unwrap_err(),
            TaichiError::UnsupportedElementType { .. }
        ));
    }

    #[test]
    fn test_i32_tensor_maps_directly() {
        let tensor = Tensor::new(&[1i32, -2, 3], &Device::Cpu).unwrap();
        let a = HostArray::from_tensor(&tensor).unwrap();
        assert_eq!(a.dtype, DataType::I32);
        assert_eq!(a.to_vec::<i32>().unwrap(), vec![1, -2, 3]);

        let back = a.to_tensor(&Device::Cpu).unwrap();
        assert_eq!(back.dtype(), DType::I32);
        assert_eq!(back.to_vec1::<i32>().unwrap(), vec![1, -2, 3]);
    }

    #[test]
    fn test_i16_tensor_maps_directly() {
        let tensor = Tensor::new(&[7i16, -8], &Device::Cpu).unwrap();
        let a = HostArray::from_tensor(&tensor).unwrap();
        assert_eq!(a.dtype, DataType::I16);
        assert_eq!(a.size_bytes(), 4);
        assert_eq!(a.to_vec::<i16>().unwrap(), vec![7, -8]);
    }

    #[test]
    fn test_u16_has_no_tensor_form() {
        let a = HostArray::from_slice(&[1u16, 2], &[2]).unwrap();
        assert!(matches!(
            a.to_tensor(&Device::Cpu).unwrap_err(),
            TaichiError::UnsupportedElementType { .. }
        ));
    }
}
