// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Kernel arguments and ND-array staging.
//!
//! ## Argument Forms
//!
//! - [`Argument`] is the typed form of one native argument and converts to the
//!   tagged `TiArgument` with [`Argument::to_raw`].
//! - [`HostValue`] is what callers hand to [`StagedArguments::stage`]: plain
//!   scalars, host arrays that still need a device copy, or an already built
//!   [`Argument`] passed through unchanged.
//! - [`NamedArgument`] pairs an argument with a name for compute graphs.
//!
//! ## Staging
//!
//! Every [`HostValue::Array`] is copied into a fresh host-visible storage
//! allocation before launch. After the launch and [`crate::Runtime::wait`],
//! [`StagedArguments::read_back`] copies each allocation back into a
//! [`HostArray`] and frees it. [`StagedArguments::release`] frees without
//! reading.
//!
//! | Host value | Native argument |
//! |------------|-----------------|
//! | `I32(i32)` | `TI_ARGUMENT_TYPE_I32` |
//! | `F32(f32)` | `TI_ARGUMENT_TYPE_F32` |
//! | `Array(HostArray)` | `TI_ARGUMENT_TYPE_NDARRAY` over a staged allocation |
//! | `Raw(Argument)` | the argument's own tag |
//! | `Bound { argument, runtime }` | the argument's own tag, after a runtime check |
//!
//! Prefer [`HostValue::ndarray`] and [`HostValue::texture`] over wrapping
//! [`Argument::ndarray`] in `Raw`: they remember the owning runtime, and
//! staging rejects them on any other runtime.

use std::ffi::{CStr, CString};

use crate::enums::{ArgumentType, DataType};
use crate::error::{Result, TaichiError};
use crate::host_array::{checked_byte_len, element_width, Element, HostArray};
use crate::image::Image;
use crate::logging::log_staging;
use crate::memory::{Memory, MemoryAllocateInfo};
use crate::runtime::Runtime;
use crate::sampler::Sampler;
use crate::sys::handles::{TiRuntime, TiSampler};
use crate::sys::structs::{
    TiArgument, TiNamedArgument, TiNdArray, TiNdShape, TiScalar, TiScalarValue, TiTensor,
    TiTensorValue, TiTexture,
};
use crate::traits::RuntimeBound;

/// One kernel argument.
#[derive(Debug, Clone, Copy)]
pub enum Argument {
    /// 32-bit signed integer.
    I32(i32),
    /// 32-bit float.
    F32(f32),
    /// Device ND-array.
    NdArray(TiNdArray),
    /// Image plus optional sampler.
    Texture(TiTexture),
    /// Typed scalar of any element type.
    Scalar(TiScalar),
    /// Small inline tensor of up to 128 bytes.
    Tensor(TiTensor),
}

impl Argument {
    /// Argument type tag.
    #[must_use]
    pub fn argument_type(&self) -> ArgumentType {
        match self {
            Self::I32(_) => ArgumentType::I32,
            Self::F32(_) => ArgumentType::F32,
            Self::NdArray(_) => ArgumentType::NdArray,
            Self::Texture(_) => ArgumentType::Texture,
            Self::Scalar(_) => ArgumentType::Scalar,
            Self::Tensor(_) => ArgumentType::Tensor,
        }
    }

    /// The tagged ABI form.
    #[must_use]
    pub fn to_raw(&self) -> TiArgument {
        match *self {
            Self::I32(v) => TiArgument::i32(v),
            Self::F32(v) => TiArgument::f32(v),
            Self::NdArray(v) => TiArgument::ndarray(v),
            Self::Texture(v) => TiArgument::texture(v),
            Self::Scalar(v) => TiArgument::scalar(v),
            Self::Tensor(v) => TiArgument::tensor(v),
        }
    }

    /// Bind an existing allocation as an ND-array.
    ///
    /// `elem_shape` equals `shape`, matching how staged arrays are bound.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the shape is invalid or does not fit the
    /// allocation, and `UnsupportedElementType` for a dtype without a width.
    pub fn ndarray(memory: &Memory<'_>, shape: &[usize], elem_type: DataType) -> Result<Self> {
        let needed = checked_byte_len(shape, element_width(elem_type)?)?;
        if needed as u64 > memory.size() {
            return Err(TaichiError::invalid_argument(format!(
                "shape {shape:?} of {elem_type} needs {needed} bytes, allocation has {}",
                memory.size()
            )));
        }
        let nd_shape = TiNdShape::new(shape)?;
        Ok(Self::NdArray(TiNdArray {
            memory: memory.handle(),
            shape: nd_shape,
            elem_shape: nd_shape,
            elem_type: elem_type.as_raw(),
        }))
    }

    /// Bind an image, optionally with a sampler, as a texture.
    #[must_use]
    pub fn texture(image: &Image<'_>, sampler: Option<&Sampler<'_>>) -> Self {
        let info = image.info();
        Self::Texture(TiTexture {
            image: image.handle(),
            sampler: sampler.map_or(TiSampler::null(), Sampler::handle),
            dimension: info.dimension.as_raw(),
            extent: info.extent,
            format: info.format.as_raw(),
        })
    }

    /// A typed scalar.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn scalar<T: Element>(value: T) -> Self {
        let mut bytes = Vec::with_capacity(8);
        value.write_le(&mut bytes);
        bytes.resize(8, 0);
        let mut le = [0u8; 8];
        le.copy_from_slice(&bytes);
        let bits = u64::from_le_bytes(le);

        let value = match T::WIDTH {
            1 => TiScalarValue::from_x8(bits as u8),
            2 => TiScalarValue::from_x16(bits as u16),
            4 => TiScalarValue::from_x32(bits as u32),
            _ => TiScalarValue::from_x64(bits),
        };
        Self::Scalar(TiScalar {
            type_: T::DATA_TYPE.as_raw(),
            value,
        })
    }

    /// A small inline tensor built from a host array.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the payload exceeds 128 bytes.
    pub fn tensor(array: &HostArray) -> Result<Self> {
        TiTensor::from_bytes(array.dtype.as_raw(), &array.bytes)
            .map(Self::Tensor)
            .ok_or_else(|| {
                TaichiError::invalid_argument(format!(
                    "{} bytes do not fit an inline tensor ({} bytes max)",
                    array.size_bytes(),
                    TiTensorValue::CAPACITY
                ))
            })
    }
}

impl From<i32> for Argument {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<f32> for Argument {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

/// A host-side value to coerce into a kernel argument.
#[derive(Debug, Clone)]
pub enum HostValue {
    /// Becomes an `I32` argument.
    I32(i32),
    /// Becomes an `F32` argument.
    F32(f32),
    /// Staged into device memory and bound as an ND-array.
    Array(HostArray),
    /// Passed through unchanged; handles inside are not checked.
    Raw(Argument),
    /// Passed through once `runtime` is confirmed as the launching runtime.
    Bound {
        /// The argument.
        argument: Argument,
        /// Runtime owning the handles inside `argument`.
        runtime: TiRuntime,
    },
}

impl HostValue {
    /// Bind an existing allocation as an ND-array, tied to its runtime.
    ///
    /// # Errors
    ///
    /// See [`Argument::ndarray`].
    pub fn ndarray(memory: &Memory<'_>, shape: &[usize], elem_type: DataType) -> Result<Self> {
        Ok(Self::Bound {
            argument: Argument::ndarray(memory, shape, elem_type)?,
            runtime: memory.runtime_handle(),
        })
    }

    /// Bind an image and optional sampler as a texture, tied to their runtime.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the sampler belongs to another runtime.
    pub fn texture(image: &Image<'_>, sampler: Option<&Sampler<'_>>) -> Result<Self> {
        if let Some(sampler) = sampler {
            image.ensure_same_runtime(sampler)?;
        }
        Ok(Self::Bound {
            argument: Argument::texture(image, sampler),
            runtime: image.runtime_handle(),
        })
    }
}

impl From<i32> for HostValue {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<f32> for HostValue {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<HostArray> for HostValue {
    fn from(v: HostArray) -> Self {
        Self::Array(v)
    }
}

impl From<Argument> for HostValue {
    fn from(v: Argument) -> Self {
        Self::Raw(v)
    }
}

/// A compute-graph argument bound by name.
#[derive(Debug, Clone)]
pub struct NamedArgument {
    name: CString,
    argument: Argument,
}

impl NamedArgument {
    /// Pair `name` with `argument`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `name` contains a NUL byte.
    pub fn new(name: &str, argument: impl Into<Argument>) -> Result<Self> {
        let name = CString::new(name)
            .map_err(|_| TaichiError::invalid_argument(format!("argument name {name:?} contains a NUL byte")))?;
        Ok(Self {
            name,
            argument: argument.into(),
        })
    }

    /// Argument name.
    #[must_use]
    pub fn name(&self) -> &CStr {
        &self.name
    }

    /// The argument.
    #[must_use]
    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    pub(crate) fn set_argument(&mut self, argument: Argument) {
        self.argument = argument;
    }

    /// The ABI form. Borrows the name; valid while `self` lives.
    #[must_use]
    pub fn to_raw(&self) -> TiNamedArgument {
        TiNamedArgument {
            name: self.name.as_ptr(),
            argument: self.argument.to_raw(),
        }
    }
}

#[derive(Debug)]
struct StagedArray<'rt> {
    memory: Memory<'rt>,
    shape: Vec<usize>,
    dtype: DataType,
}

/// Arguments whose ND-arrays have been copied to the device.
///
/// Must be finished with [`Self::read_back`] or [`Self::release`]; dropping
/// it otherwise leaks the staging allocations.
#[must_use = "staged arguments hold device memory; call read_back() or release()"]
#[derive(Debug)]
pub struct StagedArguments<'rt> {
    runtime: &'rt Runtime,
    arguments: Vec<Argument>,
    staged: Vec<StagedArray<'rt>>,
}

impl<'rt> StagedArguments<'rt> {
    /// Coerce `values` into arguments, staging every host array.
    ///
    /// If any value fails to stage, every allocation made so far is freed and
    /// the first error is returned.
    ///
    /// # Errors
    ///
    /// - `UnsupportedElementType` for an array dtype without a fixed width
    /// - `InvalidArgument` for an empty or over-rank array, or a
    ///   [`HostValue::Bound`] from another runtime
    /// - `Api` if allocation or mapping fails
    pub fn stage(runtime: &'rt Runtime, values: impl IntoIterator<Item = HostValue>) -> Result<Self> {
        let mut staged = Self {
            runtime,
            arguments: Vec::new(),
            staged: Vec::new(),
        };

        for (index, value) in values.into_iter().enumerate() {
            let argument = match value {
                HostValue::I32(v) => Ok(Argument::I32(v)),
                HostValue::F32(v) => Ok(Argument::F32(v)),
                HostValue::Raw(arg) => Ok(arg),
                HostValue::Bound { argument, runtime: owner } if owner == runtime.handle() => Ok(argument),
                HostValue::Bound { .. } => Err(TaichiError::invalid_argument(format!(
                    "argument {index} belongs to a different runtime"
                ))),
                HostValue::Array(array) => stage_array(runtime, array).map(|(argument, array)| {
                    staged.staged.push(array);
                    argument
                }),
            };
            match argument {
                Ok(argument) => staged.arguments.push(argument),
                Err(e) => {
                    if let Err(cleanup) = staged.free_all() {
                        tracing::warn!(
                            target: "taichi_aot::launch",
                            error = %cleanup,
                            "failed to free staging memory after a staging error"
                        );
                    }
                    return Err(e);
                }
            }
        }

        log_staging(
            staged.staged.len(),
            staged.staged.iter().map(|s| s.memory.size() as usize).sum(),
        );
        Ok(staged)
    }

    /// Arguments in order, ready for launch.
    #[must_use]
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Number of staged ND-arrays.
    #[must_use]
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// Copy every staged ND-array back to the host, then free it.
    ///
    /// Arrays are returned in argument order. Call after
    /// [`crate::Runtime::wait`].
    ///
    /// # Errors
    ///
    /// Returns the first failure; the remaining allocations are still freed.
    pub fn read_back(mut self) -> Result<Vec<HostArray>> {
        let mut first_error = None;
        let mut arrays = Vec::with_capacity(self.staged.len());

        for StagedArray { memory, shape, dtype } in std::mem::take(&mut self.staged) {
            let read = memory
                .read_bytes()
                .and_then(|bytes| HostArray::new(bytes, shape, dtype));
            let freed = memory.free();
            match (read, freed) {
                (Ok(array), Ok(())) => arrays.push(array),
                (Err(e), _) | (Ok(_), Err(e)) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(arrays),
        }
    }

    /// Free every staging allocation without reading it.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the remaining allocations are still freed.
    pub fn release(mut self) -> Result<()> {
        self.free_all()
    }

    fn free_all(&mut self) -> Result<()> {
        let mut first_error = None;
        for staged in std::mem::take(&mut self.staged) {
            if let Err(e) = staged.memory.free() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl RuntimeBound for StagedArguments<'_> {
    fn runtime_handle(&self) -> TiRuntime {
        self.runtime.handle()
    }
}

impl Drop for StagedArguments<'_> {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            tracing::warn!(
                target: "taichi_aot::launch",
                leaked = self.staged.len(),
                "staged arguments dropped without read_back() or release()"
            );
        }
    }
}

/// Allocate, fill and bind one host array.
fn stage_array<'rt>(runtime: &'rt Runtime, array: HostArray) -> Result<(Argument, StagedArray<'rt>)> {
    let width = element_width(array.dtype)?;
    let size = checked_byte_len(&array.shape, width)?;
    if size == 0 {
        return Err(TaichiError::invalid_argument(format!(
            "cannot stage an empty array of shape {:?}",
            array.shape
        )));
    }
    let nd_shape = TiNdShape::new(&array.shape)?;

    let memory = Memory::allocate(runtime, &MemoryAllocateInfo::staging(size as u64))?;
    if let Err(e) = memory.write_bytes(&array.bytes) {
        if let Err(cleanup) = memory.free() {
            tracing::warn!(target: "taichi_aot::launch", error = %cleanup, "failed to free staging memory");
        }
        return Err(e);
    }

    let argument = Argument::NdArray(TiNdArray {
        memory: memory.handle(),
        shape: nd_shape,
        elem_shape: nd_shape,
        elem_type: array.dtype.as_raw(),
    });
    Ok((
        argument,
        StagedArray {
            memory,
            shape: array.shape,
            dtype: array.dtype,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_arguments_to_raw() {
        assert_eq!(Argument::I32(-7).to_raw().value_i32(), Some(-7));
        assert_eq!(Argument::from(2.5f32).to_raw().value_f32(), Some(2.5));
        assert_eq!(Argument::I32(1).to_raw().value_f32(), None);
    }

    #[test]
    fn test_typed_scalar_argument() {
        let arg = Argument::scalar(half::f16::from_f32(1.0));
        assert_eq!(arg.argument_type(), ArgumentType::Scalar);
        let scalar = arg.to_raw().value_scalar().unwrap();
        assert_eq!(scalar.type_, DataType::F16.as_raw());
        assert_eq!(scalar.bits(), Some(u64::from(half::f16::from_f32(1.0).to_bits())));

        let arg = Argument::scalar(-1i64);
        let scalar = arg.to_raw().value_scalar().unwrap();
        assert_eq!(scalar.bits(), Some(u64::MAX));
    }

    #[test]
    fn test_tensor_argument() {
        let small = HostArray::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[4]).unwrap();
        let Argument::Tensor(tensor) = Argument::tensor(&small).unwrap() else {
            panic!("expected a tensor argument");
        };
        assert_eq!(tensor.contents.length, 4);
        assert_eq!(tensor.element_bytes().unwrap(), small.bytes.as_slice());

        let large = HostArray::from_slice(&[0u64; 17], &[17]).unwrap();
        assert!(Argument::tensor(&large).is_err());
    }

    #[test]
    fn test_named_argument() {
        let named = NamedArgument::new("delta", 3).unwrap();
        assert_eq!(named.name().to_str().unwrap(), "delta");
        let raw = named.to_raw();
        assert_eq!(raw.argument.value_i32(), Some(3));
        // SAFETY: `named` is alive, so the borrowed name is valid.
        assert_eq!(unsafe { CStr::from_ptr(raw.name) }, named.name());

        assert!(NamedArgument::new("bad\0name", 1).is_err());
    }

    #[test]
    fn test_host_value_conversions() {
        assert!(matches!(HostValue::from(5), HostValue::I32(5)));
        assert!(matches!(HostValue::from(0.5f32), HostValue::F32(_)));
        let array = HostArray::from_slice(&[1u8], &[1]).unwrap();
        assert!(matches!(HostValue::from(array), HostValue::Array(_)));
        assert!(matches!(HostValue::from(Argument::I32(1)), HostValue::Raw(_)));
    }
}
