// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Python bindings for taichi-aot.
//!
//! Exposes library loading, the error channel, runtimes, memory, AOT
//! modules, kernels and compute graphs to Python. Kernel arguments may be
//! Python `int`, `float` or NumPy arrays; arrays are staged into device
//! memory and read back after the launch.
//!
//! ## Usage from Python
//!
//! ```python
//! import numpy as np
//! import taichi_aot_bindings as ti
//!
//! ti.load_library(search_dirs=["/opt/taichi/lib"])
//! print(ti.get_version(), ti.get_available_archs())
//!
//! runtime = ti.Runtime("vulkan")
//! module = runtime.load_module("assets/copy_module")
//! copy = module.get_kernel("copy")
//!
//! src = np.arange(256, dtype=np.int32)
//! dst = np.zeros(256, dtype=np.int32)
//! _, out = copy.launch(src, dst)
//! assert (out == src).all()
//!
//! module.destroy()
//! runtime.destroy()
//! ```
//!
//! Handles are not destroyed on garbage collection; call `destroy()` or
//! `free()` explicitly, as with the native API.

#![allow(clippy::useless_conversion)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use numpy::{PyArray1, PyArrayMethods, PyReadonlyArrayDyn};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict, PyFloat, PyLong, PyTuple};

use crate::aot_module::AotModule;
use crate::argument::HostValue;
use crate::compute_graph::ComputeGraph;
use crate::enums::{Arch, DataType};
use crate::error::{ErrorCode, TaichiError};
use crate::host_array::{Element, HostArray};
use crate::kernel::Kernel;
use crate::loader::{Loader, LoaderConfig, TaichiLibrary};
use crate::logging::{LogConfig, LogLevel};
use crate::memory::{Memory, MemoryAllocateInfo};
use crate::runtime::Runtime;
use crate::sys::handles::{TiAotModule, TiComputeGraph, TiKernel, TiMemory};

/// Loader shared by every object created from Python.
static LOADER: Mutex<Option<Loader>> = Mutex::new(None);

// =============================================================================
// LIBRARY FUNCTIONS
// =============================================================================

/// Load the Taichi C-API library.
///
/// # Arguments
/// * `search_dirs` - Extra directories searched after the working directory
///   and the directory of the running executable
///
/// Loading is idempotent: once a library is loaded, later calls return
/// immediately and log a warning for any `search_dirs` they cannot honor.
#[pyfunction]
#[pyo3(signature = (search_dirs=None))]
fn load_library(search_dirs: Option<Vec<PathBuf>>) -> PyResult<()> {
    let config = search_dirs
        .unwrap_or_default()
        .into_iter()
        .fold(LoaderConfig::default(), LoaderConfig::with_search_dir);
    load_with(config).map(|_| ())
}

/// Native library version as `major.minor.patch`.
#[pyfunction]
fn get_version() -> PyResult<String> {
    Ok(library()?.version().to_string())
}

/// Names of the archs the native library can run on, e.g. `["vulkan", "x64"]`.
#[pyfunction]
fn get_available_archs() -> PyResult<Vec<String>> {
    let archs = library()?.available_archs().map_err(to_py_err)?;
    Ok(archs.into_iter().map(|a| a.name().to_string()).collect())
}

/// Read the error channel without clearing it.
///
/// # Returns
/// `(code, message)`, where `code` is the raw `TiError` value.
#[pyfunction]
#[pyo3(signature = (buffer_size=256))]
fn get_last_error(buffer_size: usize) -> PyResult<(i32, String)> {
    let (message, code) = library()?.last_error(buffer_size);
    Ok((code.as_raw(), message))
}

/// Write `code` and `message` into the error channel.
#[pyfunction]
fn set_last_error(code: i32, message: &str) -> PyResult<()> {
    library()?
        .set_last_error(ErrorCode::from_raw(code), message)
        .map_err(to_py_err)
}

// =============================================================================
// RUNTIME
// =============================================================================

/// Python wrapper for a Taichi runtime.
#[pyclass(name = "Runtime", unsendable)]
pub struct PyRuntime {
    inner: Option<Runtime>,
}

impl PyRuntime {
    fn get(&self) -> PyResult<&Runtime> {
        self.inner
            .as_ref()
            .ok_or_else(|| PyRuntimeError::new_err("Runtime has been destroyed"))
    }
}

#[pymethods]
impl PyRuntime {
    /// Create a runtime on `arch` (a name such as `"vulkan"` or `"x64"`).
    #[new]
    #[pyo3(signature = (arch="vulkan", device_index=0))]
    fn new(arch: &str, device_index: u32) -> PyResult<Self> {
        let arch = Arch::from_name(arch)
            .ok_or_else(|| PyValueError::new_err(format!("Unknown arch: {arch}")))?;
        let runtime = Runtime::create(library()?, arch, device_index).map_err(to_py_err)?;
        Ok(Self {
            inner: Some(runtime),
        })
    }

    /// Arch name of the runtime.
    #[getter]
    fn arch(&self) -> PyResult<&'static str> {
        Ok(self.get()?.arch().name())
    }

    /// Submit queued work.
    fn flush(&self) -> PyResult<()> {
        self.get()?.flush().map_err(to_py_err)
    }

    /// Block until queued work has completed.
    fn wait(&self) -> PyResult<()> {
        self.get()?.wait().map_err(to_py_err)
    }

    /// Device capabilities as `(name, level)` pairs.
    fn capabilities(&self) -> PyResult<Vec<(&'static str, u32)>> {
        let caps = self.get()?.capabilities().map_err(to_py_err)?;
        Ok(caps.into_iter().map(|c| (c.capability.name(), c.level)).collect())
    }

    /// Allocate device memory.
    #[pyo3(signature = (size, host_access=true))]
    fn allocate_memory(slf: &Bound<'_, Self>, size: u64, host_access: bool) -> PyResult<PyMemory> {
        let this = slf.borrow();
        let info = if host_access {
            MemoryAllocateInfo::staging(size)
        } else {
            MemoryAllocateInfo::new(size)
        };
        let memory = Memory::allocate(this.get()?, &info).map_err(to_py_err)?;
        Ok(PyMemory {
            runtime: slf.clone().unbind(),
            handle: Some(memory.handle()),
            info,
        })
    }

    /// Load an AOT module from a path on disk.
    fn load_module(slf: &Bound<'_, Self>, path: PathBuf) -> PyResult<PyAotModule> {
        let this = slf.borrow();
        let module = AotModule::load(this.get()?, &path).map_err(to_py_err)?;
        Ok(PyAotModule::wrap(slf, &module))
    }

    /// Create an AOT module from an in-memory blob.
    fn create_module(slf: &Bound<'_, Self>, data: &[u8]) -> PyResult<PyAotModule> {
        let this = slf.borrow();
        let module = AotModule::create(this.get()?, data).map_err(to_py_err)?;
        Ok(PyAotModule::wrap(slf, &module))
    }

    /// Destroy the runtime. Later calls on it raise `RuntimeError`.
    fn destroy(&mut self) -> PyResult<()> {
        match self.inner.take() {
            Some(runtime) => runtime.destroy().map_err(to_py_err),
            None => Ok(()),
        }
    }

    fn __repr__(&self) -> String {
        match &self.inner {
            Some(rt) => format!("Runtime(arch='{}', device_index={})", rt.arch(), rt.device_index()),
            None => "Runtime(destroyed)".to_string(),
        }
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// Python wrapper for a device memory allocation.
#[pyclass(name = "Memory", unsendable)]
pub struct PyMemory {
    runtime: Py<PyRuntime>,
    handle: Option<TiMemory>,
    info: MemoryAllocateInfo,
}

impl PyMemory {
    fn with_memory<R>(
        &self,
        py: Python<'_>,
        f: impl FnOnce(&Memory<'_>) -> crate::Result<R>,
    ) -> PyResult<R> {
        let handle = self
            .handle
            .ok_or_else(|| PyRuntimeError::new_err("Memory has been freed"))?;
        let runtime = self.runtime.bind(py).borrow();
        let memory = Memory::from_raw_parts(runtime.get()?, handle, self.info);
        f(&memory).map_err(to_py_err)
    }
}

#[pymethods]
impl PyMemory {
    /// Allocation size in bytes.
    #[getter]
    fn size(&self) -> u64 {
        self.info.size
    }

    /// Copy the whole allocation to the host.
    fn read<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        let bytes = self.with_memory(py, Memory::read_bytes)?;
        Ok(PyBytes::new_bound(py, &bytes))
    }

    /// Copy `data` to the start of the allocation.
    fn write(&self, py: Python<'_>, data: &[u8]) -> PyResult<()> {
        self.with_memory(py, |m| m.write_bytes(data))
    }

    /// Release the allocation.
    fn free(&mut self, py: Python<'_>) -> PyResult<()> {
        let Some(handle) = self.handle else {
            return Ok(());
        };
        let runtime = self.runtime.bind(py).borrow();
        Memory::from_raw_parts(runtime.get()?, handle, self.info)
            .free()
            .map_err(to_py_err)?;
        self.handle = None;
        Ok(())
    }
}

// =============================================================================
// AOT MODULE, KERNEL, COMPUTE GRAPH
// =============================================================================

/// Python wrapper for a loaded AOT module.
#[pyclass(name = "AotModule", unsendable)]
pub struct PyAotModule {
    runtime: Py<PyRuntime>,
    handle: Option<TiAotModule>,
    origin: String,
}

impl PyAotModule {
    fn wrap(runtime: &Bound<'_, PyRuntime>, module: &AotModule<'_>) -> Self {
        Self {
            runtime: runtime.clone().unbind(),
            handle: Some(module.handle()),
            origin: module.origin().to_string(),
        }
    }

    fn with_module<R>(
        &self,
        py: Python<'_>,
        f: impl FnOnce(&AotModule<'_>) -> crate::Result<R>,
    ) -> PyResult<R> {
        let handle = self
            .handle
            .ok_or_else(|| PyRuntimeError::new_err("AotModule has been destroyed"))?;
        let runtime = self.runtime.bind(py).borrow();
        let module = AotModule::from_raw_parts(runtime.get()?, handle, self.origin.clone());
        f(&module).map_err(to_py_err)
    }
}

#[pymethods]
impl PyAotModule {
    /// Path the module came from, or `<memory>`.
    #[getter]
    fn origin(&self) -> &str {
        &self.origin
    }

    /// Look up a kernel by name.
    fn get_kernel(slf: &Bound<'_, Self>, name: &str) -> PyResult<PyKernel> {
        let handle = slf
            .borrow()
            .with_module(slf.py(), |m| m.get_kernel(name).map(|k| k.handle()))?;
        Ok(PyKernel {
            module: slf.clone().unbind(),
            handle,
            name: name.to_string(),
        })
    }

    /// Look up a compute graph by name.
    fn get_compute_graph(slf: &Bound<'_, Self>, name: &str) -> PyResult<PyComputeGraph> {
        let handle = slf
            .borrow()
            .with_module(slf.py(), |m| m.get_compute_graph(name).map(|g| g.handle()))?;
        Ok(PyComputeGraph {
            module: slf.clone().unbind(),
            handle,
            name: name.to_string(),
        })
    }

    /// Release the module.
    fn destroy(&mut self, py: Python<'_>) -> PyResult<()> {
        let Some(handle) = self.handle else {
            return Ok(());
        };
        let runtime = self.runtime.bind(py).borrow();
        AotModule::from_raw_parts(runtime.get()?, handle, self.origin.clone())
            .destroy()
            .map_err(to_py_err)?;
        self.handle = None;
        Ok(())
    }
}

/// Python wrapper for a kernel.
#[pyclass(name = "Kernel", unsendable)]
pub struct PyKernel {
    module: Py<PyAotModule>,
    handle: TiKernel,
    name: String,
}

#[pymethods]
impl PyKernel {
    /// Kernel name.
    #[getter]
    fn name(&self) -> &str {
        &self.name
    }

    /// Launch with positional arguments and wait for completion.
    ///
    /// # Returns
    /// One NumPy array per array argument, in argument order, holding the
    /// device contents after the launch.
    #[pyo3(signature = (*args))]
    fn launch(&self, py: Python<'_>, args: &Bound<'_, PyTuple>) -> PyResult<Vec<PyObject>> {
        let values = args
            .iter()
            .map(|a| extract_host_value(&a))
            .collect::<PyResult<Vec<_>>>()?;
        let module = self.module.bind(py).borrow();
        let outputs = module.with_module(py, |m| Kernel::new(m, self.handle, &self.name).run(values))?;
        outputs.iter().map(|a| to_numpy(py, a)).collect()
    }
}

/// Python wrapper for a compute graph.
#[pyclass(name = "ComputeGraph", unsendable)]
pub struct PyComputeGraph {
    module: Py<PyAotModule>,
    handle: TiComputeGraph,
    name: String,
}

#[pymethods]
impl PyComputeGraph {
    /// Graph name.
    #[getter]
    fn name(&self) -> &str {
        &self.name
    }

    /// Launch with named arguments and wait for completion.
    ///
    /// # Returns
    /// One NumPy array per array argument, in keyword order.
    #[pyo3(signature = (**kwargs))]
    fn launch(&self, py: Python<'_>, kwargs: Option<&Bound<'_, PyDict>>) -> PyResult<Vec<PyObject>> {
        let mut values = Vec::new();
        if let Some(kwargs) = kwargs {
            for (key, value) in kwargs.iter() {
                values.push((key.extract::<String>()?, extract_host_value(&value)?));
            }
        }
        let module = self.module.bind(py).borrow();
        let outputs = module.with_module(py, |m| {
            ComputeGraph::new(m, self.handle, &self.name).run(values)
        })?;
        outputs.iter().map(|a| to_numpy(py, a)).collect()
    }
}

// =============================================================================
// LOGGING AND UTILITIES
// =============================================================================

/// Initialize logging for taichi-aot.
///
/// # Arguments
/// * `level` - Log level: "trace", "debug", "info", "warn", "error" (default: "warn")
/// * `timestamps` - Include timestamps in output (default: True)
/// * `ansi` - Use ANSI colors (default: True)
#[pyfunction]
#[pyo3(signature = (level="warn", timestamps=true, ansi=true))]
fn init_logging(level: &str, timestamps: bool, ansi: bool) -> PyResult<()> {
    let level = LogLevel::from_name(level).ok_or_else(|| {
        PyValueError::new_err(format!(
            "Invalid log level: {level}. Use: trace, debug, info, warn, error"
        ))
    })?;
    let config = LogConfig::new()
        .with_level(level)
        .with_timestamps(timestamps)
        .with_ansi(ansi);
    crate::logging::init_logging(&config);
    Ok(())
}

/// Get the taichi-aot binding version.
#[pyfunction]
fn version() -> &'static str {
    crate::VERSION
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn to_py_err(e: TaichiError) -> PyErr {
    match e {
        TaichiError::InvalidArgument(_) | TaichiError::UnsupportedElementType { .. } => {
            PyValueError::new_err(e.to_string())
        }
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

fn load_with(config: LoaderConfig) -> PyResult<Arc<TaichiLibrary>> {
    let mut slot = LOADER.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(loader) = slot.as_ref().filter(|l| l.is_loaded()) {
        let unused = loader.unused_search_dirs(&config.search_dirs);
        if !unused.is_empty() {
            tracing::warn!(
                target: "taichi_aot::loader",
                ?unused,
                "Taichi C-API already loaded; ignoring new search_dirs"
            );
        }
        return loader.load().map_err(to_py_err);
    }
    let loader = slot.insert(Loader::new(config));
    loader.load().map_err(to_py_err)
}

/// The loaded library, loading it from the default locations if needed.
fn library() -> PyResult<Arc<TaichiLibrary>> {
    load_with(LoaderConfig::default())
}

fn array_from<T: Element + numpy::Element>(array: &PyReadonlyArrayDyn<'_, T>) -> PyResult<HostArray> {
    let view = array.as_array();
    let data: Vec<T> = view.iter().copied().collect();
    HostArray::from_slice(&data, view.shape()).map_err(to_py_err)
}

macro_rules! try_arrays {
    ($value:expr; $($ty:ty),+) => {
        $(
            if let Ok(array) = $value.extract::<PyReadonlyArrayDyn<'_, $ty>>() {
                return Ok(HostValue::Array(array_from(&array)?));
            }
        )+
    };
}

fn extract_host_value(value: &Bound<'_, PyAny>) -> PyResult<HostValue> {
    if value.is_instance_of::<PyLong>() {
        return Ok(HostValue::I32(value.extract()?));
    }
    if value.is_instance_of::<PyFloat>() {
        return Ok(HostValue::F32(value.extract()?));
    }
    try_arrays!(value; f32, f64, i8, i16, i32, i64, u8, u16, u32, u64);
    Err(PyValueError::new_err(format!(
        "Unsupported argument type: {}. Expected int, float or a NumPy array",
        value.get_type().name()?
    )))
}

fn numpy_from<T: Element + numpy::Element>(py: Python<'_>, array: &HostArray) -> PyResult<PyObject> {
    let flat = PyArray1::from_vec_bound(py, array.to_vec::<T>().map_err(to_py_err)?);
    Ok(flat.reshape(array.shape.clone())?.into_any().unbind())
}

fn to_numpy(py: Python<'_>, array: &HostArray) -> PyResult<PyObject> {
    match array.dtype {
        DataType::F32 => numpy_from::<f32>(py, array),
        DataType::F64 => numpy_from::<f64>(py, array),
        DataType::I8 => numpy_from::<i8>(py, array),
        DataType::I16 => numpy_from::<i16>(py, array),
        DataType::I32 => numpy_from::<i32>(py, array),
        DataType::I64 => numpy_from::<i64>(py, array),
        DataType::U8 => numpy_from::<u8>(py, array),
        DataType::U16 => numpy_from::<u16>(py, array),
        DataType::U32 => numpy_from::<u32>(py, array),
        DataType::U64 => numpy_from::<u64>(py, array),
        other => Err(PyValueError::new_err(format!(
            "No NumPy counterpart for element type {other}"
        ))),
    }
}

// =============================================================================
// PYTHON MODULE DEFINITION
// =============================================================================

/// Python module for taichi-aot bindings.
#[pymodule]
pub fn taichi_aot_bindings(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Register class types
    m.add_class::<PyRuntime>()?;
    m.add_class::<PyMemory>()?;
    m.add_class::<PyAotModule>()?;
    m.add_class::<PyKernel>()?;
    m.add_class::<PyComputeGraph>()?;

    // Library functions
    m.add_function(wrap_pyfunction!(load_library, m)?)?;
    m.add_function(wrap_pyfunction!(get_version, m)?)?;
    m.add_function(wrap_pyfunction!(get_available_archs, m)?)?;
    m.add_function(wrap_pyfunction!(get_last_error, m)?)?;
    m.add_function(wrap_pyfunction!(set_last_error, m)?)?;

    // Logging and utilities
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;
    m.add_function(wrap_pyfunction!(version, m)?)?;

    Ok(())
}
