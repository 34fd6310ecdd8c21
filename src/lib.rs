// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! # taichi-aot
//!
//! Safe Rust bindings for the Taichi C-API (`libtaichi_c_api`), the runtime
//! that executes ahead-of-time compiled Taichi kernels and compute graphs on
//! Vulkan, Metal, CUDA, OpenGL and CPU backends.
//!
//! The crate has no compute logic of its own. Every operation forwards to the
//! native library through a fixed C ABI:
//!
//! > host call → argument coercion → ABI call → native library → error check → return
//!
//! ## Modules
//!
//! - [`sys`] - Raw ABI: descriptor table, handles, `#[repr(C)]` records and unions
//! - [`loader`] - Library discovery, symbol resolution and the error channel
//! - [`runtime`], [`memory`], [`image`], [`sampler`] - Runtime-scoped resources
//! - [`aot_module`], [`kernel`], [`compute_graph`] - Loading and launching AOT code
//! - [`argument`] - Argument coercion and ND-array staging
//! - [`host_array`], [`dtype`] - Host-side arrays, Candle tensor interop
//! - [`device`] - GPU-first arch selection
//! - [`error`] - Error types keeping native error codes intact
//! - [`logging`] - `tracing` setup and log helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taichi_aot::{AotModule, HostArray, Loader, LoaderConfig, Result, Runtime, RuntimeConfig};
//!
//! fn main() -> Result<()> {
//!     let library = Loader::new(LoaderConfig::default()).load()?;
//!     println!("Taichi C-API {}", library.version());
//!
//!     let runtime = Runtime::from_config(library, &RuntimeConfig::default())?;
//!     let module = AotModule::load(&runtime, "assets/copy_module")?;
//!     let kernel = module.get_kernel("copy")?;
//!
//!     let src = HostArray::from_slice(&[1.0f32, 2.0, 3.0], &[3])?;
//!     let dst = HostArray::from_slice(&[0.0f32; 3], &[3])?;
//!     let out = kernel.run(vec![src.into(), dst.into()])?;
//!     assert_eq!(out[1].to_vec::<f32>()?, vec![1.0, 2.0, 3.0]);
//!
//!     drop(kernel);
//!     module.destroy()?;
//!     runtime.destroy()
//! }
//! ```
//!
//! ## Error Channel
//!
//! Every wrapper reads `ti_get_last_error` after each native call. A
//! non-success code becomes an error carrying the numeric code and message;
//! see [`TaichiError::code`].
//!
//! ## Feature Flags
//!
//! - `python` - `PyO3` bindings exposed as the `taichi_aot_bindings` module

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aot_module;
pub mod argument;
pub mod compute_graph;
pub mod device;
pub mod dtype;
pub mod enums;
pub mod error;
pub mod host_array;
pub mod image;
pub mod kernel;
pub mod loader;
pub mod logging;
pub mod memory;
pub mod runtime;
pub mod sampler;
pub mod sys;
pub mod traits;

#[cfg(feature = "python")]
pub mod python;

// Re-exports for convenience
pub use aot_module::AotModule;
pub use argument::{Argument, HostValue, NamedArgument, StagedArguments};
pub use compute_graph::ComputeGraph;
pub use device::{select_arch, warn_if_cpu, RuntimeConfig};
pub use dtype::{bytes_per_element, is_floating_point, parse_data_type, to_candle_dtype, DTypeExt};
pub use enums::{
    AddressMode, Arch, ArgumentType, Capability, DataType, Filter, Format, ImageDimension,
    ImageLayout, ImageUsage, MemoryUsage,
};
pub use error::{ApiError, ErrorCode, Result, TaichiError};
pub use host_array::{Element, HostArray};
pub use image::{Image, ImageAllocateInfo, ImageSlice};
pub use kernel::Kernel;
pub use loader::{Loader, LoaderConfig, Platform, TaichiLibrary, Version, DEFAULT_ERROR_BUFFER_SIZE};
pub use logging::{init_logging, LogConfig, LogLevel};
pub use memory::{Memory, MemoryAllocateInfo, MemorySlice};
pub use runtime::{CapabilityLevel, Runtime};
pub use sampler::{Sampler, SamplerCreateInfo};
pub use traits::{RuntimeBound, ValidatableConfig};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
