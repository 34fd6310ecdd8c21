// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Error types for the Taichi AOT bindings.
//!
//! Failures fall into two classes that callers can always tell apart:
//!
//! - **ABI-reported**: the native library ran and recorded a non-success
//!   `TiError` on its error channel. These carry the numeric [`ErrorCode`] and
//!   the native message, never a generic wrapper that drops the code.
//! - **Binding-local**: the binding could not even reach the native library
//!   (missing library, missing symbol, unsupported platform) or rejected an
//!   argument before calling it.
//!
//! A creating call that returns a null handle while the channel still reads
//! success is ABI-reported: the native call ran and failed. The binding picks
//! the code in that case and sets the `synthesized` flag on [`ApiError`].
//!
//! ## Error Hierarchy
//!
//! ```text
//! TaichiError
//! ├── Api                     - Non-success code from the error channel
//! ├── UnsupportedArch         - Runtime creation failed for arch/device
//! ├── NoAvailableArch         - No preferred arch is offered by the library
//! ├── ModuleLoad              - AOT module could not be loaded
//! ├── NameNotFound            - Kernel or compute graph missing from module
//! ├── LibraryNotFound         - No candidate path held the shared library
//! ├── LibraryLoad             - Dynamic loader rejected the library file
//! ├── UnsupportedPlatform     - Host OS has no known library filename
//! ├── SymbolResolution        - Library lacks a declared export
//! ├── UnsupportedElementType  - Host array dtype has no native mapping
//! ├── InvalidArgument         - Rejected before any native call
//! ├── InvalidConfig           - Configuration validation failure
//! └── Candle                  - Host tensor errors
//! ```

use std::fmt;

use thiserror::Error;

use crate::sys::types as raw;

/// Result type alias for binding operations.
pub type Result<T> = std::result::Result<T, TaichiError>;

/// Native error codes reported through `ti_get_last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No error.
    Success,
    /// API or parameter combination not supported.
    NotSupported,
    /// Provided data is corrupted.
    CorruptedData,
    /// Provided name does not exist.
    NameNotFound,
    /// Argument constraint violation or kernel argument mismatch.
    InvalidArgument,
    /// A by-reference argument is null.
    ArgumentNull,
    /// An argument is out of its acceptable range.
    ArgumentOutOfRange,
    /// One or more kernel arguments are missing.
    ArgumentNotFound,
    /// The interoperation is not possible on the current arch.
    InvalidInterop,
    /// The C-API entered an unrecoverable invalid state.
    InvalidState,
    /// The AOT module is not compatible with the current runtime.
    IncompatibleModule,
    /// Out of memory.
    OutOfMemory,
    /// A code this binding does not know.
    Unrecognized(i32),
}

impl ErrorCode {
    /// Decode a raw `TiError`.
    #[must_use]
    pub fn from_raw(code: raw::TiError) -> Self {
        match code {
            raw::TI_ERROR_SUCCESS => Self::Success,
            raw::TI_ERROR_NOT_SUPPORTED => Self::NotSupported,
            raw::TI_ERROR_CORRUPTED_DATA => Self::CorruptedData,
            raw::TI_ERROR_NAME_NOT_FOUND => Self::NameNotFound,
            raw::TI_ERROR_INVALID_ARGUMENT => Self::InvalidArgument,
            raw::TI_ERROR_ARGUMENT_NULL => Self::ArgumentNull,
            raw::TI_ERROR_ARGUMENT_OUT_OF_RANGE => Self::ArgumentOutOfRange,
            raw::TI_ERROR_ARGUMENT_NOT_FOUND => Self::ArgumentNotFound,
            raw::TI_ERROR_INVALID_INTEROP => Self::InvalidInterop,
            raw::TI_ERROR_INVALID_STATE => Self::InvalidState,
            raw::TI_ERROR_INCOMPATIBLE_MODULE => Self::IncompatibleModule,
            raw::TI_ERROR_OUT_OF_MEMORY => Self::OutOfMemory,
            other => Self::Unrecognized(other),
        }
    }

    /// The raw `TiError` value.
    #[must_use]
    pub fn as_raw(self) -> raw::TiError {
        match self {
            Self::Success => raw::TI_ERROR_SUCCESS,
            Self::NotSupported => raw::TI_ERROR_NOT_SUPPORTED,
            Self::CorruptedData => raw::TI_ERROR_CORRUPTED_DATA,
            Self::NameNotFound => raw::TI_ERROR_NAME_NOT_FOUND,
            Self::InvalidArgument => raw::TI_ERROR_INVALID_ARGUMENT,
            Self::ArgumentNull => raw::TI_ERROR_ARGUMENT_NULL,
            Self::ArgumentOutOfRange => raw::TI_ERROR_ARGUMENT_OUT_OF_RANGE,
            Self::ArgumentNotFound => raw::TI_ERROR_ARGUMENT_NOT_FOUND,
            Self::InvalidInterop => raw::TI_ERROR_INVALID_INTEROP,
            Self::InvalidState => raw::TI_ERROR_INVALID_STATE,
            Self::IncompatibleModule => raw::TI_ERROR_INCOMPATIBLE_MODULE,
            Self::OutOfMemory => raw::TI_ERROR_OUT_OF_MEMORY,
            Self::Unrecognized(code) => code,
        }
    }

    /// Whether this is `TI_ERROR_SUCCESS`.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Symbolic C name, e.g. `TI_ERROR_NAME_NOT_FOUND`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "TI_ERROR_SUCCESS",
            Self::NotSupported => "TI_ERROR_NOT_SUPPORTED",
            Self::CorruptedData => "TI_ERROR_CORRUPTED_DATA",
            Self::NameNotFound => "TI_ERROR_NAME_NOT_FOUND",
            Self::InvalidArgument => "TI_ERROR_INVALID_ARGUMENT",
            Self::ArgumentNull => "TI_ERROR_ARGUMENT_NULL",
            Self::ArgumentOutOfRange => "TI_ERROR_ARGUMENT_OUT_OF_RANGE",
            Self::ArgumentNotFound => "TI_ERROR_ARGUMENT_NOT_FOUND",
            Self::InvalidInterop => "TI_ERROR_INVALID_INTEROP",
            Self::InvalidState => "TI_ERROR_INVALID_STATE",
            Self::IncompatibleModule => "TI_ERROR_INCOMPATIBLE_MODULE",
            Self::OutOfMemory => "TI_ERROR_OUT_OF_MEMORY",
            Self::Unrecognized(_) => "TI_ERROR_UNRECOGNIZED",
        }
    }

    /// Human-readable description of the code.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Success => "Successful Taichi C-API invocation",
            Self::NotSupported => "API or parameter combination not supported",
            Self::CorruptedData => "Provided data is corrupted",
            Self::NameNotFound => "Provided name does not exist",
            Self::InvalidArgument => {
                "Function argument constraint violation or AOT module kernel argument mismatch"
            }
            Self::ArgumentNull => "One or more by-reference (pointer) function arguments point to null",
            Self::ArgumentOutOfRange => "One or more function arguments are out of its acceptable range",
            Self::ArgumentNotFound => "One or more kernel arguments are missing",
            Self::InvalidInterop => "The intended interoperation is not possible on the current arch",
            Self::InvalidState => "The Taichi C-API enters an unrecoverable invalid state",
            Self::IncompatibleModule => "The AOT module is not compatible with the current runtime",
            Self::OutOfMemory => "Out of memory",
            Self::Unrecognized(_) => "Unrecognized error code",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_raw())
    }
}

/// A non-success code and message read from the native error channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}. {} (TiError code: {})", .code.description(), .code.as_raw())]
pub struct ApiError {
    /// Decoded error code.
    pub code: ErrorCode,
    /// Message recorded by the native library (may be empty).
    pub message: String,
    /// The code was chosen by the binding after a null result, not read from
    /// the error channel.
    pub synthesized: bool,
}

impl ApiError {
    /// Create an API error as read from the error channel.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            synthesized: false,
        }
    }

    /// Create an API error for a null result the error channel did not report.
    pub fn synthesized(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            synthesized: true,
            ..Self::new(code, message)
        }
    }
}

/// Errors raised by the Taichi AOT bindings.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TaichiError {
    /// Non-success code read from the native error channel.
    #[error("Taichi C-API error: {0}")]
    Api(#[from] ApiError),

    /// Runtime creation failed for the requested arch and device.
    ///
    /// Raised when the backend has no usable device at that index.
    #[error("unsupported arch {arch} on device {device_index}: {source}")]
    UnsupportedArch {
        /// Requested arch name.
        arch: String,
        /// Requested device index.
        device_index: u32,
        /// Native error behind the failure.
        source: ApiError,
    },

    /// None of the preferred arches is offered by the library.
    #[error("no preferred arch is available: wanted {preferred}; library offers {available}")]
    NoAvailableArch {
        /// Preferred arch names, in order.
        preferred: String,
        /// Arch names reported by `ti_get_available_archs`.
        available: String,
    },

    /// An AOT module could not be loaded or created.
    #[error("failed to load AOT module from {origin}: {source}")]
    ModuleLoad {
        /// Path or `<memory>` for blob-created modules.
        origin: String,
        /// Native error behind the failure.
        source: ApiError,
    },

    /// A kernel or compute graph name is absent from a module.
    #[error("name not found in AOT module: {name}: {source}")]
    NameNotFound {
        /// Requested name.
        name: String,
        /// Native error behind the failure.
        source: ApiError,
    },

    /// No candidate directory contained the native library.
    #[error("Taichi C-API library {file_name} not found; searched: {}", display_paths(.searched))]
    LibraryNotFound {
        /// Platform-specific library filename.
        file_name: String,
        /// Directories that were checked, in order.
        searched: Vec<std::path::PathBuf>,
    },

    /// A candidate library file exists but the dynamic loader rejected it.
    #[error("failed to open {}: {message}", .path.display())]
    LibraryLoad {
        /// Path that was opened.
        path: std::path::PathBuf,
        /// Loader diagnostic.
        message: String,
    },

    /// The host OS is not a supported platform.
    #[error("unsupported platform: {os}")]
    UnsupportedPlatform {
        /// Host OS identifier.
        os: String,
    },

    /// The opened library lacks a declared export.
    #[error("failed to resolve symbol {symbol}: {message}")]
    SymbolResolution {
        /// Missing symbol name.
        symbol: String,
        /// Loader diagnostic.
        message: String,
    },

    /// A host array element type has no native data-type mapping.
    #[error("unsupported element type: {dtype}")]
    UnsupportedElementType {
        /// Host dtype name.
        dtype: String,
    },

    /// An argument was rejected before any native call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Underlying Candle error.
    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

fn display_paths(paths: &[std::path::PathBuf]) -> String {
    if paths.is_empty() {
        return "<none>".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl TaichiError {
    /// Create an API error from a code and message.
    pub fn api(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Api(ApiError::new(code, message))
    }

    /// Create a symbol resolution error.
    pub fn symbol_resolution(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SymbolResolution {
            symbol: symbol.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported platform error.
    pub fn unsupported_platform(os: impl Into<String>) -> Self {
        Self::UnsupportedPlatform { os: os.into() }
    }

    /// Create an unsupported element type error.
    pub fn unsupported_element_type(dtype: impl Into<String>) -> Self {
        Self::UnsupportedElementType {
            dtype: dtype.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    fn api_source(&self) -> Option<&ApiError> {
        match self {
            Self::Api(source)
            | Self::UnsupportedArch { source, .. }
            | Self::ModuleLoad { source, .. }
            | Self::NameNotFound { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The native error code, for every ABI-reported variant.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        self.api_source().map(|e| e.code)
    }

    /// Whether the code was chosen by the binding for a null result rather
    /// than read from the error channel.
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        self.api_source().is_some_and(|e| e.synthesized)
    }

    /// Whether the failure was detected by the binding rather than reported
    /// by the native library.
    #[must_use]
    pub fn is_binding_local(&self) -> bool {
        self.code().is_none()
    }
}
