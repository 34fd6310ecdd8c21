// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Native library discovery, loading, and the error channel.
//!
//! ## Search Order
//!
//! The platform selects exactly one filename:
//!
//! | Platform | File |
//! |----------|------|
//! | Linux    | `libtaichi_c_api.so` |
//! | macOS    | `libtaichi_c_api.dylib` |
//! | Windows  | `taichi_c_api.dll` |
//!
//! Candidate directories are checked in order: the current working directory,
//! the directory of the running binary, then any extra directories from
//! [`LoaderConfig::with_search_dir`]. The first existing file is opened and
//! every declared symbol is resolved before anything is returned.
//!
//! ## No Global State
//!
//! [`TaichiLibrary`] is an ordinary value owning the library and its resolved
//! function pointers. [`Loader`] adds idempotent, shared initialization on
//! top: the first `load()` opens the library and every later call returns the
//! same `Arc`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use taichi_aot::{Loader, LoaderConfig};
//!
//! let loader = Loader::new(LoaderConfig::new().with_search_dir("/opt/taichi/lib"));
//! let library = loader.load()?;
//! println!("Taichi C-API {}", library.version());
//! # Ok::<(), taichi_aot::TaichiError>(())
//! ```

use std::ffi::{c_char, CString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use libloading::Library;

use crate::enums::Arch;
use crate::error::{ApiError, ErrorCode, Result, TaichiError};
use crate::logging::log_native_call;
use crate::sys::api::NativeApi;
use crate::sys::types::TI_MAX_ARCH_COUNT;
use crate::traits::ValidatableConfig;

/// Default message buffer size for `ti_get_last_error`.
pub const DEFAULT_ERROR_BUFFER_SIZE: usize = 256;

/// Host platform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux.
    Linux,
    /// macOS.
    MacOs,
    /// Windows.
    Windows,
}

impl Platform {
    /// Map an OS identifier (`std::env::consts::OS` values) to a platform.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPlatform` for any other OS.
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::MacOs),
            "windows" => Ok(Self::Windows),
            other => Err(TaichiError::unsupported_platform(other)),
        }
    }

    /// The platform this process runs on.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPlatform` if the host OS is not supported.
    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Shared library filename on this platform.
    #[must_use]
    pub fn library_file_name(self) -> &'static str {
        match self {
            Self::Linux => "libtaichi_c_api.so",
            Self::MacOs => "libtaichi_c_api.dylib",
            Self::Windows => "taichi_c_api.dll",
        }
    }
}

/// Configuration for locating and opening the native library.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Extra directories searched after the default candidates.
    pub search_dirs: Vec<PathBuf>,
    /// Search the current working directory first.
    pub include_working_dir: bool,
    /// Search the directory of the running binary.
    pub include_binary_dir: bool,
    /// Restrict loading to these platforms; `None` allows every platform
    /// with a known filename.
    pub supported_platforms: Option<Vec<Platform>>,
    /// Message buffer size used by the always-check error policy.
    pub error_buffer_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_dirs: Vec::new(),
            include_working_dir: true,
            include_binary_dir: true,
            supported_platforms: None,
            error_buffer_size: DEFAULT_ERROR_BUFFER_SIZE,
        }
    }
}

impl LoaderConfig {
    /// Create a new loader configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directory to the search list.
    #[must_use]
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Only search the explicitly added directories.
    #[must_use]
    pub fn with_default_dirs(mut self, enable: bool) -> Self {
        self.include_working_dir = enable;
        self.include_binary_dir = enable;
        self
    }

    /// Restrict the supported platforms.
    #[must_use]
    pub fn with_supported_platforms(mut self, platforms: impl Into<Vec<Platform>>) -> Self {
        self.supported_platforms = Some(platforms.into());
        self
    }

    /// Set the error-channel message buffer size.
    #[must_use]
    pub fn with_error_buffer_size(mut self, size: usize) -> Self {
        self.error_buffer_size = size;
        self
    }

    /// Directories to check, in order.
    #[must_use]
    pub fn candidate_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if self.include_working_dir {
            if let Ok(cwd) = std::env::current_dir() {
                dirs.push(cwd);
            }
        }
        if self.include_binary_dir {
            if let Some(dir) = std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
            {
                dirs.push(dir);
            }
        }
        dirs.extend(self.search_dirs.iter().cloned());
        dirs
    }

    /// Check the host platform against the allow-list.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPlatform` if the host is not allowed.
    pub fn platform(&self) -> Result<Platform> {
        let platform = Platform::current()?;
        match &self.supported_platforms {
            Some(allowed) if !allowed.contains(&platform) => Err(
                TaichiError::unsupported_platform(format!("{} (not in allow-list)", std::env::consts::OS)),
            ),
            _ => Ok(platform),
        }
    }

    /// Find the first candidate path holding `file_name`.
    ///
    /// # Errors
    ///
    /// Returns `LibraryNotFound` listing every directory checked.
    pub fn locate(&self, file_name: &str) -> Result<PathBuf> {
        let searched = self.candidate_dirs();
        searched
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|path| path.is_file())
            .ok_or_else(|| TaichiError::LibraryNotFound {
                file_name: file_name.to_string(),
                searched,
            })
    }
}

impl ValidatableConfig for LoaderConfig {
    fn validate(&self) -> Result<()> {
        if self.error_buffer_size == 0 {
            return Err(TaichiError::invalid_config(
                "error_buffer_size must be at least 1 to carry a message",
            ));
        }
        if !self.include_working_dir && !self.include_binary_dir && self.search_dirs.is_empty() {
            return Err(TaichiError::invalid_config(
                "no search directories configured",
            ));
        }
        if self.supported_platforms.as_ref().is_some_and(Vec::is_empty) {
            return Err(TaichiError::invalid_config(
                "supported_platforms must not be empty",
            ));
        }
        Ok(())
    }
}

/// Native library version, decoded from `ti_get_version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

impl Version {
    /// Decode `major * 1_000_000 + minor * 1_000 + patch`.
    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        Self {
            major: raw / 1_000_000,
            minor: (raw / 1_000) % 1_000,
            patch: raw % 1_000,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A loaded Taichi C-API: the library handle plus resolved entry points.
///
/// All safe wrappers hold an `Arc<TaichiLibrary>` and route every native call
/// through [`TaichiLibrary::checked`], which queries the error channel after
/// the call and turns any non-success code into an error.
#[derive(Debug)]
pub struct TaichiLibrary {
    // Keeps the function pointers in `api` valid.
    _library: Option<Library>,
    api: NativeApi,
    path: Option<PathBuf>,
    error_buffer_size: usize,
}

impl TaichiLibrary {
    /// Locate, open, and resolve the native library.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the configuration is invalid
    /// - `UnsupportedPlatform` if the host OS is not supported
    /// - `LibraryNotFound` if no candidate directory holds the library
    /// - `LibraryLoad` if the dynamic loader rejects the file
    /// - `SymbolResolution` if a declared export is missing
    pub fn open(config: &LoaderConfig) -> Result<Self> {
        config.validate()?;
        let platform = config.platform()?;
        let path = config.locate(platform.library_file_name())?;
        Self::open_path(&path, config.error_buffer_size)
    }

    /// Open the library at an explicit path.
    ///
    /// # Errors
    ///
    /// Returns `LibraryLoad` or `SymbolResolution` as for [`Self::open`].
    pub fn open_path(path: &Path, error_buffer_size: usize) -> Result<Self> {
        tracing::debug!(target: "taichi_aot::loader", path = %path.display(), "opening Taichi C-API");

        // SAFETY: loading a shared library runs its initialisers; the Taichi
        // C-API has no initialisers with preconditions on the host process.
        let library = unsafe { Library::new(path) }.map_err(|e| TaichiError::LibraryLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        // SAFETY: the descriptor table mirrors the C header for this library.
        let api = unsafe { NativeApi::resolve(&library) }?;

        let loaded = Self {
            _library: Some(library),
            api,
            path: Some(path.to_path_buf()),
            error_buffer_size: error_buffer_size.max(1),
        };
        tracing::info!(
            target: "taichi_aot::loader",
            path = %path.display(),
            version = %loaded.version(),
            "Taichi C-API loaded"
        );
        Ok(loaded)
    }

    /// Wrap entry points that are already resolved.
    ///
    /// Used for statically linked builds and for in-process implementations
    /// of the C-API.
    ///
    /// # Safety
    ///
    /// Every pointer in `api` must implement the corresponding Taichi C-API
    /// function and stay valid for the lifetime of the returned value.
    #[must_use]
    pub unsafe fn from_api(api: NativeApi) -> Self {
        Self {
            _library: None,
            api,
            path: None,
            error_buffer_size: DEFAULT_ERROR_BUFFER_SIZE,
        }
    }

    /// Resolved entry points.
    #[must_use]
    pub fn api(&self) -> &NativeApi {
        &self.api
    }

    /// Path the library was loaded from, if it came from disk.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Native library version.
    #[must_use]
    pub fn version(&self) -> Version {
        log_native_call("ti_get_version");
        // SAFETY: no arguments; pure query.
        Version::from_raw(unsafe { (self.api.ti_get_version)() })
    }

    /// Arches the native library can create runtimes for.
    ///
    /// Unknown raw values are skipped and at most `TI_MAX_ARCH_COUNT` entries
    /// are returned.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn available_archs(&self) -> Result<Vec<Arch>> {
        let mut count = 0u32;
        self.checked("ti_get_available_archs", |api| {
            // SAFETY: null output array requests the count only.
            unsafe { (api.ti_get_available_archs)(&mut count, std::ptr::null_mut()) }
        })?;

        let capacity = (count as usize).min(TI_MAX_ARCH_COUNT);
        let mut raw = vec![0i32; capacity];
        // Bounded by TI_MAX_ARCH_COUNT.
        #[allow(clippy::cast_possible_truncation)]
        let mut filled = capacity as u32;
        self.checked("ti_get_available_archs", |api| {
            // SAFETY: `raw` holds `filled` writable slots.
            unsafe { (api.ti_get_available_archs)(&mut filled, raw.as_mut_ptr()) }
        })?;
        raw.truncate((filled as usize).min(capacity));

        Ok(raw
            .into_iter()
            .filter_map(|value| {
                let arch = Arch::from_raw(value);
                if arch.is_none() {
                    tracing::debug!(target: "taichi_aot::ffi", value, "skipping unknown arch");
                }
                arch
            })
            .collect())
    }

    /// Read the most recent native error.
    ///
    /// Up to `buffer_size` bytes of message are retrieved; the message is cut
    /// at the first NUL and decoded lossily. A `buffer_size` of zero queries
    /// the code only. A [`ErrorCode::Success`] code means no error.
    #[must_use]
    pub fn last_error(&self, buffer_size: usize) -> (String, ErrorCode) {
        let mut buffer = vec![0u8; buffer_size];
        let mut size = buffer_size as u64;
        let message_ptr = if buffer_size == 0 {
            std::ptr::null_mut()
        } else {
            buffer.as_mut_ptr().cast::<c_char>()
        };

        // SAFETY: `message_ptr` is null or points to `size` writable bytes.
        let code = unsafe { (self.api.ti_get_last_error)(&mut size, message_ptr) };

        let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
        let message = String::from_utf8_lossy(&buffer[..end]).into_owned();
        (message, ErrorCode::from_raw(code))
    }

    /// Record a synthetic error on the native error channel.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `message` contains a NUL byte.
    pub fn set_last_error(&self, code: ErrorCode, message: &str) -> Result<()> {
        let message = CString::new(message)
            .map_err(|_| TaichiError::invalid_argument("error message contains a NUL byte"))?;
        log_native_call("ti_set_last_error");
        // SAFETY: `message` is NUL-terminated and outlives the call.
        unsafe { (self.api.ti_set_last_error)(code.as_raw(), message.as_ptr()) };
        Ok(())
    }

    /// Query the error channel and fail on any non-success code.
    ///
    /// # Errors
    ///
    /// Returns `Api` carrying the native code and message.
    pub fn check(&self) -> Result<()> {
        self.check_api().map_err(TaichiError::Api)
    }

    pub(crate) fn check_api(&self) -> std::result::Result<(), ApiError> {
        let (message, code) = self.last_error(self.error_buffer_size);
        if code.is_success() {
            Ok(())
        } else {
            tracing::debug!(
                target: "taichi_aot::ffi",
                code = code.as_raw(),
                %message,
                "native error reported"
            );
            Err(ApiError::new(code, message))
        }
    }

    /// Invoke a native entry point, then check the error channel.
    ///
    /// `call` receives the resolved entry points and performs the unsafe call.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn checked<T>(&self, symbol: &'static str, call: impl FnOnce(&NativeApi) -> T) -> Result<T> {
        self.checked_api(symbol, call).map_err(TaichiError::Api)
    }

    pub(crate) fn checked_api<T>(
        &self,
        symbol: &'static str,
        call: impl FnOnce(&NativeApi) -> T,
    ) -> std::result::Result<T, ApiError> {
        log_native_call(symbol);
        let out = call(&self.api);
        self.check_api()?;
        Ok(out)
    }
}

/// Idempotent, shared initialization of a [`TaichiLibrary`].
///
/// The first successful [`Loader::load`] opens the library; later calls hand
/// out the same `Arc` without reopening it or resolving symbols again. A
/// failed load leaves the loader empty so the caller may fix the environment
/// and retry.
#[derive(Debug)]
pub struct Loader {
    config: LoaderConfig,
    library: Mutex<Option<Arc<TaichiLibrary>>>,
}

impl Loader {
    /// Create a loader. Nothing is opened until [`Self::load`].
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            library: Mutex::new(None),
        }
    }

    /// Create a loader around an already opened library.
    #[must_use]
    pub fn with_library(config: LoaderConfig, library: Arc<TaichiLibrary>) -> Self {
        Self {
            config,
            library: Mutex::new(Some(library)),
        }
    }

    /// Open the library once and return the shared handle.
    ///
    /// # Errors
    ///
    /// Propagates [`TaichiLibrary::open`] errors from the first load.
    pub fn load(&self) -> Result<Arc<TaichiLibrary>> {
        let mut slot = self.library.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(library) = slot.as_ref() {
            tracing::trace!(target: "taichi_aot::loader", "Taichi C-API already loaded");
            return Ok(Arc::clone(library));
        }
        let library = Arc::new(TaichiLibrary::open(&self.config)?);
        *slot = Some(Arc::clone(&library));
        Ok(library)
    }

    /// Whether a library has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.library
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The loader configuration.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Directories from `dirs` that a later load request would not search.
    ///
    /// Empty until the library is loaded. Afterwards, any directory missing
    /// from this loader's own search list is returned, since the open
    /// library is reused as is.
    #[must_use]
    pub fn unused_search_dirs<'a>(&self, dirs: &'a [PathBuf]) -> Vec<&'a PathBuf> {
        if !self.is_loaded() {
            return Vec::new();
        }
        dirs.iter()
            .filter(|dir| !self.config.search_dirs.contains(dir))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_library_name_per_platform() {
        assert_eq!(Platform::Linux.library_file_name(), "libtaichi_c_api.so");
        assert_eq!(Platform::MacOs.library_file_name(), "libtaichi_c_api.dylib");
        assert_eq!(Platform::Windows.library_file_name(), "taichi_c_api.dll");

        let names: std::collections::HashSet<_> = [Platform::Linux, Platform::MacOs, Platform::Windows]
            .iter()
            .map(|p| p.library_file_name())
            .collect();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_platform_from_os() {
        assert_eq!(Platform::from_os("linux").unwrap(), Platform::Linux);
        assert_eq!(Platform::from_os("macos").unwrap(), Platform::MacOs);
        assert_eq!(Platform::from_os("windows").unwrap(), Platform::Windows);
        assert!(matches!(
            Platform::from_os("freebsd").unwrap_err(),
            TaichiError::UnsupportedPlatform { .. }
        ));
    }

    #[test]
    fn test_candidate_dirs_order() {
        let config = LoaderConfig::new().with_search_dir("/opt/taichi");
        let dirs = config.candidate_dirs();
        assert_eq!(dirs.first(), std::env::current_dir().ok().as_ref());
        assert_eq!(dirs.last(), Some(&PathBuf::from("/opt/taichi")));

        let only_extra = LoaderConfig::new()
            .with_default_dirs(false)
            .with_search_dir("/a")
            .with_search_dir("/b");
        assert_eq!(
            only_extra.candidate_dirs(),
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn test_locate_reports_searched_dirs() {
        let config = LoaderConfig::new()
            .with_default_dirs(false)
            .with_search_dir("/nonexistent/taichi-aot-test");
        match config.locate("libtaichi_c_api.so").unwrap_err() {
            TaichiError::LibraryNotFound { file_name, searched } => {
                assert_eq!(file_name, "libtaichi_c_api.so");
                assert_eq!(searched, vec![PathBuf::from("/nonexistent/taichi-aot-test")]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(LoaderConfig::default().validate().is_ok());
        assert!(LoaderConfig::new().with_error_buffer_size(0).validate().is_err());
        assert!(LoaderConfig::new().with_default_dirs(false).validate().is_err());
        assert!(LoaderConfig::new()
            .with_supported_platforms(Vec::new())
            .validate()
            .is_err());
    }

    #[test]
    fn test_platform_allow_list() {
        let Ok(host) = Platform::current() else {
            return;
        };
        let others: Vec<_> = [Platform::Linux, Platform::MacOs, Platform::Windows]
            .into_iter()
            .filter(|p| *p != host)
            .collect();
        let config = LoaderConfig::new().with_supported_platforms(others);
        assert!(matches!(
            config.platform().unwrap_err(),
            TaichiError::UnsupportedPlatform { .. }
        ));
        assert_eq!(
            LoaderConfig::new().with_supported_platforms(vec![host]).platform().unwrap(),
            host
        );
    }

    #[test]
    fn test_open_missing_library_fails_fast() {
        let config = LoaderConfig::new()
            .with_default_dirs(false)
            .with_search_dir("/nonexistent/taichi-aot-test");
        let err = TaichiLibrary::open(&config).unwrap_err();
        assert!(err.is_binding_local());
    }

    #[test]
    fn test_failed_load_leaves_loader_empty() {
        let loader = Loader::new(
            LoaderConfig::new()
                .with_default_dirs(false)
                .with_search_dir("/nonexistent/taichi-aot-test"),
        );
        assert!(loader.load().is_err());
        assert!(!loader.is_loaded());
    }

    #[test]
    fn test_version_decoding() {
        let v = Version::from_raw(1_007_003);
        assert_eq!((v.major, v.minor, v.patch), (1, 7, 3));
        assert_eq!(v.to_string(), "1.7.3");
        assert_eq!(Version::from_raw(0).to_string(), "0.0.0");
    }
}
