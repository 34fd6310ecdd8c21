// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Texture samplers.

use crate::enums::{AddressMode, Filter};
use crate::error::{ApiError, ErrorCode, Result, TaichiError};
use crate::runtime::Runtime;
use crate::sys::handles::{TiRuntime, TiSampler};
use crate::sys::structs::TiSamplerCreateInfo;
use crate::traits::{RuntimeBound, ValidatableConfig};

/// Descriptor for [`Sampler::create`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerCreateInfo {
    /// Magnification filter.
    pub mag_filter: Filter,
    /// Minification filter.
    pub min_filter: Filter,
    /// Address mode for all axes.
    pub address_mode: AddressMode,
    /// Maximum anisotropy; 1.0 disables anisotropic filtering.
    pub max_anisotropy: f32,
}

impl Default for SamplerCreateInfo {
    fn default() -> Self {
        Self {
            mag_filter: Filter::Linear,
            min_filter: Filter::Linear,
            address_mode: AddressMode::Repeat,
            max_anisotropy: 1.0,
        }
    }
}

impl SamplerCreateInfo {
    /// Linear filtering, repeat addressing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both filters.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.mag_filter = filter;
        self.min_filter = filter;
        self
    }

    /// Set the address mode.
    #[must_use]
    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_mode = mode;
        self
    }

    /// Set the maximum anisotropy.
    #[must_use]
    pub fn with_max_anisotropy(mut self, value: f32) -> Self {
        self.max_anisotropy = value;
        self
    }

    /// The ABI descriptor.
    #[must_use]
    pub fn to_raw(&self) -> TiSamplerCreateInfo {
        TiSamplerCreateInfo {
            mag_filter: self.mag_filter.as_raw(),
            min_filter: self.min_filter.as_raw(),
            address_mode: self.address_mode.as_raw(),
            max_anisotropy: self.max_anisotropy,
        }
    }
}

impl ValidatableConfig for SamplerCreateInfo {
    fn validate(&self) -> Result<()> {
        if !self.max_anisotropy.is_finite() || self.max_anisotropy < 1.0 {
            return Err(TaichiError::invalid_argument(format!(
                "max_anisotropy must be a finite value >= 1.0, got {}",
                self.max_anisotropy
            )));
        }
        Ok(())
    }
}

/// A sampler owned by one runtime.
#[derive(Debug)]
pub struct Sampler<'rt> {
    runtime: &'rt Runtime,
    handle: TiSampler,
}

impl<'rt> Sampler<'rt> {
    /// Create a sampler.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an invalid descriptor and `Api` if the
    /// native call fails.
    pub fn create(runtime: &'rt Runtime, info: &SamplerCreateInfo) -> Result<Self> {
        info.validate()?;
        let raw = info.to_raw();
        let handle = runtime.library().checked("ti_create_sampler", |api| {
            // SAFETY: `raw` is a valid descriptor for the duration of the call.
            unsafe { (api.ti_create_sampler)(runtime.handle(), &raw) }
        })?;
        if handle.is_null() {
            return Err(TaichiError::Api(ApiError::synthesized(
                ErrorCode::OutOfMemory,
                "ti_create_sampler returned a null handle",
            )));
        }
        Ok(Self { runtime, handle })
    }

    /// Destroy the sampler.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the error channel reports a failure.
    pub fn destroy(self) -> Result<()> {
        self.runtime.library().checked("ti_destroy_sampler", |api| {
            // SAFETY: `self.handle` is live and consumed here.
            unsafe { (api.ti_destroy_sampler)(self.runtime.handle(), self.handle) }
        })
    }

    /// Raw sampler handle.
    #[must_use]
    pub fn handle(&self) -> TiSampler {
        self.handle
    }
}

impl RuntimeBound for Sampler<'_> {
    fn runtime_handle(&self) -> TiRuntime {
        self.runtime.handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_info_to_raw() {
        let raw = SamplerCreateInfo::new()
            .with_filter(Filter::Nearest)
            .with_address_mode(AddressMode::ClampToEdge)
            .to_raw();
        assert_eq!(raw.mag_filter, 0);
        assert_eq!(raw.min_filter, 0);
        assert_eq!(raw.address_mode, 2);
        assert!((raw.max_anisotropy - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sampler_info_validation() {
        assert!(SamplerCreateInfo::default().validate().is_ok());
        assert!(SamplerCreateInfo::new().with_max_anisotropy(16.0).validate().is_ok());
        assert!(SamplerCreateInfo::new().with_max_anisotropy(0.5).validate().is_err());
        assert!(SamplerCreateInfo::new().with_max_anisotropy(f32::NAN).validate().is_err());
    }
}
