// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Kernel launch.

use crate::aot_module::AotModule;
use crate::argument::{Argument, HostValue, StagedArguments};
use crate::error::{Result, TaichiError};
use crate::host_array::HostArray;
use crate::logging::log_launch;
use crate::sys::handles::{TiKernel, TiRuntime};
use crate::sys::structs::TiArgument;
use crate::traits::RuntimeBound;

/// A kernel retrieved from an [`AotModule`].
#[derive(Debug, Clone)]
pub struct Kernel<'m> {
    module: &'m AotModule<'m>,
    handle: TiKernel,
    name: String,
}

impl<'m> Kernel<'m> {
    pub(crate) fn new(module: &'m AotModule<'m>, handle: TiKernel, name: &str) -> Self {
        Self {
            module,
            handle,
            name: name.to_string(),
        }
    }

    /// Queue one launch with positional arguments.
    ///
    /// The launch is asynchronous; call [`crate::Runtime::wait`] before
    /// reading results.
    ///
    /// # Preconditions
    ///
    /// Every ND-array and texture in `args` must belong to this kernel's
    /// runtime and stay allocated until the launch completes.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the native library rejects the launch.
    pub fn launch(&self, args: &[Argument]) -> Result<()> {
        let raw: Vec<TiArgument> = args.iter().map(Argument::to_raw).collect();
        let count = u32::try_from(raw.len())
            .map_err(|_| TaichiError::invalid_argument("too many kernel arguments"))?;
        log_launch("kernel", raw.len());

        let runtime = self.module.runtime();
        runtime.library().checked("ti_launch_kernel", |api| {
            // SAFETY: `raw` holds `count` initialised arguments for the call.
            unsafe { (api.ti_launch_kernel)(runtime.handle(), self.handle, count, raw.as_ptr()) }
        })
    }

    /// Queue one launch with staged arguments.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the arguments were staged on another
    /// runtime, and `Api` if the native library rejects the launch.
    pub fn launch_staged(&self, staged: &StagedArguments<'_>) -> Result<()> {
        self.ensure_same_runtime(staged)?;
        self.launch(staged.arguments())
    }

    /// Stage, launch, wait, and read every ND-array back.
    ///
    /// Returns the read-back arrays in argument order. Staging allocations
    /// are freed whether or not the launch succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first staging, launch, wait or read-back failure.
    pub fn run(&self, values: Vec<HostValue>) -> Result<Vec<HostArray>> {
        let runtime = self.module.runtime();
        let staged = StagedArguments::stage(runtime, values)?;
        if let Err(e) = self.launch_staged(&staged).and_then(|()| runtime.wait()) {
            if let Err(cleanup) = staged.release() {
                tracing::warn!(target: "taichi_aot::launch", error = %cleanup, "failed to release staged arguments");
            }
            return Err(e);
        }
        staged.read_back()
    }

    /// Raw kernel handle.
    #[must_use]
    pub fn handle(&self) -> TiKernel {
        self.handle
    }

    /// Name the kernel was looked up by.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl RuntimeBound for Kernel<'_> {
    fn runtime_handle(&self) -> TiRuntime {
        self.module.runtime_handle()
    }
}
