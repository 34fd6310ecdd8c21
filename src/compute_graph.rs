// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Compute-graph launch.
//!
//! A compute graph is a fixed sequence of kernel invocations baked into the
//! AOT module. Its arguments are bound by name rather than position.

use crate::aot_module::AotModule;
use crate::argument::{HostValue, NamedArgument, StagedArguments};
use crate::error::{Result, TaichiError};
use crate::host_array::HostArray;
use crate::logging::log_launch;
use crate::sys::handles::{TiComputeGraph, TiRuntime};
use crate::sys::structs::TiNamedArgument;
use crate::traits::RuntimeBound;

/// A compute graph retrieved from an [`AotModule`].
#[derive(Debug, Clone)]
pub struct ComputeGraph<'m> {
    module: &'m AotModule<'m>,
    handle: TiComputeGraph,
    name: String,
}

impl<'m> ComputeGraph<'m> {
    pub(crate) fn new(module: &'m AotModule<'m>, handle: TiComputeGraph, name: &str) -> Self {
        Self {
            module,
            handle,
            name: name.to_string(),
        }
    }

    /// Queue one launch with named arguments.
    ///
    /// # Preconditions
    ///
    /// Every ND-array and texture in `args` must belong to this graph's
    /// runtime and stay allocated until the launch completes.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the native library rejects the launch, e.g. with
    /// `ARGUMENT_NOT_FOUND` for a missing name.
    pub fn launch(&self, args: &[NamedArgument]) -> Result<()> {
        // The names stay owned by `args` for the whole call.
        let raw: Vec<TiNamedArgument> = args.iter().map(NamedArgument::to_raw).collect();
        let count = u32::try_from(raw.len())
            .map_err(|_| TaichiError::invalid_argument("too many graph arguments"))?;
        log_launch("compute_graph", raw.len());

        let runtime = self.module.runtime();
        runtime.library().checked("ti_launch_compute_graph", |api| {
            // SAFETY: `raw` holds `count` initialised arguments whose name
            // pointers borrow from `args`.
            unsafe { (api.ti_launch_compute_graph)(runtime.handle(), self.handle, count, raw.as_ptr()) }
        })
    }

    /// Stage, launch, wait, and read every ND-array back.
    ///
    /// Arrays are returned in the order of `values`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a name containing NUL, otherwise the
    /// first staging, launch, wait or read-back failure.
    pub fn run<S: AsRef<str>>(&self, values: Vec<(S, HostValue)>) -> Result<Vec<HostArray>> {
        let (names, values): (Vec<S>, Vec<HostValue>) = values.into_iter().unzip();
        // Validate names before anything is allocated.
        let mut named = names
            .iter()
            .map(|n| NamedArgument::new(n.as_ref(), 0))
            .collect::<Result<Vec<_>>>()?;

        let runtime = self.module.runtime();
        let staged = StagedArguments::stage(runtime, values)?;
        for (slot, argument) in named.iter_mut().zip(staged.arguments()) {
            slot.set_argument(*argument);
        }

        let launched = self
            .ensure_same_runtime(&staged)
            .and_then(|()| self.launch(&named))
            .and_then(|()| runtime.wait());
        if let Err(e) = launched {
            if let Err(cleanup) = staged.release() {
                tracing::warn!(target: "taichi_aot::launch", error = %cleanup, "failed to release staged arguments");
            }
            return Err(e);
        }
        staged.read_back()
    }

    /// Raw compute-graph handle.
    #[must_use]
    pub fn handle(&self) -> TiComputeGraph {
        self.handle
    }

    /// Name the graph was looked up by.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl RuntimeBound for ComputeGraph<'_> {
    fn runtime_handle(&self) -> TiRuntime {
        self.module.runtime_handle()
    }
}
