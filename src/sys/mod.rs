// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Raw Taichi C-API surface.
//!
//! Everything in here mirrors the C header one-to-one and is `unsafe` to use
//! directly. The safe wrappers in the crate root build on top of it.
//!
//! - [`types`] - `TiBool`, `TiFlags`, and raw enum values
//! - [`handles`] - typed opaque handles
//! - [`structs`] - `#[repr(C)]` records and unions
//! - [`api`] - the descriptor table and resolved function pointers

#![allow(missing_docs)]

pub mod api;
pub mod handles;
pub mod structs;
pub mod types;

pub use api::{signature, NativeApi, Signature, SIGNATURES};
pub use handles::*;
pub use structs::*;
pub use types::*;
