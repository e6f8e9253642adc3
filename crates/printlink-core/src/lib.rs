// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printlink core: types, job state model and error definitions shared by
// the submission crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CloudConfig, SpoolerConfig, SubmitConfig};
pub use error::{PrintError, Result};
pub use types::*;
