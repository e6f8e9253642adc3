// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printlink Submit: one adapter that submits a print job either to a spooler
// over IPP or to the cloud print API over HTTPS, and reports the outcome in
// a backend-neutral shape. Domain types live in `printlink-core`.

pub mod adapter;
pub mod cloud;
pub mod job;
pub mod printer;
pub mod retry;
pub mod server;
pub mod spooler;

pub use adapter::SubmissionAdapter;
pub use cloud::{CloudSession, HttpSession};
pub use job::{PrintJob, SubmissionOutcome};
pub use printer::{Printer, PrinterAttributes};
pub use server::{BackendConnection, ConnectionCheck, OpenConnection, PrintServer};
pub use spooler::{IppConnection, SpoolerConnection};
