//! Concurrent best-voucher selection.
//!
//! Vouchers are scored against an order in parallel under a fixed worker cap and
//! reduced to the single largest discount. The [`selection`] module holds the
//! engine; [`config`], [`error`], and [`telemetry`] carry the process plumbing
//! shared by the CLI runner and the HTTP service.

pub mod config;
pub mod error;
pub mod selection;
pub mod telemetry;
