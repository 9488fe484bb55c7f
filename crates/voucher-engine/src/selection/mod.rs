//! Best-voucher selection: score every voucher against an order under a
//! bounded worker pool and keep the largest discount.
//!
//! Flow: [`VoucherSource`] → [`BoundedDispatcher`] → [`calculate_discount`] →
//! result channel → [`RunningBest`] → [`Selection`] or
//! [`SelectionError::NoEligibleVoucher`].

pub mod dispatcher;
pub mod domain;
pub mod observer;
pub mod reducer;
pub mod router;
pub mod run;
pub mod scoring;
pub mod selector;
pub mod service;
pub mod source;

#[cfg(test)]
mod tests;

pub use dispatcher::{BoundedDispatcher, Completion, Dispatch};
pub use domain::{DiscountRule, OrderContext, RunStats, ScoredVoucher, Selection, Voucher};
pub use observer::{NoopObserver, SelectionObserver, TracingObserver};
pub use reducer::RunningBest;
pub use router::{selection_router, BestVoucherRequest, BestVoucherResponse};
pub use run::{CancelHandle, Interruption, RunContext};
pub use scoring::{calculate_discount, EvaluationError, MalformedVoucher};
pub use selector::{SelectionConfig, SelectionError, VoucherSelector};
pub use service::VoucherSelectionService;
pub use source::{CsvVoucherSource, SourceError, StaticVoucherSource, VoucherSource};
