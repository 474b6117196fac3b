//! `tracing` spans for transactions and migration units.
//!
//! Compiled only with the `tracing` feature; callers enter the span for the
//! duration of the operation.

use tracing::{info_span, Span};

pub(crate) fn begin_transaction_span(depth: u32) -> Span {
    info_span!("shelfwise.transaction.begin", depth)
}

pub(crate) fn commit_transaction_span(depth: u32) -> Span {
    info_span!("shelfwise.transaction.commit", depth)
}

pub(crate) fn rollback_transaction_span(depth: u32) -> Span {
    info_span!("shelfwise.transaction.rollback", depth)
}

pub(crate) fn migration_span(direction: &'static str, version: i64, name: &str) -> Span {
    info_span!("shelfwise.migration", direction, version, name)
}
