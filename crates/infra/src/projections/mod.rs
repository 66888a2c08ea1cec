//! Projection implementations (read model builders).
//!
//! Projections consume committed event envelopes and maintain query-optimized
//! read models. All projections are:
//! - **Rebuildable**: can be reconstructed from the event streams
//! - **Idempotent**: per-stream cursors make at-least-once delivery safe
//!
//! Application services apply committed events synchronously after each
//! dispatch, so reads observe writes immediately.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use assetflow_core::AggregateId;

pub mod assets;
pub mod employees;
pub mod payments;
pub mod requests;
pub mod teams;

pub use assets::{AssetFilter, AssetRow, AssetSort, AssetsProjection};
pub use employees::{EmployeeRow, EmployeesProjection};
pub use payments::{PaymentRow, PaymentsProjection};
pub use requests::{RequestFilter, RequestRow, RequestsProjection, TypeCount};
pub use teams::{TeamRow, TeamsProjection};

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize event payload: {0}")]
    Deserialize(String),

    #[error("event does not match envelope stream: {0}")]
    StreamMismatch(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Outcome of a cursor check for an incoming envelope.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CursorDecision {
    Apply,
    /// Replay at or below the cursor; safe to ignore.
    Duplicate,
}

/// Per-stream cursors tracking the last applied sequence number.
///
/// Events are applied synchronously by the services, one dispatch at a time,
/// so check-then-advance is not racy in practice.
#[derive(Debug, Default)]
pub struct StreamCursors {
    inner: RwLock<HashMap<AggregateId, u64>>,
}

impl StreamCursors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decide(
        &self,
        aggregate_id: AggregateId,
        sequence_number: u64,
    ) -> Result<CursorDecision, ProjectionError> {
        let cursors = match self.inner.read() {
            Ok(c) => c,
            Err(_) => return Ok(CursorDecision::Duplicate),
        };
        let last = *cursors.get(&aggregate_id).unwrap_or(&0);

        if sequence_number == 0 {
            return Err(ProjectionError::NonMonotonicSequence {
                last,
                found: sequence_number,
            });
        }
        if sequence_number <= last {
            return Ok(CursorDecision::Duplicate);
        }
        // The first observed event may sit at any positive sequence; after
        // that we require strict +1 increments.
        if last != 0 && sequence_number != last + 1 {
            return Err(ProjectionError::NonMonotonicSequence {
                last,
                found: sequence_number,
            });
        }
        Ok(CursorDecision::Apply)
    }

    pub fn advance(&self, aggregate_id: AggregateId, sequence_number: u64) {
        if let Ok(mut cursors) = self.inner.write() {
            cursors.insert(aggregate_id, sequence_number);
        }
    }

    pub fn reset(&self) {
        if let Ok(mut cursors) = self.inner.write() {
            cursors.clear();
        }
    }
}

/// One page of a list query: the page's rows plus the total row count the
/// pagination UI needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: usize,
}

/// 1-based pagination parameters; both absent means "everything".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: Option<usize>,
    pub size: Option<usize>,
}

impl PageRequest {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of(page: usize, size: usize) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }
}

/// Slice `rows` to the requested page. `count` is reported as-is: some list
/// endpoints count a broader set than the filtered rows being paged.
pub fn paginate_counted<T>(rows: Vec<T>, count: usize, request: PageRequest) -> Page<T> {
    let items = match (request.page, request.size) {
        (Some(page), Some(size)) if page >= 1 && size > 0 => {
            let start = (page - 1) * size;
            rows.into_iter().skip(start).take(size).collect()
        }
        _ => rows,
    };
    Page { items, count }
}

/// Slice `rows` to the requested page, counting the rows themselves.
pub fn paginate<T>(rows: Vec<T>, request: PageRequest) -> Page<T> {
    let count = rows.len();
    paginate_counted(rows, count, request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_one_based() {
        let rows: Vec<u32> = (1..=10).collect();
        let page = paginate(rows, PageRequest::of(2, 3));
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.count, 10);
    }

    #[test]
    fn missing_page_params_return_everything() {
        let rows: Vec<u32> = (1..=4).collect();
        let page = paginate(rows, PageRequest::all());
        assert_eq!(page.items.len(), 4);
        assert_eq!(page.count, 4);
    }

    #[test]
    fn cursor_rejects_gaps_and_ignores_replays() {
        let cursors = StreamCursors::new();
        let id = AggregateId::new();

        assert_eq!(cursors.decide(id, 1).unwrap(), CursorDecision::Apply);
        cursors.advance(id, 1);

        assert_eq!(cursors.decide(id, 1).unwrap(), CursorDecision::Duplicate);
        assert!(matches!(
            cursors.decide(id, 3),
            Err(ProjectionError::NonMonotonicSequence { last: 1, found: 3 })
        ));
        assert_eq!(cursors.decide(id, 2).unwrap(), CursorDecision::Apply);
    }
}
