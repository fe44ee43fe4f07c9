//! Stale-result discarding for superseded projection requests.
//!
//! Projection requests triggered by user-visible method changes can arrive
//! faster than computation completes. The tracker hands out tickets with a
//! monotonically increasing generation number; a result is delivered only
//! if its ticket is still the latest issued. A slow earlier computation can
//! therefore never overwrite a newer one. The comparison is an explicit
//! sequence-number check, with no timers involved.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A claim on one request generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    /// The generation number this ticket was issued at.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Issues tickets and gates delivery to the latest one.
///
/// Cheap to clone; clones share the same counter, so tickets issued through
/// any clone supersede tickets issued through every other. Safe to use from
/// worker threads.
#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    latest: Arc<AtomicU64>,
}

impl RequestTracker {
    /// Create a tracker with no requests issued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a new request, superseding all earlier tickets.
    pub fn issue(&self) -> RequestTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RequestTicket { generation }
    }

    /// Whether `ticket` is still the latest issued.
    ///
    /// Long-running computations can poll this to abandon superseded work
    /// early; doing so is an optimization, not required for correctness.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.generation == self.latest.load(Ordering::SeqCst)
    }

    /// Deliver a computed result against its ticket.
    ///
    /// Returns `Some(result)` only when the ticket is still the latest;
    /// results from superseded requests are silently discarded.
    pub fn deliver<T>(&self, ticket: RequestTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            debug!(
                generation = ticket.generation,
                latest = self.latest.load(Ordering::SeqCst),
                "discarding superseded result"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generations_are_monotonic() {
        let tracker = RequestTracker::new();
        let a = tracker.issue();
        let b = tracker.issue();
        let c = tracker.issue();
        assert!(a.generation() < b.generation());
        assert!(b.generation() < c.generation());
    }

    #[test]
    fn test_only_latest_result_is_delivered() {
        let tracker = RequestTracker::new();
        let first = tracker.issue();
        let second = tracker.issue();

        // The superseded request finishes late: its result is discarded
        // even though it arrives after the newer one was issued.
        assert_eq!(tracker.deliver(first, "first"), None);
        assert_eq!(tracker.deliver(second, "second"), Some("second"));
    }

    #[test]
    fn test_delivery_order_does_not_matter() {
        let tracker = RequestTracker::new();
        let first = tracker.issue();
        let second = tracker.issue();

        // Newest delivered first, stale one after: same outcome.
        assert_eq!(tracker.deliver(second, 2), Some(2));
        assert_eq!(tracker.deliver(first, 1), None);
    }

    #[test]
    fn test_is_current_flips_on_supersession() {
        let tracker = RequestTracker::new();
        let ticket = tracker.issue();
        assert!(tracker.is_current(ticket));

        tracker.issue();
        assert!(!tracker.is_current(ticket));
    }

    #[test]
    fn test_clones_share_the_counter() {
        let tracker = RequestTracker::new();
        let clone = tracker.clone();

        let old = tracker.issue();
        let new = clone.issue();

        assert_eq!(tracker.deliver(old, "old"), None);
        assert_eq!(tracker.deliver(new, "new"), Some("new"));
    }

    #[test]
    fn test_supersession_from_worker_thread() {
        let tracker = RequestTracker::new();
        let ticket = tracker.issue();

        let handle = {
            let tracker = tracker.clone();
            std::thread::spawn(move || tracker.issue())
        };
        let newer = handle.join().expect("worker thread");

        assert_eq!(tracker.deliver(ticket, "stale"), None);
        assert_eq!(tracker.deliver(newer, "fresh"), Some("fresh"));
    }
}
