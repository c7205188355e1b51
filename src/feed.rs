use crate::store::append_unique;
use crate::types::CommitEvent;

// ---------------------------------------------------------------------------
// Feed state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Loading,
    /// The backend returned a short page; no further fetches until `reset`.
    Exhausted,
}

/// Continuation token for one page fetch. Opaque above the feed controller —
/// the page index is an implementation detail of the current backend.
#[derive(Debug, Clone, Copy)]
pub struct PageCursor {
    page: u32,
    limit: u32,
}

impl PageCursor {
    pub(crate) fn page(&self) -> u32 {
        self.page
    }

    pub(crate) fn limit(&self) -> u32 {
        self.limit
    }
}

/// Incremental loader for the append-only commit feed.
///
/// `Idle → Loading → {Idle | Exhausted}`. The network await happens outside
/// this type: callers `begin()` to claim the load (a no-op while one is in
/// flight or after exhaustion), fetch, then `complete()` or `abort()`. Items
/// append in order and are deduplicated by id, so a page fetched twice
/// during a race changes nothing.
#[derive(Debug)]
pub struct FeedController {
    state: FeedState,
    items: Vec<CommitEvent>,
    next_page: u32,
    page_size: u32,
}

impl FeedController {
    pub fn new(page_size: u32) -> Self {
        Self {
            state: FeedState::Idle,
            items: Vec::new(),
            next_page: 1,
            page_size,
        }
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn items(&self) -> &[CommitEvent] {
        &self.items
    }

    pub fn has_more(&self) -> bool {
        self.state != FeedState::Exhausted
    }

    /// Claim the next load. `None` means no-op: a load is already in flight,
    /// or the feed is exhausted.
    pub fn begin(&mut self) -> Option<PageCursor> {
        match self.state {
            FeedState::Idle => {
                self.state = FeedState::Loading;
                Some(PageCursor {
                    page: self.next_page,
                    limit: self.page_size,
                })
            }
            FeedState::Loading | FeedState::Exhausted => None,
        }
    }

    /// Apply a fetched page. A short page (fewer items than the page size)
    /// marks the feed exhausted. Returns the number of items appended.
    pub fn complete(&mut self, page: Vec<CommitEvent>) -> usize {
        if self.state != FeedState::Loading {
            return 0;
        }
        let short = page.len() < self.page_size as usize;
        let appended = append_unique(&mut self.items, page);
        self.next_page += 1;
        self.state = if short {
            FeedState::Exhausted
        } else {
            FeedState::Idle
        };
        appended
    }

    /// The fetch failed — back to `Idle` so the user can retry.
    pub fn abort(&mut self) {
        if self.state == FeedState::Loading {
            self.state = FeedState::Idle;
        }
    }

    /// Full reset, e.g. on a scope change. The only way out of `Exhausted`.
    pub fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_page(start_id: u64, len: usize) -> Vec<CommitEvent> {
        (0..len as u64)
            .map(|offset| CommitEvent {
                id: start_id + offset,
                author: "alice".to_owned(),
                message: format!("commit {}", start_id + offset),
                run_id: None,
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn pages_append_until_short_page_exhausts() {
        let mut feed = FeedController::new(5);

        let cursor = feed.begin().unwrap();
        assert_eq!(cursor.page(), 1);
        assert_eq!(feed.complete(make_page(1, 5)), 5);
        assert!(feed.has_more());

        let cursor = feed.begin().unwrap();
        assert_eq!(cursor.page(), 2);
        assert_eq!(feed.complete(make_page(6, 5)), 5);
        assert!(feed.has_more());

        feed.begin().unwrap();
        assert_eq!(feed.complete(make_page(11, 2)), 2);
        assert!(!feed.has_more());
        assert_eq!(feed.state(), FeedState::Exhausted);
        assert_eq!(feed.items().len(), 12);
    }

    #[test]
    fn load_while_loading_is_a_no_op() {
        let mut feed = FeedController::new(5);
        assert!(feed.begin().is_some());
        assert!(feed.begin().is_none());
        assert_eq!(feed.state(), FeedState::Loading);
    }

    #[test]
    fn exhausted_feed_ignores_load_more_until_reset() {
        let mut feed = FeedController::new(5);
        feed.begin().unwrap();
        feed.complete(make_page(1, 2));
        assert_eq!(feed.state(), FeedState::Exhausted);

        assert!(feed.begin().is_none());
        assert_eq!(feed.items().len(), 2);

        feed.reset();
        assert!(feed.items().is_empty());
        let cursor = feed.begin().unwrap();
        assert_eq!(cursor.page(), 1);
    }

    #[test]
    fn duplicate_page_is_deduplicated_by_id() {
        let mut feed = FeedController::new(5);
        feed.begin().unwrap();
        feed.complete(make_page(1, 5));

        // The same page arrives again after a race.
        feed.begin().unwrap();
        assert_eq!(feed.complete(make_page(1, 5)), 0);
        assert_eq!(feed.items().len(), 5);
    }

    #[test]
    fn abort_returns_to_idle() {
        let mut feed = FeedController::new(5);
        let cursor = feed.begin().unwrap();
        assert_eq!(cursor.limit(), 5);
        feed.abort();
        assert_eq!(feed.state(), FeedState::Idle);
        // Retry fetches the same page.
        assert_eq!(feed.begin().unwrap().page(), 1);
    }

    #[test]
    fn complete_without_begin_is_ignored() {
        let mut feed = FeedController::new(5);
        assert_eq!(feed.complete(make_page(1, 5)), 0);
        assert!(feed.items().is_empty());
        assert_eq!(feed.state(), FeedState::Idle);
    }
}
