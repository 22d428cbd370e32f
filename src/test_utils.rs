//! Test utilities for boardsync
//!
//! This module provides an in-memory record source, a renderer that keeps
//! every view it receives, sample records, and assertion helpers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{BoardsyncError, Result};
use crate::session::BoardRenderer;
use crate::source::RecordSource;
use crate::view::BoardView;

/// Identifier of the sample game: ten minutes plus ten seconds per move
pub const GAME_ID: &str = "wdoor+floodgate-600-10F+alice+bob+20230101120000";

/// Two plies, no end marker
pub const OPEN_RECORD: &str = "V2.2\n\
N+alice\n\
N-bob\n\
+\n\
+7776FU\n\
T10\n\
'** 30\n\
-3334FU\n\
T5\n";

/// The sample game after resignation
pub const CLOSED_RECORD: &str = "V2.2\n\
N+alice\n\
N-bob\n\
+\n\
+7776FU\n\
T10\n\
'** 30\n\
-3334FU\n\
T5\n\
%TORYO\n\
'$END_TIME:2023/01/01 12:30:00\n";

/// In-memory [`RecordSource`] with call counters and injectable failures
#[derive(Default)]
pub struct FakeSource {
    records: Mutex<HashMap<String, String>>,
    list: Mutex<Option<String>>,
    failures: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    record_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_record(&self, game_id: &str, text: &str) {
        self.records
            .lock()
            .unwrap()
            .insert(game_id.to_string(), text.to_string());
    }

    pub fn set_list(&self, text: &str) {
        *self.list.lock().unwrap() = Some(text.to_string());
    }

    /// Make the next `count` requests fail with a network error
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Make every record fetch take `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn record_calls(&self) -> usize {
        self.record_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RecordSource for FakeSource {
    async fn fetch_record(&self, game_id: &str) -> Result<String> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.take_failure() {
            return Err(BoardsyncError::Network("connection reset".to_string()).into());
        }
        self.records
            .lock()
            .unwrap()
            .get(game_id)
            .cloned()
            .ok_or_else(|| BoardsyncError::Network(format!("HTTP 404 for {}", game_id)).into())
    }

    async fn fetch_list(&self) -> Result<String> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_failure() {
            return Err(BoardsyncError::Network("connection reset".to_string()).into());
        }
        self.list
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BoardsyncError::Network("HTTP 404 for list".to_string()).into())
    }
}

/// [`BoardRenderer`] that keeps every view it is given
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    views: Arc<Mutex<Vec<BoardView>>>,
    released: Arc<AtomicBool>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_count(&self) -> usize {
        self.views.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<BoardView> {
        self.views.lock().unwrap().last().cloned()
    }

    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl BoardRenderer for RecordingRenderer {
    fn render(&mut self, view: &BoardView) {
        self.views.lock().unwrap().push(view.clone());
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_source_serves_records() {
        let source = FakeSource::new();
        source.set_record(GAME_ID, OPEN_RECORD);
        assert_eq!(source.fetch_record(GAME_ID).await.unwrap(), OPEN_RECORD);
        assert_error_contains(source.fetch_record("missing").await, "HTTP 404");
        assert_eq!(source.record_calls(), 2);
    }

    #[tokio::test]
    async fn test_fake_source_failures_run_out() {
        let source = FakeSource::new();
        source.set_list("a+b-1-1+20230101000000\n");
        source.fail_next(1);
        assert_error_contains(source.fetch_list().await, "connection reset");
        assert!(source.fetch_list().await.is_ok());
        assert_eq!(source.list_calls(), 2);
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }
}
