//! Transient user-facing notices (the dashboard's toasts).

use std::cell::RefCell;
use std::collections::VecDeque;

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// FIFO of notices waiting to be shown. Single-threaded, shared by reference.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    pending: RefCell<VecDeque<Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "notice");
        self.push(NoticeLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "error notice");
        self.push(NoticeLevel::Error, message);
    }

    fn push(&self, level: NoticeLevel, message: String) {
        self.pending.borrow_mut().push_back(Notice { level, message });
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Takes every pending notice, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        self.pending.borrow_mut().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_order() {
        let board = NoticeBoard::new();
        board.error("Could not save start point");
        board.success("Route optimization completed");
        assert_eq!(board.len(), 2);

        let notices = board.drain();
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[1].message, "Route optimization completed");
        assert!(board.is_empty());
    }
}
