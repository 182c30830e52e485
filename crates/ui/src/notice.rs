//! Transient notices.

use std::time::{Duration, Instant};

/// How long a notice stays up.
pub const NOTICE_LIFETIME: Duration = Duration::from_millis(3000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub text: String,
    expires_at: Instant,
}

/// Short-lived messages shown over the panel or popup.
#[derive(Debug)]
pub struct Notices {
    items: Vec<Notice>,
    lifetime: Duration,
    next_id: u64,
}

impl Notices {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            items: Vec::new(),
            lifetime,
            next_id: 1,
        }
    }

    pub fn show(&mut self, kind: NoticeKind, text: impl Into<String>, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Notice {
            id,
            kind,
            text: text.into(),
            expires_at: now + self.lifetime,
        });
        id
    }

    pub fn error(&mut self, text: impl Into<String>, now: Instant) -> u64 {
        self.show(NoticeKind::Error, text, now)
    }

    /// Dismiss early. Returns whether the notice was still up.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drop expired notices.
    pub fn tick(&mut self, now: Instant) {
        self.items.retain(|n| n.expires_at > now);
    }

    /// Notices still up at `now`.
    pub fn active(&self, now: Instant) -> impl Iterator<Item = &Notice> {
        self.items.iter().filter(move |n| n.expires_at > now)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::new(NOTICE_LIFETIME)
    }
}
