//! Nullable notifier: records every notice.

use skillswap_types::{Notice, NoticeLevel, Notifier};
use std::sync::Mutex;

#[derive(Default)]
pub struct NullNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl NullNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.level == level)
            .count()
    }
}

impl Notifier for NullNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
