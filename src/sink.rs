//! Text notification sinks.
//!
//! The server may interleave any number of TEXT frames with a call's
//! terminal reply; each one carries console output produced while the
//! method ran. The call executor forwards them, in arrival order, to a
//! [`TextSink`] before the call returns. Notifications are a side channel:
//! they never affect the call's outcome.

use crate::messages::CoreTextNotification;

/// Receiver for text notifications streamed alongside a call.
pub trait TextSink {
    /// Deliver one notification, in arrival order.
    fn notify(&mut self, notification: &CoreTextNotification);
}

/// Default sink: forwards each fragment to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl TextSink for LogSink {
    fn notify(&mut self, notification: &CoreTextNotification) {
        for fragment in &notification.fragments {
            tracing::info!(target: "dfremote::server", "{}", fragment.text.trim_end());
        }
    }
}

/// Recording sink: keeps every notification for later inspection.
///
/// Useful for embedders that surface server text in their own UI, and for
/// tests asserting delivery order.
#[derive(Debug, Default)]
pub struct MemorySink {
    notifications: Vec<CoreTextNotification>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far, oldest first.
    pub fn notifications(&self) -> &[CoreTextNotification] {
        &self.notifications
    }

    /// Concatenated text of every fragment received so far.
    pub fn text(&self) -> String {
        self.notifications
            .iter()
            .flat_map(|n| n.fragments.iter())
            .map(|f| f.text.as_str())
            .collect()
    }

    /// Drop everything recorded so far.
    pub fn clear(&mut self) {
        self.notifications.clear();
    }
}

impl TextSink for MemorySink {
    fn notify(&mut self, notification: &CoreTextNotification) {
        self.notifications.push(notification.clone());
    }
}

/// Shared-handle forwarding, so a caller can keep a handle to the sink it
/// hands the client (the client is single-threaded by design, so a
/// non-atomic handle is enough).
impl<T: TextSink> TextSink for std::rc::Rc<std::cell::RefCell<T>> {
    fn notify(&mut self, notification: &CoreTextNotification) {
        self.borrow_mut().notify(notification);
    }
}
