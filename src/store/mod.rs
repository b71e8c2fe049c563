//! Buffered message store
//!
//! The correlator only ever reads; whatever session layer feeds the buffer
//! owns the writes. A bounded in-memory buffer is enough since correlation
//! only looks at a short recency window.

use crate::types::RawMessage;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;

/// Read-only view over recently seen chat messages
pub trait MessageStore: Send + Sync {
    /// Recent messages in ascending timestamp order
    fn recent_messages(&self) -> Vec<RawMessage>;
}

/// Bounded in-memory message buffer
#[derive(Clone)]
pub struct MessageBuffer {
    inner: Arc<RwLock<VecDeque<RawMessage>>>,
    capacity: usize,
}

impl MessageBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append a message, evicting the oldest when full
    pub fn push(&self, message: RawMessage) {
        let mut buf = self.inner.write();
        if buf.len() == self.capacity {
            buf.pop_front();
        }
        buf.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl MessageStore for MessageBuffer {
    fn recent_messages(&self) -> Vec<RawMessage> {
        self.inner.read().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(id: i64) -> RawMessage {
        RawMessage {
            id,
            chat_id: "chat".to_string(),
            sender_handle: None,
            is_bot: false,
            text: format!("msg {id}"),
            timestamp: Utc::now(),
            inline_urls: Vec::new(),
            reply_thread_id: None,
        }
    }

    #[test]
    fn push_and_read_back() {
        let buffer = MessageBuffer::new(10);
        buffer.push(message(1));
        buffer.push(message(2));
        let all = buffer.recent_messages();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[1].id, 2);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let buffer = MessageBuffer::new(2);
        buffer.push(message(1));
        buffer.push(message(2));
        buffer.push(message(3));
        let all = buffer.recent_messages();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, 2);
        assert_eq!(all[1].id, 3);
    }
}
