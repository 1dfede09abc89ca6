//! The bounded mailbox every node's driver consumes from.
//!
//! A message-accepting participant (the transport's receive tasks) pushes
//! into the inbox; exactly one driver participant pops from it. The
//! underlying channel is never exposed — callers only see `push`/`pop`.

use crate::messages::Message;
use std::time::Duration;
use tokio::sync::mpsc;

/// Default bounded capacity per spec §3 ("Inbox"). Overflow is dropped
/// silently with a warning; the protocol tolerates lost messages by
/// timeout.
pub const DEFAULT_INBOX_CAPACITY: usize = 4096;

pub struct Inbox {
    tx: mpsc::Sender<Message>,
    rx: mpsc::Receiver<Message>,
}

/// A clonable handle for producers to push messages onto a node's inbox.
#[derive(Clone)]
pub struct InboxSender {
    tx: mpsc::Sender<Message>,
}

impl Inbox {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self { tx, rx }
    }

    pub fn sender(&self) -> InboxSender {
        InboxSender {
            tx: self.tx.clone(),
        }
    }

    /// Pops the next message, waiting up to `timeout`. Returns `None` on
    /// timeout or if every sender has been dropped.
    pub async fn pop(&mut self, timeout: Duration) -> Option<Message> {
        tokio::time::timeout(timeout, self.rx.recv()).await.ok().flatten()
    }
}

impl InboxSender {
    /// Attempts to enqueue a message, silently dropping it (and logging at
    /// the call site) if the inbox is full.
    pub fn try_push(&self, message: Message) -> bool {
        self.tx.try_send(message).is_ok()
    }
}
