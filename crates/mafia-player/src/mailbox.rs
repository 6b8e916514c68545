//! A single-slot, overwritable mailbox.
//!
//! Writers never block: [`Mailbox::put`] replaces whatever is in the slot
//! and wakes the reader. The reader sees only the latest value. Once
//! closed, the mailbox rejects writes and the reader observes `None`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

struct Slot<T> {
    value: Option<T>,
    closed: bool,
}

/// Last-write-wins mailbox with one logical reader.
pub struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
    notify: Notify,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    // The slot is only touched in short non-panicking sections, so a
    // poisoned lock still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `value`, overwriting any unread one.
    ///
    /// Returns `false` (and drops `value`) if the mailbox is closed.
    pub fn put(&self, value: T) -> bool {
        {
            let mut slot = self.lock();
            if slot.closed {
                return false;
            }
            slot.value = Some(value);
        }
        self.notify.notify_one();
        true
    }

    /// Waits for the next value.
    ///
    /// Returns `None` once the mailbox is closed, even if a value was
    /// still sitting in the slot.
    pub async fn recv(&self) -> Option<T> {
        loop {
            {
                let mut slot = self.lock();
                if slot.closed {
                    return None;
                }
                if let Some(value) = slot.value.take() {
                    return Some(value);
                }
            }
            // notify_one stores a permit when nobody is waiting yet, so a
            // put between the check above and this await is not lost.
            self.notify.notified().await;
        }
    }

    /// Takes the pending value without waiting.
    pub fn try_take(&self) -> Option<T> {
        let mut slot = self.lock();
        if slot.closed {
            return None;
        }
        slot.value.take()
    }

    /// Discards any pending value.
    pub fn clear(&self) {
        self.lock().value = None;
    }

    /// Closes the mailbox for good and wakes the reader.
    pub fn close(&self) {
        {
            let mut slot = self.lock();
            slot.closed = true;
            slot.value = None;
        }
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
