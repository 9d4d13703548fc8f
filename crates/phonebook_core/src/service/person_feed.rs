//! Live listing feed.
//!
//! Subscribers receive full snapshots of the phonebook, never deltas. A
//! snapshot is pushed once on subscribe and again after each successful
//! mutation. Subscribers whose receiving end was dropped are pruned on the
//! next publish.

use crate::model::person::Person;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Receiving end of a live phonebook listing.
#[derive(Debug)]
pub struct PersonSubscription {
    receiver: Receiver<Vec<Person>>,
}

impl PersonSubscription {
    /// Returns the next pending snapshot without blocking.
    pub fn try_next(&self) -> Option<Vec<Person>> {
        self.receiver.try_recv().ok()
    }

    /// Waits up to `timeout` for the next snapshot.
    ///
    /// Returns `None` on timeout or when the feed has been dropped.
    pub fn next_timeout(&self, timeout: Duration) -> Option<Vec<Person>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(snapshot) => Some(snapshot),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drains pending snapshots and returns the newest one, if any.
    ///
    /// UIs call this once per frame; intermediate states are skipped.
    pub fn latest(&self) -> Option<Vec<Person>> {
        self.receiver.try_iter().last()
    }
}

/// Fan-out of listing snapshots to any number of subscribers.
#[derive(Debug, Default)]
pub struct PersonFeed {
    subscribers: Mutex<Vec<Sender<Vec<Person>>>>,
}

impl PersonFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and hands it `current` as its first snapshot.
    pub fn subscribe(&self, current: Vec<Person>) -> PersonSubscription {
        let (sender, receiver) = mpsc::channel();
        // Receiver is alive here, so the send cannot fail.
        let _ = sender.send(current);
        self.lock().push(sender);
        PersonSubscription { receiver }
    }

    /// Sends `snapshot` to every live subscriber and returns how many got it.
    pub fn publish(&self, snapshot: &[Person]) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|sender| sender.send(snapshot.to_vec()).is_ok());
        subscribers.len()
    }

    /// Whether anyone is currently listening.
    ///
    /// May over-report until the next publish prunes dropped subscribers.
    pub fn has_subscribers(&self) -> bool {
        !self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<Vec<Person>>>> {
        // A panic while holding the lock cannot leave the Vec half-updated.
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::PersonFeed;
    use crate::model::person::Person;

    #[test]
    fn subscribe_delivers_current_snapshot_first() {
        let feed = PersonFeed::new();
        let subscription = feed.subscribe(vec![Person::new("Ana", "111")]);

        let first = subscription.try_next().unwrap();
        assert_eq!(first, vec![Person::new("Ana", "111")]);
        assert!(subscription.try_next().is_none());
    }

    #[test]
    fn publish_prunes_dropped_subscribers() {
        let feed = PersonFeed::new();
        let kept = feed.subscribe(Vec::new());
        let dropped = feed.subscribe(Vec::new());
        drop(dropped);

        assert_eq!(feed.publish(&[Person::new("Bea", "222")]), 1);
        assert!(feed.has_subscribers());
        assert_eq!(kept.latest().unwrap(), vec![Person::new("Bea", "222")]);
    }

    #[test]
    fn latest_skips_intermediate_snapshots() {
        let feed = PersonFeed::new();
        let subscription = feed.subscribe(Vec::new());
        feed.publish(&[Person::new("Ana", "111")]);
        feed.publish(&[]);

        assert_eq!(subscription.latest().unwrap(), Vec::<Person>::new());
        assert!(subscription.latest().is_none());
    }
}
