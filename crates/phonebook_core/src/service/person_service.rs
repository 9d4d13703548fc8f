//! Person use-case service.
//!
//! # Responsibility
//! - Expose upsert/delete/list entry points to presentation layers.
//! - Keep live subscribers in sync with the store.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Only successful writes publish a new snapshot.
//! - Services built with [`PersonService::with_feed`] on the same feed see
//!   each other's writes, whichever connection performed them.

use crate::model::person::Person;
use crate::repo::person_repo::{PersonRepository, RepoResult};
use crate::service::person_feed::{PersonFeed, PersonSubscription};
use log::{debug, error, info};
use std::sync::Arc;

/// Use-case wrapper around a [`PersonRepository`].
pub struct PersonService<R: PersonRepository> {
    repo: R,
    feed: Arc<PersonFeed>,
}

impl<R: PersonRepository> PersonService<R> {
    /// Creates a service with a private feed.
    pub fn new(repo: R) -> Self {
        Self::with_feed(repo, Arc::new(PersonFeed::new()))
    }

    /// Creates a service that publishes to, and subscribes through, `feed`.
    ///
    /// Callers that open one connection per request share a single feed
    /// across those short-lived services so subscribers outlive them.
    pub fn with_feed(repo: R, feed: Arc<PersonFeed>) -> Self {
        Self { repo, feed }
    }

    pub fn feed(&self) -> &Arc<PersonFeed> {
        &self.feed
    }

    /// Inserts or replaces the entry keyed by `person.phone_number`.
    pub fn upsert(&self, person: &Person) -> RepoResult<()> {
        if let Err(err) = self.repo.upsert(person) {
            error!("event=person_upsert module=service status=error error={err}");
            return Err(err);
        }
        info!("event=person_upsert module=service status=ok");
        self.refresh_feed();
        Ok(())
    }

    /// Deletes the entry with `phone_number`; unknown numbers are a no-op.
    pub fn delete(&self, phone_number: &str) -> RepoResult<()> {
        if let Err(err) = self.repo.delete(phone_number) {
            error!("event=person_delete module=service status=error error={err}");
            return Err(err);
        }
        info!("event=person_delete module=service status=ok");
        self.refresh_feed();
        Ok(())
    }

    /// Current entries in insertion order.
    pub fn list_all(&self) -> RepoResult<Vec<Person>> {
        self.repo.list_all()
    }

    pub fn get(&self, phone_number: &str) -> RepoResult<Option<Person>> {
        self.repo.get(phone_number)
    }

    pub fn count(&self) -> RepoResult<u64> {
        self.repo.count()
    }

    /// Subscribes to live listings, starting with the current one.
    pub fn subscribe(&self) -> RepoResult<PersonSubscription> {
        let current = self.repo.list_all()?;
        Ok(self.feed.subscribe(current))
    }

    fn refresh_feed(&self) {
        if !self.feed.has_subscribers() {
            return;
        }
        // The write already committed; a failed re-read only delays the UI.
        match self.repo.list_all() {
            Ok(snapshot) => {
                let delivered = self.feed.publish(&snapshot);
                debug!(
                    "event=feed_publish module=service status=ok rows={} subscribers={}",
                    snapshot.len(),
                    delivered
                );
            }
            Err(err) => {
                error!("event=feed_publish module=service status=error error={err}");
            }
        }
    }
}
