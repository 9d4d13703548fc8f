//! FFI use-case API for the phonebook screen.
//!
//! # Responsibility
//! - Expose add/list/delete to Dart via FRB.
//! - Push a fresh listing to every open watch after each write.
//! - Keep error semantics simple: every call returns an envelope.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Writes and watch waits are non-`sync` FRB calls, so they run off the
//!   UI thread.
//! - One feed per process: every call publishes to it, whichever
//!   connection it opened.

use log::{info, warn};
use phonebook_core::db::open_db;
use phonebook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Person, PersonFeed, PersonForm, PersonService, PersonSubscription, RepoResult,
    SqlitePersonRepository, SubmitOutcome,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

const DB_PATH_ENV: &str = "PHONEBOOK_DB_PATH";
const DB_FILE_NAME: &str = "phonebook.sqlite3";
const MISSING_FIELDS_MESSAGE: &str = "Name and phone number are required.";
const WATCH_TIMEOUT_MAX_MS: u32 = 30_000;
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static FEED: OnceLock<Arc<PersonFeed>> = OnceLock::new();
static WATCHES: OnceLock<Mutex<HashMap<u64, Arc<Mutex<PersonSubscription>>>>> = OnceLock::new();
static NEXT_WATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Health check.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the call with the same `level + log_dir` is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One row of the phonebook list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonItem {
    pub name: String,
    pub phone_number: String,
}

impl From<Person> for PersonItem {
    fn from(value: Person) -> Self {
        Self {
            name: value.name,
            phone_number: value.phone_number,
        }
    }
}

/// Listing envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonListResponse {
    pub ok: bool,
    /// Rows in insertion order; empty on failure.
    pub items: Vec<PersonItem>,
    pub message: String,
}

/// Write envelope for submit/delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonActionResponse {
    pub ok: bool,
    /// `true` only when the store was mutated by a submit.
    pub saved: bool,
    pub message: String,
}

impl PersonActionResponse {
    fn success(saved: bool, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            saved,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            saved: false,
            message: message.into(),
        }
    }
}

/// Watch registration envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonWatchResponse {
    pub ok: bool,
    /// Handle for `person_watch_next` / `person_watch_stop`.
    pub watch_id: Option<u64>,
    pub message: String,
}

/// Submits the add form.
///
/// Empty name or phone number is rejected without touching the store.
/// Inputs are stored as typed. Submitting an existing phone number replaces
/// that entry's name.
pub fn person_submit(name: String, phone_number: String) -> PersonActionResponse {
    let mut form = PersonForm { name, phone_number };
    match with_person_service(|service| form.submit(service)) {
        Ok(SubmitOutcome::Saved(_)) => PersonActionResponse::success(true, "Person saved."),
        Ok(SubmitOutcome::Ignored) => PersonActionResponse::failure(MISSING_FIELDS_MESSAGE),
        Err(err) => PersonActionResponse::failure(format!("person_submit failed: {err}")),
    }
}

/// Deletes the entry with `phone_number`. Unknown numbers succeed silently.
pub fn person_delete(phone_number: String) -> PersonActionResponse {
    match with_person_service(|service| service.delete(phone_number.as_str())) {
        Ok(()) => PersonActionResponse::success(false, "Person deleted."),
        Err(err) => PersonActionResponse::failure(format!("person_delete failed: {err}")),
    }
}

/// Lists all entries.
#[flutter_rust_bridge::frb(sync)]
pub fn person_list() -> PersonListResponse {
    match with_person_service(|service| service.list_all()) {
        Ok(people) => list_response(people),
        Err(err) => list_failure(format!("person_list failed: {err}")),
    }
}

/// Opens a live listing.
///
/// The first `person_watch_next` returns the current entries; later calls
/// return the listing after each submit or delete made through this bridge.
#[flutter_rust_bridge::frb(sync)]
pub fn person_watch_start() -> PersonWatchResponse {
    match with_person_service(|service| service.subscribe()) {
        Ok(subscription) => {
            let watch_id = NEXT_WATCH_ID.fetch_add(1, Ordering::Relaxed);
            lock_watches().insert(watch_id, Arc::new(Mutex::new(subscription)));
            info!("event=watch_start module=ffi status=ok watch_id={watch_id}");
            PersonWatchResponse {
                ok: true,
                watch_id: Some(watch_id),
                message: "Watching.".to_string(),
            }
        }
        Err(err) => PersonWatchResponse {
            ok: false,
            watch_id: None,
            message: format!("person_watch_start failed: {err}"),
        },
    }
}

/// Waits up to `timeout_ms` (capped at 30 s) for the next listing.
///
/// Returns `None` when nothing changed in time, and a failed envelope when
/// `watch_id` is unknown or stopped. The UI loops on this call.
pub fn person_watch_next(watch_id: u64, timeout_ms: u32) -> Option<PersonListResponse> {
    let Some(watch) = lock_watches().get(&watch_id).cloned() else {
        return Some(list_failure(format!("unknown watch_id {watch_id}")));
    };
    let timeout = Duration::from_millis(u64::from(timeout_ms.min(WATCH_TIMEOUT_MAX_MS)));
    // Only this watch's lock is held while waiting; the registry stays free.
    let subscription = watch.lock().unwrap_or_else(PoisonError::into_inner);
    subscription.next_timeout(timeout).map(list_response)
}

/// Closes a watch. Returns `false` when `watch_id` was not open.
#[flutter_rust_bridge::frb(sync)]
pub fn person_watch_stop(watch_id: u64) -> bool {
    let removed = lock_watches().remove(&watch_id).is_some();
    info!("event=watch_stop module=ffi status=ok watch_id={watch_id} removed={removed}");
    removed
}

fn list_response(people: Vec<Person>) -> PersonListResponse {
    let items = people.into_iter().map(PersonItem::from).collect::<Vec<_>>();
    let message = if items.is_empty() {
        "No entries.".to_string()
    } else {
        format!("{} entr{}.", items.len(), if items.len() == 1 { "y" } else { "ies" })
    };
    PersonListResponse {
        ok: true,
        items,
        message,
    }
}

fn list_failure(message: String) -> PersonListResponse {
    PersonListResponse {
        ok: false,
        items: Vec::new(),
        message,
    }
}

fn shared_feed() -> Arc<PersonFeed> {
    Arc::clone(FEED.get_or_init(|| Arc::new(PersonFeed::new())))
}

fn lock_watches() -> MutexGuard<'static, HashMap<u64, Arc<Mutex<PersonSubscription>>>> {
    WATCHES
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_person_service<T>(
    f: impl FnOnce(&PersonService<SqlitePersonRepository<'_>>) -> RepoResult<T>,
) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| {
        warn!("event=ffi_db_open module=ffi status=error error={err}");
        format!("phonebook DB open failed: {err}")
    })?;
    let repo = SqlitePersonRepository::try_new(&conn)
        .map_err(|err| format!("phonebook repo init failed: {err}"))?;
    let service = PersonService::with_feed(repo, shared_feed());
    f(&service).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, person_delete, person_list, person_submit,
        person_watch_next, person_watch_start, person_watch_stop, ping, resolve_db_path,
        PersonListResponse, MISSING_FIELDS_MESSAGE,
    };
    use phonebook_core::db::open_db;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn submit_then_list_contains_entry() {
        let phone = unique_phone("list");
        let response = person_submit("Ana".to_string(), phone.clone());
        assert!(response.ok, "{}", response.message);
        assert!(response.saved);

        let listing = person_list();
        assert!(listing.ok, "{}", listing.message);
        assert!(listing
            .items
            .iter()
            .any(|item| item.phone_number == phone && item.name == "Ana"));
    }

    #[test]
    fn submit_same_phone_replaces_name() {
        let phone = unique_phone("replace");
        assert!(person_submit("Ana".to_string(), phone.clone()).ok);
        assert!(person_submit("Ana Maria".to_string(), phone.clone()).ok);

        let conn = open_db(resolve_db_path()).expect("open db");
        let (rows, name): (i64, String) = conn
            .query_row(
                "SELECT COUNT(*), MAX(name) FROM people WHERE phone_number = ?1",
                [phone.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("query person row");
        assert_eq!(rows, 1);
        assert_eq!(name, "Ana Maria");
    }

    #[test]
    fn submit_with_empty_field_writes_nothing() {
        let phone = unique_phone("empty");
        let response = person_submit(String::new(), phone.clone());
        assert!(!response.ok);
        assert!(!response.saved);
        assert_eq!(response.message, MISSING_FIELDS_MESSAGE);

        let listing = person_list();
        assert!(listing.items.iter().all(|item| item.phone_number != phone));
    }

    #[test]
    fn delete_removes_entry_and_tolerates_unknown_phone() {
        let phone = unique_phone("delete");
        assert!(person_submit("Bea".to_string(), phone.clone()).ok);

        let deleted = person_delete(phone.clone());
        assert!(deleted.ok, "{}", deleted.message);
        assert!(person_list()
            .items
            .iter()
            .all(|item| item.phone_number != phone));

        let again = person_delete(phone);
        assert!(again.ok, "{}", again.message);
    }

    #[test]
    fn submit_keeps_whitespace_as_typed() {
        let phone = format!("{} ", unique_phone("spaced"));
        let response = person_submit(" ".to_string(), phone.clone());
        assert!(response.ok, "{}", response.message);

        assert!(person_list()
            .items
            .iter()
            .any(|item| item.phone_number == phone && item.name == " "));
    }

    #[test]
    fn watch_receives_listing_after_submit_and_delete() {
        let watch = person_watch_start();
        assert!(watch.ok, "{}", watch.message);
        let watch_id = watch.watch_id.expect("watch should return watch_id");

        let initial = person_watch_next(watch_id, 1_000).expect("initial listing");
        assert!(initial.ok, "{}", initial.message);

        let phone = unique_phone("watch");
        assert!(person_submit("Ana".to_string(), phone.clone()).ok);
        let added = wait_for(watch_id, |listing| {
            listing.items.iter().any(|item| item.phone_number == phone)
        });
        assert!(added, "watch never saw submitted entry");

        assert!(person_delete(phone.clone()).ok);
        let removed = wait_for(watch_id, |listing| {
            listing.items.iter().all(|item| item.phone_number != phone)
        });
        assert!(removed, "watch never saw deleted entry disappear");

        assert!(person_watch_stop(watch_id));
        assert!(!person_watch_stop(watch_id));
        let stopped = person_watch_next(watch_id, 10).expect("stopped watch answers");
        assert!(!stopped.ok);
    }

    #[test]
    fn watch_next_times_out_without_changes() {
        let watch_id = person_watch_start().watch_id.expect("watch_id");
        person_watch_next(watch_id, 1_000).expect("initial listing");

        // Other tests share the process feed, so drain until a quiet window.
        let quiet = (0..50).any(|_| person_watch_next(watch_id, 50).is_none());
        assert!(quiet);
        person_watch_stop(watch_id);
    }

    fn wait_for(watch_id: u64, done: impl Fn(&PersonListResponse) -> bool) -> bool {
        // Concurrent tests publish too; skip their snapshots.
        (0..50).any(|_| {
            person_watch_next(watch_id, 1_000)
                .map(|listing| listing.ok && done(&listing))
                .unwrap_or(false)
        })
    }

    fn unique_phone(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
