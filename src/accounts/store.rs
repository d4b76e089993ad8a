use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};

use crate::{
    log_debug, log_info,
    models::{Account, AccountDraft},
    persistence::PersistHook,
};

use super::{
    identity::{IdentityGenerator, OpaqueIdGenerator},
    normalize::normalize_account,
};

const ENABLE_LOGS: bool = true;

pub type Listener = Arc<dyn Fn(&[Account]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered, observable account collection.
///
/// Insertion order is display order. Every mutation runs under one lock, so
/// at most one record per identity ever exists. The persistence hook is
/// called while that lock is held, so snapshots reach storage in mutation
/// order; listeners are called after it is released.
pub struct AccountStore {
    entries: Mutex<Vec<AccountDraft>>,
    ids: Box<dyn IdentityGenerator>,
    hook: Option<Box<dyn PersistHook>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl AccountStore {
    /// Store seeded with `initial`; entries missing an identity are repaired
    /// lazily by the first call that reads or mutates the collection.
    pub fn new(initial: Vec<AccountDraft>) -> Self {
        Self {
            entries: Mutex::new(initial),
            ids: Box::new(OpaqueIdGenerator::new()),
            hook: None,
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    pub fn with_identity_generator(mut self, ids: impl IdentityGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_persist_hook(mut self, hook: impl PersistHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn identity_generator(&self) -> &dyn IdentityGenerator {
        self.ids.as_ref()
    }

    /// Number of stored entries, repaired or not.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current collection. Assigns identities to entries that lack one and
    /// publishes the result if anything had to be repaired.
    pub fn list_all(&self) -> Vec<Account> {
        let (accounts, repaired) = {
            let mut entries = self.lock_entries();
            let (accounts, repaired) = self.repair(&mut entries);
            if repaired {
                self.flush(&accounts);
            }
            (accounts, repaired)
        };

        if repaired {
            self.notify(&accounts);
        }
        accounts
    }

    /// Upserts by identity: replaces the entry in place when the identity is
    /// already stored, appends otherwise. Returns the record as stored.
    pub fn save(&self, record: impl Into<AccountDraft>) -> Account {
        let (accounts, saved) = {
            let mut entries = self.lock_entries();
            let (mut accounts, _) = self.repair(&mut entries);
            let normalized = normalize_account(record.into(), self.ids.as_ref());
            upsert(&mut accounts, normalized.clone());
            *entries = to_drafts(&accounts);
            self.flush(&accounts);
            (accounts, normalized)
        };

        self.notify(&accounts);
        saved
    }

    /// Drops every entry with `id`. Returns whether anything was removed; when
    /// nothing matched the collection is left as is and nothing is published
    /// beyond a pending identity repair.
    pub fn remove(&self, id: &str) -> bool {
        let (accounts, repaired, removed) = {
            let mut entries = self.lock_entries();
            let (accounts, repaired) = self.repair(&mut entries);
            let before = accounts.len();
            let next: Vec<Account> = accounts.into_iter().filter(|a| a.id != id).collect();
            let removed = next.len() != before;
            if removed {
                *entries = to_drafts(&next);
            }
            if removed || repaired {
                self.flush(&next);
            }
            (next, repaired, removed)
        };

        if removed || repaired {
            self.notify(&accounts);
        }
        if !removed {
            log_debug!("No account with id '{id}' to remove");
        }
        removed
    }

    /// Bulk overwrite, for import or reset. Records sharing an identity
    /// collapse into one, the later record winning at the earlier position.
    pub fn replace_all<I, R>(&self, records: I) -> Vec<Account>
    where
        I: IntoIterator<Item = R>,
        R: Into<AccountDraft>,
    {
        let accounts = {
            let mut entries = self.lock_entries();
            let mut accounts = Vec::new();
            for record in records {
                upsert(
                    &mut accounts,
                    normalize_account(record.into(), self.ids.as_ref()),
                );
            }
            *entries = to_drafts(&accounts);
            self.flush(&accounts);
            accounts
        };

        log_info!("Replaced account list with {} records", accounts.len());
        self.notify(&accounts);
        accounts
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&[Account]) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn repair(&self, entries: &mut Vec<AccountDraft>) -> (Vec<Account>, bool) {
        let mut repaired = false;
        let mut accounts = Vec::with_capacity(entries.len());

        for draft in entries.iter() {
            let account = normalize_account(draft.clone(), self.ids.as_ref());
            if draft.id.as_deref() != Some(account.id.as_str())
                || draft.password != account.password
            {
                repaired = true;
            }
            if upsert(&mut accounts, account) {
                repaired = true;
            }
        }

        if repaired {
            log_info!("Repaired stored accounts ({} remain)", accounts.len());
            *entries = to_drafts(&accounts);
        }
        (accounts, repaired)
    }

    /// Callers hold the entries lock.
    fn flush(&self, accounts: &[Account]) {
        if let Some(hook) = &self.hook {
            hook.flush(accounts);
        }
    }

    fn notify(&self, accounts: &[Account]) {
        let listeners: Vec<Listener> = self
            .lock_listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(accounts);
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, Vec<AccountDraft>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Replaces the entry sharing `account.id` or appends. Returns true when an
/// existing entry was replaced.
fn upsert(accounts: &mut Vec<Account>, account: Account) -> bool {
    match accounts.iter_mut().find(|existing| existing.id == account.id) {
        Some(existing) => {
            *existing = account;
            true
        }
        None => {
            accounts.push(account);
            false
        }
    }
}

fn to_drafts(accounts: &[Account]) -> Vec<AccountDraft> {
    accounts.iter().cloned().map(AccountDraft::from).collect()
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore")
            .field("entries", &*self.lock_entries())
            .field("persisted", &self.hook.is_some())
            .field("listeners", &self.lock_listeners().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::accounts::identity::testing::SequentialIds;
    use crate::models::{AccountType, Label};

    /// Records every flushed snapshot.
    #[derive(Clone, Default)]
    struct RecordingHook(Arc<Mutex<Vec<Vec<Account>>>>);

    impl RecordingHook {
        fn flushes(&self) -> Vec<Vec<Account>> {
            self.0.lock().unwrap().clone()
        }
    }

    impl PersistHook for RecordingHook {
        fn flush(&self, accounts: &[Account]) {
            self.0.lock().unwrap().push(accounts.to_vec());
        }
    }

    fn account(id: &str, login: &str) -> Account {
        Account {
            id: id.into(),
            labels: vec![],
            account_type: AccountType::Local,
            login: login.into(),
            password: Some("pw".into()),
        }
    }

    fn draft_without_id(login: &str) -> AccountDraft {
        AccountDraft {
            login: login.into(),
            password: Some("pw".into()),
            ..AccountDraft::default()
        }
    }

    fn store_with(initial: Vec<AccountDraft>) -> (AccountStore, RecordingHook) {
        let hook = RecordingHook::default();
        let store = AccountStore::new(initial)
            .with_identity_generator(SequentialIds::default())
            .with_persist_hook(hook.clone());
        (store, hook)
    }

    fn ids(accounts: &[Account]) -> Vec<&str> {
        accounts.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn list_all_assigns_missing_ids_once() {
        let (store, hook) = store_with(vec![
            account("a", "alice").into(),
            draft_without_id("bob"),
        ]);

        let first = store.list_all();
        assert_eq!(ids(&first), vec!["a", "id-1"]);
        assert_eq!(hook.flushes().len(), 1);

        let second = store.list_all();
        assert_eq!(first, second);
        assert_eq!(hook.flushes().len(), 1);
    }

    #[test]
    fn list_all_without_repairs_does_not_flush() {
        let (store, hook) = store_with(vec![account("a", "alice").into()]);
        assert_eq!(store.list_all().len(), 1);
        assert!(hook.flushes().is_empty());
    }

    #[test]
    fn repair_nulls_ldap_passwords_from_storage() {
        let mut stored: AccountDraft = account("a", "svc").into();
        stored.account_type = AccountType::Ldap;
        let (store, hook) = store_with(vec![stored]);

        let accounts = store.list_all();
        assert_eq!(accounts[0].password, None);
        assert_eq!(hook.flushes().len(), 1);
    }

    #[test]
    fn repair_collapses_duplicate_ids() {
        let (store, _) = store_with(vec![
            account("a", "first").into(),
            account("b", "other").into(),
            account("a", "second").into(),
        ]);

        let accounts = store.list_all();
        assert_eq!(ids(&accounts), vec!["a", "b"]);
        assert_eq!(accounts[0].login, "second");
    }

    #[test]
    fn save_replaces_existing_entry_in_place() {
        let (store, hook) = store_with(vec![
            account("a", "alice").into(),
            account("b", "bob").into(),
        ]);

        let mut changed = account("a", "alice2");
        changed.labels = vec![Label::new("new")];
        store.save(changed.clone());

        let accounts = store.list_all();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0], changed);
        assert_eq!(accounts[1], account("b", "bob"));
        assert_eq!(hook.flushes().last().unwrap(), &accounts);
    }

    #[test]
    fn save_appends_unknown_identity() {
        let (store, _) = store_with(vec![
            account("a", "alice").into(),
            account("b", "bob").into(),
        ]);

        store.save(Account {
            id: "c".into(),
            labels: vec![],
            account_type: AccountType::Local,
            login: "x".into(),
            password: Some("p".into()),
        });

        let accounts = store.list_all();
        assert_eq!(ids(&accounts), vec!["a", "b", "c"]);
        assert_eq!(accounts[2].login, "x");
    }

    #[test]
    fn save_assigns_identity_to_new_draft() {
        let (store, _) = store_with(vec![]);
        let saved = store.save(draft_without_id("carol"));
        assert_eq!(saved.id, "id-1");
        assert_eq!(store.list_all(), vec![saved]);
    }

    #[test]
    fn save_nulls_ldap_password() {
        let (store, _) = store_with(vec![]);
        let saved = store.save(Account {
            id: "l".into(),
            labels: vec![],
            account_type: AccountType::Ldap,
            login: "svc".into(),
            password: Some("ignored".into()),
        });

        assert_eq!(saved.password, None);
        assert_eq!(store.list_all()[0].password, None);
    }

    #[test]
    fn save_repairs_before_upserting() {
        let (store, hook) = store_with(vec![draft_without_id("bob")]);
        store.save(account("a", "alice"));

        let accounts = store.list_all();
        assert_eq!(ids(&accounts), vec!["id-1", "a"]);
        assert_eq!(hook.flushes().len(), 1);
    }

    #[test]
    fn remove_filters_matching_entry() {
        let (store, hook) = store_with(vec![
            account("a", "alice").into(),
            account("b", "bob").into(),
        ]);

        assert!(store.remove("a"));
        assert_eq!(ids(&store.list_all()), vec!["b"]);
        assert_eq!(hook.flushes().len(), 1);
    }

    #[test]
    fn remove_of_unknown_id_is_a_no_op() {
        let (store, hook) = store_with(vec![account("a", "alice").into()]);
        let before = store.list_all();

        assert!(!store.remove("nonexistent"));
        assert_eq!(store.list_all(), before);
        assert!(hook.flushes().is_empty());
    }

    #[test]
    fn replace_all_normalizes_and_dedupes() {
        let (store, hook) = store_with(vec![account("old", "gone").into()]);

        let accounts = store.replace_all(vec![
            draft_without_id("new"),
            account("x", "first").into(),
            account("x", "last").into(),
        ]);

        assert_eq!(ids(&accounts), vec!["id-1", "x"]);
        assert_eq!(accounts[1].login, "last");
        assert_eq!(store.list_all(), accounts);
        assert_eq!(hook.flushes().len(), 1);
    }

    #[test]
    fn listeners_see_each_change_until_unsubscribed() {
        let (store, _) = store_with(vec![]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = store.subscribe(move |accounts| {
            sink.lock().unwrap().push(accounts.len());
        });

        store.save(account("a", "alice"));
        store.save(account("b", "bob"));
        store.remove("missing");
        assert!(store.unsubscribe(subscription));
        store.remove("a");

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert!(!store.unsubscribe(subscription));
    }

    #[test]
    fn listener_may_read_the_store() {
        let store = Arc::new(AccountStore::default());
        let observed = Arc::new(Mutex::new(0));
        let (reader, sink) = (Arc::downgrade(&store), Arc::clone(&observed));
        store.subscribe(move |_| {
            if let Some(store) = reader.upgrade() {
                *sink.lock().unwrap() = store.len();
            }
        });

        store.save(account("a", "alice"));
        assert_eq!(*observed.lock().unwrap(), 1);
    }

    /// Blocks inside its first flush until released.
    struct SlowFirstFlush {
        started: Mutex<Option<std::sync::mpsc::Sender<()>>>,
        flushes: Arc<Mutex<Vec<Vec<Account>>>>,
    }

    impl PersistHook for SlowFirstFlush {
        fn flush(&self, accounts: &[Account]) {
            let first = self.started.lock().unwrap().take();
            if let Some(started) = first {
                started.send(()).unwrap();
                std::thread::sleep(std::time::Duration::from_millis(200));
            }
            self.flushes.lock().unwrap().push(accounts.to_vec());
        }
    }

    #[test]
    fn slow_flush_cannot_overwrite_a_later_snapshot() {
        let (started, first_flush) = std::sync::mpsc::channel();
        let flushes = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::new(AccountStore::default().with_persist_hook(SlowFirstFlush {
            started: Mutex::new(Some(started)),
            flushes: Arc::clone(&flushes),
        }));

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                store.save(account("a", "alice"));
            })
        };
        first_flush.recv().unwrap();
        store.save(account("b", "bob"));
        writer.join().unwrap();

        let in_memory = store.list_all();
        let flushes = flushes.lock().unwrap();
        assert_eq!(ids(&in_memory), vec!["a", "b"]);
        assert_eq!(flushes.len(), 2);
        assert_eq!(flushes.last().unwrap(), &in_memory);
    }

    #[test]
    fn blank_ids_get_a_fresh_identity_on_save() {
        let (store, _) = store_with(vec![]);

        let first = store.save(account("", "alice"));
        let second = store.save(account("  ", "bob"));

        assert_eq!(first.id, "id-1");
        assert_eq!(second.id, "id-2");
        assert_eq!(ids(&store.list_all()), vec!["id-1", "id-2"]);
    }

    #[test]
    fn repair_replaces_blank_stored_ids() {
        let mut stored: AccountDraft = account("a", "alice").into();
        stored.id = Some(String::new());
        let (store, hook) = store_with(vec![stored]);

        assert_eq!(ids(&store.list_all()), vec!["id-1"]);
        assert_eq!(hook.flushes().len(), 1);
    }
}
