//! ChecklistStore tests against an in-memory backend with fault injection.

use super::*;
use crate::domain::{ChecklistOption, Section, DEFAULT_MEMBER_NAME};
use crate::repository::init_db;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

type RowRewrite = Box<dyn Fn(&mut Row) + Send>;

/// Wraps a real backend; can fail calls on demand and alter update results.
struct ScriptedService {
    inner: Arc<dyn PersistenceService>,
    fail_query: AtomicBool,
    fail_insert: AtomicBool,
    fail_update: AtomicBool,
    writes: AtomicUsize,
    rewrite_update: StdMutex<Option<RowRewrite>>,
}

impl ScriptedService {
    fn new(inner: Arc<dyn PersistenceService>) -> Self {
        Self {
            inner,
            fail_query: AtomicBool::new(false),
            fail_insert: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
            rewrite_update: StdMutex::new(None),
        }
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn unavailable() -> PersistenceError {
    PersistenceError::Status {
        status: 503,
        body: "unavailable".to_string(),
    }
}

#[async_trait]
impl PersistenceService for ScriptedService {
    async fn query(&self, table: &str, filter: &Filter, order: Option<&Order>) -> Result<Vec<Row>, PersistenceError> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.query(table, filter, order).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, PersistenceError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.insert(table, row).await
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Row, PersistenceError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut row = self.inner.update(table, id, patch).await?;
        if let Some(rewrite) = self.rewrite_update.lock().unwrap().as_ref() {
            rewrite(&mut row);
        }
        Ok(row)
    }
}

async fn setup() -> (ChecklistStore, Arc<ScriptedService>) {
    let db = init_db(Path::new(":memory:")).await.expect("Failed to init test DB");
    let service = Arc::new(ScriptedService::new(Arc::new(db)));
    (ChecklistStore::new(service.clone()), service)
}

/// Store a checklist directly in the backend, bypassing the store
async fn seed(service: &Arc<ScriptedService>, checklist: &ChecklistDocument) -> ChecklistDocument {
    let repo: Repository<ChecklistDocument> = Repository::new(service.inner.clone());
    repo.create(checklist).await.expect("Failed to seed")
}

fn two_unchecked() -> Vec<Section> {
    vec![Section::new(
        "Gear",
        vec![ChecklistOption::new("Gloves"), ChecklistOption::new("Goggles")],
    )]
}

/// Loaded store whose selected checklist is already saved
async fn setup_saved(sections: Vec<Section>) -> (ChecklistStore, Arc<ScriptedService>) {
    let (mut store, service) = setup().await;
    seed(&service, &ChecklistDocument::with_sections("U1", "T1", "Me", sections)).await;
    store.load("T1", "U1").await.unwrap();
    (store, service)
}

// ========================
// load / select
// ========================

#[tokio::test]
async fn test_load_empty_synthesizes_own_checklist() {
    let (mut store, service) = setup().await;

    let checklists = store.load("T1", "U1").await.expect("Load failed");

    assert_eq!(checklists.len(), 1);
    let own = &checklists[0];
    assert_eq!(own.member_name, DEFAULT_MEMBER_NAME);
    assert_eq!(own.owner_id, "U1");
    assert_eq!(own.trip_id, "T1");
    assert!(own.id.is_none());
    let titles: Vec<_> = own.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["Gear", "Clothing", "Other"]);
    assert!(!ChecklistStore::is_ready(own));

    let member_id = own.member_id.clone();
    assert_eq!(store.selected_member_id(), Some(member_id.as_str()));
    assert_eq!(service.writes(), 0);
}

#[tokio::test]
async fn test_load_returns_stored_checklists_oldest_first() {
    let (mut store, service) = setup().await;
    let first = seed(&service, &ChecklistDocument::new("U1", "T1", "Zoe")).await;
    seed(&service, &ChecklistDocument::new("U1", "T1", "Adam")).await;
    seed(&service, &ChecklistDocument::new("U1", "T2", "Other trip")).await;
    seed(&service, &ChecklistDocument::new("U2", "T1", "Other owner")).await;

    let names: Vec<_> = store
        .load("T1", "U1")
        .await
        .unwrap()
        .iter()
        .map(|c| c.member_name.clone())
        .collect();

    assert_eq!(names, ["Zoe", "Adam"]);
    assert_eq!(store.selected_member_id(), Some(first.member_id.as_str()));
    assert_eq!(
        store.scope(),
        Some(&ChecklistScope {
            trip_id: "T1".to_string(),
            owner_id: "U1".to_string()
        })
    );
}

#[tokio::test]
async fn test_load_failure_keeps_previous_state() {
    let (mut store, service) = setup().await;
    store.load("T1", "U1").await.unwrap();
    let before = store.checklists().to_vec();

    service.fail_query.store(true, Ordering::SeqCst);
    let err = store.load("T2", "U1").await.unwrap_err();

    assert!(matches!(err, ChecklistError::Load(_)));
    assert_eq!(store.checklists(), before.as_slice());
    assert_eq!(store.scope().map(|s| s.trip_id.as_str()), Some("T1"));
}

#[tokio::test]
async fn test_select_member() {
    let (mut store, service) = setup().await;
    seed(&service, &ChecklistDocument::new("U1", "T1", "Me")).await;
    let alice = seed(&service, &ChecklistDocument::new("U1", "T1", "Alice")).await;
    store.load("T1", "U1").await.unwrap();

    let selected = store.select_member(&alice.member_id).unwrap();
    assert_eq!(selected.member_name, "Alice");
    assert_eq!(store.selected().map(|c| c.member_name.as_str()), Some("Alice"));

    let err = store.select_member("nobody").unwrap_err();
    assert!(matches!(err, ChecklistError::NotFound(ref id) if id == "nobody"));
    assert_eq!(store.selected_member_id(), Some(alice.member_id.as_str()));
}

// ========================
// add / rename
// ========================

#[tokio::test]
async fn test_add_member_twice_is_rejected() {
    let (mut store, _service) = setup().await;
    store.load("T1", "U1").await.unwrap();

    let alice = store.add_member("U1", "Alice").await.expect("Add failed");
    assert!(alice.id.is_some());
    assert_eq!(alice.sections.len(), 3);
    assert_eq!(store.selected_member_id(), Some(alice.member_id.as_str()));

    let err = store.add_member("U1", "Alice").await.unwrap_err();
    assert!(matches!(err, ChecklistError::DuplicateName(ref name) if name == "Alice"));
    assert_eq!(store.checklists().len(), 2);
    assert_eq!(store.selected_member_id(), Some(alice.member_id.as_str()));
}

#[tokio::test]
async fn test_add_member_names_are_case_sensitive_and_trimmed() {
    let (mut store, _service) = setup().await;
    store.load("T1", "U1").await.unwrap();

    store.add_member("U1", "Alice").await.unwrap();
    let lower = store.add_member("U1", "  alice ").await.unwrap();
    assert_eq!(lower.member_name, "alice");

    let err = store.add_member("U1", "Me").await.unwrap_err();
    assert!(matches!(err, ChecklistError::DuplicateName(_)));
    assert_eq!(store.checklists().len(), 3);
}

#[tokio::test]
async fn test_add_member_validation() {
    let (mut store, service) = setup().await;

    let err = store.add_member("U1", "Alice").await.unwrap_err();
    assert!(matches!(err, ChecklistError::NotLoaded));

    store.load("T1", "U1").await.unwrap();
    assert!(matches!(store.add_member("U1", "   ").await, Err(ChecklistError::EmptyName)));
    assert!(matches!(
        store.add_member("U2", "Alice").await,
        Err(ChecklistError::OwnerMismatch { .. })
    ));
    assert_eq!(service.writes(), 0);
}

#[tokio::test]
async fn test_add_member_failure_keeps_state() {
    let (mut store, service) = setup().await;
    store.load("T1", "U1").await.unwrap();
    let selected = store.selected_member_id().map(str::to_string);

    service.fail_insert.store(true, Ordering::SeqCst);
    let err = store.add_member("U1", "Alice").await.unwrap_err();

    assert!(matches!(err, ChecklistError::Persistence(_)));
    assert_eq!(store.checklists().len(), 1);
    assert_eq!(store.selected_member_id().map(str::to_string), selected);
}

#[tokio::test]
async fn test_rename_member() {
    let (mut store, _service) = setup().await;
    store.load("T1", "U1").await.unwrap();
    let alice = store.add_member("U1", "Alice").await.unwrap();

    let renamed = store
        .rename_member("U1", &alice.member_id, "Alicia")
        .await
        .expect("Rename failed");

    assert_eq!(renamed.member_name, "Alicia");
    assert_eq!(renamed.member_id, alice.member_id);
    assert_eq!(renamed.id, alice.id);
    assert_eq!(store.checklists()[1].member_name, "Alicia");
}

#[tokio::test]
async fn test_rename_to_same_name_makes_no_call() {
    let (mut store, service) = setup().await;
    store.load("T1", "U1").await.unwrap();
    let alice = store.add_member("U1", "Alice").await.unwrap();
    let writes = service.writes();

    let same = store.rename_member("U1", &alice.member_id, "Alice").await.unwrap();

    assert_eq!(same, alice);
    assert_eq!(service.writes(), writes);
}

#[tokio::test]
async fn test_rename_rejections() {
    let (mut store, service) = setup().await;
    store.load("T1", "U1").await.unwrap();
    let own_id = store.checklists()[0].member_id.clone();
    let alice = store.add_member("U1", "Alice").await.unwrap();

    let err = store.rename_member("U1", &alice.member_id, "Me").await.unwrap_err();
    assert!(matches!(err, ChecklistError::DuplicateName(_)));

    let err = store.rename_member("U1", &own_id, "Myself").await.unwrap_err();
    assert!(matches!(err, ChecklistError::NotPersisted(ref id) if *id == own_id));

    let err = store.rename_member("U1", "ghost", "Casper").await.unwrap_err();
    assert!(matches!(err, ChecklistError::NotFound(_)));

    service.fail_update.store(true, Ordering::SeqCst);
    let err = store.rename_member("U1", &alice.member_id, "Al").await.unwrap_err();
    assert!(matches!(err, ChecklistError::Persistence(_)));
    assert_eq!(store.checklists()[1].member_name, "Alice");
}

// ========================
// toggle / persist
// ========================

#[tokio::test]
async fn test_toggle_requires_saved_checklist() {
    let (mut store, service) = setup().await;
    store.load("T1", "U1").await.unwrap();

    let err = store.toggle_option(0, 0).await.unwrap_err();
    assert!(matches!(err, ChecklistError::NotPersisted(_)));
    assert_eq!(service.writes(), 0);

    let saved = store.persist_selected("U1").await.expect("Persist failed");
    assert!(saved.id.is_some());
    assert_eq!(saved.member_name, DEFAULT_MEMBER_NAME);
    assert_eq!(store.selected_member_id(), Some(saved.member_id.as_str()));

    store.persist_selected("U1").await.unwrap();
    assert_eq!(service.writes(), 1);

    let toggled = store.toggle_option(0, 0).await.unwrap();
    assert!(toggled.sections[0].options[0].checked);
}

#[tokio::test]
async fn test_toggle_without_selection() {
    let (mut store, _service) = setup().await;
    assert!(matches!(store.toggle_option(0, 0).await, Err(ChecklistError::NoSelection)));
}

#[tokio::test]
async fn test_double_toggle_restores_value() {
    let (mut store, _service) = setup_saved(two_unchecked()).await;

    let once = store.toggle_option(0, 1).await.unwrap();
    assert_eq!(once.option(0, 1).map(|o| o.checked), Some(true));

    let twice = store.toggle_option(0, 1).await.unwrap();
    assert_eq!(twice.option(0, 1).map(|o| o.checked), Some(false));
    assert_eq!(twice.sections, two_unchecked());
}

#[tokio::test]
async fn test_toggle_until_ready() {
    let (mut store, _service) = setup_saved(two_unchecked()).await;

    let after_first = store.toggle_option(0, 0).await.unwrap();
    assert!(!after_first.is_ready());

    let after_second = store.toggle_option(0, 1).await.unwrap();
    assert!(after_second.is_ready());
    assert!(store.readiness()[0].ready);
}

#[tokio::test]
async fn test_toggle_out_of_range() {
    let (mut store, service) = setup_saved(two_unchecked()).await;
    let writes = service.writes();

    let err = store.toggle_option(0, 2).await.unwrap_err();
    assert!(matches!(err, ChecklistError::IndexOutOfRange { section: 0, option: 2 }));
    let err = store.toggle_option(1, 0).await.unwrap_err();
    assert!(matches!(err, ChecklistError::IndexOutOfRange { section: 1, option: 0 }));
    assert_eq!(service.writes(), writes);
}

#[tokio::test]
async fn test_toggle_failure_keeps_previous_value() {
    let (mut store, service) = setup_saved(two_unchecked()).await;

    service.fail_update.store(true, Ordering::SeqCst);
    let err = store.toggle_option(0, 0).await.unwrap_err();

    assert!(matches!(err, ChecklistError::Persistence(_)));
    assert_eq!(store.selected().and_then(|c| c.option(0, 0)).map(|o| o.checked), Some(false));
}

#[tokio::test]
async fn test_toggle_adopts_stored_copy() {
    let (mut store, service) = setup_saved(two_unchecked()).await;
    *service.rewrite_update.lock().unwrap() = Some(Box::new(|row: &mut Row| {
        row["data"][0]["options"][0]["title"] = Value::String("Gloves (rental)".to_string());
    }));

    let saved = store.toggle_option(0, 0).await.unwrap();

    assert_eq!(saved.sections[0].options[0].title, "Gloves (rental)");
    assert!(saved.sections[0].options[0].checked);
    assert_eq!(store.selected(), Some(&saved));
}

#[tokio::test]
async fn test_toggle_persists_whole_section_list() {
    let (mut store, service) = setup_saved(two_unchecked()).await;
    store.toggle_option(0, 1).await.unwrap();

    let mut fresh = ChecklistStore::new(service.clone());
    let reloaded = fresh.load("T1", "U1").await.unwrap();
    assert_eq!(reloaded[0].option(0, 1).map(|o| o.checked), Some(true));
    assert_eq!(reloaded[0].option(0, 0).map(|o| o.checked), Some(false));
}

#[tokio::test]
async fn test_readiness_per_member() {
    let (mut store, _service) = setup_saved(vec![]).await;
    store.add_member("U1", "Alice").await.unwrap();

    let readiness = store.readiness();
    let summary: Vec<_> = readiness.iter().map(|r| (r.member_name.as_str(), r.ready)).collect();
    assert_eq!(summary, [("Me", false), ("Alice", false)]);
}
