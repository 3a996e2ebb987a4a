use async_trait::async_trait;
use pagesmith_common::{LoadResponse, MemoryCache, SaveRequest, SaveResponse};
use pagesmith_content::model::BannerContent;
use pagesmith_content::{ContentDocument, Section, SectionContent};
use pagesmith_editor::{BackendError, ContentBackend, EditorConfig, EditorStore};
use std::sync::Arc;

struct NoBackend;

#[async_trait]
impl ContentBackend for NoBackend {
    async fn load(&self) -> Result<LoadResponse, BackendError> {
        Err(BackendError::NotFound("content".into()))
    }

    async fn save(&self, _request: SaveRequest) -> Result<SaveResponse, BackendError> {
        Err(BackendError::NotFound("content".into()))
    }
}

fn banner(text: &str) -> ContentDocument {
    ContentDocument {
        sections: vec![Section::new(
            "banner",
            ".banner",
            SectionContent::Banner(BannerContent {
                text: Some(text.into()),
                ..Default::default()
            }),
        )],
        ..Default::default()
    }
}

fn editor(config: EditorConfig) -> EditorStore {
    EditorStore::new(Arc::new(NoBackend), Arc::new(MemoryCache::new()), config)
}

#[test]
fn test_n_updates_then_n_undos_restore_original() {
    let mut store = editor(EditorConfig::default());
    let original = banner("original");
    store.load(original.clone()).unwrap();

    for i in 0..10 {
        store.update(banner(&format!("edit {}", i))).unwrap();
        assert_eq!(store.history_index(), i + 1);
        assert!(store.is_dirty());
    }
    for _ in 0..10 {
        assert!(store.undo());
    }

    assert_eq!(store.current(), &original);
    assert_eq!(store.history_index(), 0);
    assert!(!store.is_dirty());
    assert!(!store.undo());
}

#[test]
fn test_redo_after_undo_sequence() {
    let mut store = editor(EditorConfig::default());
    let original = banner("original");
    let a = banner("A");
    let b = banner("B");
    store.load(original.clone()).unwrap();
    store.update(a.clone()).unwrap();
    store.update(b.clone()).unwrap();

    store.undo();
    assert_eq!(store.current(), &a);
    assert!(store.is_dirty());

    store.undo();
    assert_eq!(store.current(), &original);
    assert!(!store.is_dirty());

    store.redo();
    assert_eq!(store.current(), &a);
    assert!(store.is_dirty());

    store.redo();
    assert_eq!(store.current(), &b);
    assert!(store.is_dirty());
    assert!(!store.redo());
}

#[test]
fn test_history_limit_keeps_trimmed_base_dirty() {
    let mut store = editor(EditorConfig {
        history_limit: 2,
        ..Default::default()
    });
    store.load(banner("original")).unwrap();
    for text in ["A", "B", "C"] {
        store.update(banner(text)).unwrap();
    }

    assert!(store.undo());
    assert!(store.undo());
    assert!(!store.undo());
    assert_eq!(store.current(), &banner("A"));
    // The loaded snapshot is gone, so this is still unsaved work
    assert!(store.is_dirty());
}
