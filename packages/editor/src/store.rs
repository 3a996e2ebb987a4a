//! # Editor Store
//!
//! Owns the document being edited and everything derived from it: snapshot
//! history, the dirty flag, UI selections and the persistence state needed
//! to publish (template HTML and version tokens).
//!
//! ## State rules
//!
//! - `load` makes the loaded document both original and current, clean
//! - every edit pushes a snapshot and marks the store dirty
//! - undo is clean only when it lands on the loaded snapshot
//! - redo is always dirty
//! - a failed save leaves content, history and the dirty flag untouched
//!
//! Side effects are explicit objects: the [`AutosaveTimer`] armed on the
//! clean → dirty transition, the [`UnloadGuard`] and an event broadcast.

use crate::autosave::AutosaveTimer;
use crate::backend::ContentBackend;
use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::events::{EditorEvent, PreviewDevice, SaveTarget, UnloadGuard};
use crate::history::History;
use crate::shortcuts::{EditorCommand, KeyChord, Keymap};
use chrono::{DateTime, Utc};
use pagesmith_common::{Draft, LoadResponse, LocalCache, SaveRequest, VersionTokens};
use pagesmith_content::{inject_content_into_html, Annotate, ContentDocument, LiveDocument};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const EVENT_CAPACITY: usize = 64;

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub target: SaveTarget,
    pub timestamp: DateTime<Utc>,
}

pub struct EditorStore {
    backend: Arc<dyn ContentBackend>,
    cache: Arc<dyn LocalCache>,
    config: EditorConfig,
    keymap: Keymap,

    original: ContentDocument,
    history: History<ContentDocument>,
    dirty: bool,

    active_section: Option<String>,
    preview_device: PreviewDevice,
    errors: Vec<String>,

    template_html: Option<String>,
    tokens: Option<VersionTokens>,
    last_saved: Option<DateTime<Utc>>,

    autosave: AutosaveTimer,
    autosave_signal: Arc<Notify>,
    dirty_flag: Arc<AtomicBool>,
    events: broadcast::Sender<EditorEvent>,
    cancel: CancellationToken,
    disposed: bool,
}

impl EditorStore {
    pub fn new(
        backend: Arc<dyn ContentBackend>,
        cache: Arc<dyn LocalCache>,
        config: EditorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let empty = ContentDocument::default();
        Self {
            backend,
            cache,
            keymap: Keymap::new(),
            original: empty.clone(),
            history: History::new(empty, config.history_limit),
            dirty: false,
            active_section: None,
            preview_device: PreviewDevice::default(),
            errors: Vec::new(),
            template_html: None,
            tokens: None,
            last_saved: None,
            autosave: AutosaveTimer::new(config.autosave_delay),
            autosave_signal: Arc::new(Notify::new()),
            dirty_flag: Arc::new(AtomicBool::new(false)),
            events,
            cancel: CancellationToken::new(),
            disposed: false,
            config,
        }
    }

    // ---- lifecycle ----

    /// Start editing `doc` with a fresh history
    pub fn load(&mut self, doc: ContentDocument) -> Result<(), EditorError> {
        self.ensure_live()?;
        if let Some(id) = doc.duplicate_section_id() {
            tracing::warn!(section_id = id, "loaded document has duplicate section ids");
        }
        self.original = doc.clone();
        self.history.reset(doc);
        self.set_dirty(false);
        tracing::info!(sections = self.original.sections.len(), "document loaded");
        self.emit(EditorEvent::Loaded);
        Ok(())
    }

    /// Fetch page, content and version tokens from the backend
    #[tracing::instrument(skip_all)]
    pub async fn load_remote(&mut self) -> Result<(), EditorError> {
        self.ensure_live()?;
        match self.backend.load().await {
            Ok(loaded) => self.apply_loaded(loaded),
            Err(err) => {
                let err = EditorError::from(err);
                self.errors.push(format!("Failed to load: {}", err));
                Err(err)
            }
        }
    }

    /// Apply a locally saved draft as a new edit, returning its save time
    pub fn restore_draft(&mut self) -> Result<Option<DateTime<Utc>>, EditorError> {
        self.ensure_live()?;
        let Some(draft) = Draft::load(self.cache.as_ref())? else {
            return Ok(None);
        };
        if self.template_html.is_none() {
            self.template_html = draft.html;
        }
        if self.tokens.is_none() {
            self.tokens = draft.sha;
        }
        if draft.content != *self.current() {
            self.update(draft.content)?;
        }
        tracing::info!(timestamp = %draft.timestamp, "draft restored");
        Ok(Some(draft.timestamp))
    }

    /// Stop autosave and reject further edits
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.autosave.disarm();
        self.cancel.cancel();
        self.emit(EditorEvent::Disposed);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // ---- edits ----

    /// Replace the current document with `doc`
    pub fn update(&mut self, doc: ContentDocument) -> Result<(), EditorError> {
        self.ensure_live()?;
        if let Some(id) = doc.duplicate_section_id() {
            return Err(EditorError::DuplicateSectionId(id.to_string()));
        }
        self.history.push(doc);
        self.set_dirty(true);
        self.emit(EditorEvent::Changed {
            history_index: self.history.index(),
        });
        Ok(())
    }

    /// Merge `patch` (RFC 7396) into the section with `id`
    pub fn update_section(&mut self, id: &str, patch: &Value) -> Result<(), EditorError> {
        self.ensure_live()?;
        let section = self
            .current()
            .section(id)
            .ok_or_else(|| EditorError::UnknownSection(id.to_string()))?;

        let invalid = |source| EditorError::InvalidSection {
            id: id.to_string(),
            source,
        };
        let mut value = section.to_value().map_err(invalid)?;
        merge_patch(&mut value, patch);
        let patched = pagesmith_content::Section::from_value(value).map_err(invalid)?;

        let mut doc = self.current().clone();
        if let Some(slot) = doc.section_mut(id) {
            *slot = patched;
        }
        self.update(doc)
    }

    pub fn undo(&mut self) -> bool {
        if self.disposed || !self.history.undo() {
            return false;
        }
        let dirty = !self.history.at_base();
        self.set_dirty(dirty);
        self.emit(EditorEvent::Changed {
            history_index: self.history.index(),
        });
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.disposed || !self.history.redo() {
            return false;
        }
        self.set_dirty(true);
        self.emit(EditorEvent::Changed {
            history_index: self.history.index(),
        });
        true
    }

    /// Discard every edit since load
    pub fn revert(&mut self) {
        if self.disposed {
            return;
        }
        self.history.reset(self.original.clone());
        self.set_dirty(false);
        self.emit(EditorEvent::Changed { history_index: 0 });
    }

    // ---- saving ----

    /// Persist the current document.
    ///
    /// Without version tokens the draft goes to the local cache. Otherwise the
    /// page is rendered into the template, published with the tokens and
    /// reloaded so the next save carries fresh tokens.
    #[tracing::instrument(skip_all, fields(remote = self.tokens.is_some()))]
    pub async fn save_draft(&mut self) -> Result<SaveOutcome, EditorError> {
        self.ensure_live()?;
        let Some(tokens) = self.tokens.clone() else {
            let outcome = self.save_local_draft();
            if outcome.is_ok() {
                self.set_dirty(false);
            }
            return outcome;
        };

        match self.publish(&tokens).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let transient = matches!(&err, EditorError::Backend(e) if e.is_transient());
                tracing::warn!(error = %err, transient, "save failed");
                if transient {
                    // Keep the unsent edits locally until the next attempt
                    if let Err(cache_err) = self.draft().store(self.cache.as_ref()) {
                        tracing::warn!(error = %cache_err, "failed to keep local draft");
                    }
                }
                let message = format!("Failed to save: {}", err);
                self.errors.push(message.clone());
                self.emit(EditorEvent::SaveFailed { message });
                Err(err)
            }
        }
    }

    /// Write the current document to the local cache without touching the
    /// dirty flag
    pub fn save_local_draft(&mut self) -> Result<SaveOutcome, EditorError> {
        let draft = self.draft();
        if let Err(err) = draft.store(self.cache.as_ref()) {
            let err = EditorError::from(err);
            self.errors.push(format!("Failed to save: {}", err));
            return Err(err);
        }

        self.last_saved = Some(draft.timestamp);
        self.emit(EditorEvent::Saved {
            target: SaveTarget::Local,
            timestamp: draft.timestamp,
        });
        Ok(SaveOutcome {
            target: SaveTarget::Local,
            timestamp: draft.timestamp,
        })
    }

    fn draft(&self) -> Draft {
        Draft {
            content: self.current().clone(),
            html: self.template_html.clone(),
            sha: self.tokens.clone(),
            timestamp: Utc::now(),
        }
    }

    async fn publish(&mut self, tokens: &VersionTokens) -> Result<SaveOutcome, EditorError> {
        let template = self.template_html.as_deref().ok_or(EditorError::NoTemplate)?;
        let content = self.current().clone();
        let html = inject_content_into_html(template, &content)?;

        let response = self
            .backend
            .save(SaveRequest::new(content.clone(), html, tokens))
            .await?;
        tracing::info!(message = %response.message, "content published");
        if let Err(err) = Draft::clear(self.cache.as_ref()) {
            tracing::warn!(error = %err, "failed to clear local draft");
        }

        self.last_saved = Some(response.timestamp);
        match self.backend.load().await {
            Ok(loaded) => self.apply_loaded(loaded)?,
            Err(err) => {
                // Published, but the tokens are now stale
                tracing::warn!(error = %err, "reload after save failed");
                self.original = content;
                self.set_dirty(false);
                self.errors
                    .push(format!("Saved, but failed to refresh content: {}", err));
            }
        }

        self.emit(EditorEvent::Saved {
            target: SaveTarget::Remote,
            timestamp: response.timestamp,
        });
        Ok(SaveOutcome {
            target: SaveTarget::Remote,
            timestamp: response.timestamp,
        })
    }

    fn apply_loaded(&mut self, loaded: LoadResponse) -> Result<(), EditorError> {
        self.template_html = Some(loaded.html);
        self.tokens = Some(loaded.sha);
        self.load(loaded.content)
    }

    // ---- autosave plumbing ----

    pub fn autosave_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    /// True (once) when an autosave is due at `now` and there is something to save
    pub fn take_due_autosave(&mut self, now: Instant) -> bool {
        !self.disposed && self.autosave.take_due(now) && self.dirty
    }

    pub fn autosave_signal(&self) -> Arc<Notify> {
        self.autosave_signal.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // ---- input and UI state ----

    /// Run the command bound to `chord`, if any
    pub async fn handle_shortcut(
        &mut self,
        chord: &KeyChord,
    ) -> Result<Option<EditorCommand>, EditorError> {
        let Some(command) = self.keymap.resolve(chord) else {
            return Ok(None);
        };
        match command {
            EditorCommand::Undo => {
                self.undo();
            }
            EditorCommand::Redo => {
                self.redo();
            }
            EditorCommand::Save => {
                self.save_draft().await?;
            }
        }
        Ok(Some(command))
    }

    pub fn unload_guard(&self) -> UnloadGuard {
        UnloadGuard::new(self.dirty_flag.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    pub fn set_active_section(&mut self, id: Option<String>) {
        self.active_section = id;
    }

    pub fn set_preview_device(&mut self, device: PreviewDevice) {
        self.preview_device = device;
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Render the current document into the template for the preview frame
    pub fn preview_html(&self, annotate: Annotate) -> Result<String, EditorError> {
        let template = self.template_html.as_deref().ok_or(EditorError::NoTemplate)?;
        let mut live = LiveDocument::new(template)?;
        live.apply(self.current());
        Ok(live.render(annotate))
    }

    // ---- accessors ----

    pub fn current(&self) -> &ContentDocument {
        self.history.current()
    }

    pub fn original(&self) -> &ContentDocument {
        &self.original
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn history_index(&self) -> usize {
        self.history.index()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn active_section(&self) -> Option<&str> {
        self.active_section.as_deref()
    }

    pub fn preview_device(&self) -> PreviewDevice {
        self.preview_device
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn template_html(&self) -> Option<&str> {
        self.template_html.as_deref()
    }

    pub fn version_tokens(&self) -> Option<&VersionTokens> {
        self.tokens.as_ref()
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn ensure_live(&self) -> Result<(), EditorError> {
        if self.disposed {
            Err(EditorError::Disposed)
        } else {
            Ok(())
        }
    }

    fn set_dirty(&mut self, dirty: bool) {
        if self.dirty == dirty {
            return;
        }
        self.dirty = dirty;
        self.dirty_flag.store(dirty, Ordering::Release);
        if dirty {
            self.autosave.arm(Instant::now());
        } else {
            self.autosave.disarm();
        }
        self.autosave_signal.notify_one();
        self.emit(EditorEvent::DirtyChanged { dirty });
    }

    fn emit(&self, event: EditorEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for EditorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorStore")
            .field("history_index", &self.history.index())
            .field("history_len", &self.history.len())
            .field("dirty", &self.dirty)
            .field("remote", &self.tokens.is_some())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

/// JSON merge patch: objects merge recursively, `null` deletes, anything
/// else replaces
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target) = target {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(key);
            } else {
                merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use async_trait::async_trait;
    use pagesmith_common::{MemoryCache, SaveResponse, DRAFT_KEY};
    use pagesmith_content::model::HeroContent;
    use pagesmith_content::{Section, SectionContent};
    use serde_json::json;

    struct OfflineBackend;

    #[async_trait]
    impl ContentBackend for OfflineBackend {
        async fn load(&self) -> Result<LoadResponse, BackendError> {
            Err(BackendError::Network("offline".into()))
        }

        async fn save(&self, _request: SaveRequest) -> Result<SaveResponse, BackendError> {
            Err(BackendError::Network("offline".into()))
        }
    }

    fn hero(heading: &str) -> ContentDocument {
        ContentDocument {
            sections: vec![Section::new(
                "hero",
                ".hero",
                SectionContent::Hero(HeroContent {
                    heading: Some(heading.into()),
                    ..Default::default()
                }),
            )],
            ..Default::default()
        }
    }

    fn store() -> (EditorStore, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::new());
        let store = EditorStore::new(Arc::new(OfflineBackend), cache.clone(), EditorConfig::default());
        (store, cache)
    }

    fn heading(store: &EditorStore) -> Option<String> {
        match &store.current().sections[0].content {
            SectionContent::Hero(hero) => hero.heading.clone(),
            _ => None,
        }
    }

    #[test]
    fn test_load_is_clean() {
        let (mut store, _) = store();
        store.load(hero("A")).unwrap();
        assert!(!store.is_dirty());
        assert_eq!(store.history_len(), 1);
        assert_eq!(store.original(), store.current());
        assert_eq!(store.autosave_deadline(), None);
    }

    #[test]
    fn test_redo_after_undo_stays_dirty() {
        let (mut store, _) = store();
        store.load(hero("A")).unwrap();
        store.update(hero("B")).unwrap();
        assert!(store.is_dirty());

        assert!(store.undo());
        assert!(!store.is_dirty());
        assert_eq!(heading(&store).as_deref(), Some("A"));

        assert!(store.redo());
        assert!(store.is_dirty());
        assert_eq!(heading(&store).as_deref(), Some("B"));
    }

    #[test]
    fn test_edit_mid_history_drops_redo() {
        let (mut store, _) = store();
        store.load(hero("A")).unwrap();
        store.update(hero("B")).unwrap();
        store.update(hero("C")).unwrap();
        store.undo();
        store.update(hero("D")).unwrap();

        assert_eq!(store.history_len(), 3);
        assert!(!store.can_redo());
        assert_eq!(heading(&store).as_deref(), Some("D"));
    }

    #[test]
    fn test_revert() {
        let (mut store, _) = store();
        store.load(hero("A")).unwrap();
        store.update(hero("B")).unwrap();
        store.revert();
        assert!(!store.is_dirty());
        assert_eq!(store.history_len(), 1);
        assert_eq!(heading(&store).as_deref(), Some("A"));
    }

    #[test]
    fn test_update_section_merges_patch() {
        let (mut store, _) = store();
        store.load(hero("A")).unwrap();
        store
            .update_section("hero", &json!({ "content": { "subheading": "Sub" } }))
            .unwrap();

        let SectionContent::Hero(hero) = &store.current().sections[0].content else {
            panic!("expected hero section");
        };
        assert_eq!(hero.heading.as_deref(), Some("A"));
        assert_eq!(hero.subheading.as_deref(), Some("Sub"));
        assert_eq!(store.history_len(), 2);
    }

    #[test]
    fn test_update_section_errors_leave_state() {
        let (mut store, _) = store();
        store.load(hero("A")).unwrap();

        assert!(matches!(
            store.update_section("missing", &json!({})),
            Err(EditorError::UnknownSection(_))
        ));
        assert!(matches!(
            store.update_section("hero", &json!({ "content": { "heading": 42 } })),
            Err(EditorError::InvalidSection { .. })
        ));
        assert_eq!(store.history_len(), 1);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let (mut store, _) = store();
        let mut doc = hero("A");
        doc.sections.push(doc.sections[0].clone());
        assert!(matches!(
            store.update(doc),
            Err(EditorError::DuplicateSectionId(id)) if id == "hero"
        ));
    }

    #[tokio::test]
    async fn test_local_save_without_tokens() {
        let (mut store, cache) = store();
        store.load(hero("A")).unwrap();
        store.update(hero("B")).unwrap();

        let outcome = store.save_draft().await.unwrap();
        assert_eq!(outcome.target, SaveTarget::Local);
        assert!(!store.is_dirty());
        assert!(cache.get(DRAFT_KEY).unwrap().is_some());
        assert_eq!(store.last_saved(), Some(outcome.timestamp));
    }

    #[tokio::test]
    async fn test_restore_draft() {
        let (mut store, cache) = store();
        store.load(hero("A")).unwrap();
        store.update(hero("B")).unwrap();
        store.save_draft().await.unwrap();

        let mut fresh = EditorStore::new(Arc::new(OfflineBackend), cache, EditorConfig::default());
        fresh.load(hero("A")).unwrap();
        assert!(fresh.restore_draft().unwrap().is_some());
        assert_eq!(heading(&fresh).as_deref(), Some("B"));
        assert!(fresh.is_dirty());
    }

    #[tokio::test]
    async fn test_failed_load_records_error() {
        let (mut store, _) = store();
        assert!(store.load_remote().await.is_err());
        assert_eq!(store.errors().len(), 1);
        assert!(store.errors()[0].starts_with("Failed to load"));
        store.clear_errors();
        assert!(store.errors().is_empty());
    }

    #[tokio::test]
    async fn test_shortcuts_drive_history() {
        let (mut store, _) = store();
        store.load(hero("A")).unwrap();
        store.update(hero("B")).unwrap();

        let undo = KeyChord::new("z").meta();
        assert_eq!(store.handle_shortcut(&undo).await.unwrap(), Some(EditorCommand::Undo));
        assert_eq!(heading(&store).as_deref(), Some("A"));

        let redo = KeyChord::new("y").ctrl();
        assert_eq!(store.handle_shortcut(&redo).await.unwrap(), Some(EditorCommand::Redo));
        assert_eq!(heading(&store).as_deref(), Some("B"));

        assert_eq!(store.handle_shortcut(&KeyChord::new("q")).await.unwrap(), None);
    }

    #[test]
    fn test_unload_guard_and_events() {
        let (mut store, _) = store();
        let guard = store.unload_guard();
        let mut events = store.subscribe();

        store.load(hero("A")).unwrap();
        assert!(guard.check().is_none());
        store.update(hero("B")).unwrap();
        assert!(guard.check().is_some());

        assert_eq!(events.try_recv().unwrap(), EditorEvent::Loaded);
        assert_eq!(events.try_recv().unwrap(), EditorEvent::DirtyChanged { dirty: true });
        assert_eq!(
            events.try_recv().unwrap(),
            EditorEvent::Changed { history_index: 1 }
        );
    }

    #[test]
    fn test_dispose_rejects_edits() {
        let (mut store, _) = store();
        let token = store.cancellation_token();
        store.dispose();
        assert!(token.is_cancelled());
        assert!(matches!(store.update(hero("B")), Err(EditorError::Disposed)));
        assert!(!store.undo());
    }

    #[test]
    fn test_merge_patch() {
        let mut target = json!({ "a": 1, "b": { "c": 2, "d": 3 } });
        merge_patch(&mut target, &json!({ "a": null, "b": { "c": 5 }, "e": [1] }));
        assert_eq!(target, json!({ "b": { "c": 5, "d": 3 }, "e": [1] }));
    }

    #[test]
    fn test_ui_state() {
        let (mut store, _) = store();
        store.set_active_section(Some("hero".into()));
        store.set_preview_device(PreviewDevice::Mobile);
        assert_eq!(store.active_section(), Some("hero"));
        assert_eq!(store.preview_device().width(), 375);
    }
}
