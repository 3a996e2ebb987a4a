//! # Pagesmith Editor
//!
//! Edit-state manager for page content.
//!
//! ```text
//! ┌──────────────┐  update/undo/redo   ┌──────────────┐
//! │ UI / keymap  │ ──────────────────▶ │ EditorStore  │──events──▶ subscribers
//! └──────────────┘                     │  History     │
//!                                      │  dirty flag  │──deadline──▶ autosave task
//!                                      └──────┬───────┘
//!                                save_draft   │
//!                        ┌────────────────────┴───────────────┐
//!                        ▼                                    ▼
//!                  LocalCache (draft)            ContentBackend (publish)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagesmith_editor::{spawn_autosave, EditorConfig, EditorStore, HttpBackend};
//!
//! let config = EditorConfig::from_env();
//! let backend = Arc::new(HttpBackend::new("http://localhost:3000", config.request_timeout)?);
//! let mut store = EditorStore::new(backend, Arc::new(MemoryCache::new()), config);
//! store.load_remote().await?;
//!
//! let store = Arc::new(Mutex::new(store));
//! let autosave = spawn_autosave(store.clone());
//! ```

mod autosave;
mod backend;
mod config;
mod errors;
mod events;
mod history;
mod shortcuts;
mod store;

pub use autosave::{spawn_autosave, AutosaveTimer};
pub use backend::{BackendError, ContentBackend, HttpBackend};
pub use config::{EditorConfig, DEFAULT_AUTOSAVE_DELAY};
pub use errors::EditorError;
pub use events::{EditorEvent, PreviewDevice, SaveTarget, UnloadGuard, UNSAVED_CHANGES_WARNING};
pub use history::History;
pub use shortcuts::{EditorCommand, KeyChord, Keymap};
pub use store::{merge_patch, EditorStore, SaveOutcome};
