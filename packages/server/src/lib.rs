//! # Pagesmith Server
//!
//! HTTP surface over the content engine:
//!
//! | route               | purpose                                        |
//! |---------------------|------------------------------------------------|
//! | `POST /api/preview` | render content into posted HTML                |
//! | `GET /api/content`  | page template, content and version tokens      |
//! | `POST /api/content` | publish HTML and content guarded by the tokens |
//! | `POST /api/validate`| check a template against the mapping table     |
//! | `GET /health`       | liveness                                       |

pub mod config;
pub mod github;
pub mod handlers;
pub mod repository;
pub mod routes;
pub mod server;
pub mod store;

pub use config::{GitHubSettings, LogFormat, ServerConfig, StoreKind};
pub use github::GitHubStore;
pub use handlers::{ApiError, AppState};
pub use repository::SiteRepository;
pub use routes::create_router;
pub use store::{encode_content, MemoryStore, RemoteFile, RemoteStore, StoreError, UnconfiguredStore, WriteOutcome};
