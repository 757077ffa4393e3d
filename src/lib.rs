//! EduSmart - homework help backend
//!
//! - Learner registration and JWT login
//! - Homework questions answered through an OpenAI-compatible LLM API, with
//!   learner feedback, statistics and study recommendations
//! - A learning-material catalog
//! - Dual-mode persistence: SQLite when reachable, an in-memory demo store
//!   otherwise

pub mod types;
pub mod error;
pub mod config;
pub mod pagination;
pub mod store;
pub mod ai;
pub mod identity;
pub mod tutoring;
pub mod materials;
pub mod server;
pub mod cli;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use store::{ActiveStore, PersistenceGateway, StoreMode};

pub use server::{
    router,
    ServerState,
    start as start_server,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
