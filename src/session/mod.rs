//! Session and conversation workflow management.
//!
//! A session is a conversation thread identified by an opaque id, with its
//! own history and response cache. Sessions are created lazily on first
//! query and live in the process-wide [`SessionRegistry`].
//!
//! # Architecture
//!
//! - [`SessionWorkflow`]: per-session orchestration of cache, history, and
//!   the bound reasoning engine
//! - [`SessionRegistry`]: thread-safe id → workflow mapping
//!
//! # Example
//!
//! ```rust,ignore
//! use mantle_agent::session::SessionRegistry;
//!
//! let registry = SessionRegistry::new(engine, storage);
//! let (session_id, workflow) = registry.get_or_create(None);
//! let response = workflow.run("What is Mantle?", true).await?;
//! ```

mod registry;
mod workflow;

pub use registry::SessionRegistry;
pub use workflow::{SessionWorkflow, Turn, WorkflowState};
