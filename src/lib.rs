//! Mantle ecosystem QA agent
//!
//! A conversational question-answering service for the Mantle blockchain
//! ecosystem. Queries are enriched with per-session conversation history,
//! answered by a hosted LLM that can search the web, scrape pages, and read
//! on-chain data, and cached per session.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP front end over the session registry
//! - **CLI**: interactive question loop on a fixed session
//! - **Session layer**: per-session history, cache, and orchestration
//! - **Reasoning engine**: hosted chat model bound to the Mantle persona and
//!   the tool set
//! - **Tools**: web search, page fetch, and Mantle RPC queries
//!
//! # Modules
//!
//! - [`session`]: session workflow and registry
//! - [`llm`]: reasoning engine adapter
//! - [`tools`]: tool descriptors and adapters
//! - [`storage`]: session state persistence
//! - [`events`]: run lifecycle types

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::unused_async)]

pub mod cli;
pub mod config;
pub mod events;
pub mod llm;
pub mod server;
pub mod session;
pub mod storage;
pub mod tools;

use std::sync::Arc;

use session::SessionRegistry;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Session registry for conversation management.
    pub registry: Arc<SessionRegistry>,
}
