/// State management module
///
/// This module handles all application state, including:
/// - The key/value preference area on disk (preferences.rs)
/// - The pattern list store and its schema migration (store.rs)
/// - The in-memory pattern registry (registry.rs)
/// - Per-entry workspace state with deferred saves (workspace.rs)
/// - Shared data structures and their JSON encodings (data.rs, wire.rs)

pub mod data;
pub mod draft;
pub mod error;
pub mod preferences;
pub mod recommended;
pub mod registry;
pub mod store;
pub mod wire;
pub mod workspace;
