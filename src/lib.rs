// Session engine, paragraph providers, and results store.
// The terminal front-end in main.rs (app, event, ui) is binary-only and
// drives everything through this crate; benches and tests/ use it directly.

pub mod config;
pub mod engine;
pub mod provider;
pub mod session;
pub mod store;
