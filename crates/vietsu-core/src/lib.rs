//! Core client logic — pure Rust, no browser APIs.
//!
//! Everything that talks to the outside world goes through the port
//! traits in [`ports`]; adapters live in `vietsu-platform`. This crate
//! can therefore be tested natively with mock ports.

pub mod api;
pub mod chat;
pub mod directory;
pub mod event_bus;
pub mod ports;
pub mod session;
pub mod sse;

mod tests;

pub use api::ApiClient;
pub use chat::ChatRuntime;
pub use directory::ConversationDirectory;
pub use event_bus::EventBus;
pub use session::SessionStore;
