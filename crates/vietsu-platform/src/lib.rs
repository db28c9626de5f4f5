//! Browser platform adapters — implements vietsu-core port traits
//! via wasm-bindgen.
//!
//! Nothing here contains chat logic; each module is a thin bridge from
//! a port trait to a web API.

pub mod http;
pub mod storage;
pub mod stream;
pub mod timer;

pub use http::FetchHttpClient;
pub use storage::{auto_detect_storage, LocalStorage, MemoryStorage};
pub use stream::FetchChatStream;
pub use timer::BrowserTimer;
