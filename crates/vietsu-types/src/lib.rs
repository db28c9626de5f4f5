pub mod auth;
pub mod citation;
pub mod config;
pub mod content;
pub mod conversation;
pub mod error;
pub mod event;
pub mod message;
pub mod stream;


pub use error::ClientError;
pub type Result<T> = std::result::Result<T, ClientError>;
