pub mod auth;
pub mod chat;
pub mod citations;
pub mod sidebar;
