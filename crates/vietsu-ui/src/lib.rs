//! egui panels and UI state for the Viet Su chat client.

pub mod panels;
pub mod state;
pub mod theme;
