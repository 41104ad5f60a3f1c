// Presentation layer - Read-only HTTP surface
pub mod app_state;
pub mod handlers;
