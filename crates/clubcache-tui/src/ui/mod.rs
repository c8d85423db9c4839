//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, status bar, overlays and modals
//! - `input`: keyboard event handling
//! - `styles`: color scheme and text styling
//! - `pages`: per-page content (home, history, gallery, events)

pub mod input;
pub mod pages;
pub mod render;
pub mod styles;
