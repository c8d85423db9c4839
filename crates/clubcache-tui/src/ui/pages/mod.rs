//! Page content, one module per site page.

pub mod events;
pub mod gallery;
pub mod history;
pub mod home;
