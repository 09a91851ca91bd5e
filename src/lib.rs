//! Weekly duty roster generator.
//!
//! People declare which one-hour slots (Monday to Friday, 12h to 21h) they can
//! work; the allocator gives everyone at least one shift, covers as many slots
//! as it can and keeps each person's load under a cap.
//!
//! - **`schedule`**: slot grid, allocator and roster types
//! - **`parser`**: availability form (CSV) ingestion
//! - **`display`** / **`export`**: grid rendering and CSV sheets
//! - **`web`**: upload-and-regenerate HTTP service

pub mod error;
pub mod logging;
pub mod parser;
pub mod schedule;
pub mod display;
pub mod export;
pub mod web;

pub use error::{Result, RosterError};
