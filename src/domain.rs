//! Domain models for assignment authoring.
//!
//! This module contains the assignment and its pages, the markup model pages
//! are written in, the page editor with its word completion, account
//! verification, the calculator, and configuration.

/// Assignments, their cover metadata and content pages.
pub mod assignment;
pub use assignment::{Assignment, AssignmentDraft, Cover, CoverRow, PageError, Side};

pub mod autocomplete;
pub mod calculator;

mod config;
pub use config::Config;

pub mod credential;
pub mod editor;
pub mod markup;
