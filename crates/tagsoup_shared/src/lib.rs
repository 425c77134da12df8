//! Shared functionality
//!
//! This crate supplies the character source every other tagsoup crate reads from: the
//! [`page::Page`] with its cursors and charset handling, and the error types.

pub mod page;
pub mod types;
