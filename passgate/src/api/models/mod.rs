//! Form and view data structures.

pub mod auth;
pub mod pages;
