//! Store record structures.
//!
//! `*CreateDBRequest` types are what callers hand to a store, `*DBResponse` types are the rows
//! a store hands back.

pub mod identities;
pub mod sessions;
