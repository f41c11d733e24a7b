//! Shared helpers: process execution, hashing, MIME and path handling.

pub mod exec;
pub mod hash;
pub mod mime;
pub mod path;
