//! Path and URL utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`)
//! - [`route`]: Request URL handling (`request_path`, `strip_basename`, `join_route`)

pub mod fs;
pub mod route;

pub use fs::normalize_path;
