//! Core types for the redirect kernel.

pub mod url;
pub mod pair;

pub use url::{DocUrl, RedirectTarget};
pub use pair::RedirectPair;
