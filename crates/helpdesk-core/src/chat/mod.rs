//! Chat sessions, message exchange, and history.
//!
//! The storage ports live in [`repository`]; everything else is generic over
//! them and never touches a database directly.

pub mod exchange;
pub mod history;
pub mod repository;
pub mod service;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
