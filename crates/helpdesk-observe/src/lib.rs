//! Observability setup for the help desk service.

pub mod tracing_setup;
