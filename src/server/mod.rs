//! REST API server and its schema.

pub mod run;
pub mod schema;
