//! HTTP protocol layer module
//!
//! Protocol-level helpers shared by the API layer and static serving.

pub mod mime;
pub mod response;
