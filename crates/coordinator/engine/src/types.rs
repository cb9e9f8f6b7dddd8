//! Request and response types for coordinator engine operations.

pub mod request;
pub mod response;
