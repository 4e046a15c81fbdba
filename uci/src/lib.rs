//! UCI protocol types: search reporting and time-control parsing.
//!
//! This crate deliberately stops at the wire format. Reading `position`/`go`
//! commands from stdin and driving an actual UCI session is a front-end
//! concern that lives outside the search engine.

pub mod search_info;
pub mod time_control;
