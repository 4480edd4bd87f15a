// Library root: the host around castaway-core, re-exported so integration
// tests and the binary share one API.

pub mod config;
pub mod pipeline;
pub mod report;
pub mod snapshot;
