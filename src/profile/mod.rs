//! Profile domain module

mod service;

pub use service::ProfileService;
