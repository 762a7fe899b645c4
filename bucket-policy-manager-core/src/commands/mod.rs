//! Commands module - service layer for bucket policy operations

mod apply;
mod remove;
mod restore;
pub(crate) mod service;

pub use service::PolicyManagerService;
