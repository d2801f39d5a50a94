//! Pipeline phases. Each handler sequences the services for one phase and
//! owns the logging around it.

pub mod build_handlers;
pub mod deploy_handlers;
