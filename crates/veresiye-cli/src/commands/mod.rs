//! Command handlers, one module per command group.

pub mod customers;
pub mod import;
pub mod init;
pub mod maintenance;
pub mod misc;
pub mod prices;
pub mod quick;
pub mod settings;
pub mod summary;
pub mod transactions;
