pub mod backend;
pub mod clear;
pub mod cli;
pub mod config;
pub mod dom;
pub mod executor;
pub mod facade;
pub mod followup;
pub mod inject;
pub mod locator;
pub mod store;

pub use promptdock_common::error;
pub use promptdock_common::html;
pub use promptdock_common::protocol;
pub use promptdock_common::sites;
