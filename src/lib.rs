pub mod browser;
pub mod cdp;
pub mod check;
pub mod collection;
pub mod commands;
pub mod communicator;
pub mod condition;
pub mod config;
pub mod driver;
pub mod element;
pub mod error;
pub mod wait;

pub use error::{Result, VerifyError};
