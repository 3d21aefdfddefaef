pub mod app;
pub mod commands;

pub use self::app::{Cli, Commands};
