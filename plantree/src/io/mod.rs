//! I/O helpers: the wrapped child process, stream duplication, config.

pub mod config;
pub mod process;
pub mod tee;
