//! pandora: a tabbed terminal shell with typo correction, command
//! prediction and shared sessions.

pub mod assist;
pub mod bridge;
pub mod command;
pub mod config;
pub mod store;
pub mod terminal;
pub mod tui;
