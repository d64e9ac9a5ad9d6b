//! CLI commands and operator menu

pub mod commands;
pub mod menu;
