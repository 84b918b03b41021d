//! Application shell

pub mod cli;
pub mod options;
pub mod run;
pub mod settings;
