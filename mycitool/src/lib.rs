//! mycitool library
//!
//! Checks out a repository, builds the image described by its Dockerfile
//! and launches a container from it, waiting until it is running.

pub mod app;
pub mod deploy;
pub mod diagnostic;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod utils;
