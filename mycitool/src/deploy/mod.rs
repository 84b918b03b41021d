//! Deployment module

pub mod builder;
pub mod docker;
pub mod fsm;
pub mod git;
pub mod launcher;
