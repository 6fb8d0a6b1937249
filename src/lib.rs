//! Intake Assist: conversational project intake with a Q&A side mode.

pub mod cli;
pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
pub mod qa;
