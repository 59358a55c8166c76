//! Utility modules for the bundler.

pub mod path;
