// Library module for treeseal
// Re-exports modules for use in integration tests and external collaborators

pub mod config;
pub mod hash;
pub mod library;
