// Test module entry point for integrity tests
// All engine-related tests organized here


mod error_tests;
mod library_tests;
mod log_tests;
mod manifest_tests;
mod task_tests;
