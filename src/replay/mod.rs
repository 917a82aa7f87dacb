pub mod actions;
pub mod engine;
pub mod event;
pub mod options;
pub mod windows;
