pub mod client;
pub mod task_model;
