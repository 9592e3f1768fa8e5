pub mod dirs;
pub mod json;
pub mod types;
