pub mod browse;
pub mod config;
pub mod delete;
pub mod folders;
pub mod health;
pub mod upload;
