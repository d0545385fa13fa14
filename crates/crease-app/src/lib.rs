pub mod app;
pub mod backup;
pub mod command;
pub mod config;
pub mod sync;
pub mod view;
