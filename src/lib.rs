pub mod cache;
pub mod cli;
pub mod config;
pub mod event;
pub mod feed;
pub mod transport;
