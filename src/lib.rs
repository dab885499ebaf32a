pub mod config;
pub mod error;
pub mod identity;
pub mod registry;
pub mod security;
pub mod server;
pub mod storage;
