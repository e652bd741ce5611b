pub mod config;
pub mod counter;
pub mod http;
pub mod registry;
pub mod storage;
