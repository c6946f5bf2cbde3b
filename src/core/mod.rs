pub mod app;
pub mod backend;
pub mod chat_stream;
pub mod config;
pub mod message;
