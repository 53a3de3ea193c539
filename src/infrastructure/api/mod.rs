pub mod auth;
pub mod chatbot;
pub mod datasets;
