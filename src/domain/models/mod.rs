mod chat;
mod credentials;
mod document;
mod gateway_error;

pub use chat::*;
pub use credentials::*;
pub use document::*;
pub use gateway_error::*;
