pub mod agent;
pub mod protocol;
pub mod transcript;
pub mod history;
pub mod config;
pub mod error;
pub mod event;
pub mod session;


pub use error::ClientError;
pub type Result<T> = std::result::Result<T, ClientError>;
