pub mod connection;
pub mod message;

pub use connection::FeedConnection;
pub use message::FeedMessage;
