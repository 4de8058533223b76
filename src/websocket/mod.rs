mod connection;
mod handler;
mod message;

pub use connection::run_connection;
pub use handler::ws_handler;
pub use message::OutboundMessage;
