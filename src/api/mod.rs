//! API layer - HTTP endpoint handlers organized by domain.

mod health;
mod messages;
mod metrics;
mod presence;
mod routes;
mod slideshow;

pub use health::{health, stats};
pub use messages::{mark_conversation_read, mark_message_read, send_message};
pub use metrics::prometheus_metrics;
pub use presence::user_presence;
pub use routes::api_routes;
pub use slideshow::{
    get_slideshow, navigate_slideshow, start_slideshow, stop_slideshow, transfer_control,
    update_auto_advance,
};
