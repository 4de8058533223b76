mod settings;

pub use settings::{JwtConfig, OtelConfig, ServerConfig, Settings, WebSocketConfig};
