pub mod api_client;
#[cfg(target_arch = "wasm32")]
pub mod auth_events;

pub use api_client::*;
#[cfg(target_arch = "wasm32")]
pub use auth_events::AuthEventListener;
