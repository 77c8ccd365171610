//! HTTP control surface
//!
//! - GET /health - Liveness
//! - GET /status - Talk, session, hardware, audio and health snapshot
//! - PUT /session - Reconnect with a new session configuration
//! - POST /session/reconnect - Reconnect with the current configuration
//! - POST /talk/unlatch - Release a latched microphone
//! - POST /buttons/{talk|call}/{down|up} - Inject a button edge

mod handlers;
mod routes;
mod state;

pub use handlers::ErrorResponse;
pub use routes::create_router;
pub use state::AppState;
