//! Web server module
//!
//! A small JSON gateway exposing the orchestrator to a browser front-end.
//! Every client session owns its own orchestrator.

mod handlers;
mod routes;
mod state;

pub use handlers::SESSION_HEADER;
pub use routes::create_router;
pub use state::{AppState, SessionStore};
