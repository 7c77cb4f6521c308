//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. Trailing-slash normalization
//! 3. `TraceLayer` (request span with method, path, request id)
//! 4. Request ID (propagate or create `x-request-id`)
//! 5. CORS (credentialed, configured origins)
//! 6. Session layer (tower-sessions with `PostgreSQL` store)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, RequireStaff, clear_current_user, set_current_user};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::{cart_owner, create_session_layer, session_store};
