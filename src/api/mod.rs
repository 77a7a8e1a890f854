//! Management API. Every route except `/api/health` runs behind the auth
//! middleware and receives the caller's [`Session`](crate::auth::Session).

mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_api_router;
