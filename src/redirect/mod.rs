//! Public redirect server: resolves short codes and QR ids, hands a scan
//! event to the recorder and answers with a redirect.

pub mod handlers;
pub mod middleware;
pub mod resolver;
pub mod routes;

pub use handlers::RedirectState;
pub use resolver::{resolve, Lookup, Resolution};
pub use routes::create_redirect_router;
