use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;

/// Per-request facts captured before routing.
#[derive(Debug, Copy, Clone)]
pub struct RequestContext {
    pub started: Instant,
    /// Absent when the router is driven without a socket, e.g. in tests.
    pub peer: Option<SocketAddr>,
}

pub async fn capture_request_context(mut request: Request<Body>, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    request.extensions_mut().insert(RequestContext {
        started: Instant::now(),
        peer,
    });
    next.run(request).await
}
