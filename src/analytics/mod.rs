//! Scan analytics
//!
//! Turns redirect requests into scan events (user-agent heuristics, proxy
//! aware client IP, UTM attribution), records them off the request path and
//! summarizes them per QR code. No geo-IP lookup is performed.

pub mod ip_extractor;
pub mod recorder;
pub mod summary;
pub mod user_agent;

pub use ip_extractor::{anonymize_ip, extract_client_ip};
pub use recorder::ScanRecorder;
pub use summary::{summarize, ScanSummary};
pub use user_agent::{classify, UserAgentInfo};
