//! HTTP middleware

pub mod metrics;
pub mod rate_limit;
pub mod request_id;

pub use metrics::metrics_middleware;
pub use rate_limit::{create_rate_limiter, rate_limit_middleware};
pub use request_id::{RequestId, request_id_middleware};
