pub mod client_ip;
pub mod middleware;
pub mod request_id;

pub use client_ip::{client_ip, ClientIp};
pub use middleware::{identity_middleware, AuthUser};
pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};
