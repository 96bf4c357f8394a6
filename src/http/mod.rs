//! Minimal HTTP/1.1 front end for the control API
//!
//! One thread per connection, one request per connection, JSON in and out.

pub mod request;
pub mod response;
pub mod routes;
pub mod server;

pub use request::Request;
pub use response::Response;
pub use server::HttpServer;
