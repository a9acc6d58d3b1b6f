/// Middleware module
///
/// Custom middleware for authentication and request logging.

mod auth;
mod request_logger;

pub use auth::{AuthMiddleware, AuthenticatedUser};
pub use request_logger::RequestLogger;
