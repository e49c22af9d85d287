pub mod transport;
pub use transport::{OaError, OaTransport, RequestOptions};
pub mod gateway;
pub use gateway::PlatformGateway;
