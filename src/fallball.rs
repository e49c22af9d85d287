pub mod client;
pub use client::{FallballClient, FallballError};
pub mod reseller_repo;
pub use reseller_repo::ResellerRepository;
pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
