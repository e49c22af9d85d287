pub mod application;
pub mod tenant;
pub mod user;
