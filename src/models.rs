pub mod application;
pub mod fallball;
pub mod oa;
pub mod tenant;
pub mod user;
