pub mod error;
pub mod extract;
pub mod logging;
pub mod memo;
pub mod naming;
pub mod oauth1;
