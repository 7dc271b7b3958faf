pub mod google;
pub mod handlers;
pub mod session;
