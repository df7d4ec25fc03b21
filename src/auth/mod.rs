pub mod cookies;
pub mod handlers;
pub mod session;
pub mod users;
