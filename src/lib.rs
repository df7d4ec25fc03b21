// Library exports for Ruokareseptit
// This allows integration tests and the binary to share the same modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod flash;
pub mod navigation;
pub mod pagination;
pub mod recipes;
pub mod reviews;
pub mod routes;
pub mod seed;
pub mod state;
