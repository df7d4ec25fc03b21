pub mod repository;

pub use repository::ReviewUpdate;
