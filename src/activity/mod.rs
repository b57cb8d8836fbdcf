pub mod activity_handlers;
pub mod activity_models;
pub mod activity_repository;

pub use activity_models::Activity;
pub use activity_repository::ActivityRepository;
