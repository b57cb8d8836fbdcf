pub mod task_dto;
pub mod task_handlers;
pub mod task_models;
pub mod task_repository;

pub use task_models::{Task, TaskPriority, TaskStatus};
pub use task_repository::TaskRepository;
