pub mod dispatch;
pub mod notification_dto;
pub mod notification_handlers;
pub mod notification_models;
pub mod notification_repository;

pub use notification_models::{NewNotification, Notification, NotificationKind};
pub use notification_repository::NotificationRepository;
