pub mod notification_dto;
pub mod notification_handlers;
pub mod notification_service;
pub mod routes;

pub use notification_service::NotificationService;
