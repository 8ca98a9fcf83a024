pub mod subtask_dto;
pub mod subtask_handlers;
pub mod subtask_models;
pub mod subtask_repository;
pub mod subtask_service;

pub use subtask_models::{Subtask, SubtaskProgress};
pub use subtask_repository::SubtaskRepository;
pub use subtask_service::SubtaskService;
