pub mod routes;
pub mod template_dto;
pub mod template_handlers;
pub mod template_models;
pub mod template_repository;
pub mod template_service;

pub use template_models::Template;
pub use template_repository::TemplateRepository;
pub use template_service::TemplateService;
