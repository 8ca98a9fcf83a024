pub mod jwt;

pub mod auth_dto;
pub mod auth_handlers;
pub mod auth_service;
pub mod routes;

pub use auth_service::AuthService;
