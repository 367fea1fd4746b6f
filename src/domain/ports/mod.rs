pub mod semantic_provider;
pub mod ticket_repository;
