pub mod health;
pub mod project;
pub mod repository;
