pub mod kv_repo;
pub mod repository;
pub mod sqlite;
