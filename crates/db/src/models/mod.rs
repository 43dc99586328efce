//! Domain model structs and DTOs.
//!
//! The comment module contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the create and update payloads
//! - Plain structs for repository-only inputs (imports)
//! - The shaped reply tree returned by read endpoints

pub mod comment;
