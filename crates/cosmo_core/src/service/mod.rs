//! Use-case services built on top of the unit of work.
//!
//! # Responsibility
//! - Provide caller-facing entry points that set audit metadata.
//! - Keep storage details behind `UnitOfWork` and the repositories.

pub mod catalog_service;
