/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh)
/// - `organizations`: Organization and membership management
/// - `tasks`: Organization-scoped task CRUD

pub mod auth;
pub mod health;
pub mod organizations;
pub mod tasks;
