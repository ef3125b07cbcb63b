//! Barbershop Booking Service
//!
//! This library provides the scheduling engine and HTTP service behind a
//! barbershop booking platform: barbers publish weekly working hours,
//! customers book services into free slots, and appointments move through
//! a role-gated lifecycle.
//!
//! # Modules
//!
//! - `services::time_slots`: slot computation over weekly availability
//! - `services::booking`: validation of booking requests
//! - `services::lifecycle`: appointment status transition rules
//! - `services::database`: CSV persistence with atomic check-and-insert
//! - `auth`: signed actor headers issued by the gateway
//! - `client`: outgoing appointment notifications
//!
//! # Authentication
//!
//! Requests carry the caller identity in `X-Actor-Id` and `X-Actor-Role`
//! headers. When a gateway secret is configured, those headers must be
//! signed with HMAC-SHA256, following the same scheme used to sign
//! outgoing notifications.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;


// Re-export the main API types for ease of use
pub use client::{NotificationClient, Notifier};
pub use config::Config;
pub use error::{AppError, SchedulingError};
pub use handlers::api::AppState;
pub use routes::create_router;
