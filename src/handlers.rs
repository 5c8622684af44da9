// src/handlers.rs

pub mod auth;
pub mod locations;
pub mod notifications;
pub mod proposals;
pub mod sla;
pub mod third_party;
pub mod work_orders;
