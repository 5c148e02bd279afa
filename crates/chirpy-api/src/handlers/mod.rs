//! API handlers

pub mod admin;
pub mod auth;
pub mod chirps;
pub mod health;
pub mod polka;
