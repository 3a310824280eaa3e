//! Suspend-safe fan control for ASUS Zenbook laptops.
//!
//! A [`controller::CoolingDevice`] arbitrates between the firmware's own fan
//! curve and an explicitly requested speed, and hands the fan back to the
//! firmware across suspend, resume and shutdown.

pub mod config;
pub mod controller;
pub mod errors;
pub mod fan;
pub mod firmware;
pub mod platform;
pub mod power;
pub mod session;
