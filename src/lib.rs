//! Virtual dress try-on relay
//!
//! This library accepts a customer photo and a dress choice, runs the try-on
//! through the Deep-Image API, optionally watermarks the result, records the
//! customer's contact and relays the image to an administrator on Telegram.

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
