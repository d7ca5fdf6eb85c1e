//! cargaboard: dashboard tier for an EV-charging monitoring backend.
//!
//! Talks to the statistics API (`/api/stats/*`), renders each dashboard
//! page into a [`pages::Document`] with SVG charts, and serves or prints it.

pub mod api;
pub mod auth;
pub mod charts;
pub mod cli;
pub mod co2;
pub mod config;
pub mod diagnostics;
pub mod pages;
pub mod web;
