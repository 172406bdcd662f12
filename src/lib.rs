//! Doctruyen - a small Vietnamese web fiction site
//!
//! This library provides the core functionality for the doctruyen site:
//! server-rendered story listings, multi-part reading pages, keyword
//! search, genre management, and a shared-secret upload surface.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod view;
