//! Banyuanyar - content management back end for the Desa Banyuanyar website
//!
//! This library provides the JSON API consumed by the village landing pages
//! and the admin back-office: village profile, news, events, tourism, UMKM,
//! galleries, potentials, achievements and site settings.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
