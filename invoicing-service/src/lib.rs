//! Invoicing service: invoice lifecycle over PostgreSQL.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
