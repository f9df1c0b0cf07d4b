// src/lib.rs

pub mod api;
pub mod common;
pub mod config;
pub mod gateway;
pub mod middleware;
pub mod models;
pub mod services;
