// src/lib.rs

pub mod app;
pub mod common;
pub mod config;
pub mod fallball;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod oa;
pub mod services;
