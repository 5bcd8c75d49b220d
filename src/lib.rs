// bKash Gateway - tokenized checkout client library

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod payment;
pub mod routes;
pub mod webhook;
