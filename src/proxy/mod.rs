// src/proxy/mod.rs
mod forwarder;

pub use forwarder::{Forwarder, ProxiedResponse, ProxyError};
