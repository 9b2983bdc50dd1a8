//! vitals-assistant-server library
//!
//! This crate provides the request pipeline behind the assistant server:
//! - Line framing and request decoding for the device protocol
//! - Message classification and the deterministic math fast path
//! - Prompt construction and the generation backend adapter
//! - The sequential TCP listener

pub mod backend;
pub mod classifier;
pub mod config;
pub mod error;
pub mod generation;
pub mod math;
pub mod resolver;
pub mod server;
pub mod transport;
