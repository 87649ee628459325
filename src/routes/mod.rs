//! Route modules for Chunkyard Server

pub mod download;
pub mod health;
pub mod upload;
