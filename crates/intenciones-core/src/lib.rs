//! Core types and trait definitions for the parish intention service.
//!
//! This crate is deliberately free of HTTP, database and rendering
//! dependencies. Every other crate in the workspace depends on it.

// Native `async fn` in traits; the store trait spells out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod category;
pub mod error;
pub mod intention;
pub mod mass;
pub mod phrase;
pub mod setting;
pub mod store;
pub mod user;

pub use error::{Entity, Error, Result};
