//! Worklens - Conversational assistant core for work-item tracking.
//!
//! This crate routes free-text queries ("how many hours did Alice work this
//! week?") to specialized intent handlers that extract structured parameters
//! and execute them against an external work-item tracker.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
