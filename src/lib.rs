//! Tiersync - keeps Supabase subscription state in sync with billing events
//!
//! This library receives LemonSqueezy webhooks, maps billing products onto
//! subscription tiers, and writes the resulting user and subscription rows
//! to Supabase. It also imports user profiles from the Clerk directory.

pub mod config;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod models;
pub mod payments;
pub mod store;
pub mod sync;
