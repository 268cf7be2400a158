//! # Skill Harness Core
//!
//! I/O-free logic for Skill Harness: skill and usage models, keyword
//! extraction, scoring, the candidate pre-filter, and usage learning.
//!
//! This crate does no filesystem, git, or process work. Usage persistence is
//! reached through the [`usage::UsageBackend`] trait, which the application
//! implements over its JSON file.
//!
//! ## Pipeline
//!
//! ```text
//! query ──▶ keywords ──▶ score (per skill, + learned scenarios) ──▶ prefilter ──▶ candidates
//!                                        ▲                                          │
//!                                        └──────── usage (feedback) ◀───────────────┘
//! ```

pub mod keywords;
pub mod models;
pub mod prefilter;
pub mod score;
pub mod usage;
