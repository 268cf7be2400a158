//! # Skill Harness
//!
//! A local skill repository manager for AI assistants.
//!
//! Skills are markdown files kept in a git repository (or a local
//! directory). Skill Harness syncs that repository into a cache, indexes
//! the skills' frontmatter, and narrows the index to a short candidate list
//! for a free-text query, so that a downstream assistant only has to rank a
//! couple of dozen skills instead of hundreds. Feedback on loaded skills is
//! remembered and lifts the same skills for similar queries later.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────┐   ┌────────────┐   ┌────────────┐
//! │    Sync    │──▶│  Index   │──▶│ Pre-filter │──▶│   Prompt   │
//! │ git/local  │   │ frontmat │   │  (core)    │   │ / inject   │
//! └────────────┘   └──────────┘   └─────▲──────┘   └─────┬──────┘
//!                                       │                │
//!                                 ┌─────┴──────┐         │
//!                                 │   Usage    │◀────────┘
//!                                 │  learner   │  load / feedback
//!                                 └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! skills config https://github.com/acme/skills   # point at a repository
//! skills sync                                     # clone + index
//! skills load "react hooks with typescript"       # candidate prompt
//! skills inject --query "react hooks" react-hooks # load a skill
//! skills feedback react-hooks useful              # teach the ranking
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration |
//! | [`sync`] | Repository clone/update or local copy |
//! | [`parser`] | Skill frontmatter parsing |
//! | [`index`] | Skill discovery and the index snapshot |
//! | [`usage_store`] | JSON usage store and reports |
//! | [`loader`] | Skill body loading and rendering |
//! | [`prompt`] | Candidate prompt for the ranking step |
//! | [`persist`] | Atomic JSON writes |
//! | [`commands`] | CLI command handlers |
//!
//! The pure algorithms (tokenizer, scorer, pre-filter, usage learner) live
//! in the `skill-harness-core` crate.

pub mod commands;
pub mod config;
pub mod index;
pub mod loader;
pub mod parser;
pub mod persist;
pub mod prompt;
pub mod sync;
pub mod usage_store;
