//! # nutrilog
//!
//! A local-first food diary. Free-text meal descriptions are turned into
//! nutrition entries by a configurable extractor, persisted in SQLite, and
//! summarised per day and per period.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌──────────┐
//! │ "2 eggs &  │──▶│  Extractor   │──▶│  SQLite   │
//! │   toast"   │   │ tag/kw/model │   │  Store    │
//! └────────────┘   └─────────────┘   └────┬─────┘
//!                                         │
//!                                         ▼
//!                                  ┌─────────────┐
//!                                  │ Aggregation │──▶ day / history / export
//!                                  └─────────────┘
//! ```
//!
//! The engine (value types, `Store` trait, offline extractors, aggregation)
//! lives in `nutrilog-core`. This crate adds the native pieces.
//!
//! ## Quick Start
//!
//! ```bash
//! nutrilog init
//! nutrilog log "2 eggs and toast for breakfast"
//! nutrilog day
//! nutrilog history --period week
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite-backed `Store` |
//! | [`extractor`] | Extractor factory and the model-backed strategy |
//! | [`log_cmd`] | Text → entries pipeline |
//! | [`report`] | Day and history views |
//! | [`entry_cmd`] | Editing and deleting entries |
//! | [`export`] | JSON export |
//! | [`args`] | Date and time argument parsing |
//! | [`logging`] | Tracing subscriber setup |

pub mod args;
pub mod config;
pub mod db;
pub mod entry_cmd;
pub mod export;
pub mod extractor;
pub mod log_cmd;
pub mod logging;
pub mod migrate;
pub mod report;
pub mod sqlite_store;
