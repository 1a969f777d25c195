//! # EcoQuest Core - Progression & Rewards Engine
//!
//! EcoQuest is a sustainability learning app for kids: narrated stories, quizzes,
//! mini-games, and a virtual garden economy. This crate implements the engineered
//! core behind all of that: the rules that turn a completed activity into XP,
//! EcoCoins, levels, and achievements, and the plumbing that keeps that state in
//! sync between the remote EcoQuest service and a local fallback store.
//!
//! ## Features
//!
//! - **Reward Engine**: Pure functions converting completed lessons, stories,
//!   challenges, and mini-game sessions into XP/currency/level deltas.
//! - **Profile Store**: Sled-backed user profiles with Argon2id password hashing
//!   and snapshot-isolated reads.
//! - **Remote Sync Adapter**: Tries the remote service first and transparently
//!   falls back to the local store when it is unreachable; a rejected session
//!   (401) always propagates and never falls back.
//! - **Achievement Evaluator**: Stateless predicates over the profile snapshot;
//!   unlocked achievements are never revoked.
//! - **Session Controller**: Holds the single active profile and emits explicit
//!   `LeveledUp` / `AchievementUnlocked` events on every update.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ecoquest::config::Config;
//! use ecoquest::engine::session::Session;
//! use ecoquest::engine::store::ProfileStore;
//! use ecoquest::remote::{sync::SyncAdapter, RemoteClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = ProfileStore::open(&config.app.data_dir)?;
//!     let remote = RemoteClient::new(&config.remote);
//!     let adapter = SyncAdapter::new(remote, store);
//!     let mut session = Session::new(adapter);
//!
//!     let update = session.signup("luna", "wildflowers", "🌱").await?;
//!     println!("welcome {} ({:?})", update.profile.username, update.source);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - Reward rules, profile store, achievements, session controller
//! - [`remote`] - Remote service client and the remote-or-local sync adapter
//! - [`config`] - Configuration management and validation
//! - [`validation`] - Username/password/avatar validation rules

pub mod config;
pub mod engine;
pub mod remote;
pub mod validation;

pub use engine::errors::EcoQuestError;
pub use engine::types::{ActivityKind, GardenEntry, GardenItem, Profile};
