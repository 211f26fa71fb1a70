//! # Assistant Gateway
//!
//! One chat contract over several LLM backends, with retrieval
//! augmentation from a site's own content.
//!
//! A message goes through the lexical retrieval pipeline in
//! [`assistant_gateway_core`], has the best-matching site content
//! prepended, and is sent to whichever provider the gateway selects.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────┐   ┌────────────────┐
//! │  Content    │──▶│ Index → Search → RAG │──▶│   Assistant    │
//! │ JSON / dir  │   │   (core crate)       │   │  send_message  │
//! └─────────────┘   └──────────────────────┘   └───────┬────────┘
//!                                                      │
//!                                          ┌───────────┴──────────┐
//!                                          ▼                      ▼
//!                                   ┌─────────────┐        ┌─────────────┐
//!                                   │   Gateway   │───────▶│  Providers  │
//!                                   │  selection  │        │ Groq / Open │
//!                                   └─────────────┘        │ Router / RP │
//!                                                          └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! agw providers                         # who has credentials?
//! agw search "refund policy"            # rank site content
//! agw send "Can I return an item?"      # augmented chat
//! agw serve                             # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`env`] | Credential and model lookup |
//! | [`content`] | Content snapshot loading (JSON, directory) |
//! | [`provider`] | Provider trait, adapters, HTTP transport |
//! | [`gateway`] | Provider registry and active-provider selection |
//! | [`assistant`] | Orchestrator used by the CLI and server |
//! | [`commands`] | CLI output |
//! | [`server`] | JSON HTTP API |

pub mod assistant;
pub mod commands;
pub mod config;
pub mod content;
pub mod env;
pub mod gateway;
pub mod provider;
pub mod server;
