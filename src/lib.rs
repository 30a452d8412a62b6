// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Rx Portal - Prescription Ordering Service
//!
//! Identity and access control for the prescription-ordering portal:
//! password login, cookie sessions for the web UI, signed bearer tokens for
//! the REST API and role-based authorization in front of both.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers (Axum), web and REST surfaces
//! - `auth` - Credentials, sessions, tokens and the authorization gate
//! - `store` - User accounts
//! - `config` - Environment configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
