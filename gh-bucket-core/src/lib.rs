#![doc = "gh-bucket-core: core logic library for gh-bucket."]

//! This crate contains the backup pipeline: entity parsing, repository listing,
//! cloning and archiving, the object store contract and the job orchestrator.
//! Cloud SDK clients are not included here; they live in the `gh-bucket` binary crate.
//!
//! # Usage
//! Build a [`config::JobSettings`], pick implementations of the [`contract`] traits and
//! call [`job::run_job`].

pub mod archive;
pub mod config;
pub mod contract;
pub mod entity;
pub mod error;
pub mod job;
pub mod list;
pub mod publish;
