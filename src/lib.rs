//! Packsmith - content pack builder
//!
//! Classifies the files of a content repository's `Packs/` tree, folds item
//! sidecars into unified documents, specializes them for a target
//! marketplace and writes deterministic pack zips. The pipeline runs packs
//! in parallel and reports every failure on a shared diagnostic channel.

pub mod assembler;
pub mod classifier;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod document;
pub mod domain;
pub mod error;
pub mod hash;
pub mod loader;
pub mod pool;
pub mod progress;
pub mod specializer;
pub mod unifier;
pub mod zipper;

pub use error::{PackError, Result};
