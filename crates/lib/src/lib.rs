//! mrmsbuild-lib: orchestration core for the MRMS distribution builder
//!
//! This crate provides the pieces the `mrmsbuild` binary wires together:
//! - `config`: the question store that resolves, remembers and replays answers
//! - `flags`: compiler-define maps and their merge/render rules
//! - `builders`: the build groups (third party, WDSS2, Hydro, WG2) and units
//! - `driver`: the sequential build pipeline with its requirement gate

pub mod builders;
pub mod config;
pub mod consts;
pub mod driver;
pub mod exec;
pub mod flags;
pub mod manifest;
pub mod platform;
pub mod target;
pub mod vcs;
