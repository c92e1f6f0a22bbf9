//! Quire - a distributed issue tracker.
//!
//! A project is described by a YAML file holding its components and
//! releases, and each issue lives in its own YAML file next to it. The files
//! are meant to be committed with the code they describe.
//!
//! The entity graph lives in [`domain`]; [`storage`] reads and writes it,
//! and the `quire` binary drives both through [`cli`].

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod config;
pub mod domain;
pub mod error;
pub mod id_generation;
pub mod storage;

// Public CLI modules (needed by binary)
pub mod app;
pub mod cli;
pub mod output;

// Command implementations
pub mod commands;
