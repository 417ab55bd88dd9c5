//! A Rust library for collecting project resources, resolving import/remap rules,
//! running export plugins, and emitting a PCK or ZIP archive.
#![cfg_attr(any(docsrs, feature = "unstable"), feature(doc_cfg))]
pub mod args;
pub mod diagnostics;
pub mod driver;
pub mod ext;
pub mod filter;
pub mod keys;
pub mod pack;
pub mod pad;
pub mod plugin;
pub mod preset;
pub mod remap;
pub mod types;
pub mod utils;
pub mod walker;
