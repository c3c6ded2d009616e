//! # minwiki-render
//!
//! Template rendering library for minwiki.
//!
//! This crate turns a resolved [`minwiki_core::Corpus`] into HTML pages using
//! Askama templates and hands them to an [`OutputSink`].

pub mod render;
pub mod templates;

pub use render::{render, DirSink, MemorySink, OutputSink, RenderError, RenderSummary};
pub use templates::{BacklinkEntry, IndexTemplate, PostEntry, PostTemplate};
