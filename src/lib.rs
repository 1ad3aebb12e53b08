//! # Simple Folio
//!
//! A minimal static blog generator. A directory of markdown files with YAML
//! frontmatter becomes a site of post pages plus a home listing and one
//! listing per category and per tag.
//!
//! # Architecture: One Pass, Five Stages
//!
//! Every build runs the whole pipeline from scratch. Nothing is cached
//! between builds, so the output is a pure function of the content, the
//! config and the templates:
//!
//! ```text
//! 1. Load      content/posts/*.md  →  SourceDocument   (split frontmatter / body)
//! 2. Model     SourceDocument      →  PostRecord       (validate, render markdown)
//! 3. Index     [PostRecord]        →  SiteIndex        (listing order, label buckets)
//! 4. Render    SiteIndex           →  RenderedPage     (templates + maud fragments)
//! 5. Write     RenderedPage        →  dist/            (staged, committed at once)
//! ```
//!
//! Content comes in through [`source::ContentSource`] and goes out through
//! [`sink::OutputSink`], so every stage in between is testable without
//! touching the filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Build orchestration, stage tracking, `build_site` / `check_site` |
//! | [`source`] | Content boundary: directory walker and in-memory source |
//! | [`load`] | Stage 1: frontmatter delimiter handling |
//! | [`model`] | Stage 2: frontmatter validation into [`model::PostRecord`] |
//! | [`naming`] | `YYYY-MM-DD-slug` filename convention and slugs |
//! | [`markdown`] | Markdown to HTML and reading time |
//! | [`index`] | Stage 3: listing order, category and tag buckets |
//! | [`render`] | Stage 4: page templates and HTML components |
//! | [`sink`] | Stage 5: staged directory output and in-memory output |
//! | [`config`] | `config.toml` loading, validation, defaults and CSS generation |
//! | [`logging`] | `tracing` subscriber setup for the CLI |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Validate Everything Before Writing Anything
//!
//! A malformed post, a duplicate slug or a broken template fails the build
//! before a single file is written, and the output directory is swapped in
//! only after every page has been written to staging. A failed build always
//! leaves the previous site exactly as it was.
//!
//! ## Stable Order Everywhere
//!
//! Listings sort by pinned, then date, then slug, and label buckets are
//! ordered maps. Rebuilding unchanged content produces byte-identical output.
//!
//! ## Maud For Fragments, Placeholders For Pages
//!
//! Page-level HTML lives in two small template files that a site can
//! override; everything inside a page is built with
//! [Maud](https://maud.lambda.xyz/), so frontmatter text is escaped exactly
//! once.

pub mod config;
pub mod index;
pub mod load;
pub mod logging;
pub mod markdown;
pub mod model;
pub mod naming;
pub mod output;
pub mod render;
pub mod sink;
pub mod site;
pub mod source;

#[cfg(test)]
pub(crate) mod test_helpers;
