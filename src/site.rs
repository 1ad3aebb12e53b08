//! Site assembly: one build from content source to committed output.
//!
//! A build walks a fixed sequence of stages and never goes back:
//!
//! ```text
//! Idle → Loading → Modeling → Indexing → Rendering → Writing → Done
//!                                                         ↘ Failed (from any stage)
//! ```
//!
//! | Stage | Work |
//! |-------|------|
//! | Loading | list sources, split frontmatter from body |
//! | Modeling | validate frontmatter into [`PostRecord`]s, enforce unique slugs |
//! | Indexing | drop drafts (unless enabled), build the global listing and label buckets |
//! | Rendering | resolve templates, assign listing paths, render every page in memory |
//! | Writing | hand pages to the [`OutputSink`] and commit |
//!
//! Every page is rendered before the first byte is written, so a failure in
//! any stage up to and including rendering leaves the output untouched. The
//! sink makes the write stage itself all-or-nothing.

use crate::config::SiteConfig;
use crate::index::{LabelIndex, SiteIndex};
use crate::load::{self, LoadError};
use crate::model::{self, ModelError, PostRecord};
use crate::render::{Filter, LabelSlugs, ListingView, RenderError, RenderedPage, Renderer, Templates};
use crate::sink::{DirectorySink, OutputSink};
use crate::source::{ContentSource, DirectorySource};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where a build is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Loading,
    Modeling,
    Indexing,
    Rendering,
    Writing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Modeling => "modeling",
            Self::Indexing => "indexing",
            Self::Rendering => "rendering",
            Self::Writing => "writing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum SiteError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Output {} would replace content directory {}", output.display(), content.display())]
    OutputContainsContent { output: PathBuf, content: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A failed build: the stage that was running and what went wrong.
#[derive(Error, Debug)]
#[error("Build failed while {stage}: {source}")]
pub struct BuildError {
    pub stage: Stage,
    #[source]
    pub source: SiteError,
}

/// Where page templates come from.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// Templates compiled into the binary.
    Builtin,
    /// Built-ins, overridden per file by `<dir>/post.html` and
    /// `<dir>/listing.html`.
    Directory(PathBuf),
    /// Already parsed.
    Parsed(Templates),
}

impl TemplateSource {
    fn resolve(&self) -> Result<Templates, RenderError> {
        match self {
            Self::Builtin => Templates::builtin(),
            Self::Directory(dir) => Templates::load(dir),
            Self::Parsed(templates) => Ok(templates.clone()),
        }
    }
}

/// One category or tag and its listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSummary {
    pub label: String,
    pub posts: usize,
    /// Listing directory relative to the output root, e.g. `tags/rust/`.
    pub dir: String,
}

/// Posts and labels of one site, in listing order.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub posts: Vec<PostRecord>,
    /// Categories by label.
    pub categories: Vec<LabelSummary>,
    /// Tags by label.
    pub tags: Vec<LabelSummary>,
    /// Draft posts left out of this build.
    pub drafts_skipped: usize,
}

impl Inventory {
    fn from_index(index: &SiteIndex<'_>, slugs: &LabelSlugs, drafts_skipped: usize) -> Self {
        Self {
            posts: index.all.iter().map(|&post| post.clone()).collect(),
            categories: summarize(&index.categories, slugs, Filter::Category),
            tags: summarize(&index.tags, slugs, Filter::Tag),
            drafts_skipped,
        }
    }
}

fn summarize(
    labels: &LabelIndex<'_>,
    slugs: &LabelSlugs,
    filter: fn(String) -> Filter,
) -> Vec<LabelSummary> {
    labels
        .iter()
        .map(|(label, bucket)| LabelSummary {
            label: label.clone(),
            posts: bucket.len(),
            dir: slugs.listing_dir(Some(&filter(label.clone()))),
        })
        .collect()
}

/// Result of a committed build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub inventory: Inventory,
    /// Every written file, relative to the output root, in write order.
    pub pages: Vec<PathBuf>,
}

/// One page to render.
enum PageJob<'a> {
    Post(&'a PostRecord),
    Listing(ListingView<'a>),
}

impl PageJob<'_> {
    fn render(&self, renderer: &Renderer<'_>) -> Result<RenderedPage, RenderError> {
        match self {
            Self::Post(post) => renderer.render_post(post),
            Self::Listing(view) => renderer.render_listing(view),
        }
    }
}

/// One build of one site. Holds configuration only; content and output are
/// passed to [`SiteBuilder::build`].
pub struct SiteBuilder<'c> {
    config: &'c SiteConfig,
    templates: TemplateSource,
    stage: Stage,
}

impl<'c> SiteBuilder<'c> {
    pub fn new(config: &'c SiteConfig) -> Self {
        Self {
            config,
            templates: TemplateSource::Builtin,
            stage: Stage::Idle,
        }
    }

    pub fn with_templates(mut self, templates: TemplateSource) -> Self {
        self.templates = templates;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        tracing::info!(%stage, "entering stage");
        self.stage = stage;
    }

    fn fail(&mut self, source: impl Into<SiteError>) -> BuildError {
        let stage = self.stage;
        self.stage = Stage::Failed;
        let error = BuildError {
            stage,
            source: source.into(),
        };
        tracing::debug!(%stage, error = %error.source, "build failed");
        error
    }

    /// Load, model and index without rendering or writing anything.
    pub fn check(&mut self, source: &dyn ContentSource) -> Result<Inventory, BuildError> {
        let (posts, drafts_skipped) = self.read_posts(source)?;
        self.enter(Stage::Indexing);
        let index = SiteIndex::build(&posts);
        let inventory = Inventory::from_index(&index, &LabelSlugs::build(&index), drafts_skipped);
        self.enter(Stage::Done);
        Ok(inventory)
    }

    /// Run every stage and commit the result to `sink`.
    ///
    /// On error, nothing has been committed.
    pub fn build(
        &mut self,
        source: &dyn ContentSource,
        sink: &mut dyn OutputSink,
    ) -> Result<BuildReport, BuildError> {
        let (posts, drafts_skipped) = self.read_posts(source)?;

        self.enter(Stage::Indexing);
        let index = SiteIndex::build(&posts);
        tracing::info!(
            posts = index.all.len(),
            categories = index.categories.len(),
            tags = index.tags.len(),
            "indexed"
        );

        self.enter(Stage::Rendering);
        let templates = self.templates.resolve().map_err(|e| self.fail(e))?;
        let renderer = Renderer::new(self.config, templates, &index);
        let jobs = page_jobs(&index);

        // Ordered collect so the reported error is the first page in job
        // order, not whichever worker finished first.
        let rendered: Vec<Result<RenderedPage, RenderError>> =
            jobs.par_iter().map(|job| job.render(&renderer)).collect();
        let pages = rendered
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.fail(e))?;

        self.enter(Stage::Writing);
        for page in &pages {
            sink.write_output(&page.output_path, page.html.as_bytes())
                .map_err(|e| self.fail(e))?;
        }
        sink.commit().map_err(|e| self.fail(e))?;
        tracing::info!(pages = pages.len(), "committed");

        let report = BuildReport {
            inventory: Inventory::from_index(&index, renderer.label_slugs(), drafts_skipped),
            pages: pages.into_iter().map(|page| page.output_path).collect(),
        };
        self.enter(Stage::Done);
        Ok(report)
    }

    /// Loading and Modeling, plus the draft filter. Returns the posts that
    /// will be published and the number of drafts left out.
    fn read_posts(
        &mut self,
        source: &dyn ContentSource,
    ) -> Result<(Vec<PostRecord>, usize), BuildError> {
        self.enter(Stage::Loading);
        let sources = source.list_sources().map_err(|e| self.fail(e))?;
        tracing::info!(files = sources.len(), "listed sources");
        let docs = load::load_all(&sources).map_err(|e| self.fail(e))?;

        self.enter(Stage::Modeling);
        // Drafts take part in slug validation so publishing one can never
        // introduce a duplicate.
        let posts = model::build_posts(&docs).map_err(|e| self.fail(e))?;

        let include_drafts = self.config.posts.include_drafts;
        let total = posts.len();
        let published: Vec<PostRecord> = posts
            .into_iter()
            .filter(|post| include_drafts || !post.draft)
            .collect();
        let drafts_skipped = total - published.len();
        if drafts_skipped > 0 {
            tracing::info!(drafts = drafts_skipped, "skipping drafts");
        }
        Ok((published, drafts_skipped))
    }
}

/// Every page of the site: posts in listing order, then the home listing,
/// then category and tag listings by label.
fn page_jobs<'a>(index: &SiteIndex<'a>) -> Vec<PageJob<'a>> {
    let mut jobs: Vec<PageJob<'a>> = index.all.iter().map(|&post| PageJob::Post(post)).collect();
    jobs.push(PageJob::Listing(ListingView::home(index)));
    for (label, bucket) in &index.categories {
        jobs.push(PageJob::Listing(ListingView::category(label, bucket)));
    }
    for (label, bucket) in &index.tags {
        jobs.push(PageJob::Listing(ListingView::tag(label, bucket)));
    }
    jobs
}

/// Build the site under `root` into `output`.
///
/// Posts are read from `<root>/<posts.dir>` and template overrides from
/// `<root>/templates/`. A commit replaces `output` wholesale, so an output
/// directory that is or contains `root` is refused up front.
pub fn build_site(
    root: &Path,
    output: &Path,
    config: &SiteConfig,
) -> Result<BuildReport, BuildError> {
    check_output_target(root, output).map_err(|source| BuildError {
        stage: Stage::Idle,
        source,
    })?;
    let source = DirectorySource::new(root, &config.posts.dir);
    let mut sink = DirectorySink::new(output).map_err(|e| BuildError {
        stage: Stage::Idle,
        source: e.into(),
    })?;
    SiteBuilder::new(config)
        .with_templates(TemplateSource::Directory(root.join("templates")))
        .build(&source, &mut sink)
}

fn check_output_target(root: &Path, output: &Path) -> Result<(), SiteError> {
    let content = absolute(root)?;
    let target = absolute(output)?;
    if content.starts_with(&target) {
        return Err(SiteError::OutputContainsContent {
            output: output.to_path_buf(),
            content: root.to_path_buf(),
        });
    }
    Ok(())
}

/// `path` made absolute with symlinks resolved as far as it exists; the
/// output directory usually does not exist yet.
fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    let path = std::path::absolute(path)?;
    let mut existing = path.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(path.clone()),
        }
    }
    let mut resolved = existing.canonicalize()?;
    resolved.extend(rest.iter().rev());
    Ok(resolved)
}

/// Validate the site under `root` without writing anything.
pub fn check_site(root: &Path, config: &SiteConfig) -> Result<Inventory, BuildError> {
    let source = DirectorySource::new(root, &config.posts.dir);
    SiteBuilder::new(config).check(&source)
}

// ============================================================================
// Tests
// ============================================================================
