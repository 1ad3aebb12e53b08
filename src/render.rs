//! HTML rendering.
//!
//! Pages are produced by filling a page template with fields. Templates are
//! plain HTML with `{{ field }}` placeholders; the built-in ones live in
//! `templates/` and are embedded at compile time, and a site can replace
//! either one by dropping a file of the same name into `content/templates/`.
//!
//! Every field value is HTML built with [maud](https://maud.lambda.xyz/), so
//! text from frontmatter is escaped exactly once no matter which template
//! consumes it. The post body is the only fragment that is not generated
//! here: it comes from the markdown renderer.
//!
//! ## Template selection
//!
//! | Page | Template | Fields |
//! |------|----------|--------|
//! | post detail | `post.html` | `lang` `site_title` `page_title` `css` `nav` `title` `date` `date_iso` `author` `category` `tags` `description` `reading_time` `body` `footer` |
//! | home, category, tag | `listing.html` | `lang` `site_title` `page_title` `css` `nav` `heading` `description` `filter` `post_count` `posts` `footer` |
//!
//! A placeholder naming any other field is a build error, never an empty
//! string.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                     # Home listing (all posts)
//! ├── 2024/12/05/hello/index.html    # Post detail
//! ├── categories/engineering/index.html
//! └── tags/rust/index.html
//! ```

use crate::config::{self, SiteConfig};
use crate::index::SiteIndex;
use crate::model::PostRecord;
use crate::naming::slugify;
use maud::{Markup, PreEscaped, html};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CSS_STATIC: &str = include_str!("../static/style.css");
const POST_TEMPLATE: &str = include_str!("../templates/post.html");
const LISTING_TEMPLATE: &str = include_str!("../templates/listing.html");

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template `{template}` references field `{field}`, which this page does not supply")]
    TemplateFieldMissing {
        template: &'static str,
        field: String,
    },
    #[error("Template `{template}` is invalid: {reason}")]
    TemplateSyntax {
        template: &'static str,
        reason: String,
    },
    #[error("Cannot read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Which template a page is rendered with. The mapping is fixed: post
/// detail pages use [`TemplateKind::Post`], everything else
/// [`TemplateKind::Listing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Post,
    Listing,
}

impl TemplateKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Listing => "listing",
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Post => "post.html",
            Self::Listing => "listing.html",
        }
    }

    const fn builtin_source(self) -> &'static str {
        match self {
            Self::Post => POST_TEMPLATE,
            Self::Listing => LISTING_TEMPLATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed page template.
#[derive(Debug, Clone)]
pub struct Template {
    kind: TemplateKind,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template text. Placeholders are `{{ name }}` where `name` is
    /// made of lowercase letters, digits and underscores.
    pub fn parse(kind: TemplateKind, text: &str) -> Result<Self, RenderError> {
        let syntax = |reason: String| RenderError::TemplateSyntax {
            template: kind.name(),
            reason,
        };

        let mut segments = Vec::new();
        let mut rest = text;
        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after_open = &rest[open + 2..];
            let close = after_open
                .find("}}")
                .ok_or_else(|| syntax("unterminated `{{`".to_string()))?;
            let name = after_open[..close].trim();
            if name.is_empty() {
                return Err(syntax("empty placeholder `{{ }}`".to_string()));
            }
            if !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            {
                return Err(syntax(format!("invalid placeholder name `{name}`")));
            }
            segments.push(Segment::Field(name.to_string()));
            rest = &after_open[close + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Ok(Self { kind, segments })
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Field names referenced by this template, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder from `fields`.
    pub fn fill(&self, fields: &Fields) -> Result<String, RenderError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    let value =
                        fields
                            .get(name.as_str())
                            .ok_or_else(|| RenderError::TemplateFieldMissing {
                                template: self.kind.name(),
                                field: name.clone(),
                            })?;
                    out.push_str(&value.0);
                }
            }
        }
        Ok(out)
    }
}

/// Field values for one page, already rendered to HTML.
pub type Fields = BTreeMap<&'static str, Markup>;

/// The post and listing templates used by one build.
#[derive(Debug, Clone)]
pub struct Templates {
    pub post: Template,
    pub listing: Template,
}

impl Templates {
    /// The templates compiled into the binary.
    pub fn builtin() -> Result<Self, RenderError> {
        Ok(Self {
            post: Template::parse(TemplateKind::Post, TemplateKind::Post.builtin_source())?,
            listing: Template::parse(
                TemplateKind::Listing,
                TemplateKind::Listing.builtin_source(),
            )?,
        })
    }

    /// Built-in templates, each replaced by `<dir>/<name>.html` when present.
    pub fn load(dir: &Path) -> Result<Self, RenderError> {
        Ok(Self {
            post: load_template(dir, TemplateKind::Post)?,
            listing: load_template(dir, TemplateKind::Listing)?,
        })
    }

    fn for_kind(&self, kind: TemplateKind) -> &Template {
        match kind {
            TemplateKind::Post => &self.post,
            TemplateKind::Listing => &self.listing,
        }
    }
}

fn load_template(dir: &Path, kind: TemplateKind) -> Result<Template, RenderError> {
    let path = dir.join(kind.file_name());
    if !path.is_file() {
        return Template::parse(kind, kind.builtin_source());
    }
    let text = fs::read_to_string(&path).map_err(|source| RenderError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "using template override");
    Template::parse(kind, &text)
}

/// Display-only marker for a filtered listing. Filtering itself already
/// happened in the index; this only drives headings and highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Category(String),
    Tag(String),
}

/// A read-only, already-ordered projection of posts for one listing page.
#[derive(Debug, Clone)]
pub struct ListingView<'a> {
    pub posts: Vec<&'a PostRecord>,
    pub filter: Option<Filter>,
}

impl<'a> ListingView<'a> {
    /// The home page: every post.
    pub fn home(index: &SiteIndex<'a>) -> Self {
        Self {
            posts: index.all.clone(),
            filter: None,
        }
    }

    pub fn category(label: &str, posts: &[&'a PostRecord]) -> Self {
        Self {
            posts: posts.to_vec(),
            filter: Some(Filter::Category(label.to_string())),
        }
    }

    pub fn tag(label: &str, posts: &[&'a PostRecord]) -> Self {
        Self {
            posts: posts.to_vec(),
            filter: Some(Filter::Tag(label.to_string())),
        }
    }

    /// Output file relative to the site root.
    pub fn output_path(&self, slugs: &LabelSlugs) -> PathBuf {
        PathBuf::from(slugs.listing_dir(self.filter.as_ref())).join("index.html")
    }
}

/// Path segment of every category and tag listing of one build.
///
/// Slugs are assigned per kind, in label order, with labels that already
/// are their own slug going first. A label whose slug is taken gets the
/// first free `-2`, `-3`, ... suffix, so two labels never share a page
/// (`rust` keeps `tags/rust/`, `Rust` gets `tags/rust-2/`).
#[derive(Debug, Clone, Default)]
pub struct LabelSlugs {
    categories: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
}

impl LabelSlugs {
    pub fn build(index: &SiteIndex<'_>) -> Self {
        Self {
            categories: assign_slugs(index.categories.keys()),
            tags: assign_slugs(index.tags.keys()),
        }
    }

    /// Directory of a listing relative to the site root, with trailing
    /// slash (empty for the home page).
    pub fn listing_dir(&self, filter: Option<&Filter>) -> String {
        match filter {
            None => String::new(),
            Some(Filter::Category(label)) => {
                format!("categories/{}/", lookup(&self.categories, label))
            }
            Some(Filter::Tag(label)) => format!("tags/{}/", lookup(&self.tags, label)),
        }
    }
}

fn lookup(slugs: &BTreeMap<String, String>, label: &str) -> String {
    slugs
        .get(label)
        .cloned()
        .unwrap_or_else(|| label_slug(label))
}

fn assign_slugs<'k>(labels: impl Iterator<Item = &'k String>) -> BTreeMap<String, String> {
    let mut ordered: Vec<(&String, String)> =
        labels.map(|label| (label, label_slug(label))).collect();
    // Stable sort: within each group the BTreeMap order is kept.
    ordered.sort_by_key(|(label, base)| label.as_str() != base.as_str());

    let mut taken = HashSet::new();
    let mut slugs = BTreeMap::new();
    for (label, base) in ordered {
        let mut slug = base.clone();
        let mut n = 2;
        while !taken.insert(slug.clone()) {
            slug = format!("{base}-{n}");
            n += 1;
        }
        slugs.insert(label.clone(), slug);
    }
    slugs
}

/// URL-safe form of a category or tag label.
///
/// Labels with no alphanumeric characters at all fall back to their
/// codepoints so that they still get a stable, non-empty path.
pub fn label_slug(label: &str) -> String {
    let slug = slugify(label);
    if !slug.is_empty() {
        return slug;
    }
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| format!("u{:x}", c as u32))
        .collect::<Vec<_>>()
        .join("-")
}

/// One finished output file.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// Path relative to the output root.
    pub output_path: PathBuf,
    pub html: String,
}

/// Renders pages for one build. Holds only immutable inputs, so a single
/// renderer can be shared across worker threads.
pub struct Renderer<'a> {
    config: &'a SiteConfig,
    templates: Templates,
    css: String,
    categories: Vec<&'a str>,
    slugs: LabelSlugs,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a SiteConfig, templates: Templates, index: &SiteIndex<'a>) -> Self {
        let css = format!(
            "{}\n\n{}\n\n{}",
            config::generate_color_css(&config.colors),
            config::generate_theme_css(&config.theme),
            CSS_STATIC
        );
        // Labels are borrowed from the records, not the index keys, so they
        // outlive the index itself.
        let categories = index
            .categories
            .values()
            .filter_map(|bucket| bucket.first().copied())
            .map(|post: &'a PostRecord| post.category.as_str())
            .collect();
        Self {
            config,
            templates,
            css,
            categories,
            slugs: LabelSlugs::build(index),
        }
    }

    /// Listing paths used for every link this renderer emits.
    pub fn label_slugs(&self) -> &LabelSlugs {
        &self.slugs
    }

    /// Render the detail page of one post.
    pub fn render_post(&self, post: &PostRecord) -> Result<RenderedPage, RenderError> {
        let mut fields = self.common_fields(&post.title, None);
        fields.insert("title", html! { (post.title) });
        fields.insert("date", html! { (format_date(post)) });
        fields.insert("date_iso", html! { (post.publish_date.format("%Y-%m-%d")) });
        fields.insert("author", self.byline(post));
        fields.insert("category", self.category_link(post));
        fields.insert("tags", self.tag_list(&post.tags, None));
        fields.insert("description", html! { (post.description) });
        fields.insert("reading_time", html! { (post.reading_minutes) " min read" });
        fields.insert("body", PreEscaped(post.body_html.clone()));

        self.fill(TemplateKind::Post, post.output_path(), &fields)
    }

    /// Render a listing page: home, one category or one tag.
    pub fn render_listing(&self, view: &ListingView<'_>) -> Result<RenderedPage, RenderError> {
        let heading = match &view.filter {
            None => self.config.site.title.clone(),
            Some(Filter::Category(label)) => label.clone(),
            Some(Filter::Tag(label)) => format!("#{label}"),
        };

        let mut fields = self.common_fields(&heading, view.filter.as_ref());
        fields.insert("heading", html! { (heading) });
        fields.insert("description", self.listing_description(view.filter.as_ref()));
        fields.insert("filter", self.filter_notice(view.filter.as_ref()));
        fields.insert("post_count", html! { (post_count(view.posts.len())) });
        fields.insert("posts", self.post_list(&view.posts, view.filter.as_ref()));

        self.fill(TemplateKind::Listing, view.output_path(&self.slugs), &fields)
    }

    fn fill(
        &self,
        kind: TemplateKind,
        output_path: PathBuf,
        fields: &Fields,
    ) -> Result<RenderedPage, RenderError> {
        let html = self.templates.for_kind(kind).fill(fields)?;
        tracing::debug!(page = %output_path.display(), template = kind.name(), "rendered");
        Ok(RenderedPage { output_path, html })
    }

    /// Fields shared by every page.
    fn common_fields(&self, page_heading: &str, current: Option<&Filter>) -> Fields {
        let site_title = &self.config.site.title;
        let page_title = if page_heading == site_title {
            site_title.clone()
        } else {
            format!("{page_heading} · {site_title}")
        };

        let mut fields = Fields::new();
        fields.insert("lang", html! { (self.config.site.language) });
        fields.insert("site_title", html! { (site_title) });
        fields.insert("page_title", html! { (page_title) });
        fields.insert("css", PreEscaped(self.css.clone()));
        fields.insert("nav", self.site_header(current));
        fields.insert("footer", self.footer());
        fields
    }

    fn url(&self, relative: &str) -> String {
        self.config.url_for(relative)
    }

    fn listing_url(&self, filter: Filter) -> String {
        self.url(&self.slugs.listing_dir(Some(&filter)))
    }

    // ========================================================================
    // HTML Components
    // ========================================================================

    /// Site title plus category navigation.
    fn site_header(&self, current: Option<&Filter>) -> Markup {
        let current_category = match current {
            Some(Filter::Category(label)) => Some(label.as_str()),
            _ => None,
        };
        html! {
            header.site-header {
                a.site-title href=(self.url("")) { (self.config.site.title) }
                nav.site-nav {
                    ul {
                        li class=[current.is_none().then_some("current")] {
                            a href=(self.url("")) { "All posts" }
                        }
                        @for label in &self.categories {
                            @let is_current = current_category == Some(*label);
                            li class=[is_current.then_some("current")] {
                                a href=(self.listing_url(Filter::Category(label.to_string()))) {
                                    (label)
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn footer(&self) -> Markup {
        html! {
            @if !self.config.site.footer.is_empty() {
                footer.site-footer { p { (self.config.site.footer) } }
            }
        }
    }

    fn byline(&self, post: &PostRecord) -> Markup {
        let author = if post.author.is_empty() {
            self.config.site.author.as_str()
        } else {
            post.author.as_str()
        };
        html! {
            @if !author.is_empty() {
                " · by " span.post-author { (author) }
            }
        }
    }

    fn category_link(&self, post: &PostRecord) -> Markup {
        html! {
            @if !post.category.is_empty() {
                " · "
                a.post-category href=(self.listing_url(Filter::Category(post.category.clone()))) {
                    (post.category)
                }
            }
        }
    }

    /// Tag chips; the chip matching an active tag filter is highlighted.
    fn tag_list(&self, tags: &[String], active: Option<&Filter>) -> Markup {
        let active_tag = match active {
            Some(Filter::Tag(label)) => Some(label.as_str()),
            _ => None,
        };
        html! {
            @if !tags.is_empty() {
                ul.tag-list {
                    @for tag in tags {
                        @let is_active = active_tag == Some(tag.as_str());
                        li class=[is_active.then_some("active")] {
                            a href=(self.listing_url(Filter::Tag(tag.clone()))) {
                                "#" (tag)
                            }
                        }
                    }
                }
            }
        }
    }

    fn listing_description(&self, filter: Option<&Filter>) -> Markup {
        html! {
            @if filter.is_none() && !self.config.site.description.is_empty() {
                p.site-description { (self.config.site.description) }
            }
        }
    }

    fn filter_notice(&self, filter: Option<&Filter>) -> Markup {
        html! {
            @match filter {
                Some(Filter::Category(label)) => {
                    p.filter {
                        "Posts in category " mark { (label) } " · "
                        a href=(self.url("")) { "Show all" }
                    }
                }
                Some(Filter::Tag(label)) => {
                    p.filter {
                        "Posts tagged " mark { (label) } " · "
                        a href=(self.url("")) { "Show all" }
                    }
                }
                None => {}
            }
        }
    }

    fn post_list(&self, posts: &[&PostRecord], filter: Option<&Filter>) -> Markup {
        html! {
            @if posts.is_empty() {
                p.empty-listing { "No posts yet." }
            } @else {
                ul.post-list {
                    @for post in posts {
                        li.post-item.pinned[post.pinned] {
                            article {
                                h2 {
                                    @if post.pinned {
                                        span.pinned-marker { "Pinned" }
                                    }
                                    a href=(self.url(&post.url_path())) { (post.title) }
                                }
                                p.post-meta {
                                    time datetime=(post.publish_date.format("%Y-%m-%d")) {
                                        (format_date(post))
                                    }
                                    (self.category_link(post))
                                }
                                @if !post.description.is_empty() {
                                    p.post-description { (post.description) }
                                }
                                (self.tag_list(&post.tags, filter))
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Human-readable publish date, e.g. `December 5, 2024`.
fn format_date(post: &PostRecord) -> String {
    post.publish_date.format("%B %-d, %Y").to_string()
}

fn post_count(n: usize) -> String {
    match n {
        1 => "1 post".to_string(),
        n => format!("{n} posts"),
    }
}

// ============================================================================
// Tests
// ============================================================================
