use clap::{Parser, Subcommand};
use simple_folio::{config, logging, output, site};
use std::path::PathBuf;

/// Shared flags for commands that read posts.
#[derive(clap::Args, Clone)]
struct DraftArgs {
    /// Include posts marked `draft: true`
    #[arg(long)]
    drafts: bool,
}

#[derive(Parser)]
#[command(name = "simple-folio")]
#[command(about = "Static blog generator for markdown posts")]
#[command(long_about = "\
Static blog generator for markdown posts

Every markdown file under the posts directory becomes a post page. Posts
are listed newest first on the home page, with pinned posts on top, and
get one listing page per category and per tag.

Content structure:

  content/
  ├── config.toml                  # Site config (optional)
  ├── templates/                   # Page template overrides (optional)
  │   ├── post.html
  │   └── listing.html
  └── posts/
      ├── 2024-12-05-hello.md      # Date prefix is stripped: slug `hello`
      └── rust/ownership.md        # Subdirectories are just for you

Frontmatter:

  ---
  title: Hello, World               # required
  date: 2024-12-05                  # required
  category: Engineering
  tags: [rust, web]
  description: One-line summary
  author: Sam
  pinned: true
  draft: true
  ---

Output:

  dist/index.html                       # all posts
  dist/2024/12/05/hello/index.html      # one post
  dist/categories/engineering/index.html
  dist/tags/rust/index.html

Run 'simple-folio gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// More log output on stderr (-v stages, -vv per file)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site into the output directory
    Build(DraftArgs),
    /// Validate content without writing anything
    Check {
        #[command(flatten)]
        drafts: DraftArgs,
        /// Print the post inventory as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match &cli.command {
        Command::Build(draft_args) => {
            let site_config = load_site_config(&cli, draft_args)?;
            init_thread_pool(&site_config.processing);

            println!(
                "==> Building {} \u{2192} {}",
                cli.source.display(),
                cli.output.display()
            );
            let report = site::build_site(&cli.source, &cli.output, &site_config)?;
            output::print_build_output(&report);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check { drafts, json } => {
            let site_config = load_site_config(&cli, drafts)?;
            init_thread_pool(&site_config.processing);

            let inventory = site::check_site(&cli.source, &site_config)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&inventory.posts)?);
            } else {
                println!("==> Checking {}", cli.source.display());
                output::print_check_output(&inventory);
                println!("==> Content is valid");
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `<source>/config.toml`, with `--drafts` overriding `posts.include_drafts`.
fn load_site_config(
    cli: &Cli,
    draft_args: &DraftArgs,
) -> Result<config::SiteConfig, config::ConfigError> {
    let mut site_config = config::load_config(&cli.source)?;
    if draft_args.drafts {
        site_config.posts.include_drafts = true;
    }
    Ok(site_config)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
