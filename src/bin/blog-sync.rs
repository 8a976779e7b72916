//! blog-sync - command line client for the blog API
//! Reads go through the local cache when the server is unreachable and
//! writes fall back to it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use blog_backend::blog::query::{self, BlogFilter, StatusFilter};
use blog_backend::blog::{Blog, BlogPatch, BlogStatus, NewBlog, BLOG_CATEGORIES};
use blog_backend::client::{ClientConfig, RefreshOutcome, SaveOutcome, SyncReconciler};
use blog_backend::logging;

#[derive(Parser)]
#[command(name = "blog-sync", version, about = "Offline-first blog API client")]
struct Cli {
    /// Server origin (overrides BLOG_API_BASE).
    #[arg(long, global = true)]
    api: Option<String>,
    /// Local cache directory (overrides BLOG_CACHE_DIR).
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every blog, drafts included.
    List {
        /// Case-insensitive match on title, author, category and tags.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
        #[arg(long)]
        category: Option<String>,
    },
    /// List published blogs, newest first.
    Published {
        #[arg(long)]
        category: Option<String>,
    },
    /// Print one blog as JSON.
    Show {
        /// Blog id or slug.
        key: String,
    },
    /// Create a blog.
    Create {
        #[arg(long)]
        title: String,
        /// Derived from the title when omitted.
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, default_value = "")]
        subtitle: String,
        #[command(flatten)]
        content: ContentArgs,
        #[arg(long, default_value = "")]
        author: String,
        #[arg(long, default_value = "")]
        category: String,
        /// Comma-separated tags.
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        publish: bool,
    },
    /// Change fields of an existing blog.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        subtitle: Option<String>,
        #[command(flatten)]
        content: ContentArgs,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated tags; replaces the current list.
        #[arg(long)]
        tags: Option<String>,
    },
    /// Flip a blog between draft and published.
    Toggle {
        /// Blog id or slug.
        key: String,
    },
    Delete {
        id: String,
    },
    /// Fetch from the server and merge into the local cache.
    Refresh,
    /// Write blogs as pretty JSON files.
    Export {
        /// Blog id or slug; the whole collection when omitted.
        key: Option<String>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(clap::Args)]
struct ContentArgs {
    /// HTML content.
    #[arg(long, conflicts_with = "content_file")]
    content: Option<String>,
    /// Read HTML content from a file.
    #[arg(long)]
    content_file: Option<PathBuf>,
}

impl ContentArgs {
    fn read(&self) -> Result<Option<String>> {
        match (&self.content, &self.content_file) {
            (Some(content), _) => Ok(Some(content.clone())),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map(Some)
                .with_context(|| format!("failed to read {}", path.display())),
            (None, None) => Ok(None),
        }
    }
}

fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn print_table(blogs: &[Blog]) {
    if blogs.is_empty() {
        println!("No blogs found.");
        return;
    }
    for blog in blogs {
        println!(
            "{:<40} {:<10} {:>3} min  {:<12} {}",
            blog.slug,
            blog.status.as_str(),
            blog.reading_time,
            blog.category,
            blog.title
        );
    }
}

fn report(outcome: &SaveOutcome) {
    let blog = outcome.blog();
    println!("{}: {} ({}, {})", outcome.message(), blog.title, blog.slug, blog.status);
    if outcome.is_local() {
        eprintln!("warning: server unreachable, change kept in the local cache only");
    }
}

fn write_export(dir: &Path, (name, body): (String, String)) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Exported {}", path.display());
    Ok(())
}

async fn run(cli: Cli, sync: SyncReconciler) -> Result<()> {
    match cli.command {
        Commands::List {
            search,
            status,
            category,
        } => {
            let blogs = sync.initialize().await;
            let filter = BlogFilter {
                search,
                status,
                category,
            };
            print_table(&filter.apply(&blogs));
        }
        Commands::Published { category } => {
            print_table(&sync.published(category.as_deref()).await);
        }
        Commands::Show { key } => {
            let blog = sync.get(&key).await?;
            println!("{}", serde_json::to_string_pretty(&blog)?);
        }
        Commands::Create {
            title,
            slug,
            subtitle,
            content,
            author,
            category,
            tags,
            publish,
        } => {
            if !category.is_empty() && !BLOG_CATEGORIES.contains(&category.as_str()) {
                tracing::warn!(category = %category, "category is not one of the known categories");
            }
            let input = NewBlog {
                title,
                slug,
                subtitle,
                content: content.read()?.unwrap_or_default(),
                author,
                category,
                tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
                status: publish.then_some(BlogStatus::Published),
                ..NewBlog::default()
            };
            report(&sync.create(input).await?);
        }
        Commands::Edit {
            id,
            title,
            slug,
            subtitle,
            content,
            author,
            category,
            tags,
        } => {
            let patch = BlogPatch {
                title,
                slug,
                subtitle,
                content: content.read()?,
                author,
                category,
                tags: tags.as_deref().map(parse_tags),
                ..BlogPatch::default()
            };
            report(&sync.update(&id, patch).await?);
        }
        Commands::Toggle { key } => {
            report(&sync.toggle_status(&key).await?);
        }
        Commands::Delete { id } => {
            let outcome = sync.delete(&id).await?;
            println!("{}", outcome.message());
        }
        Commands::Refresh => match sync.refresh().await {
            RefreshOutcome::Synced(blogs) => println!("Synced {} blogs", blogs.len()),
            RefreshOutcome::Offline(blogs) => {
                println!("Server unreachable, {} blogs in the local cache", blogs.len())
            }
            RefreshOutcome::Stale => println!("Refresh superseded"),
        },
        Commands::Export { key, out_dir } => match key {
            Some(key) => {
                let blog = sync.get(&key).await?;
                write_export(&out_dir, query::export_blog(&blog)?)?;
            }
            None => {
                let blogs = sync.initialize().await;
                write_export(&out_dir, query::export_all(&blogs)?)?;
            }
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_cli(cli.verbose);

    let mut config = ClientConfig::from_env();
    if let Some(api) = &cli.api {
        config.api_base = api.clone();
    }
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    let sync = config.connect()?;

    run(cli, sync).await
}
