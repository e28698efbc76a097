//! `tweetframe` CLI - serve the oEmbed proxy and render embeds from the terminal

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use tweetframe::proxy::{self, UPSTREAM_OEMBED_URL};
use tweetframe::{is_likely_post_url, normalize_post_url, render_static, HttpUpstream, OembedUpstream};

#[derive(Parser)]
#[command(name = "tweetframe")]
#[command(about = "Auto-upgrading tweet embeds with graceful fallbacks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the oEmbed proxy endpoint
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "127.0.0.1:8787")]
        bind: String,

        /// Upstream oEmbed endpoint
        #[arg(long, default_value = UPSTREAM_OEMBED_URL)]
        upstream: String,
    },

    /// Fetch the oEmbed snippet for a tweet URL and print it
    Fetch {
        /// Tweet URL (any accepted spelling)
        url: String,

        /// Upstream oEmbed endpoint
        #[arg(long, default_value = UPSTREAM_OEMBED_URL)]
        upstream: String,
    },

    /// Render a self-contained static embed for a tweet URL
    Render {
        /// Tweet URL (any accepted spelling)
        url: String,

        /// Upstream oEmbed endpoint
        #[arg(long, default_value = UPSTREAM_OEMBED_URL)]
        upstream: String,
    },

    /// Normalize and validate a tweet URL
    Check {
        /// Tweet URL (any accepted spelling)
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, upstream } => cmd_serve(&bind, &upstream).await?,
        Commands::Fetch { url, upstream } => cmd_fetch(&url, &upstream).await?,
        Commands::Render { url, upstream } => cmd_render(&url, &upstream).await?,
        Commands::Check { url } => cmd_check(&url)?,
    }

    Ok(())
}

async fn cmd_serve(bind: &str, upstream: &str) -> Result<()> {
    let upstream: Arc<dyn OembedUpstream> = Arc::new(HttpUpstream::with_endpoint(upstream)?);
    proxy::serve(bind, upstream).await
}

async fn cmd_fetch(url: &str, upstream: &str) -> Result<()> {
    let canonical = normalize_post_url(url);
    if !is_likely_post_url(&canonical) {
        anyhow::bail!("not a recognizable tweet URL: {canonical}");
    }

    let upstream = HttpUpstream::with_endpoint(upstream)?;
    let reply = upstream.fetch_oembed(&canonical).await?;
    if !reply.status.is_success() {
        anyhow::bail!("oEmbed upstream returned {}", reply.status);
    }

    if reply.html.is_empty() {
        eprintln!("(no snippet available for {canonical})");
    } else {
        println!("{}", reply.html);
    }
    Ok(())
}

async fn cmd_render(url: &str, upstream: &str) -> Result<()> {
    let upstream = HttpUpstream::with_endpoint(upstream)?;
    println!("{}", render_static(&upstream, url).await);
    Ok(())
}

fn cmd_check(url: &str) -> Result<()> {
    let canonical = normalize_post_url(url);
    println!("{canonical}");

    if is_likely_post_url(&canonical) {
        println!("valid tweet URL");
        Ok(())
    } else {
        anyhow::bail!("not a recognizable tweet URL")
    }
}
