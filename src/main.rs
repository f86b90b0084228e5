use clap::Parser;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use portfolio_client::config::{Args, Command};
use portfolio_client::models::{ArtistFilter, ReviewFilter};
use portfolio_client::{ApiError, ClientConfig, PortfolioClient, metrics};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // parse cli arguments
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), ApiError> {
    let config = ClientConfig::from(&args);
    info!("Using API at {}", config.base_url);
    let client = PortfolioClient::new(config)?;

    match args.command {
        Command::Login { email, password } => {
            let session = client.auth.login(&email, &password).await?;
            println!("Logged in as {}", session.display_name());
        }
        Command::Logout => {
            client.auth.logout().await?;
            println!("Logged out");
        }
        Command::Whoami => print_json(&client.auth.current_user().await?),
        Command::Artists {
            page,
            limit,
            status,
            search,
        } => {
            let filter = ArtistFilter {
                page: Some(page),
                limit: Some(limit),
                status,
                search,
                ..Default::default()
            };
            print_json(&client.artists.list(&filter).await?);
        }
        Command::Reviews { page, limit, artist } => {
            let filter = ReviewFilter {
                page: Some(page),
                limit: Some(limit),
                artist_id: artist,
                ..Default::default()
            };
            print_json(&client.reviews.list(&filter).await?);
        }
        Command::LikeReview { id } => {
            let like = client.review_like(&id);
            like.ensure_status().await?;
            let handle = like.toggle()?;
            println!(
                "{} review {} ({} likes)",
                if like.is_liked() { "Liked" } else { "Unliked" },
                id,
                like.count()
            );
            handle.await?;
            if let Some(err) = like.error() {
                println!("Reverted: {}", err);
            }
        }
        Command::CommentReview { id, text } => {
            let thread = client.review_comments(&id);
            thread.load().await?;
            thread.set_input(text);
            let handle = thread.submit()?;
            handle.await?;
            match thread.error() {
                Some(err) => println!("{}", err),
                None => println!("Comment posted ({} comments)", thread.len()),
            }
        }
        Command::LikeStatus { ids } => {
            let statuses = client
                .review_likes
                .check_batch_status_cached(client.reviews.engagement(), &ids)
                .await?;
            let mut sorted: Vec<_> = statuses.into_iter().collect();
            sorted.sort();
            for (id, liked) in sorted {
                println!("{}\t{}", id, liked);
            }
        }
        Command::Stats => print_json(&client.admin.dashboard_stats().await?),
        Command::Metrics => print!("{}", metrics::render()),
    }
    Ok(())
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}
