use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use forumgate::config::Config;
use forumgate::models::Post;
use forumgate::system::SystemRegistry;

const USAGE: &str = "usage: forumgate [list | show <system> <post-id>]";

enum Command {
    List,
    Show { system: usize, post_id: String },
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        match args.next().as_deref() {
            None | Some("list") => Ok(Self::List),
            Some("show") => {
                let (Some(system), Some(post_id)) = (args.next(), args.next()) else {
                    bail!(USAGE);
                };
                let system = system
                    .parse()
                    .with_context(|| format!("Invalid system index '{system}'"))?;
                Ok(Self::Show { system, post_id })
            }
            Some(other) => bail!("Unknown command '{other}'\n{USAGE}"),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let command = Command::parse(std::env::args().skip(1))?;

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(systems = config.systems.len(), "Configuration loaded");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutting down...");
        on_signal.cancel();
    });

    let mut registry =
        SystemRegistry::from_config(&config).context("Failed to build systems")?;
    registry
        .load_all(&cancel)
        .await
        .context("Failed to load systems")?;

    match command {
        Command::List => list(&registry, &cancel).await,
        Command::Show { system, post_id } => show(&registry, system, post_id, &cancel).await,
    }
}

async fn list(registry: &SystemRegistry, cancel: &CancellationToken) -> Result<()> {
    for system in registry.with_capability("posts") {
        if !system.is_loaded() {
            continue;
        }
        let posts = system
            .list_posts(cancel)
            .await
            .with_context(|| format!("Failed to list posts from {}", system.filter_value()))?;

        for post in &posts {
            println!(
                "[{}] {:>8}  {}  {}  ({} in {})",
                post.sys_idx,
                post.id,
                post.created_at.format("%Y-%m-%d %H:%M"),
                post.subject,
                post.author.name,
                post.forum.name,
            );
        }
    }
    Ok(())
}

async fn show(
    registry: &SystemRegistry,
    index: usize,
    post_id: String,
    cancel: &CancellationToken,
) -> Result<()> {
    let system = registry
        .get(index)
        .with_context(|| format!("No system with index {index}"))?;

    let mut post = Post {
        id: post_id,
        sys_idx: index,
        ..Post::default()
    };
    system
        .load_post(&mut post, cancel)
        .await
        .with_context(|| format!("Failed to load post {}", post.id))?;

    println!("{}\n", post.body);
    for reply in &post.replies {
        println!("--- {} at {}", reply.author.name, reply.created_at.format("%Y-%m-%d %H:%M"));
        println!("{}\n", reply.body);
    }
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,forumgate=info"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    // Logs go to stderr so stdout stays clean for listings.
    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
