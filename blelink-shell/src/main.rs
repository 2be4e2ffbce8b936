#[derive(clap::Parser)]
#[command(name = "blelink-shell")]
#[command(about = "Serve the page shell from an offline cache")]
struct Cli {
    /// Directory holding the page shell
    #[arg(long, default_value = "shell")]
    root: std::path::PathBuf,
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9000")]
    addr: std::net::SocketAddr,
    /// Path to precache, repeat for more (defaults to the shell's own files)
    #[arg(long = "asset")]
    assets: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli: Cli = clap::Parser::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cache = if cli.assets.is_empty() {
        blelink_shell::ShellCache::install(&cli.root, blelink_shell::DEFAULT_ASSETS).await?
    } else {
        blelink_shell::ShellCache::install(&cli.root, &cli.assets).await?
    };
    if cache.is_empty() {
        tracing::warn!("nothing precached, every request goes to disk");
    } else {
        tracing::info!(root = %cli.root.display(), "installed {} assets", cache.len());
    }

    blelink_shell::http::run_server(cli.addr, cache).await?;
    Ok(())
}
