use clap::Parser;
use eyre::Context;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_extract::{
    AuthConfig, AuthorizationSession, CHANNEL_PARTS, ChannelTree, CredentialStore, OAuthManager,
    Query, TerminalPrompt, extract,
};

/// List a YouTube channel's playlists and the videos in them.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Youtube account name to look up.
    #[arg(long, default_value = "foo")]
    account_name: String,

    /// OAuth client secrets downloaded from the Google Cloud console.
    #[arg(long, default_value = "client_service.json")]
    client_secrets: PathBuf,

    /// Directory holding the cached token [default: ~/.credentials].
    #[arg(long)]
    credentials_dir: Option<PathBuf>,

    /// Forget the cached token and go through the consent flow again.
    #[arg(long)]
    reauthorize: bool,

    /// Only print the consent URL instead of also opening it in a browser.
    #[arg(long)]
    no_browser: bool,
}

fn print_tree(tree: &ChannelTree) {
    let channel = &tree.channel;
    println!(
        "This channel's ID is {}. Its title is '{}', and it has {} views.",
        channel.id, channel.title, channel.view_count
    );
    println!("Video Collection:");
    for collection in &tree.collections {
        for item in &collection.items {
            println!("Video ID is {}. Its title is '{}'.", item.id, item.title);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let args = Args::parse();
    let query = Query::new(args.account_name, CHANNEL_PARTS).context("build query")?;
    println!("Looking up account: {}", query.account());

    // if modifying the requested scopes, delete the previously saved credentials
    let config = AuthConfig::from_file(&args.client_secrets).context("load OAuth client config")?;
    let store = match args.credentials_dir {
        Some(dir) => CredentialStore::new(dir),
        None => CredentialStore::in_home().context("locate credential cache")?,
    };
    if args.reauthorize {
        store.clear().context("clear cached credential")?;
    }

    let mut session = AuthorizationSession::new(
        OAuthManager::new(config),
        store,
        TerminalPrompt::new(!args.no_browser),
    );
    let client = session
        .acquire_client()
        .await
        .context("acquire authenticated YouTube client")?;

    let trees = extract::run(&client, &query)
        .await
        .context("extract channel playlists")?;
    for tree in &trees {
        print_tree(tree);
    }

    Ok(())
}
