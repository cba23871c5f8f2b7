use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;

use commands::Settings;
use commands::store::Lookup;

/// Log filter used when neither `RUST_LOG` nor the config file sets one.
const DEFAULT_LOG_FILTER: &str = "info,trustmesh=debug";

#[derive(Parser)]
#[command(
    name = "trustctl",
    about = "trustmesh: inspect and manage the cluster truststore",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to trustmesh.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Trust directory (overrides [trust].dir)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every trusted peer
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Show a single trusted peer
    Show {
        #[command(flatten)]
        by: ShowArgs,
    },
    /// Trust a new peer
    Add {
        #[arg(long)]
        name: String,
        /// Peer address, `ip:port` or `[ipv6%zone]:port`
        #[arg(long)]
        address: String,
        /// PEM certificate file
        #[arg(long)]
        cert: PathBuf,
    },
    /// Replace the whole trusted set from a YAML list of members
    Replace {
        #[arg(long)]
        members: PathBuf,
    },
    /// Print the SHA-256 fingerprint of a PEM certificate
    Fingerprint { cert: PathBuf },
    /// Handshake with every trusted peer using the configured identity
    Check {
        /// Identify as the notifier rather than a regular client
        #[arg(long)]
        notify: bool,
    },
    /// Print a trustmesh.toml scaffold
    Init {
        /// State directory the scaffold is rooted at
        #[arg(long, default_value = "/var/lib/trustmesh")]
        dir: PathBuf,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ShowArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    fingerprint: Option<String>,
}

impl ShowArgs {
    fn into_lookup(self) -> anyhow::Result<Lookup> {
        match (self.name, self.address, self.fingerprint) {
            (Some(name), _, _) => Ok(Lookup::Name(name)),
            (_, Some(address), _) => Ok(Lookup::Address(address.parse()?)),
            (_, _, Some(fingerprint)) => Ok(Lookup::Fingerprint(fingerprint)),
            _ => anyhow::bail!("one of --name, --address or --fingerprint is required"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::resolve(cli.config.as_deref(), cli.dir)?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(settings.log_filter().unwrap_or(DEFAULT_LOG_FILTER))
    })?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::List { format } => commands::store::list(&settings, &format),
        Commands::Show { by } => commands::store::show(&settings, &by.into_lookup()?),
        Commands::Add {
            name,
            address,
            cert,
        } => commands::store::add(&settings, &name, &address, &cert),
        Commands::Replace { members } => commands::store::replace(&settings, &members),
        Commands::Fingerprint { cert } => commands::cert::fingerprint(&cert),
        Commands::Check { notify } => commands::check::check(&settings, notify).await,
        Commands::Init { dir } => commands::init::init(&dir),
    }
}
