use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tursopanel_token::MAX_EXPIRATION_DAYS;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "tursopanel", version, about = "Admin panel and token issuer for libSQL servers")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Signing key management
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Mint, verify and inspect database access tokens
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },

    /// Start the admin API server
    Serve {
        /// Path to the configuration file
        #[arg(long, short, default_value = "tursopanel.yaml")]
        config: PathBuf,
    },

    /// Database statistics
    Stats {
        #[command(subcommand)]
        cmd: StatsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a new Ed25519 signing keypair
    Generate {
        /// Directory to write private.key and public.key into. Prints to stdout if omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// How the key is generated
        #[arg(long, value_enum, default_value_t = KeyMethod::Random)]
        method: KeyMethod,

        /// Program used by `--method openssl`
        #[arg(long, default_value = "openssl")]
        openssl: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyMethod {
    /// In-process key generation
    Random,
    /// `openssl genpkey -algorithm ed25519`
    Openssl,
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Mint a full-access / read-only token pair
    Mint {
        /// Private key: a file path or hex/PEM material
        #[arg(long, env = "TURSOPANEL_SIGNING_KEY")]
        key: Option<String>,

        /// Database name
        #[arg(long, group = "target")]
        database: Option<String>,

        /// Database id (looked up in the store)
        #[arg(long, group = "target")]
        database_id: Option<u64>,

        /// Group name
        #[arg(long, group = "target")]
        group: Option<String>,

        /// Group id (looked up in the store)
        #[arg(long, group = "target")]
        group_id: Option<u64>,

        /// Grantee user id
        #[arg(long, group = "grantee")]
        user: Option<u64>,

        /// Grantee team id
        #[arg(long, group = "grantee")]
        team: Option<u64>,

        /// Days until expiry; 0 means unlimited
        #[arg(
            long,
            default_value_t = 30,
            value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_EXPIRATION_DAYS))
        )]
        days: u32,

        /// Configuration file, needed for id lookups
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Verify a token's signature and expiry
    Verify {
        /// Public key: a file path or hex
        #[arg(long, env = "TURSOPANEL_PUBLIC_KEY")]
        key: Option<String>,

        /// Configuration file whose `signing.public_key_file` is used when no key is passed
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Token string or a file containing it
        token: String,
    },

    /// Decode a token without verifying it
    Inspect {
        /// Token string or a file containing it
        token: String,
    },
}

#[derive(Subcommand, Debug)]
enum StatsCommand {
    /// Fetch stats from the database server and store the current bucket
    Refresh {
        /// Path to the configuration file
        #[arg(long, short, default_value = "tursopanel.yaml")]
        config: PathBuf,

        /// Refresh a single database instead of every active one
        #[arg(long)]
        database: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Keys { cmd } => match cmd {
            KeysCommand::Generate {
                output,
                method,
                openssl,
            } => commands::keys::generate(output, method, &openssl)?,
        },

        Command::Token { cmd } => match cmd {
            TokenCommand::Mint {
                key,
                database,
                database_id,
                group,
                group_id,
                user,
                team,
                days,
                config,
            } => {
                let target =
                    commands::token::target_from_args(database, database_id, group, group_id)?;
                let grantee = commands::token::grantee_from_args(user, team)?;
                commands::token::mint(key, target, grantee, days, config).await?
            }
            TokenCommand::Verify { key, config, token } => {
                commands::token::verify(key, config, token)?
            }
            TokenCommand::Inspect { token } => commands::token::inspect(token)?,
        },

        Command::Serve { config } => commands::serve::serve(config).await?,

        Command::Stats { cmd } => match cmd {
            StatsCommand::Refresh { config, database } => {
                commands::stats::refresh(config, database).await?
            }
        },
    }

    Ok(())
}
