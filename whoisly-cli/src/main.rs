use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use whoisly_core::output::{get_formatter, OutputFormat};
use whoisly_core::whois::parsers::PARSER_REGISTRY;
use whoisly_core::{
    clean_query, lookup_options, CachedLookup, FileStore, LookupConfig, LookupOutcome, WhoisLookup,
};

const CACHE_DIR_NAME: &str = "whoisly";

#[derive(Parser)]
#[command(name = "whoisly")]
#[command(about = "WHOIS lookups for domains, IPs and ASNs with normalized output")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (human or json)
    #[arg(short, long, global = true, default_value = "human")]
    format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a domain, IP address, CIDR block or ASN
    Lookup {
        /// Name to query (e.g. example.com, 8.8.8.8, AS15169)
        query: String,
        /// Always query live and leave the on-disk cache untouched
        #[arg(long)]
        no_cache: bool,
        /// WHOIS server to ask instead of the default route
        #[arg(short, long)]
        server: Option<String>,
    },
    /// Parse raw WHOIS text from a file or stdin
    Parse {
        /// File holding the raw response; stdin when omitted
        file: Option<PathBuf>,
        /// Name the response belongs to, used to pick a registry parser
        #[arg(short, long)]
        query: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_format: OutputFormat = cli.format.parse().unwrap_or_else(|e| {
        eprintln!("{} {}, using human", "Warning:".yellow(), e);
        OutputFormat::Human
    });

    match cli.command {
        Commands::Lookup {
            query,
            no_cache,
            server,
        } => {
            let outcome = run_lookup(&clean_query(&query), no_cache, server).await;
            println!("{}", get_formatter(output_format).format_outcome(&outcome));
            if !outcome.status {
                std::process::exit(1);
            }
        }
        Commands::Parse { file, query } => {
            let raw = read_input(file.as_ref())?;
            let record = PARSER_REGISTRY.parse(&raw, query.as_deref().unwrap_or_default());
            println!("{}", get_formatter(output_format).format_record(&record));
        }
    }

    Ok(())
}

async fn run_lookup(query: &str, no_cache: bool, server: Option<String>) -> LookupOutcome {
    let config = LookupConfig::from_env();

    match server {
        // An explicit server bypasses the cache, whose key does not carry it
        Some(server) => {
            let options = lookup_options(query, &config).with_server(server);
            WhoisLookup::with_config(config).lookup_with(query, options).await
        }
        None if no_cache => WhoisLookup::with_config(config).lookup(query).await,
        None => {
            let store = file_store(cache_dir(&config), config.cache_ttl);
            CachedLookup::new(WhoisLookup::with_config(config), store)
                .lookup(query)
                .await
        }
    }
}

/// `WHOIS_CACHE_DIR`, else the platform cache directory, else the working directory.
fn cache_dir(config: &LookupConfig) -> PathBuf {
    config
        .cache_dir
        .clone()
        .or_else(|| dirs::cache_dir().map(|p| p.join(CACHE_DIR_NAME)))
        .unwrap_or_else(|| PathBuf::from(format!(".{}-cache", CACHE_DIR_NAME)))
}

fn file_store(dir: PathBuf, ttl: Option<Duration>) -> FileStore {
    let store = FileStore::new(dir);
    match ttl {
        Some(ttl) => store.with_ttl(ttl),
        None => store,
    }
}

fn read_input(file: Option<&PathBuf>) -> anyhow::Result<String> {
    match file {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            Ok(raw)
        }
    }
}
