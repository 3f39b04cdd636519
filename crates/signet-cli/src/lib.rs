//! Command-line interface for signet drivers.
//!
//! Three subcommands: `key` generates (or refuses to overwrite) a key file,
//! `sign` issues a token from a claims JSON object, and `verify` runs full
//! bearer-token validation and prints the accepted claims.
//!
//! Key and claims parameters come from a TOML profile file; `key` flags
//! override the profile for one-off generation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use signet::{ClaimsConfig, Driver, KeyConfig, SignetConfig};

/// Main CLI application structure
#[derive(Parser, Debug)]
#[command(
    name = "signet",
    version,
    about = "Issue and verify JSON Web Tokens backed by per-algorithm key drivers"
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Profile file with `keys` and `payloads` tables
    #[arg(long, short = 'c', global = true, env = "SIGNET_CONFIG", default_value = "signet.toml")]
    pub config: PathBuf,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a key file for the active (or overridden) key profile
    Key {
        /// Overwrite the key file even if one already exists
        #[arg(long, short = 'f')]
        force: bool,

        /// Algorithm override (ES256, HS512, ...)
        #[arg(long, env = "SIGNET_KEY_ALGORITHM")]
        algorithm: Option<String>,

        /// Curve override, for the ECDSA and EdDSA families
        #[arg(long, env = "SIGNET_KEY_CURVE")]
        curve: Option<String>,

        /// Key size in bits, for the HMAC and RSA families
        #[arg(long, env = "SIGNET_KEY_SIZE")]
        size: Option<u32>,

        /// Key file path override
        #[arg(long, env = "SIGNET_KEY_PATH")]
        path: Option<PathBuf>,
    },

    /// Sign a claims object and print the compact token
    Sign {
        /// Claims as a JSON object
        #[arg(long, short = 'p', default_value = "{}")]
        claims: String,
    },

    /// Verify a token and print its claims, or fail with a non-zero exit
    Verify {
        /// The compact-serialized token
        token: String,
    },
}

/// Parse arguments, initialize logging, and dispatch.
///
/// # Errors
///
/// Configuration, key, and token failures bubble up for `main` to report.
pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Key {
            force,
            algorithm,
            curve,
            size,
            path,
        } => generate_key(&cli.config, force, algorithm, curve, size, path),
        Commands::Sign { claims } => sign(&cli.config, &claims),
        Commands::Verify { token } => verify(&cli.config, &token),
    }
}

fn load_config(path: &Path) -> Result<SignetConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.to_path_buf()))
        .add_source(config::Environment::with_prefix("SIGNET").separator("__"))
        .build()
        .with_context(|| format!("could not load profile file {}", path.display()))?;

    settings
        .try_deserialize()
        .context("profile file does not match the expected layout")
}

fn generate_key(
    config_path: &Path,
    force: bool,
    algorithm: Option<String>,
    curve: Option<String>,
    size: Option<u32>,
    path: Option<PathBuf>,
) -> Result<()> {
    // Flags override the active profile; a missing profile file is fine as
    // long as the flags carry everything needed.
    let profile = load_config(config_path)
        .ok()
        .and_then(|config| config.active_key().cloned().ok());

    let mut key_config = match (algorithm, profile) {
        (Some(algorithm), Some(profile)) => KeyConfig {
            algorithm,
            ..profile
        },
        (Some(algorithm), None) => KeyConfig::new(algorithm),
        (None, Some(profile)) => profile,
        (None, None) => bail!("no profile file and no --algorithm given"),
    };
    if curve.is_some() {
        key_config.curve = curve;
    }
    if size.is_some() {
        key_config.size = size;
    }
    if path.is_some() {
        key_config.path = path;
    }

    let Some(target) = key_config.path.clone() else {
        bail!("a key path is required, via --path or the profile");
    };

    if target.exists() {
        if !force {
            println!("A key already exists at {}, ignoring", target.display());
            return Ok(());
        }
        std::fs::remove_file(&target)
            .with_context(|| format!("could not remove {}", target.display()))?;
    }

    let driver = Driver::from_config(&key_config, &ClaimsConfig::new())?;
    tracing::info!(algorithm = %driver.algorithm(), "generated key");
    println!(
        "Generated a new {} key at {}",
        driver.algorithm(),
        target.display()
    );
    Ok(())
}

fn sign(config_path: &Path, claims: &str) -> Result<()> {
    let claims: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(claims).context("claims must be a JSON object")?;

    let driver = Driver::from_profiles(&load_config(config_path)?)?;
    println!("{}", driver.sign_serialized(&claims)?);
    Ok(())
}

fn verify(config_path: &Path, token: &str) -> Result<()> {
    let driver = Driver::from_profiles(&load_config(config_path)?)?;
    let claims = driver.authenticate(token)?;

    println!("{}", serde_json::to_string_pretty(&claims)?);
    Ok(())
}
