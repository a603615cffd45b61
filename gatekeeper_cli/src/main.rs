use clap::{Parser, Subcommand};
use gatekeeper_core::{AuthorizationConfig, AuthorizationDecision, PermissionRequirement, Principal};
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gatekeeper", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse a comma-separated permission string and print the result as JSON
    Parse {
        /// Raw permission string, e.g. "orders.read, orders.write"
        raw: String,
    },
    /// Check a principal against a configured policy
    Check {
        /// Path to the TOML authorization config
        #[arg(long)]
        config: PathBuf,

        /// Policy name (or "permissions:<list>" for an inline policy)
        #[arg(long)]
        policy: String,

        /// Principal name; omit to check as an anonymous principal
        #[arg(long)]
        name: Option<String>,

        /// Claims as TYPE=VALUE, repeatable
        #[arg(long = "claim", value_parser = parse_claim)]
        claims: Vec<(String, String)>,

        /// Permissions granted through the configured claim type, repeatable
        #[arg(long = "permission")]
        permissions: Vec<String>,

        /// Print the principal, decision and audit entry as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_claim(raw: &str) -> Result<(String, String), String> {
    let (claim_type, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=VALUE, got {:?}", raw))?;

    if claim_type.trim().is_empty() {
        return Err("claim type cannot be empty".to_string());
    }

    Ok((claim_type.trim().to_string(), value.to_string()))
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { raw } => {
            let requirement = PermissionRequirement::parse(&raw);
            match serde_json::to_string(&requirement) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    error!("Failed to serialize permissions: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Check {
            config,
            policy,
            name,
            claims,
            permissions,
            json,
        } => {
            let config = match AuthorizationConfig::from_file(&config) {
                Ok(config) => config,
                Err(e) => {
                    error!("Failed to load config {:?}: {}", config, e);
                    eprintln!("Error: {}", e);
                    std::process::exit(2);
                }
            };

            let service = match config.build_service() {
                Ok(service) => service,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(2);
                }
            };

            let mut principal = match name {
                Some(name) => Principal::authenticated(name),
                None => Principal::anonymous(),
            };
            for (claim_type, value) in claims {
                principal = principal.with_claim(claim_type, value);
            }
            for permission in permissions {
                principal = principal.with_claim(config.claim_type.as_str(), permission);
            }
            let principal = config.prepare_principal(principal);
            debug!("Checking {:?} against policy {}", principal, policy);

            let decision = match service.authorize(&principal, &policy) {
                Ok(decision) => decision,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(2);
                }
            };

            if json {
                let report = json!({
                    "principal": principal,
                    "decision": decision,
                    "audit": service.recent_decisions(1).first(),
                });
                println!("{}", report);
            } else {
                match &decision {
                    AuthorizationDecision::Allowed => println!("allowed"),
                    AuthorizationDecision::Denied { reasons } => {
                        println!("denied: {}", reasons.join("; "));
                    }
                }
            }

            if !decision.is_allowed() {
                std::process::exit(1);
            }
        }
    }
}
