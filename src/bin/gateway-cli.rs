use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use gateway_dispatch::auth::{Claims, SystemClock, TokenIssuer};
use gateway_dispatch::config::validation::{parse_hmac_algorithm, MIN_SECRET_LEN};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AdminArgs {
    /// Base URL of the admin listener.
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key.
    #[arg(short, long, env = "GATEWAY_ADMIN_API_KEY", hide_env_values = true)]
    key: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status(AdminArgs),
    /// List the route table
    Routes(AdminArgs),
    /// Show the revocation store size
    Revocations(AdminArgs),
    /// Mint a signed token with the gateway secret
    IssueToken {
        /// Subject (`sub` claim).
        subject: String,

        /// Lifetime in seconds.
        #[arg(long, default_value_t = 3600)]
        ttl_secs: u64,

        /// Extra claim as `name=value`; repeatable.
        #[arg(long = "claim", value_parser = parse_claim)]
        claims: Vec<(String, String)>,

        #[arg(long, default_value = "HS256")]
        algorithm: String,

        #[arg(long, env = "GATEWAY_JWT_SECRET", hide_env_values = true)]
        secret: String,
    },
    /// Revoke a token through the gateway's logout endpoint
    Logout {
        /// Base URL of the public listener.
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,

        #[arg(long, default_value = "/auth/logout")]
        path: String,

        /// Token to revoke.
        #[arg(long)]
        token: String,
    },
}

fn parse_claim(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status(args) => admin_get(&client, &args, "/admin/status").await?,
        Commands::Routes(args) => admin_get(&client, &args, "/admin/routes").await?,
        Commands::Revocations(args) => admin_get(&client, &args, "/admin/revocations").await?,
        Commands::IssueToken {
            subject,
            ttl_secs,
            claims,
            algorithm,
            secret,
        } => {
            if secret.len() < MIN_SECRET_LEN {
                return Err(format!("secret must be at least {MIN_SECRET_LEN} bytes").into());
            }
            let algorithm = parse_hmac_algorithm(&algorithm)
                .ok_or_else(|| format!("unsupported algorithm `{algorithm}`"))?;

            let extra: Claims = claims
                .into_iter()
                .map(|(name, value)| (name, Value::String(value)))
                .collect();

            let issuer = TokenIssuer::new(secret.as_bytes(), algorithm, Arc::new(SystemClock));
            println!("{}", issuer.issue(&subject, Duration::from_secs(ttl_secs), extra)?);
        }
        Commands::Logout { url, path, token } => {
            let res = client
                .post(format!("{url}{path}"))
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .send()
                .await?;
            if res.status().is_success() {
                println!("Token revoked");
            } else {
                print_response(res).await?;
            }
        }
    }

    Ok(())
}

async fn admin_get(
    client: &reqwest::Client,
    args: &AdminArgs,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", args.key))?,
    );

    let res = client
        .get(format!("{}{}", args.url, path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
