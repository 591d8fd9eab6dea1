use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use smp_gateway::services::auth::issuer::{CredentialIssuer, IdentityClaims, SigningKey};

/// Mint a gateway credential (JWT) for local testing.
///
/// - HS256 with `--secret` (same value as the gateway's JWT_SECRET), or
/// - EdDSA with `--private-pem` (Ed25519 PKCS#8 PEM; gateway uses JWT_PUBLIC_KEY_PEM)
/// - Outputs the token and a ready-to-paste Authorization header
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    /// HS256 shared secret
    #[arg(long, env = "JWT_SECRET", conflicts_with = "private_pem")]
    secret: Option<String>,

    /// Path to an Ed25519 private key in PEM (PKCS#8)
    #[arg(long, value_name = "FILE")]
    private_pem: Option<PathBuf>,

    #[arg(long)]
    email: String,

    #[arg(long)]
    name: String,

    #[arg(long)]
    tel: String,

    #[arg(long)]
    username: String,

    #[arg(long)]
    role_id: String,

    /// Optional `iss` claim
    #[arg(long)]
    issuer: Option<String>,

    /// Lifetime in seconds. Negative values mint an already-expired token.
    #[arg(long, default_value_t = 3600, allow_negative_numbers = true)]
    ttl: i64,

    /// Print only the token (no extra lines)
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn signing_key(args: &Args) -> Result<SigningKey> {
    match (&args.secret, &args.private_pem) {
        (_, Some(path)) => {
            let pem = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(SigningKey::Ed25519Pem(pem))
        }
        (Some(secret), None) if !secret.is_empty() => Ok(SigningKey::Secret(secret.clone().into_bytes())),
        _ => bail!("either --secret (or JWT_SECRET) or --private-pem is required"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let issuer = CredentialIssuer::new(&signing_key(&args)?, args.issuer.clone(), args.ttl)?;
    let token = issuer.issue(&IdentityClaims {
        email: args.email,
        name: args.name,
        tel: args.tel,
        username: args.username,
        role_id: args.role_id,
    })?;

    if args.quiet {
        println!("{token}");
    } else {
        println!("token: {token}");
        println!("Authorization: Bearer {token}");
    }
    Ok(())
}
