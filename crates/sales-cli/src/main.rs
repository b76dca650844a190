use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use sales_auth::{
    Algorithm, Auth, Claims, DecodingKey, KeyStore, ROLE_ADMIN, private_key_from_pem,
    public_key_from_pem,
};
use sales_config::AuthConfig;

#[derive(Parser)]
#[command(name = "sales-admin")]
#[command(about = "Sales admin - administrative tools for the sales API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an RSA key pair for signing and verifying tokens
    Keygen {
        /// Where to write the private key (defaults to SALES_AUTH_PRIVATE_KEY_FILE)
        #[arg(short = 'f', long)]
        private_key_file: Option<String>,

        /// Where to write the public key (defaults to SALES_AUTH_PUBLIC_KEY_FILE)
        #[arg(short = 'p', long)]
        public_key_file: Option<String>,

        /// Modulus size in bits
        #[arg(short = 'b', long, default_value = "2048")]
        bits: usize,

        /// Replace existing key files
        #[arg(long)]
        force: bool,
    },

    /// Issue a signed token from a PEM private key
    Gentoken {
        /// Key id placed in the token header (defaults to SALES_AUTH_KEY_ID)
        #[arg(short = 'k', long)]
        kid: Option<String>,

        /// RSA private key in PEM form (defaults to SALES_AUTH_PRIVATE_KEY_FILE)
        #[arg(short = 'f', long)]
        private_key_file: Option<String>,

        /// Matching public key; when given the token is verified after signing
        #[arg(long)]
        public_key_file: Option<String>,

        /// Signature algorithm (defaults to SALES_AUTH_ALGORITHM)
        #[arg(short = 'a', long)]
        algorithm: Option<String>,

        /// Principal the token identifies
        #[arg(short = 's', long, default_value = "5cf37266-3473-4006-984f-9325122678b7")]
        subject: String,

        /// Roles granted, comma separated
        #[arg(short = 'r', long, value_delimiter = ',', default_value = ROLE_ADMIN)]
        roles: Vec<String>,

        /// Lifetime in seconds
        #[arg(short = 't', long, default_value = "31536000")]
        ttl: u64,

        #[arg(long, default_value = "service project")]
        issuer: String,

        /// Intended audiences, comma separated
        #[arg(long, value_delimiter = ',', default_value = "students")]
        audience: Vec<String>,
    },
}

fn main() {
    dotenv().ok();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Keygen {
            private_key_file,
            public_key_file,
            bits,
            force,
        } => {
            let defaults = AuthConfig::from_env();
            handle_keygen(&KeyRequest {
                private_key_file: private_key_file.unwrap_or(defaults.private_key_file),
                public_key_file: public_key_file.unwrap_or(defaults.public_key_file),
                bits,
                force,
            })
        }
        Commands::Gentoken {
            kid,
            private_key_file,
            public_key_file,
            algorithm,
            subject,
            roles,
            ttl,
            issuer,
            audience,
        } => {
            let defaults = AuthConfig::from_env();
            let request = TokenRequest {
                kid: kid.unwrap_or(defaults.key_id),
                private_key_file: private_key_file.unwrap_or(defaults.private_key_file),
                public_key_file,
                algorithm: algorithm.unwrap_or(defaults.algorithm),
                claims: Claims::new(issuer, subject, audience, Duration::from_secs(ttl), roles),
            };
            handle_gentoken(request)
        }
    }
}

struct KeyRequest {
    private_key_file: String,
    public_key_file: String,
    bits: usize,
    force: bool,
}

fn handle_keygen(request: &KeyRequest) -> anyhow::Result<()> {
    if request.bits < 2048 {
        bail!("key size must be at least 2048 bits, got {}", request.bits);
    }

    for path in [&request.private_key_file, &request.public_key_file] {
        if !request.force && Path::new(path).exists() {
            bail!("{} already exists, pass --force to replace it", path);
        }
    }

    println!("🔑 Generating {}-bit RSA key pair...", request.bits);
    let private_key =
        RsaPrivateKey::new(&mut OsRng, request.bits).context("generating private key")?;

    let private_pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .context("encoding private key")?;
    let public_pem = private_key
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .context("encoding public key")?;

    fs::write(&request.private_key_file, private_pem.as_bytes())
        .with_context(|| format!("writing private key {}", request.private_key_file))?;
    fs::write(&request.public_key_file, public_pem)
        .with_context(|| format!("writing public key {}", request.public_key_file))?;

    println!("✅ Private key written to {}", request.private_key_file);
    println!("✅ Public key written to {}", request.public_key_file);

    Ok(())
}

struct TokenRequest {
    kid: String,
    private_key_file: String,
    public_key_file: Option<String>,
    algorithm: String,
    claims: Claims,
}

fn handle_gentoken(request: TokenRequest) -> anyhow::Result<()> {
    let algorithm = Algorithm::from_str(&request.algorithm)
        .with_context(|| format!("unsupported algorithm {}", request.algorithm))?;

    let pem = fs::read(&request.private_key_file)
        .with_context(|| format!("reading private key {}", request.private_key_file))?;
    let private_key = private_key_from_pem(&pem).context("parsing private key")?;

    let public_key = match &request.public_key_file {
        Some(path) => {
            let pem = fs::read(path).with_context(|| format!("reading public key {}", path))?;
            Some(public_key_from_pem(&pem).context("parsing public key")?)
        }
        None => None,
    };

    let kid = request.kid.clone();
    let verify_with = public_key.clone();
    let lookup = move |want: &str| -> anyhow::Result<DecodingKey> {
        match &verify_with {
            Some(key) if want == kid => Ok(key.clone()),
            _ => Err(anyhow!("no public key found for the specified kid: {want}")),
        }
    };

    let keys: KeyStore = [(request.kid.clone(), private_key)].into_iter().collect();
    let auth = Auth::new(algorithm, lookup, keys);

    let token = auth
        .generate_token(&request.kid, &request.claims)
        .context("generating token")?;

    if public_key.is_some() {
        auth.validate_token(&token)
            .context("verifying generated token")?;
        eprintln!("✅ Token verified with the public key");
    }

    println!("-----BEGIN TOKEN-----");
    println!("{}", token);
    println!("-----END TOKEN-----");

    Ok(())
}
