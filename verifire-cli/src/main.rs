//! `Verifire` CLI tool for enrollment and key management.

#![warn(clippy::pedantic, clippy::nursery)]

mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use verifire::identity::DEFAULT_SEGMENT_LENGTH;
use verifire::prelude::*;
use verifire_key_file::{FileKeyStore, DEFAULT_KEY_FILE};

use crate::prompt::Prompter;

/// Characters of a token echoed after enrollment.
const TOKEN_PREVIEW_CHARS: usize = 40;

#[derive(Parser)]
#[command(name = "verifire")]
#[command(about = "Verifire record encryption CLI", long_about = None)]
struct Cli {
    /// Path of the key file (created on first use)
    #[arg(long, global = true, env = "VERIFIRE_KEY_FILE", default_value = DEFAULT_KEY_FILE)]
    key_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the key, generating and saving it if missing
    Keygen,
    /// Collect a user's details and seal them
    Enroll {
        /// Email address
        #[arg(long)]
        email: Option<String>,
        /// First name
        #[arg(long)]
        first: Option<String>,
        /// Middle name (optional)
        #[arg(long)]
        middle: Option<String>,
        /// Last name
        #[arg(long)]
        last: Option<String>,
        /// Age in years
        #[arg(long)]
        age: Option<u32>,
        /// Government ID number
        #[arg(long)]
        id_number: Option<String>,
        /// Seal the whole record instead of only the ID number
        #[arg(long)]
        seal_record: bool,
        /// Length of the random part of the user ID
        #[arg(long, env = "VERIFIRE_ID_LENGTH", default_value_t = DEFAULT_SEGMENT_LENGTH)]
        id_length: usize,
    },
    /// Decrypt a token
    Decrypt {
        /// Token text as stored
        #[arg(long)]
        token: String,
        /// Reject tokens older than this many seconds
        #[arg(long)]
        ttl: Option<u64>,
        /// The token holds a whole record rather than a single field
        #[arg(long)]
        record: bool,
    },
    /// Generate a user identifier
    Id {
        /// First name
        #[arg(long)]
        first: String,
        /// Last name
        #[arg(long)]
        last: String,
        /// Length of the random part
        #[arg(long, env = "VERIFIRE_ID_LENGTH", default_value_t = DEFAULT_SEGMENT_LENGTH)]
        id_length: usize,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = FileKeyStore::new(cli.key_file);

    match cli.command {
        Commands::Keygen => keygen(&store),
        Commands::Enroll { email, first, middle, last, age, id_number, seal_record, id_length } => {
            let mut prompter = Prompter::stdio();
            println!("\nData Collection");
            let record = PlainRecord {
                email: prompter.text(email, "Enter your Email ID")?,
                name: FullName {
                    first: prompter.text(first, "Enter First Name")?,
                    middle: prompter
                        .optional(middle, "Enter Middle Name (optional, press Enter to skip)")?,
                    last: prompter.text(last, "Enter Last Name")?,
                },
                age: prompter.age(age, "Enter Age")?,
                id_number: prompter.text(id_number, "Enter ID Number")?,
            };
            let mode = if seal_record { SealMode::WholeRecord } else { SealMode::IdNumber };
            enroll(&store, &record, mode, id_length)
        }
        Commands::Decrypt { token, ttl, record } => {
            decrypt(&store, &Token::new(token), ttl.map(Duration::from_secs), record)
        }
        Commands::Id { first, last, id_length } => {
            let ids = IdentityGenerator::new().with_segment_length(id_length);
            println!("{}", ids.generate(&first, &last));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn keygen(store: &FileKeyStore) -> Result<ExitCode> {
    let (key, origin) = store
        .ensure_key_with_origin()
        .with_context(|| format!("no usable key at {}", store.path().display()))?;

    match origin {
        KeyOrigin::Generated => {
            println!("New key generated and saved to '{}'.", store.path().display());
            println!("KEEP THIS FILE SAFE AND BACKED UP. Tokens cannot be opened without it.");
        }
        KeyOrigin::Loaded => {
            println!("Key loaded successfully from '{}'.", store.path().display());
        }
    }
    println!("Fingerprint: {}", key.fingerprint());
    Ok(ExitCode::SUCCESS)
}

fn enroll(
    store: &FileKeyStore,
    record: &PlainRecord,
    mode: SealMode,
    id_length: usize,
) -> Result<ExitCode> {
    let key = store
        .ensure_key()
        .with_context(|| format!("no usable key at {}", store.path().display()))?;
    let assembler = RecordAssembler::new(Vault::new(&key))
        .with_identity_generator(IdentityGenerator::new().with_segment_length(id_length));

    println!("\nEncryption");
    let stored = assembler.assemble(record, mode).context("sealing the record failed")?;
    info!(user_id = %stored.user_id(), "record sealed");

    let token = stored.token();
    println!("Encryption successful!");
    println!("Stored Document:\n{}", serde_json::to_string_pretty(&stored.to_document()?)?);
    println!(
        "Encrypted Token: {}... (Total length: {})",
        token.preview(TOKEN_PREVIEW_CHARS),
        token.len()
    );

    println!("\nDecryption");
    match assembler.open(&stored) {
        Ok(opened) => {
            println!("Decryption successful!");
            println!("Decrypted Data Structure:\n{}", serde_json::to_string_pretty(&opened)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("\nDecryption failed! Reason: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn decrypt(
    store: &FileKeyStore,
    token: &Token,
    ttl: Option<Duration>,
    whole_record: bool,
) -> Result<ExitCode> {
    let key = store
        .load()
        .with_context(|| format!("no usable key at {}", store.path().display()))?;
    let vault = Vault::new(&key);

    let opened = match ttl {
        Some(ttl) => vault.decrypt_with_ttl(token, ttl),
        None => vault.decrypt(token),
    }
    .and_then(|bytes| render(&bytes, whole_record));

    match opened {
        Ok(text) => {
            println!("Decryption successful!");
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("Decryption failed! Reason: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn render(bytes: &[u8], whole_record: bool) -> Result<String, Error> {
    if whole_record {
        let record: PlainRecord = verifire::canonical::decode(bytes)?;
        serde_json::to_string_pretty(&record)
            .map_err(|e| Error::MalformedPayload(format!("cannot render record: {e}")))
    } else {
        verifire::canonical::decode::<String>(bytes)
    }
}
