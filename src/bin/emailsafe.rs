#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI that backs up one IMAP folder to `.eml` files

use clap::Parser;
use emailsafe::{BackupReport, EmlStore, Folder, ImapClient, ImapConfig, NamingScheme, run_backup};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emailsafe")]
#[command(about = "EmailSafe: back up an IMAP mailbox to local .eml files")]
#[allow(clippy::struct_excessive_bools)]
struct Args {
    /// IMAP server address
    #[arg(long, env = "IMAP_HOST")]
    server: Option<String>,

    /// IMAP server port
    #[arg(long, env = "IMAP_PORT")]
    port: Option<u16>,

    /// Username
    #[arg(long, env = "IMAP_USERNAME")]
    username: Option<String>,

    /// Password
    #[arg(long, env = "IMAP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Connect over plain TCP instead of TLS [env: IMAP_TLS=false]
    #[arg(long)]
    no_tls: bool,

    /// Accept any TLS certificate (self-signed servers) [env: IMAP_INSECURE]
    #[arg(long)]
    insecure: bool,

    /// Network timeout in seconds [env: IMAP_TIMEOUT] [default: 30]
    #[arg(long)]
    timeout: Option<u64>,

    /// Folder to back up
    #[arg(long, default_value = "INBOX")]
    folder: String,

    /// Directory the .eml files are written to
    #[arg(long, default_value = EmlStore::DEFAULT_DIR)]
    output: PathBuf,

    /// Prefix file names with the message UID so none collide
    #[arg(long)]
    with_id: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    tokio::select! {
        result = run(&args) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\nTerminated by user");
            ExitCode::SUCCESS
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let mut config = ImapConfig::from_parts(
        args.server.clone(),
        args.port,
        args.username.clone(),
        args.password.clone(),
    )?;
    config.apply_env_overrides()?;
    if args.no_tls {
        config.use_tls = false;
    }
    if args.insecure {
        config.accept_invalid_certs = true;
    }
    if let Some(timeout) = args.timeout {
        config.set_timeout_secs(timeout)?;
    }

    let naming = if args.with_id {
        NamingScheme::IdSenderSubject
    } else {
        NamingScheme::SenderSubject
    };
    let store = EmlStore::new(&args.output).with_naming(naming);
    let folder = Folder::from(args.folder.as_str());

    let mut client = ImapClient::new(config);
    let report = run_backup(&mut client, &store, &folder).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &store);
    }

    Ok(())
}

fn print_summary(report: &BackupReport, store: &EmlStore) {
    println!(
        "{} message(s) in folder, {} saved, {} already backed up",
        report.listed, report.written, report.skipped
    );
    println!("Backup directory: {}", store.dir().display());
}
