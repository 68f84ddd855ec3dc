use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, ensure, Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use solana_sdk::signature::Signer;
use solana_sdk::signer::keypair::read_keypair_file;
use token_forge::{
    format_sol, ImageFile, MintSession, MinterConfig, ProgressStatus, SubmissionError,
    SubmissionForm, SubmissionSequencer, UploadProgress,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const DEFAULT_LOG_DIRECTIVE: &str = "warn";
const DEFAULT_NAME: &str = "Forge Demo";
const DEFAULT_SYMBOL: &str = "FORGE";
const DEFAULT_SUPPLY: &str = "1000000";
const DEFAULT_DECIMALS: &str = "9";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_example_tracing();

    let args = ExampleArgs::from_env()?;
    let config = MinterConfig::from_env()?;
    let wallet = read_keypair_file(&args.keypair_path)
        .map_err(|err| anyhow!("failed to read keypair {}: {err}", args.keypair_path.display()))?;

    let form = args.to_form(config.max_image_bytes())?;
    let request = form.validate(config.max_image_bytes())?;

    let bar = build_progress_bar();
    bar.println(format!(
        "Minting {} ({}) from {} on {}",
        request.name(),
        request.symbol(),
        wallet.pubkey(),
        config.rpc_url()
    ));
    for (label, lamports) in config.fees().breakdown(request.revocation()) {
        bar.println(format!("  {label:<24} {} SOL", format_sol(lamports)));
    }
    bar.println(format!(
        "  {:<24} {} SOL",
        "Total",
        format_sol(config.fees().total(request.revocation()))
    ));

    let session = MintSession::from_config(&config)?.with_wallet(Arc::new(wallet));
    let sequencer = SubmissionSequencer::new(session, config);
    let mirror = spawn_progress_mirror(sequencer.subscribe(), bar.clone());

    let outcome = sequencer.submit(&request).await;
    drop(sequencer);
    let _ = mirror.await;

    match outcome {
        Ok(token) => {
            bar.finish_with_message("done");
            println!("mint:           {}", token.mint);
            println!("token account:  {}", token.token_account);
            println!("metadata:       {}", token.metadata_uri);
            println!("fee tx:         {}", token.fee_signature);
            println!("mint tx:        {}", token.mint_signature);
            println!("metadata tx:    {}", token.metadata_signature);
            if let Some(signature) = token.revocation_signature {
                println!("revocation tx:  {signature}");
            }
            Ok(())
        }
        Err(SubmissionError::Revocation { token, source }) => {
            bar.abandon_with_message("authority revocation failed");
            println!("mint {} was created but still holds its authorities", token.mint);
            Err(source.into())
        }
        Err(err) => {
            bar.abandon_with_message("submission failed");
            Err(err.into())
        }
    }
}

fn init_example_tracing() {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", DEFAULT_LOG_DIRECTIVE);
    }
    token_forge::init_tracing();
}

fn build_progress_bar() -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::stdout_with_hz(12));
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=>-");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Copies every progress update onto the bar until the sequencer is dropped.
fn spawn_progress_mirror(
    mut receiver: watch::Receiver<UploadProgress>,
    bar: ProgressBar,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while receiver.changed().await.is_ok() {
            let state = receiver.borrow_and_update().clone();
            bar.set_position(u64::from(state.progress));
            let message = match (state.status, state.error) {
                (ProgressStatus::Error, Some(error)) => format!("{} ({error})", state.message),
                _ => state.message,
            };
            bar.set_message(message);
        }
    })
}

struct ExampleArgs {
    keypair_path: PathBuf,
    image_path: PathBuf,
    name: String,
    symbol: String,
    supply: String,
    decimals: String,
    description: String,
    revoke_mint: bool,
    revoke_freeze: bool,
}

impl ExampleArgs {
    fn from_env() -> Result<Self> {
        let default_keypair = env::var("HOME")
            .map(|home| format!("{home}/.config/solana/id.json"))
            .unwrap_or_else(|_| "id.json".to_owned());
        let keypair_path = PathBuf::from(read_env_or_default(
            "TOKEN_FORGE_KEYPAIR",
            &default_keypair,
        ));
        let image_path = env::args()
            .nth(1)
            .or_else(|| env::var("TOKEN_FORGE_IMAGE").ok())
            .map(PathBuf::from)
            .context("pass an image path as the first argument or set TOKEN_FORGE_IMAGE")?;

        let revoke_mint = parse_env_with_default::<bool>("TOKEN_FORGE_REVOKE_MINT", false)?;
        let revoke_freeze = parse_env_with_default::<bool>("TOKEN_FORGE_REVOKE_FREEZE", false)?;

        ensure!(
            image_path.is_file(),
            "image {} does not exist",
            image_path.display()
        );

        Ok(Self {
            keypair_path,
            image_path,
            name: read_env_or_default("TOKEN_FORGE_NAME", DEFAULT_NAME),
            symbol: read_env_or_default("TOKEN_FORGE_SYMBOL", DEFAULT_SYMBOL),
            supply: read_env_or_default("TOKEN_FORGE_SUPPLY", DEFAULT_SUPPLY),
            decimals: read_env_or_default("TOKEN_FORGE_DECIMALS", DEFAULT_DECIMALS),
            description: read_env_or_default("TOKEN_FORGE_DESCRIPTION", ""),
            revoke_mint,
            revoke_freeze,
        })
    }

    fn to_form(&self, max_image_bytes: usize) -> Result<SubmissionForm> {
        let bytes = std::fs::read(&self.image_path)
            .with_context(|| format!("failed to read {}", self.image_path.display()))?;
        let file_name = self
            .image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_owned());

        let mut form = SubmissionForm {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            initial_supply: self.supply.clone(),
            decimals: self.decimals.clone(),
            description: self.description.clone(),
            revoke_mint_authority: self.revoke_mint,
            revoke_freeze_authority: self.revoke_freeze,
            ..SubmissionForm::default()
        };
        form.select_image(
            ImageFile::new(file_name, content_type_for(&self.image_path), bytes),
            max_image_bytes,
        )?;
        Ok(form)
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn read_env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

fn parse_env_with_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("failed to parse {key}='{value}'")),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("failed to read {key}")),
    }
}
