use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{debug, LevelFilter};
use rand::Rng;
use shufflecipher_core::{
    derive_rng, random_modest_config, random_wide_config, secure_rng, CipherConfig,
    DisplacementMode, MetaCipherConfig, ModestRandomParams, OperationMode, OutputFormat,
    TransformOutput, WideRandomParams,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "shufflecipher",
    author,
    version,
    about = "ShuffleCipher CLI (experimental, not for serious use)"
)]
struct Cli {
    #[arg(long, global = true)]
    debug: bool,
    /// JSON cipher profile; built-in defaults are used when absent.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "TEXT")]
    key: Option<String>,
    #[arg(long, global = true, value_enum)]
    mode: Option<ModeArg>,
    #[arg(long, global = true, value_enum)]
    format: Option<FormatArg>,
    #[arg(long, global = true, value_enum)]
    disp_mode: Option<DispModeArg>,
    #[arg(long, global = true, value_name = "N")]
    disp_const: Option<i64>,
    #[arg(long, global = true, value_name = "N")]
    disp_mask: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Continuous,
    Single,
    SingleWithLastIv,
    SingleWithRandomIv,
}

impl From<ModeArg> for OperationMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Continuous => OperationMode::Continuous,
            ModeArg::Single => OperationMode::Single,
            ModeArg::SingleWithLastIv => OperationMode::SingleWithLastIv,
            ModeArg::SingleWithRandomIv => OperationMode::SingleWithRandomIv,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Text,
    Values,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Values => OutputFormat::Values,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DispModeArg {
    TruncatedBinary,
    Binary,
    Constant,
    SeparateMetacipher,
}

impl From<DispModeArg> for DisplacementMode {
    fn from(arg: DispModeArg) -> Self {
        match arg {
            DispModeArg::TruncatedBinary => DisplacementMode::TruncatedBinary,
            DispModeArg::Binary => DisplacementMode::Binary,
            DispModeArg::Constant => DisplacementMode::Constant,
            DispModeArg::SeparateMetacipher => DisplacementMode::SeparateMetaCipher,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a message. With --iv (symbol text) the state is reset and
    /// the IV applied before encrypting.
    Encrypt {
        #[arg(long, value_name = "TEXT")]
        message: String,
        #[arg(long, value_name = "TEXT")]
        iv: Option<String>,
    },
    /// Decrypt a message produced by `encrypt`.
    Decrypt {
        #[arg(long, value_name = "TEXT")]
        message: String,
        #[arg(long, value_name = "TEXT")]
        iv: Option<String>,
    },
    /// Write a profile with freshly randomized metacipher configurations.
    GenConfig {
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
        /// Draw extra random main offsets instead of the modest pair.
        #[arg(long)]
        wide: bool,
        /// Deterministic draw label; OS entropy when absent.
        #[arg(long, value_name = "TEXT")]
        seed: Option<String>,
    },
    /// Run an encrypt/decrypt round trip inline.
    Demo {
        #[arg(long, default_value = "the quick brown fox jumps over the lazy dog.")]
        message: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    match &cli.command {
        Commands::Encrypt { message, iv } => cmd_transform(&cli, message, iv.as_deref(), true),
        Commands::Decrypt { message, iv } => cmd_transform(&cli, message, iv.as_deref(), false),
        Commands::GenConfig { out, wide, seed } => {
            cmd_gen_config(&cli, out, *wide, seed.as_deref())
        }
        Commands::Demo { message } => cmd_demo(&cli, message),
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default));
    builder.format_timestamp(None);
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn resolve_config(cli: &Cli) -> Result<CipherConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CipherConfig::default(),
    };
    if let Some(key) = &cli.key {
        config.key = key.clone();
    }
    if let Some(mode) = cli.mode {
        config.operation_mode = mode.into();
    }
    if let Some(format) = cli.format {
        config.output_format = format.into();
    }
    if let Some(mode) = cli.disp_mode {
        config.displacement.mode = mode.into();
    }
    if let Some(constant) = cli.disp_const {
        config.displacement.constant = constant;
    }
    if let Some(mask) = cli.disp_mask {
        config.displacement.mask = mask;
    }
    Ok(config)
}

fn cmd_transform(cli: &Cli, message: &str, iv: Option<&str>, encrypting: bool) -> Result<()> {
    let mut config = resolve_config(cli)?;
    if iv.is_some() && cli.mode.is_none() {
        // An explicit IV only survives the mode controller when the mode
        // re-applies it; pick that unless the caller chose otherwise.
        config.operation_mode = OperationMode::SingleWithLastIv;
    }
    let mut cipher = config.build().context("building cipher from profile")?;
    if let Some(iv_text) = iv {
        cipher
            .apply_iv_text(iv_text)
            .context("applying initialization vector")?;
    }
    debug!(
        "{} {} symbols, mode {:?}",
        if encrypting { "encrypting" } else { "decrypting" },
        message.chars().count(),
        cipher.operation_mode()
    );
    let output = if encrypting {
        cipher.encrypt_text(message)
    } else {
        cipher.decrypt_text(message)
    };
    print_output(output);
    Ok(())
}

fn cmd_gen_config(cli: &Cli, out: &Path, wide: bool, seed: Option<&str>) -> Result<()> {
    let mut config = resolve_config(cli)?;
    let (metacipher, offsets) = match seed {
        Some(label) => draw_pair(wide, &mut derive_rng(label.as_bytes())),
        None => draw_pair(wide, &mut secure_rng()),
    };
    config.metacipher = metacipher;
    config.offset_metacipher = offsets;
    save_json(out, "cipher profile", &config)?;
    println!(
        "Wrote {} profile with {} metacipher entries to {}",
        if wide { "wide" } else { "modest" },
        config.metacipher.len(),
        out.display()
    );
    Ok(())
}

fn draw_pair<R: Rng + ?Sized>(wide: bool, rng: &mut R) -> (MetaCipherConfig, MetaCipherConfig) {
    if wide {
        let params = WideRandomParams::default();
        (
            random_wide_config(&params, rng),
            random_wide_config(&params, rng),
        )
    } else {
        let params = ModestRandomParams::default();
        (
            random_modest_config(&params, rng),
            random_modest_config(&params, rng),
        )
    }
}

fn cmd_demo(cli: &Cli, message: &str) -> Result<()> {
    let mut config = resolve_config(cli)?;
    config.output_format = OutputFormat::Text;
    let mut encoder = config.build().context("building cipher from profile")?;
    let mut decoder = encoder.clone();
    println!("key      : {}", config.key);
    println!("plaintext: {message}");
    let ciphertext = encoder
        .encrypt_text(message)
        .into_text()
        .expect("text output format");
    println!("encrypted: {ciphertext}");
    let recovered = decoder
        .decrypt_text(&ciphertext)
        .into_text()
        .expect("text output format");
    println!("decrypted: {recovered}");
    Ok(())
}

fn print_output(output: TransformOutput) {
    match output {
        TransformOutput::Text(text) => println!("{text}"),
        TransformOutput::Values(values) => println!("{values:?}"),
    }
}

fn load_config(path: &Path) -> Result<CipherConfig> {
    let data =
        fs::read(path).with_context(|| format!("reading profile from {}", path.display()))?;
    let config =
        serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

fn save_json<T: serde::Serialize>(path: &Path, label: &str, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)
        .with_context(|| format!("writing {} to {}", label, path.display()))?;
    Ok(())
}
