//! CLI for Vehicle Swap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use vehicle_swap::config::{parse_addr, AppConfig, DEFAULT_LISTEN_ADDR, DEFAULT_UPLOAD_LIMIT_BYTES};
use vehicle_swap::image::resolve_api_key;
use vehicle_swap::{DiskFile, EditForm, GeminiModel, ImageEditor, RequestStatus};

#[derive(Parser)]
#[command(name = "vehicle-swap")]
#[command(about = "Replace the vehicle in a photo using Gemini image editing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gemini API key (falls back to GOOGLE_API_KEY)
    #[arg(long, env = "API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Gemini model
    #[arg(long, value_enum, default_value = "flash", global = true)]
    model: ModelArg,

    /// Override the Gemini API root
    #[arg(long, env = "GEMINI_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web UI
    Serve(ServeArgs),

    /// Edit one image from disk
    Edit(EditArgs),

    /// Check that the API key and model are usable
    Check,
}

#[derive(Args)]
struct ServeArgs {
    /// Listen address (":8080" binds all interfaces)
    #[arg(long, env = "VEHICLE_SWAP_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    addr: String,

    /// Largest accepted upload in megabytes
    #[arg(long, default_value_t = DEFAULT_UPLOAD_LIMIT_BYTES / (1024 * 1024))]
    upload_limit_mb: usize,
}

#[derive(Args)]
struct EditArgs {
    /// Original photo (PNG, JPEG or WEBP)
    input: PathBuf,

    /// Description of the new vehicle
    vehicle: String,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Flash,
    Pro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiModel::NanoBanana,
            ModelArg::Pro => GeminiModel::NanoBananaPro,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Missing credentials stop the process before anything else runs
    let mut config = AppConfig::new(resolve_api_key(cli.api_key.clone())?)?;
    config.model = cli.model.into();
    config.base_url = cli.base_url.clone();

    match cli.command {
        Commands::Serve(args) => {
            config.listen_addr = parse_addr(&args.addr)?;
            config.upload_limit_bytes = args.upload_limit_mb * 1024 * 1024;
            vehicle_swap::server::serve(&config).await?;
        }
        Commands::Edit(args) => {
            edit_image(&config, args, cli.json).await?;
        }
        Commands::Check => {
            let editor = config.editor()?;
            editor.health_check().await?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "ok": true,
                        "model": editor.model(),
                    }))?
                );
            } else {
                println!("OK: {} is reachable", editor.model());
            }
        }
    }

    Ok(())
}

async fn edit_image(config: &AppConfig, args: EditArgs, json_output: bool) -> anyhow::Result<()> {
    let editor = config.editor()?;

    let mut form = EditForm::new();
    form.select_image(Arc::new(DiskFile::open(&args.input)?))
        .await?;
    form.set_prompt(args.vehicle);
    form.submit(&editor).await?;

    let image = match form.status() {
        RequestStatus::Success(image) => image,
        RequestStatus::Error(message) => anyhow::bail!("{message}"),
        other => anyhow::bail!("unexpected form state after submit: {other:?}"),
    };

    let size = image.save(&args.output)?;

    if json_output {
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "output": args.output.display().to_string(),
            "size_bytes": size,
            "mime_type": image.image.mime_type,
            "model": image.metadata.model,
            "duration_ms": image.metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated image: {} ({} bytes) via {}",
            args.output.display(),
            size,
            editor.model()
        );
        if let Some(duration) = image.metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(())
}
