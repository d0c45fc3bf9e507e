use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use family_stylizer::config::BackendKind;
use family_stylizer::upload::{extension_for, validate_size};
use family_stylizer::{build_backend, Config, GenerationRequest, Style};

#[derive(Parser, Debug)]
#[command(name = "stylizectl", about = "CLI for the family stylizer backends", version)]
struct Cli {
    /// Override BACKEND (comfyui, a1111, hosted)
    #[arg(global = true, long)]
    backend: Option<BackendKind>,

    /// Override the active backend's base URL
    #[arg(global = true, long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stylize one image with the configured backend
    Generate {
        /// Source photo
        #[arg(long, value_name = "PATH")]
        image: PathBuf,
        /// Style preset; unknown values fall back to anime
        #[arg(long, default_value = "anime")]
        style: String,
        /// Output path (defaults to ./<stem>-<style>.png)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Query the backend's health endpoint
    Health,
    /// List style presets and their prompts
    Styles,
}

fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "image/png",
    }
}

fn default_out(image: &Path, style: Style) -> PathBuf {
    let stem = image.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
    PathBuf::from(format!("{}-{}.png", stem, style))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Load env and parse CLI
    Config::dotenv_load();
    let cli = Cli::parse();

    let mut conf = Config::new()?;
    if let Some(kind) = cli.backend {
        conf.backend = kind;
    }
    if let Some(url) = cli.url {
        match conf.backend {
            BackendKind::ComfyUI => conf.comfyui_url = url,
            BackendKind::A1111 => conf.a1111_url = url,
            BackendKind::Hosted => conf.hosted_api_url = url,
        }
    }

    match cli.command {
        Commands::Generate { image, style, out } => {
            let style = Style::from_field(&style);
            let len = tokio::fs::metadata(&image).await?.len();
            validate_size(usize::try_from(len).unwrap_or(usize::MAX))?;

            let original = image.file_name().and_then(|n| n.to_str());
            let ext = extension_for(original);
            let request = GenerationRequest {
                image_path: image.clone(),
                file_name: format!("stylizectl-{}.{}", uuid::Uuid::new_v4(), ext),
                content_type: content_type_for(&ext).to_string(),
                style,
            };

            let backend = build_backend(&conf);
            eprintln!("Generating {} with {} at {}", style, backend.name(), backend.base_url());
            let result = backend.generate(&request).await?;
            let path = out.unwrap_or_else(|| default_out(&image, style));
            tokio::fs::write(&path, &result).await?;
            println!("Saved {} ({} bytes)", path.display(), result.len());
            Ok(())
        }
        Commands::Health => {
            let backend = build_backend(&conf);
            match backend.health().await {
                Ok(info) => {
                    println!("{}", serde_json::to_string_pretty(&info)?);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Error: {} at {} is unavailable: {}", backend.name(), backend.base_url(), e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Styles => {
            for style in Style::ALL {
                let prompt = style.prompt();
                println!("{}", style);
                println!("  positive:    {}", prompt.positive);
                println!("  negative:    {}", prompt.negative);
                println!("  instruction: {}", prompt.instruction);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_uses_stem_and_style() {
        assert_eq!(default_out(Path::new("/tmp/kids.jpg"), Style::Cartoon), PathBuf::from("kids-cartoon.png"));
    }

    #[test]
    fn content_types_match_extensions() {
        assert_eq!(content_type_for("jpg"), "image/jpeg");
        assert_eq!(content_type_for("png"), "image/png");
        assert_eq!(content_type_for("heic"), "image/png");
    }
}
