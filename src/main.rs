use anyhow::Result;
use clap::Parser;
use image_uploads::app::App;
use image_uploads::models::{Config, THUMBNAILS_SUBDIR};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "image-uploads")]
#[command(about = "Store an image upload and its thumbnail")]
struct CliArgs {
    /// Image file to store.
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// MIME type of the file (`image/png` or `image/jpeg`). Sniffed when omitted.
    #[arg(long)]
    content_type: Option<String>,

    /// Directory for originals. Overrides UPLOADS_DIR.
    #[arg(long, value_name = "DIR")]
    uploads_dir: Option<PathBuf>,

    /// Directory for thumbnails. Overrides THUMBNAILS_DIR.
    #[arg(long, value_name = "DIR")]
    thumbnails_dir: Option<PathBuf>,

    /// Treat any content type other than image/png as JPEG.
    #[arg(long)]
    jpeg_fallback: bool,

    /// Print the stored upload as JSON instead of just the filename.
    #[arg(long)]
    json: bool,
}

impl CliArgs {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.uploads_dir {
            // Thumbnails move along only while they still sit in the default
            // subdirectory; an explicit THUMBNAILS_DIR stays put.
            if config.thumbnails_dir == config.uploads_dir.join(THUMBNAILS_SUBDIR) {
                config.thumbnails_dir = dir.join(THUMBNAILS_SUBDIR);
            }
            config.uploads_dir = dir.clone();
        }
        if let Some(dir) = &self.thumbnails_dir {
            config.thumbnails_dir = dir.clone();
        }
        config.jpeg_fallback |= self.jpeg_fallback;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_uploads=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => args.apply(config),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app = App::new(&config);
    match app.run(&args.file, args.content_type.as_deref()).await {
        Ok(stored) => {
            info!("Upload stored as {}", stored.filename);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stored)?);
            } else {
                println!("{}", stored.filename);
            }
            Ok(())
        }
        Err(e) => {
            match &e.filename {
                Some(filename) => error!("Upload {} failed: {}", filename, e),
                None => error!("Upload failed: {}", e),
            }
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = CliArgs::try_parse_from(["image-uploads", "cat.png"]).unwrap();

        assert_eq!(args.file, PathBuf::from("cat.png"));
        assert!(args.content_type.is_none());
        assert_eq!(args.apply(Config::default()), Config::default());
    }

    #[test]
    fn test_cli_uploads_dir_moves_thumbnails() {
        let args =
            CliArgs::try_parse_from(["image-uploads", "cat.png", "--uploads-dir", "/srv/up"])
                .unwrap();

        let config = args.apply(Config::default());
        assert_eq!(config.uploads_dir, PathBuf::from("/srv/up"));
        assert_eq!(config.thumbnails_dir, PathBuf::from("/srv/up/thumbnails"));
    }

    #[test]
    fn test_cli_uploads_dir_keeps_configured_thumbnails() {
        let args =
            CliArgs::try_parse_from(["image-uploads", "cat.png", "--uploads-dir", "/srv/up"])
                .unwrap();
        let from_env = Config {
            uploads_dir: PathBuf::from("/var/uploads"),
            thumbnails_dir: PathBuf::from("/var/thumbs"),
            jpeg_fallback: false,
        };

        let config = args.apply(from_env);
        assert_eq!(config.uploads_dir, PathBuf::from("/srv/up"));
        assert_eq!(config.thumbnails_dir, PathBuf::from("/var/thumbs"));
    }

    #[test]
    fn test_cli_overrides() {
        let args = CliArgs::try_parse_from([
            "image-uploads",
            "cat.jpg",
            "--content-type",
            "image/jpeg",
            "--thumbnails-dir",
            "/srv/thumbs",
            "--jpeg-fallback",
            "--json",
        ])
        .unwrap();

        assert_eq!(args.content_type.as_deref(), Some("image/jpeg"));
        assert!(args.json);

        let config = args.apply(Config::default());
        assert_eq!(config.thumbnails_dir, PathBuf::from("/srv/thumbs"));
        assert!(config.jpeg_fallback);
    }

    #[test]
    fn test_cli_requires_file() {
        assert!(CliArgs::try_parse_from(["image-uploads"]).is_err());
    }
}
