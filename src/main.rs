use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thumbnail_generator::app::App;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "thumbnail-generator")]
#[command(about = "Generate styled YouTube thumbnail suggestions")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the web page and HTTP API.
    Serve {
        /// Address to bind, overriding BIND_ADDR.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Generate one batch and print it as JSON.
    Generate {
        #[arg(long)]
        title: String,
        #[arg(long)]
        keywords: String,
        /// Gemini API key; defaults to GEMINI_API_KEY.
        #[arg(long)]
        api_key: Option<String>,
        /// Also export every card as PNG into this directory.
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Rasterize a saved batch into PNG files.
    Render {
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
    },
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Serve { bind } => app.serve(bind.as_deref()).await?,
        Command::Generate {
            title,
            keywords,
            api_key,
            out,
        } => {
            let batch = app
                .generate(&title, &keywords, api_key.as_deref(), out.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&batch)?);
        }
        Command::Render { input, out } => {
            let count = app.render_file(&input, &out).await?;
            info!("Rendered {} cards into {}", count, out.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thumbnail_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    match App::new() {
        Ok(app) => match run(&app, args.command).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Command failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_args() {
        let args = CliArgs::try_parse_from([
            "thumbnail-generator",
            "generate",
            "--title",
            "유튜브 조회수 늘리는 방법",
            "--keywords",
            "유튜브, 조회수",
            "--out",
            "cards",
        ])
        .unwrap();

        match args.command {
            Command::Generate {
                title,
                api_key,
                out,
                ..
            } => {
                assert_eq!(title, "유튜브 조회수 늘리는 방법");
                assert!(api_key.is_none());
                assert_eq!(out, Some(PathBuf::from("cards")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_generate_requires_title() {
        let err = CliArgs::try_parse_from(["thumbnail-generator", "generate", "--keywords", "k"])
            .unwrap_err();
        assert!(err.to_string().contains("--title"));
    }
}
