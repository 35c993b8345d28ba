use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use diplom_ai::config::Config;
use diplom_ai::outline::{self, Profile};
use diplom_ai::validation::{DocumentInput, GenerateRequest};
use diplom_ai::{Assembler, Pipeline, TemplateComposer};

/// Thesis outline generator and DOCX renderer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Override the bind address, e.g. 0.0.0.0:8000
        #[arg(long)]
        bind: Option<std::net::SocketAddr>,
    },
    /// Print the outline stream for a topic as NDJSON
    Outline {
        topic: String,
        /// Emit all items without pauses
        #[arg(long)]
        no_delay: bool,
    },
    /// Render a document request (JSON) into a .docx file
    Render {
        #[arg(long, short)]
        input: PathBuf,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List the table-of-contents skeleton of every profile
    Profiles,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Logs go to stderr so `outline` output stays clean NDJSON
    tracing_subscriber::fmt()
        .with_env_filter(config.runtime.log_level.as_str())
        .with_writer(std::io::stderr)
        .init();

    match args.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            info!(
                "Pacing: {}ms after goals, {}ms after tasks",
                config.pipeline.goal_delay_ms, config.pipeline.task_delay_ms
            );
            diplom_ai::http::start_http_server(config, Arc::new(TemplateComposer)).await
        }
        Command::Outline { topic, no_delay } => {
            let topic = GenerateRequest::new(topic).validate()?;
            let pacing = if no_delay {
                diplom_ai::Pacing::none()
            } else {
                config.pipeline.pacing()
            };
            let shutdown = CancellationToken::new();
            let pipeline = Pipeline::new(Arc::new(TemplateComposer), pacing)
                .with_shutdown(shutdown.clone());
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    shutdown.cancel();
                }
            });

            let mut run = pipeline.run(topic);
            let mut stdout = std::io::stdout();
            while let Some(record) = run.next().await {
                stdout.write_all(record.to_line()?.as_bytes())?;
                stdout.flush()?;
            }
            Ok(())
        }
        Command::Render { input, output } => {
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let request = serde_json::from_str::<DocumentInput>(&raw)?.validate()?;
            let bytes = Assembler::new(config.document.work_label.clone()).assemble(&request)?;
            let output = output.unwrap_or_else(|| PathBuf::from(&config.document.filename));
            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote {} ({} bytes)", output.display(), bytes.len());
            Ok(())
        }
        Command::Profiles => {
            for profile in Profile::ALL {
                println!("{}:", profile);
                for section in outline::resolve(profile).iter() {
                    println!("  {}", section);
                }
            }
            Ok(())
        }
    }
}
