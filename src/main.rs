use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dara_gateway::api::{ApiServer, ApiState};
use dara_gateway::intent::normalize_language_code;
use dara_gateway::Config;

/// Dára - multilingual voice command gateway
#[derive(Parser)]
#[command(name = "dara", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Port to listen on (overrides `DARA_PORT`)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (overrides `DARA_HOST`)
        #[arg(long)]
        host: Option<String>,
    },
    /// Run the full pipeline on a local audio file and print the result
    Process {
        /// Audio file (wav, mp3, m4a, ogg, webm, flac)
        file: PathBuf,

        /// Write the reply audio here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Classify a transcript and print the intent
    Classify {
        /// Transcript text
        text: String,

        /// Language code of the transcript
        #[arg(short, long, default_value = "en")]
        language: String,
    },
    /// Synthesize speech for a reply
    Synthesize {
        /// Text to speak
        text: String,

        /// Language code selecting the voice
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Output MP3 file
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity; RUST_LOG wins when set
    let filter = match cli.verbose {
        0 => "info,dara_gateway=info",
        1 => "info,dara_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    match cli.command.unwrap_or(Command::Serve {
        port: None,
        host: None,
    }) {
        Command::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            serve(&config).await
        }
        Command::Process { file, out } => process(&config, &file, out.as_deref()).await,
        Command::Classify { text, language } => classify(&config, &text, &language).await,
        Command::Synthesize {
            text,
            language,
            out,
        } => synthesize(&config, &text, &language, &out).await,
    }
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let addr = config.server.addr()?;
    tracing::info!(
        %addr,
        normalizer = ?config.audio.normalizer,
        stt = ?config.stt.provider,
        reasoning = ?config.reasoning.provider,
        tts = ?config.tts.provider,
        "starting dara gateway"
    );

    let state = ApiState::from_config(config)?;
    let server = ApiServer::new(state, addr).spawn();

    tokio::select! {
        result = server => {
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

async fn process(config: &Config, file: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let audio = tokio::fs::read(file).await?;
    let pipeline = config.build_pipeline()?;
    let filename = file.file_name().and_then(|n| n.to_str());

    let outcome = pipeline.run(&audio, filename, None).await?;

    if let Some(out) = out {
        tokio::fs::write(out, &outcome.response.response_audio).await?;
        tracing::info!(
            path = %out.display(),
            bytes = outcome.response.response_audio.len(),
            "wrote reply audio"
        );
    }

    let report = serde_json::json!({
        "transcript": outcome.response.transcript,
        "language": outcome.response.language,
        "intent": outcome.response.intent,
        "classification": outcome.classification,
        "response_audio_bytes": outcome.response.response_audio.len(),
        "timings_ms": outcome.timings,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn classify(config: &Config, text: &str, language: &str) -> anyhow::Result<()> {
    let classifier = config.build_classifier();
    let result = classifier
        .classify_with_outcome(text, &normalize_language_code(language))
        .await;

    tracing::info!(outcome = ?result.outcome, "classification finished");
    println!("{}", serde_json::to_string_pretty(&result.intent)?);
    Ok(())
}

async fn synthesize(config: &Config, text: &str, language: &str, out: &Path) -> anyhow::Result<()> {
    let synthesizer = config.build_synthesizer()?;
    if !synthesizer.is_available() {
        anyhow::bail!("no TTS provider configured");
    }

    let audio = synthesizer
        .synthesize(text, &normalize_language_code(language))
        .await;
    if audio.is_empty() {
        anyhow::bail!("speech synthesis produced no audio");
    }

    tokio::fs::write(out, &audio).await?;
    println!("wrote {} bytes to {}", audio.len(), out.display());
    Ok(())
}
