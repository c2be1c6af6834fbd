mod display;
mod page;
mod server;

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use neuropredict_ai::InferenceEngine;
use neuropredict_chat::{ChatClient, ChatConfig};
use neuropredict_core::{RawValue, Submission, find, format, readable_input};

#[derive(Parser)]
#[command(name = "neuropredict", version, about = "Alzheimer's disease risk assessment")]
struct Cli {
    /// Path to the model manifest.
    #[arg(
        long,
        global = true,
        env = "NEUROPREDICT_MODEL",
        default_value = "models/alzheimers_model.json"
    )]
    model: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the assessment page and JSON API.
    Serve {
        #[arg(long, env = "NEUROPREDICT_BIND", default_value = "127.0.0.1:8050")]
        bind: SocketAddr,

        #[command(flatten)]
        chat: ChatArgs,
    },
    /// Score one patient record from a JSON file and/or NAME=VALUE pairs.
    Predict {
        /// JSON object mapping feature names to values.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Override one feature, e.g. `--set Age=72 --set Gender=Female`.
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
    /// Print the feature schema.
    Schema,
}

#[derive(Args)]
struct ChatArgs {
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "NEUROPREDICT_CHAT_MODEL", default_value = neuropredict_chat::http::DEFAULT_MODEL)]
    chat_model: String,

    #[arg(long, env = "NEUROPREDICT_CHAT_TIMEOUT_SECS", default_value_t = 30)]
    chat_timeout_secs: u64,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing feature name in '{s}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Interpret a textual value for `name`: option labels become their codes,
/// numbers stay numbers, anything else is passed through as text.
fn parse_value(name: &str, value: &str) -> RawValue {
    if value.is_empty() {
        return RawValue::Null;
    }
    if let Some(code) = find(name).and_then(|spec| spec.encode_label(value)) {
        return RawValue::Number(code as f64);
    }
    match value.parse::<f64>() {
        Ok(n) => RawValue::Number(n),
        Err(_) => RawValue::Text(value.to_string()),
    }
}

/// Defaults, overlaid by the JSON file, overlaid by `--set` pairs.
fn build_submission(input: Option<&Path>, set: &[(String, String)]) -> anyhow::Result<Submission> {
    let mut submission = Submission::defaults();

    if let Some(path) = input {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let entries: BTreeMap<String, RawValue> = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        for (name, value) in entries {
            let value = match value {
                RawValue::Text(s) => parse_value(&name, s.trim()),
                other => other,
            };
            submission.set(&name, value);
        }
    }

    for (name, value) in set {
        submission.set(name, parse_value(name, value));
    }
    Ok(submission)
}

async fn serve(engine: InferenceEngine, bind: SocketAddr, chat: ChatArgs) -> anyhow::Result<()> {
    let chat = ChatClient::new(ChatConfig {
        api_key: chat.api_key,
        model: chat.chat_model,
        timeout: Duration::from_secs(chat.chat_timeout_secs),
        ..ChatConfig::default()
    })?;
    if !chat.is_configured() {
        tracing::warn!("GOOGLE_API_KEY not set, chat replies will report the missing key");
    }

    let app = server::router(server::AppState {
        engine: Arc::new(engine),
        chat: Arc::new(chat),
    });

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!("listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn predict(
    engine: &InferenceEngine,
    input: Option<&Path>,
    set: &[(String, String)],
) -> anyhow::Result<()> {
    if let Some(reason) = engine.unavailable_reason() {
        bail!("model not loaded: {reason}");
    }

    let submission = build_submission(input, set)?;
    let encoded = engine.normalize(&submission)?;
    let result = engine.predict(&encoded)?;

    display::print_assessment(&readable_input(&submission), &format(&result), encoded.filled());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("neuropredict v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { bind, chat } => serve(InferenceEngine::load(&cli.model), bind, chat).await,
        Command::Predict { input, set } => {
            predict(&InferenceEngine::load(&cli.model), input.as_deref(), &set)
        }
        Command::Schema => {
            display::print_schema();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_assignments() {
        assert_eq!(
            parse_assignment("Age=72").unwrap(),
            ("Age".to_string(), "72".to_string())
        );
        assert_eq!(
            parse_assignment(" Gender = Female ").unwrap(),
            ("Gender".to_string(), "Female".to_string())
        );
        assert!(parse_assignment("Age").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn option_labels_become_codes() {
        assert_eq!(parse_value("Gender", "Female"), RawValue::Number(1.0));
        assert_eq!(parse_value("Smoking", "Yes"), RawValue::Number(1.0));
        assert_eq!(parse_value("Age", "72.5"), RawValue::Number(72.5));
        assert_eq!(parse_value("Age", ""), RawValue::Null);
        assert_eq!(parse_value("Gender", "Unknown"), RawValue::Text("Unknown".into()));
    }

    #[test]
    fn set_overrides_defaults() {
        let set = vec![
            ("Age".to_string(), "81".to_string()),
            ("Gender".to_string(), "Female".to_string()),
        ];
        let sub = build_submission(None, &set).unwrap();
        assert_eq!(sub.get("Age"), Some(&RawValue::Number(81.0)));
        assert_eq!(sub.get("Gender"), Some(&RawValue::Number(1.0)));
        assert_eq!(sub.len(), Submission::defaults().len());
    }

    #[test]
    fn json_input_then_set() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("patient.json");
        std::fs::write(&path, r#"{"Age": 66, "Ethnicity": "Asian", "MMSE": null}"#).unwrap();

        let set = vec![("Age".to_string(), "67".to_string())];
        let sub = build_submission(Some(&path), &set).unwrap();

        assert_eq!(sub.get("Age"), Some(&RawValue::Number(67.0)));
        assert_eq!(sub.get("Ethnicity"), Some(&RawValue::Number(2.0)));
        assert_eq!(sub.get("MMSE"), Some(&RawValue::Null));
    }

    #[test]
    fn unreadable_input_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("absent.json");
        assert!(build_submission(Some(&missing), &[]).is_err());

        let bad = tmp.path().join("bad.json");
        std::fs::write(&bad, "[1, 2, 3]").unwrap();
        let err = build_submission(Some(&bad), &[]).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }

    #[test]
    fn serve_subcommand_reads_flags() {
        let cli = Cli::try_parse_from([
            "neuropredict",
            "--model",
            "m.json",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--chat-timeout-secs",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.model, PathBuf::from("m.json"));
        match cli.command {
            Command::Serve { bind, chat } => {
                assert_eq!(bind.port(), 9000);
                assert_eq!(chat.chat_timeout_secs, 5);
            }
            _ => panic!("expected serve"),
        }
    }
}
