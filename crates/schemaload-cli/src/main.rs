mod logging;
mod settings;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Args, Parser, Subcommand};
use schemaload_client::{HttpConfigClient, LoadError};
use schemaload_core::{
    Error as DocumentError, RedactedConnection, RelationGraphReport, STARTER_DOCUMENT,
    SchemaDocument, ValidationIssue, ValidationReport, build_relation_graph_report,
    parse_document, redact_connection, redact_document, validate_document,
};
use schemaload_submit::{Submission, SubmissionStatus, SubmitOutcome};
use serde_json::json;
use thiserror::Error;

use logging::{LoggingError, init_logging};
use settings::{
    CliSettings, LogFormat, SettingsError, SettingsOverrides, load_settings, write_bytes_atomic,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Document(#[from] DocumentError),
    #[error("client error: {0}")]
    Client(#[from] LoadError),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document failed validation with {0} error(s)")]
    Invalid(usize),
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

#[derive(Parser, Debug)]
#[command(name = "schemaload", version, about = "Author and load schema documents")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Settings file (defaults to ./schemaload.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Base URL of the backend configuration loader.
    #[arg(long, global = true, value_name = "URL")]
    backend_url: Option<String>,
    /// Request timeout in seconds.
    #[arg(long, global = true, value_name = "SECONDS")]
    timeout_secs: Option<u64>,
    /// Log output format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
    /// Append logs to this file instead of stderr.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a document and load it into the backend.
    Submit(DocumentArgs),
    /// Validate a document offline and describe its relation graph.
    Check(CheckArgs),
    /// Print or write the starter document.
    Template(TemplateArgs),
}

#[derive(Args, Debug)]
struct DocumentArgs {
    /// Document to read; `-` or omitted reads stdin.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    document: DocumentArgs,
    /// Emit the report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// Write the template here instead of stdout.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Overwrite an existing file.
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let GlobalArgs {
        config,
        backend_url,
        timeout_secs,
        log_format,
        log_file,
    } = cli.global;

    let settings = load_settings(config.as_deref())?.apply(SettingsOverrides {
        backend_url,
        timeout_secs,
        log_format,
        log_file,
    });
    settings.validate()?;

    init_logging(settings.log_format, settings.log_file.as_deref())?;

    match cli.command {
        Command::Submit(args) => run_submit(args, &settings).await,
        Command::Check(args) => run_check(args),
        Command::Template(args) => run_template(args),
    }
}

async fn run_submit(args: DocumentArgs, settings: &CliSettings) -> Result<(), CliError> {
    let text = read_document(args.file.as_deref())?;
    let client = HttpConfigClient::new(&settings.client_options())?;

    tracing::info!(event = "backend_selected", url = %client.load_url());

    let proceeded = Arc::new(AtomicBool::new(false));
    let proceed = {
        let proceeded = Arc::clone(&proceeded);
        move || {
            proceeded.store(true, Ordering::SeqCst);
            println!("configuration loaded; continue in the editor");
        }
    };

    let machine = Submission::with_text(client, proceed, text);

    match machine.submit().await {
        SubmitOutcome::Resolved(SubmissionStatus::Succeeded) => {
            tracing::info!(
                event = "run_finished",
                status = "success",
                proceeded = proceeded.load(Ordering::SeqCst)
            );
            Ok(())
        }
        SubmitOutcome::Resolved(status) => {
            print_issues(&machine.last_issues());
            let message = status
                .error_message()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            tracing::info!(event = "run_finished", status = "failed");
            Err(CliError::SubmissionFailed(message))
        }
        SubmitOutcome::Ignored => Err(CliError::SubmissionFailed(
            "a submission is already in flight".to_string(),
        )),
    }
}

fn run_check(args: CheckArgs) -> Result<(), CliError> {
    let text = read_document(args.document.file.as_deref())?;
    let document = parse_document(&text)?;
    let report = validate_document(&document);
    let graph = build_relation_graph_report(&document);
    let connections: Vec<_> = document
        .databases
        .iter()
        .map(|(alias, connection)| redact_connection(alias, connection))
        .collect();

    tracing::info!(
        event = "document_checked",
        errors = report.errors.len(),
        warnings = report.warnings.len()
    );

    if args.json {
        let output = check_json(&document, &connections, &report, &graph);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("databases:");
        for connection in &connections {
            println!("  {}: {}", connection.alias, connection.redacted);
        }
        println!(
            "tables: {}, relations: {} ({} cross-database)",
            graph.summary.nodes, graph.summary.edges, graph.summary.cross_database_edges
        );
        match (&graph.dependency_order, &graph.cycle) {
            (Some(order), _) => println!("dependency order: {}", order.join(", ")),
            (None, Some(cycle)) => println!("relation cycle between: {}", cycle.join(", ")),
            (None, None) => {}
        }
        print_issues(&report.errors);
        for warning in &report.warnings {
            eprintln!("warning: {warning}");
        }
    }

    if report.is_ok() {
        Ok(())
    } else {
        Err(CliError::Invalid(report.errors.len()))
    }
}

fn run_template(args: TemplateArgs) -> Result<(), CliError> {
    let Some(out) = args.out else {
        print!("{STARTER_DOCUMENT}");
        return Ok(());
    };

    if out.exists() && !args.force {
        return Err(CliError::InvalidArgs(format!(
            "{} already exists; pass --force to overwrite",
            out.display()
        )));
    }

    write_bytes_atomic(&out, STARTER_DOCUMENT.as_bytes())?;
    tracing::info!(event = "template_written", path = %out.display());
    Ok(())
}

fn check_json(
    document: &SchemaDocument,
    connections: &[RedactedConnection],
    report: &ValidationReport,
    graph: &RelationGraphReport,
) -> serde_json::Value {
    json!({
        "document": redact_document(document),
        "databases": connections,
        "report": report,
        "graph": graph,
    })
}

fn read_document(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn print_issues(issues: &[ValidationIssue]) {
    for issue in issues {
        eprintln!("error: {issue}");
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "schemaload",
            "check",
            "schema.json",
            "--json",
            "--backend-url",
            "http://backend:9000",
            "--log-format",
            "json",
        ])
        .expect("parse arguments");

        assert_eq!(cli.global.backend_url.as_deref(), Some("http://backend:9000"));
        assert_eq!(cli.global.log_format, Some(LogFormat::Json));
        match cli.command {
            Command::Check(args) => {
                assert!(args.json);
                assert_eq!(args.document.file, Some(PathBuf::from("schema.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn template_is_written_once_without_force() {
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("schema.json");

        run_template(TemplateArgs {
            out: Some(out.clone()),
            force: false,
        })
        .expect("write template");
        let written = std::fs::read_to_string(&out).expect("read template");
        assert!(parse_document(&written).is_ok());

        let again = run_template(TemplateArgs {
            out: Some(out.clone()),
            force: false,
        });
        assert!(matches!(again, Err(CliError::InvalidArgs(_))));

        run_template(TemplateArgs {
            out: Some(out),
            force: true,
        })
        .expect("overwrite template");
    }

    #[test]
    fn check_reports_invalid_documents() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("schema.json");
        std::fs::write(
            &path,
            r#"{"databases":{},"tables":{"t1":{"db":"db2","columns":["id"]}}}"#,
        )
        .expect("write document");

        let result = run_check(CheckArgs {
            document: DocumentArgs { file: Some(path) },
            json: true,
        });
        assert!(matches!(result, Err(CliError::Invalid(1))));
    }

    #[test]
    fn check_json_never_contains_passwords() {
        let document = parse_document(STARTER_DOCUMENT).expect("parse starter document");
        let connections: Vec<_> = document
            .databases
            .iter()
            .map(|(alias, connection)| redact_connection(alias, connection))
            .collect();
        let report = validate_document(&document);
        let graph = build_relation_graph_report(&document);

        let output = check_json(&document, &connections, &report, &graph);

        let rendered = serde_json::to_string(&output).expect("serialize output");
        assert!(!rendered.contains("mysecretpassword"));
        assert_eq!(output["document"]["databases"]["db1"]["password"], "***");
        assert_eq!(output["document"]["tables"]["books"]["db"], "db1");
        assert_eq!(output["graph"]["cycle"][0], "authors");
    }
}
