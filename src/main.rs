//! Command-line interface for stamping and verifying registered documents

use std::fs;
use std::path::PathBuf;
use std::process;

use acv::{
    CallerContext, JsonRegistry, PdfStamper, PayloadEncoder, Role, StampBinding, StampConfig,
    StampJob, VerificationReconciler, VerificationResult,
};
use clap::{Arg, ArgMatches, Command};
use serde::Deserialize;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_one::<String>("log-level").map(String::as_str));

    let outcome = match matches.subcommand() {
        Some(("stamp", sub)) => run_stamp(sub),
        Some(("batch", sub)) => run_batch(sub),
        Some(("verify-file", sub)) => run_verify_file(sub).await,
        Some(("verify-hash", sub)) => run_verify_hash(sub).await,
        Some(("extract", sub)) => run_extract(sub),
        _ => {
            error!("no subcommand given; see --help");
            process::exit(2);
        }
    };

    match outcome {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{e}");
            process::exit(2);
        }
    }
}

fn build_cli() -> Command {
    let config_arg = Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Stamp configuration file (JSON)");
    let registry_arg = Arg::new("registry")
        .short('r')
        .long("registry")
        .value_name("FILE")
        .required(true)
        .help("Registry records file (JSON array)");
    let caller_args = [
        Arg::new("user")
            .long("user")
            .value_name("ID")
            .required(true)
            .help("Caller user id, recorded with the verification"),
        Arg::new("role")
            .long("role")
            .value_name("ROLE")
            .default_value("VERIFIER")
            .help("Caller role: STUDENT, VERIFIER or ADMIN"),
    ];

    Command::new("acv")
        .version("0.1.0")
        .about("Stamps registered PDF documents with an integrity marker and verifies presented copies")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level: error, warn, info, debug or trace"),
        )
        .subcommand(
            Command::new("stamp")
                .about("Stamp a single document")
                .arg(Arg::new("input").short('i').long("input").value_name("FILE").required(true))
                .arg(Arg::new("output").short('o').long("output").value_name("FILE").required(true))
                .arg(Arg::new("doc-id").long("doc-id").value_name("ID").required(true))
                .arg(Arg::new("hash").long("hash").value_name("HEX").required(true)
                    .help("SHA-256 of the original file, as recorded by the registry"))
                .arg(Arg::new("verify-url").long("verify-url").value_name("URL"))
                .arg(config_arg.clone()),
        )
        .subcommand(
            Command::new("batch")
                .about("Stamp a batch of documents; failures are reported per item")
                .arg(Arg::new("jobs").long("jobs").value_name("FILE").required(true)
                    .help("JSON array of {input, output, doc_id, file_hash, verify_url?}"))
                .arg(config_arg.clone()),
        )
        .subcommand(
            Command::new("verify-file")
                .about("Verify a presented PDF against its registry record")
                .arg(Arg::new("input").short('i').long("input").value_name("FILE").required(true))
                .arg(Arg::new("doc-id").long("doc-id").value_name("ID").required(true))
                .arg(registry_arg.clone())
                .args(caller_args.clone())
                .arg(config_arg.clone()),
        )
        .subcommand(
            Command::new("verify-hash")
                .about("Verify a claimed hash string against its registry record")
                .arg(Arg::new("doc-id").long("doc-id").value_name("ID").required(true))
                .arg(Arg::new("hash").long("hash").value_name("HEX").required(true))
                .arg(registry_arg)
                .args(caller_args)
                .arg(config_arg.clone()),
        )
        .subcommand(
            Command::new("extract")
                .about("Recover the asserted binding from an artifact's trailer lines")
                .arg(Arg::new("input").short('i').long("input").value_name("FILE").required(true))
                .arg(config_arg),
        )
}

fn init_logging(level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter = match level {
        Some(level) => EnvFilter::new(format!("acv={level}")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("acv=info")),
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn load_config(matches: &ArgMatches) -> acv::Result<StampConfig> {
    match matches.get_one::<String>("config") {
        Some(path) => StampConfig::from_file(path),
        None => Ok(StampConfig::default()),
    }
}

fn caller(matches: &ArgMatches) -> acv::Result<CallerContext> {
    let user_id = matches
        .get_one::<String>("user")
        .cloned()
        .unwrap_or_default();
    let role = match matches
        .get_one::<String>("role")
        .map(String::as_str)
        .unwrap_or("VERIFIER")
        .to_ascii_uppercase()
        .as_str()
    {
        "STUDENT" => Role::Student,
        "VERIFIER" => Role::Verifier,
        "ADMIN" => Role::Admin,
        other => {
            return Err(acv::Error::InvalidConfiguration(format!(
                "unknown role: {other}"
            )))
        }
    };
    Ok(CallerContext { user_id, role })
}

fn run_stamp(matches: &ArgMatches) -> acv::Result<i32> {
    let config = load_config(matches)?;
    let stamper = PdfStamper::new(config)?;

    let input = matches.get_one::<String>("input").expect("required");
    let output = matches.get_one::<String>("output").expect("required");
    let mut binding = StampBinding::new(
        matches.get_one::<String>("doc-id").expect("required").clone(),
        matches.get_one::<String>("hash").expect("required").clone(),
    );
    if let Some(url) = matches.get_one::<String>("verify-url") {
        binding = binding.with_verify_url(url.clone());
    }

    let original = fs::read(input)?;
    let artifact = stamper.stamp(&original, &binding)?;
    fs::write(output, &artifact)?;
    info!(%input, %output, doc_id = %binding.doc_id, "stamped artifact written");
    Ok(0)
}

/// One entry of a batch jobs file.
#[derive(Debug, Deserialize)]
struct BatchJobSpec {
    input: PathBuf,
    output: PathBuf,
    doc_id: String,
    file_hash: String,
    #[serde(default)]
    verify_url: Option<String>,
}

fn run_batch(matches: &ArgMatches) -> acv::Result<i32> {
    let config = load_config(matches)?;
    let stamper = PdfStamper::new(config)?;

    let jobs_path = matches.get_one::<String>("jobs").expect("required");
    let raw = fs::read_to_string(jobs_path)?;
    let specs: Vec<BatchJobSpec> = serde_json::from_str(&raw)
        .map_err(|e| acv::Error::InvalidConfiguration(format!("jobs file parse failed: {e}")))?;

    let mut jobs = Vec::with_capacity(specs.len());
    let mut outputs = Vec::with_capacity(specs.len());
    for spec in &specs {
        let mut binding = StampBinding::new(spec.doc_id.clone(), spec.file_hash.clone());
        if let Some(url) = &spec.verify_url {
            binding = binding.with_verify_url(url.clone());
        }
        jobs.push(StampJob {
            name: spec.input.display().to_string(),
            bytes: fs::read(&spec.input)?,
            binding,
        });
        outputs.push(spec.output.clone());
    }

    let report = stamper.stamp_batch(&jobs);
    let mut summary = Vec::with_capacity(report.items.len());
    for (item, output) in report.items.iter().zip(&outputs) {
        match &item.result {
            Ok(artifact) => {
                fs::write(output, artifact)?;
                summary.push(serde_json::json!({
                    "input": item.name,
                    "doc_id": item.doc_id,
                    "output": output,
                    "status": "stamped",
                }));
            }
            Err(e) => {
                warn!(input = %item.name, doc_id = %item.doc_id, "item failed: {e}");
                summary.push(serde_json::json!({
                    "input": item.name,
                    "doc_id": item.doc_id,
                    "status": "failed",
                    "error": e.to_string(),
                }));
            }
        }
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "succeeded": report.succeeded(),
            "failed": report.failed(),
            "items": summary,
        }))
        .expect("report serialization")
    );
    Ok(if report.failed() == 0 { 0 } else { 1 })
}

fn print_result(result: &VerificationResult) -> i32 {
    println!(
        "{}",
        serde_json::to_string_pretty(result).expect("result serialization")
    );
    if result.is_valid() {
        0
    } else {
        1
    }
}

async fn run_verify_file(matches: &ArgMatches) -> acv::Result<i32> {
    let config = load_config(matches)?;
    let registry = JsonRegistry::load(matches.get_one::<String>("registry").expect("required"))?;
    let reconciler = VerificationReconciler::new(registry, config);

    let ctx = caller(matches)?;
    let doc_id = matches.get_one::<String>("doc-id").expect("required");
    let presented = fs::read(matches.get_one::<String>("input").expect("required"))?;

    let result = reconciler.verify_by_file(&ctx, doc_id, &presented).await?;
    Ok(print_result(&result))
}

async fn run_verify_hash(matches: &ArgMatches) -> acv::Result<i32> {
    let config = load_config(matches)?;
    let registry = JsonRegistry::load(matches.get_one::<String>("registry").expect("required"))?;
    let reconciler = VerificationReconciler::new(registry, config);

    let ctx = caller(matches)?;
    let doc_id = matches.get_one::<String>("doc-id").expect("required");
    let claimed = matches.get_one::<String>("hash").expect("required");

    let result = reconciler.verify_by_hash(&ctx, doc_id, claimed).await?;
    Ok(print_result(&result))
}

fn run_extract(matches: &ArgMatches) -> acv::Result<i32> {
    let config = load_config(matches)?;
    let artifact = fs::read(matches.get_one::<String>("input").expect("required"))?;

    match acv::trailer::extract_binding(&artifact, &config.product_token) {
        Some(binding) => {
            let payload = PayloadEncoder::payload_text(&StampBinding::new(
                binding.doc_id.clone(),
                binding.file_hash.clone(),
            ));
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "doc_id": binding.doc_id,
                    "file_hash": binding.file_hash,
                    "payload": payload,
                }))
                .expect("binding serialization")
            );
            Ok(0)
        }
        None => {
            error!("no trailer marker found in artifact");
            Ok(1)
        }
    }
}
