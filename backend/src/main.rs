//! UMUD CLI - validate, store and query ultrasound dataset metadata
//!
//! # Main Commands
//!
//! ```bash
//! umud serve                          # Start HTTP server (port 3000)
//! umud validate metadata.json         # Check a submission, print every error
//! umud submit metadata.json           # Validate and store
//! umud query -c muscle=Soleus --csv out.csv
//! ```
//!
//! # Catalog Inspection
//!
//! ```bash
//! umud distinct muscles               # Values offered by a filter widget
//! umud group --group device --value muscles
//! umud histogram --group participantSex   # Age distribution, 20 bins
//! umud fields                         # Field table of the contribution form
//! umud email-link dataset_metadata.json
//! ```

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use umud::catalog::DEFAULT_BINS;
use umud::export::{SIDECAR_FILENAME, SUBMISSION_ADDRESS};
use umud::{
    criteria_from_pairs, describe, mailto_link, records_to_csv, to_json_sidecar, validate,
    validate_many, Catalog, CatalogError, Config, JsonDirStore,
};

#[derive(Parser)]
#[command(name = "umud")]
#[command(about = "Metadata catalog for musculoskeletal ultrasound datasets", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory of the dataset store
    #[arg(long, global = true, env = "UMUD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate metadata (a JSON object or an array of objects)
    Validate {
        /// Input JSON file
        input: PathBuf,

        /// Write the normalized metadata sidecar (single record only)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate metadata and add it to the catalog
    Submit {
        /// Input JSON file (object or array)
        input: PathBuf,
    },

    /// Filter the catalog
    Query {
        /// Criterion as field=value (repeatable; all must match)
        #[arg(short, long = "criterion")]
        criteria: Vec<String>,

        /// Write matches as CSV to this file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Output file for JSON matches (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the distinct values of a field
    Distinct {
        /// Field name
        field: String,
    },

    /// Count records per group and value (set fields are exploded)
    Group {
        /// Field to group by
        #[arg(short, long)]
        group: String,

        /// Field to count
        #[arg(short, long)]
        value: String,
    },

    /// Bin a numeric field per group (set fields are exploded)
    Histogram {
        /// Field to group by
        #[arg(short, long)]
        group: String,

        /// Numeric field to bin
        #[arg(short, long, default_value = "participantAge")]
        field: String,

        /// Number of equal-width bins
        #[arg(short, long, default_value_t = DEFAULT_BINS)]
        bins: usize,
    },

    /// Show the metadata fields
    Fields {
        /// Print the full description as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a mailto: link for submitting files by e-mail
    EmailLink {
        /// Files to attach
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// E-mail subject
        #[arg(long, default_value = "UMUD dataset submission")]
        subject: String,

        /// Recipient address
        #[arg(long, default_value = SUBMISSION_ADDRESS)]
        to: String,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "UMUD_PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "umud=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(None, cli.data_dir);

    let result = match cli.command {
        Commands::Validate { input, output } => cmd_validate(&input, output.as_deref()),
        Commands::Submit { input } => cmd_submit(&config, &input),
        Commands::Query {
            criteria,
            csv,
            output,
        } => cmd_query(&config, &criteria, csv.as_deref(), output.as_deref()),
        Commands::Distinct { field } => cmd_distinct(&config, &field),
        Commands::Group { group, value } => cmd_group(&config, &group, &value),
        Commands::Histogram { group, field, bins } => cmd_histogram(&config, &group, &field, bins),
        Commands::Fields { json } => cmd_fields(json),
        Commands::EmailLink { files, subject, to } => cmd_email_link(&files, &subject, &to),
        Commands::Serve { port } => cmd_serve(config.with_overrides(port, None)).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn read_json(input: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(input)?;
    Ok(serde_json::from_str(&content)?)
}

fn as_batch(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn cmd_validate(input: &Path, output: Option<&Path>) -> CliResult {
    eprintln!("✔️  Validating: {}", input.display());
    let value = read_json(input)?;

    if value.is_array() {
        if output.is_some() {
            return Err("--output needs a single record, not an array".into());
        }
        let records = as_batch(value);
        let (accepted, rejected) = validate_many(&records);
        for (i, errors) in &rejected {
            eprintln!("\n❌ Record {} invalid:", i);
            for err in errors {
                eprintln!("   - {}", err);
            }
        }
        eprintln!("\n📊 Results: {} valid, {} invalid", accepted.len(), rejected.len());
        if !rejected.is_empty() {
            return Err(format!("{} invalid record(s)", rejected.len()).into());
        }
        return Ok(());
    }

    match validate(&value) {
        Ok(record) => {
            eprintln!("✅ {} is valid", record.name);
            if let Some(path) = output {
                write_output(&to_json_sidecar(&record)?, Some(path))?;
            }
            Ok(())
        }
        Err(errors) => {
            for err in &errors {
                eprintln!("   - {}", err);
            }
            Err(format!("{} field error(s)", errors.len()).into())
        }
    }
}

fn cmd_submit(config: &Config, input: &Path) -> CliResult {
    eprintln!("📄 Submitting: {}", input.display());
    let store = JsonDirStore::with_dir(&config.data_dir);
    let catalog = Catalog::new(&store);

    let mut failed = 0;
    for (i, raw) in as_batch(read_json(input)?).iter().enumerate() {
        match catalog.submit(raw) {
            Ok((id, record)) => eprintln!("   ✓ {} stored as {}", record.name, id),
            Err(CatalogError::Invalid(failure)) => {
                failed += 1;
                eprintln!("\n❌ Record {} invalid:", i);
                for err in &failure.0 {
                    eprintln!("   - {}", err);
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("\n❌ Record {}: {}", i, e);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} record(s) not stored", failed).into());
    }
    Ok(())
}

fn cmd_query(
    config: &Config,
    criteria: &[String],
    csv: Option<&Path>,
    output: Option<&Path>,
) -> CliResult {
    let pairs = criteria
        .iter()
        .map(|c| {
            c.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| format!("criterion must be field=value, got '{}'", c))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let store = JsonDirStore::with_dir(&config.data_dir);
    let records = Catalog::new(&store).filter(&criteria_from_pairs(pairs))?;
    eprintln!("🔎 {} matching record(s)", records.len());

    if let Some(path) = csv {
        write_output(&records_to_csv(&records)?, Some(path))?;
        if output.is_none() {
            return Ok(());
        }
    }
    write_output(&serde_json::to_string_pretty(&records)?, output)
}

fn cmd_distinct(config: &Config, field: &str) -> CliResult {
    let store = JsonDirStore::with_dir(&config.data_dir);
    for value in Catalog::new(&store).distinct(field)? {
        println!("{}", value);
    }
    Ok(())
}

fn cmd_group(config: &Config, group: &str, value: &str) -> CliResult {
    let store = JsonDirStore::with_dir(&config.data_dir);
    let counts = Catalog::new(&store).group_count(group, value)?;
    write_output(&serde_json::to_string_pretty(&counts)?, None)
}

fn cmd_histogram(config: &Config, group: &str, field: &str, bins: usize) -> CliResult {
    let store = JsonDirStore::with_dir(&config.data_dir);
    let hist = Catalog::new(&store).histogram(group, field, bins)?;
    eprintln!("📊 {} group(s), {} bin(s)", hist.counts.len(), bins);
    write_output(&serde_json::to_string_pretty(&hist)?, None)
}

fn cmd_fields(json: bool) -> CliResult {
    let fields = describe();
    if json {
        return write_output(&serde_json::to_string_pretty(&fields)?, None);
    }

    println!("📋 Metadata fields:\n");
    for f in &fields {
        let presence = if f.required { "required" } else { "optional" };
        println!("  {:<24} {:<9} {:<14} {}", f.name, presence, f.family, f.description);
    }
    Ok(())
}

fn cmd_email_link(files: &[PathBuf], subject: &str, to: &str) -> CliResult {
    let names: Vec<String> = files
        .iter()
        .map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| p.display().to_string())
        })
        .collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    let body = format!(
        "Please find attached the {} of my dataset for the UMUD catalog.",
        SIDECAR_FILENAME
    );
    println!("{}", mailto_link(subject, &body, to, &names));
    Ok(())
}

async fn cmd_serve(config: Config) -> CliResult {
    umud::start_server(config).await?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> CliResult {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
