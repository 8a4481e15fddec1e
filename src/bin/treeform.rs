//! Format verifier CLI
//!
//! Verifies tab-indented files against format schemas, analyzes schemas for
//! structural defects, and lists the versions of a format directory.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use treeform::config::OutputFormat;
use treeform::encoding::SCHEMA_EXTENSION;
use treeform::loader::load_schema_file;
use treeform::verify::file_extension;
use treeform::{
    analyze_schema, Checksum, FormatRegistry, RuleGraph, Severity, TextTreeLoader, TreeLoader,
    ValidatorConfig, Verifier,
};

#[derive(Parser)]
#[command(name = "treeform")]
#[command(about = "Verify tab-indented files against format schemas")]
struct Cli {
    /// Path to a config file (defaults to treeform.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify files or directories against a format schema
    Verify {
        /// Schema file (defaults to the latest version in the configured
        /// schema directory)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Files or directories to verify
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write a JSON report to this file
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Print trace-level diagnostics
        #[arg(long)]
        trace: bool,
    },

    /// Analyze a schema for unknown names, level conflicts, and unreachable rules
    Check {
        /// Schema file to analyze
        schema: PathBuf,
    },

    /// Export a schema's rule graph as DOT
    Graph {
        /// Schema file to graph
        schema: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a summary of a schema
    Show {
        /// Schema file to summarize
        schema: PathBuf,
    },

    /// List schema versions in the configured schema directory
    Formats,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ValidatorConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Verify {
            schema,
            paths,
            report,
            trace,
        } => {
            let (schema, schema_path) = match schema {
                Some(path) => {
                    let loaded = load_schema_file(&path)?;
                    (loaded, path)
                }
                None => {
                    let dir = config.schema_dir();
                    let registry = FormatRegistry::load_dir(&config.formats.format_name, &dir)?;
                    let version = match &config.formats.default_version {
                        Some(version) => version.clone(),
                        None => registry
                            .latest_version()
                            .ok_or_else(|| {
                                anyhow::anyhow!("no schema versions found in {:?}", dir)
                            })?
                            .to_string(),
                    };
                    let loaded = registry.schema(&version).cloned().ok_or_else(|| {
                        anyhow::anyhow!("version {:?} is not present in {:?}", version, dir)
                    })?;
                    println!("🔍 Using schema version {} from {:?}", version, dir);
                    (loaded, dir.join(format!("{}{}", version, SCHEMA_EXTENSION)))
                }
            };

            if config.verify.analyze_schema {
                let findings = analyze_schema(&schema);
                if !findings.is_empty() {
                    print!("{}", findings.format_filtered(Severity::Warning));
                }
                if findings.has_errors() {
                    println!("❌ Schema {:?} has defects, not verifying", schema_path);
                    std::process::exit(1);
                }
            }

            // Expand directories to the files the schema claims
            let mut files = Vec::new();
            for path in &paths {
                if path.is_dir() {
                    for entry in walkdir::WalkDir::new(path) {
                        let entry = entry?;
                        if entry.file_type().is_file()
                            && schema.matches_extension(&file_extension(entry.path()))
                        {
                            files.push(entry.path().to_path_buf());
                        }
                    }
                } else {
                    files.push(path.clone());
                }
            }
            files.sort();

            if files.is_empty() {
                println!("No files matching {} to verify", schema.extension());
                return Ok(());
            }

            let loader = TextTreeLoader;
            let verifier = Verifier::new(&schema);
            let min = if trace {
                Severity::Trace
            } else {
                config.report.min_severity
            };

            let mut files_json = Vec::new();
            let mut all_passed = true;

            for file in &files {
                let result = if config.verify.check_extension {
                    verifier.verify_file(file, &loader)
                } else {
                    loader.load(file).map(|tree| verifier.verify_tree(&tree))
                };

                match result {
                    Ok(outcome) => {
                        if outcome.passed {
                            println!("✅ {}", file.display());
                        } else {
                            all_passed = false;
                            println!(
                                "❌ {} - {} error(s), {} warning(s)",
                                file.display(),
                                outcome.diagnostics.error_count(),
                                outcome.diagnostics.warning_count()
                            );
                        }
                        print!("{}", outcome.diagnostics.format_filtered(min));

                        let items: Vec<_> = outcome
                            .diagnostics
                            .all()
                            .iter()
                            .filter(|i| {
                                config.report.include_traces || i.severity() > Severity::Trace
                            })
                            .collect();
                        files_json.push(serde_json::json!({
                            "path": file.display().to_string(),
                            "passed": outcome.passed,
                            "errors": outcome.diagnostics.error_count(),
                            "warnings": outcome.diagnostics.warning_count(),
                            "diagnostics": items,
                        }));
                    }
                    Err(e) => {
                        all_passed = false;
                        println!("❌ {} - {}", file.display(), e);
                        files_json.push(serde_json::json!({
                            "path": file.display().to_string(),
                            "passed": false,
                            "error": e.to_string(),
                        }));
                    }
                }
            }

            if let Some(report_path) = report {
                let mut doc = serde_json::json!({
                    "generated_at": chrono::Utc::now().to_rfc3339(),
                    "schema": schema_path.display().to_string(),
                    "extension": schema.extension(),
                    "passed": all_passed,
                    "files": files_json,
                });

                if config.report.include_checksum {
                    doc["schema_checksum"] =
                        serde_json::json!(Checksum::from_file(&schema_path)?.as_str());
                }

                let json = match config.report.output_format {
                    OutputFormat::Pretty => serde_json::to_string_pretty(&doc)?,
                    OutputFormat::Compact => serde_json::to_string(&doc)?,
                };
                std::fs::write(&report_path, &json)?;
                println!("✅ Report written to {:?}", report_path);
            }

            println!();
            if all_passed {
                println!("✅ {} file(s) passed", files.len());
            } else {
                println!("❌ Verification failed");
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Check { schema } => {
            println!("🔍 Analyzing schema {:?}", schema);
            let loaded = load_schema_file(&schema)?;
            let findings = analyze_schema(&loaded);

            if findings.is_empty() {
                println!("✅ No defects found ({} rules)", loaded.rule_count());
            } else {
                print!("{}", findings.format_all());
                if findings.has_errors() {
                    std::process::exit(1);
                }
            }
            Ok(())
        }

        Commands::Graph { schema, output } => {
            let loaded = load_schema_file(&schema)?;
            let dot = RuleGraph::new(&loaded).to_dot();

            match output {
                Some(path) => {
                    std::fs::write(&path, &dot)?;
                    println!("✅ Exported DOT to: {:?}", path);
                }
                None => print!("{}", dot),
            }
            Ok(())
        }

        Commands::Show { schema } => {
            let loaded = load_schema_file(&schema)?;

            println!("Format schema {:?}", schema);
            println!("  extension:       {}", loaded.extension());
            println!("  rules:           {}", loaded.rule_count());
            println!(
                "  head candidates: {}",
                loaded.head_candidates().join(", ")
            );

            for rule in loaded.rules() {
                println!();
                println!("  {} (level {})", rule.name(), rule.level());
                if let Some(pattern) = rule.title_pattern() {
                    println!("    title:    {}", pattern);
                } else if let Some(regex) = rule.title_regex() {
                    println!("    title:    /{}/", regex);
                }
                if let Some(pattern) = rule.data_pattern() {
                    println!("    data:     {}", pattern);
                } else if let Some(regex) = rule.data_regex() {
                    println!("    data:     /{}/", regex);
                }
                println!("    parents:  {}", rule.parent_names().join(", "));
                println!("    children: {}", rule.child_names().join(", "));
                println!("    prev:     {}", rule.prev_sibling_names().join(", "));
                println!("    next:     {}", rule.next_sibling_names().join(", "));
            }
            Ok(())
        }

        Commands::Formats => {
            let dir = config.schema_dir();
            println!("🔍 Loading schemas from {:?}", dir);
            let registry = FormatRegistry::load_dir(&config.formats.format_name, &dir)?;

            let versions = registry.versions();
            if versions.is_empty() {
                println!("No schema versions found");
                return Ok(());
            }

            println!("Format {:?}: {} version(s)", registry.name(), versions.len());
            for version in registry.versions() {
                if let Some(schema) = registry.schema(version) {
                    let marker = if Some(version) == registry.latest_version() {
                        " (latest)"
                    } else {
                        ""
                    };
                    println!(
                        "  {} - extension {}, {} rule(s){}",
                        version,
                        schema.extension(),
                        schema.rule_count(),
                        marker
                    );
                }
            }
            Ok(())
        }
    }
}
