use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_cohort_matrix::app::{self, App, BuildResult, ResolveResult};
use kira_cohort_matrix::config::{ConfigLoader, ConfigOverrides, ResolvedConfig};
use kira_cohort_matrix::domain::{CountType, MappingDedup};
use kira_cohort_matrix::error::KiraError;
use kira_cohort_matrix::gdc::GdcHttpClient;
use kira_cohort_matrix::output::{JsonOutput, LogSink, OutputMode};

#[derive(Parser)]
#[command(name = "kira-cm")]
#[command(about = "Cohort-level expression matrices from GDC gene quantification files")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download cohort files from GDC and build the matrix and gene mapping")]
    Build(RunArgs),
    #[command(about = "Show which manifest file belongs to each cohort case")]
    Resolve(RunArgs),
    #[command(about = "Build the matrix and gene mapping from local quantification files")]
    Merge(MergeArgs),
}

#[derive(Args, Clone)]
struct RunArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    manifest: Option<String>,

    #[arg(long)]
    cohort: Option<String>,

    #[arg(long)]
    type_of_counts: Option<CountType>,

    #[arg(long)]
    mapping_dedup: Option<MappingDedup>,

    #[arg(long)]
    matrix_output: Option<String>,

    #[arg(long)]
    mapping_output: Option<String>,

    #[arg(long)]
    raw_dir: Option<String>,
}

#[derive(Args)]
struct MergeArgs {
    #[command(flatten)]
    run: RunArgs,

    #[arg(required = true)]
    files: Vec<Utf8PathBuf>,
}

impl RunArgs {
    fn resolve_config(&self) -> Result<ResolvedConfig, KiraError> {
        let overrides = ConfigOverrides {
            manifest: self.manifest.clone(),
            cohort: self.cohort.clone(),
            type_of_counts: self.type_of_counts,
            mapping_dedup: self.mapping_dedup,
            matrix_output: self.matrix_output.clone(),
            mapping_output: self.mapping_output.clone(),
            raw_dir: self.raw_dir.clone(),
        };
        ConfigLoader::resolve(self.config.as_deref(), overrides)
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::ManifestRead(_)
        | KiraError::ManifestParse(_)
        | KiraError::InvalidManifest(_)
        | KiraError::CohortRead(_)
        | KiraError::CohortColumn(_)
        | KiraError::IdentityCollision { .. }
        | KiraError::CaseCollision { .. }
        | KiraError::UnknownFile(_) => 2,
        KiraError::GdcHttp(_) | KiraError::GdcStatus { .. } | KiraError::GdcResponse(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Build(args) => {
            let config = args.resolve_config()?;
            let gdc = GdcHttpClient::new(&config.api_base_url)?;
            let app = App::new(gdc);
            let result = app.build(&config, &LogSink)?;
            print_build(&result, output_mode)
        }
        Commands::Resolve(args) => {
            let config = args.resolve_config()?;
            let result = app::resolve(&config, &LogSink)?;
            print_resolve(&result, output_mode)
        }
        Commands::Merge(args) => {
            let config = args.run.resolve_config()?;
            let result = app::merge_local(&config, &args.files, &LogSink)?;
            print_build(&result, output_mode)
        }
    }
}

fn print_build(result: &BuildResult, output_mode: OutputMode) -> miette::Result<()> {
    if matches!(output_mode, OutputMode::NonInteractive) {
        return JsonOutput::print_build(result).into_diagnostic();
    }

    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}KIRA-CM summary{reset}");
    println!(
        "{green}Cases merged: {} ({} values){reset}",
        result.cases_processed, result.type_of_counts
    );
    println!("{green}Gene columns: {}{reset}", result.gene_columns);
    println!(
        "{green}Mapping rows: {} (dedup: {}){reset}",
        result.mapping_rows, result.mapping_dedup
    );
    if !result.drift_events.is_empty() {
        println!(
            "{yellow}Schema drift in {} case(s){reset}",
            result.drift_events.len()
        );
    }
    if result.mapping_conflicts > 0 {
        println!(
            "{yellow}Inconsistent gene annotations: {}{reset}",
            result.mapping_conflicts
        );
    }
    if !result.missing_cases.is_empty() {
        println!(
            "{yellow}Cohort cases without data: {}{reset}",
            result.missing_cases.len()
        );
    }
    println!("{cyan}   matrix: {}{reset}", result.matrix_output);
    println!("{cyan}   mapping: {}{reset}", result.mapping_output);
    if let Some(raw_dir) = &result.raw_dir {
        println!("{cyan}   raw files: {raw_dir}{reset}");
    }
    Ok(())
}

fn print_resolve(result: &ResolveResult, output_mode: OutputMode) -> miette::Result<()> {
    if matches!(output_mode, OutputMode::NonInteractive) {
        return JsonOutput::print_resolve(result).into_diagnostic();
    }
    for case in &result.cases {
        println!("{}\t{}", case.case_id, case.file_name);
    }
    for case_id in &result.unmatched {
        println!("{case_id}\t-");
    }
    Ok(())
}
