use crate::{
    env::{API_KEY_VAR, EnvManager, SLACK_CHANNEL_VAR, SLACK_TOKEN_VAR},
    error::CliError,
    interrupt::ExitCode,
};
use clap::Parser;
use commands::{Commands, SettingsArgs};
use connectors::{
    check::{CheckService, SpeedyIndexClient},
    file::csv::workbook::{CsvWorkbook, write_table},
    notify::{SlackNotifier, notify_best_effort},
};
use engine_config::{
    report::{
        balance::BalanceStatus,
        summary::{SummaryReport, render_notification},
    },
    settings::validated::ValidatedSettings,
};
use engine_processing::extractor::RowExtractor;
use engine_runtime::execution::executor;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod env;
mod error;
mod interrupt;
mod output;

#[derive(Parser)]
#[command(
    name = "speedycheck",
    version = "0.1.0",
    about = "Batch indexation checker for spreadsheet URL lists"
)]
struct Cli {
    #[arg(long, global = true, help = "Load environment variables from this .env file")]
    env_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut env = EnvManager::new();
    if let Some(path) = &cli.env_file {
        env.load_from_file(path)?;
    }

    match cli.command {
        Commands::Check {
            input,
            output,
            sheets,
            settings,
            report,
            json,
            no_notify,
        } => {
            let exit = run_check(CheckArgs {
                env: &env,
                input,
                output,
                sheets,
                settings: &settings,
                report,
                json,
                notify: !no_notify,
            })
            .await?;

            if !matches!(exit, ExitCode::Success) {
                std::process::exit(exit.as_i32());
            }
        }
        Commands::Balance { settings } => {
            let settings = settings.resolve()?;
            let service = connect(&env, &settings)?;
            let status = fetch_balance(service.as_ref(), &settings).await;
            println!("{status}");
        }
        Commands::Sheets { input, settings } => {
            list_sheets(&input, &settings)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

struct CheckArgs<'a> {
    env: &'a EnvManager,
    input: PathBuf,
    output: PathBuf,
    sheets: Vec<String>,
    settings: &'a SettingsArgs,
    report: Option<PathBuf>,
    json: bool,
    notify: bool,
}

async fn run_check(args: CheckArgs<'_>) -> Result<ExitCode, CliError> {
    let settings = args.settings.resolve()?;
    let service = connect(args.env, &settings)?;

    // Read the whole workbook before anything is submitted.
    let workbook = CsvWorkbook::open(&args.input)?;
    let table = workbook.load_table()?;
    info!(
        input = %args.input.display(),
        sheets = table.len(),
        "Loaded workbook"
    );

    let balance = fetch_balance(service.as_ref(), &settings).await;
    info!("{balance}");

    let cancel = CancellationToken::new();
    let listener = interrupt::cancel_on_signal(cancel.clone());
    let run = executor::run(table, &args.sheets, service, &settings, cancel.clone()).await;
    listener.abort();
    let run = run?;
    let cancelled = cancel.is_cancelled();

    write_table(&run.table, &args.output)?;
    info!(output = %args.output.display(), "Wrote annotated workbook");
    info!(metrics = ?run.metrics, "Run metrics");

    let text = render_notification(&run.summary);
    if args.notify {
        send_notification(args.env, &text).await;
    }

    let exit = ExitCode::for_run(&run.summary, cancelled);
    let report = SummaryReport::new(run.summary, run.metrics);
    if let Some(path) = &args.report {
        output::write_report(&report, path).await?;
    }
    if args.json {
        output::print_report(&report)?;
    } else {
        output::print_summary(&report.summary);
    }

    Ok(exit)
}

fn connect(
    env: &EnvManager,
    settings: &ValidatedSettings,
) -> Result<Arc<dyn CheckService>, CliError> {
    let api_key = env.require(API_KEY_VAR)?;
    let client = SpeedyIndexClient::new(settings.client_config(api_key))?;
    Ok(Arc::new(client))
}

async fn fetch_balance(service: &dyn CheckService, settings: &ValidatedSettings) -> BalanceStatus {
    let balance = match service.balance().await {
        Ok(balance) => Some(balance),
        Err(err) => {
            warn!(error = %err, "Could not fetch balance");
            None
        }
    };
    BalanceStatus::classify(balance, settings.low_balance_threshold())
}

async fn send_notification(env: &EnvManager, text: &str) {
    let (Some(token), Some(channel)) = (env.get(SLACK_TOKEN_VAR), env.get(SLACK_CHANNEL_VAR))
    else {
        info!("Slack credentials not configured, skipping notification");
        return;
    };

    match SlackNotifier::new(token, channel) {
        Ok(notifier) => {
            info!(
                channel = env.display_value(SLACK_CHANNEL_VAR).as_deref(),
                token = env.display_value(SLACK_TOKEN_VAR).as_deref(),
                "Sending notification"
            );
            notify_best_effort(&notifier, text).await;
        }
        Err(err) => warn!(error = %err, "Could not create Slack notifier"),
    }
}

fn list_sheets(input: &Path, settings: &SettingsArgs) -> Result<(), CliError> {
    let settings = settings.resolve()?;
    let layout = settings.layout();
    let extractor = RowExtractor::new(&layout);
    let workbook = CsvWorkbook::open(input)?;

    println!("{:<24} {:>6} {:>11}", "Sheet", "Rows", "Header row");
    println!("{}", "-".repeat(43));
    for name in workbook.sheet_names() {
        let sheet = workbook.read_sheet(name)?;
        println!(
            "{:<24} {:>6} {:>11}",
            name,
            sheet.row_count(),
            extractor.find_header_row(&sheet).ordinal()
        );
    }

    Ok(())
}
