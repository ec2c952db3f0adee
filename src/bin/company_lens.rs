use std::fs::{self, OpenOptions};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use company_lens::api::HttpMetadataApi;
use company_lens::app::App;
use company_lens::config::{ConfigLoader, ResolvedConfig, StoreBackend};
use company_lens::csv::EXPORT_FILE_NAME;
use company_lens::detail::{self, Detail, SelectedRecord};
use company_lens::domain::RecordId;
use company_lens::error::LensError;
use company_lens::output::{DeleteSummary, ExportSummary, JsonOutput};
use company_lens::postgrest::PostgrestStore;
use company_lens::providers::microlink::MicrolinkClient;
use company_lens::server;
use company_lens::store::{self, FileStore, RecordStore};
use company_lens::table::TableView;
use company_lens::tui::Tui;

#[derive(Parser)]
#[command(name = "company-lens")]
#[command(about = "Collect company website metadata and browse it as a table")]
#[command(version, author)]
struct Cli {
    /// JSON config file (defaults to ./company-lens.json when present)
    #[arg(long, global = true, env = "COMPANY_LENS_CONFIG")]
    config: Option<String>,

    /// Base URL of a running company-lens server
    #[arg(long, global = true)]
    api_base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve(ServeArgs),
    #[command(about = "Print every stored record, newest first")]
    List,
    #[command(about = "Fetch metadata for a website and store it")]
    Add(AddArgs),
    #[command(about = "Delete records by id")]
    Delete(DeleteArgs),
    #[command(about = "Export every record as CSV")]
    Export(ExportArgs),
    #[command(about = "Show one record by id")]
    Show(ShowArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[derive(Args)]
struct AddArgs {
    url: String,
}

#[derive(Args)]
struct DeleteArgs {
    #[arg(required = true)]
    ids: Vec<String>,
}

#[derive(Args)]
struct ExportArgs {
    #[arg(long, short, default_value = EXPORT_FILE_NAME)]
    output: Utf8PathBuf,
}

#[derive(Args)]
struct ShowArgs {
    id: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(lens) = report.downcast_ref::<LensError>() {
            return ExitCode::from(map_exit_code(lens));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &LensError) -> u8 {
    match error {
        LensError::InvalidUrl(_)
        | LensError::RecordNotFound(_)
        | LensError::MissingConfig(_)
        | LensError::InvalidConfig(_) => 2,
        LensError::ProviderHttp(_)
        | LensError::ProviderStatus { .. }
        | LensError::ProviderResponse(_)
        | LensError::StoreHttp(_)
        | LensError::StoreStatus { .. }
        | LensError::ApiHttp(_)
        | LensError::ApiStatus { .. } => 3,
        _ => 1,
    }
}

const TUI_LOG_FILE: &str = "company-lens.log";

/// Where formatted events go. The TUI owns the terminal, so it logs to a file.
#[derive(Debug, PartialEq, Eq)]
enum LogTarget {
    Stderr,
    File(Utf8PathBuf),
}

fn log_target(command: Option<&Commands>) -> Result<LogTarget, LensError> {
    match command {
        Some(_) => Ok(LogTarget::Stderr),
        None => Ok(LogTarget::File(store::data_dir()?.join(TUI_LOG_FILE))),
    }
}

fn init_tracing(target: &LogTarget) -> miette::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false);
    match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).into_diagnostic()?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .into_diagnostic()?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
    }
    Ok(())
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(&log_target(cli.command.as_ref())?)?;

    let mut resolved = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(base) = cli.api_base_url.as_deref() {
        resolved.api_base_url = company_lens::config::normalize_base_url(base);
    }

    match cli.command {
        Some(Commands::Serve(args)) => run_serve(args, &resolved),
        Some(Commands::List) => run_list(&resolved),
        Some(Commands::Add(args)) => run_add(args, &resolved),
        Some(Commands::Delete(args)) => run_delete(args, &resolved),
        Some(Commands::Export(args)) => run_export(args, &resolved),
        Some(Commands::Show(args)) => run_show(args, &resolved),
        None => run_tui(&resolved),
    }
}

fn run_serve(args: ServeArgs, resolved: &ResolvedConfig) -> miette::Result<()> {
    let addr = args.bind.unwrap_or(resolved.bind);
    match &resolved.store {
        StoreBackend::File(path) => {
            tracing::info!(path = %path, "using file store");
            serve_with(FileStore::new(path.clone()), resolved, addr)
        }
        StoreBackend::Postgrest { url, key, table } => {
            tracing::info!(url = %url, table = %table, "using PostgREST store");
            serve_with(PostgrestStore::new(url, key, table)?, resolved, addr)
        }
    }
}

/// Blocking HTTP clients must be built and dropped outside the runtime,
/// so `main` keeps its own handle on the app until the runtime is gone.
fn serve_with<S: RecordStore + 'static>(
    store: S,
    resolved: &ResolvedConfig,
    addr: SocketAddr,
) -> miette::Result<()> {
    let provider = MicrolinkClient::new(&resolved.provider)?;
    let app = Arc::new(App::new(store, provider));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    let result = runtime.block_on(server::serve(Arc::clone(&app), addr));
    drop(runtime);
    drop(app);
    result?;
    Ok(())
}

fn table_view(resolved: &ResolvedConfig) -> Result<TableView<HttpMetadataApi>, LensError> {
    let api = HttpMetadataApi::new(&resolved.api_base_url)?;
    Ok(TableView::new(api, resolved.page_size))
}

fn run_list(resolved: &ResolvedConfig) -> miette::Result<()> {
    let mut table = table_view(resolved)?;
    table.load_all()?;
    JsonOutput::print_records(table.records()).into_diagnostic()?;
    Ok(())
}

fn run_add(args: AddArgs, resolved: &ResolvedConfig) -> miette::Result<()> {
    let mut table = table_view(resolved)?;
    let record = table.add_by_url(&args.url, Instant::now())?;
    JsonOutput::print_record(&record).into_diagnostic()?;
    Ok(())
}

fn run_delete(args: DeleteArgs, resolved: &ResolvedConfig) -> miette::Result<()> {
    let mut table = table_view(resolved)?;
    for id in &args.ids {
        table.toggle_select(&RecordId::new(id.trim()));
    }
    let deleted = table.delete_selected(Instant::now())?;
    JsonOutput::print_delete(&DeleteSummary { deleted }).into_diagnostic()?;
    Ok(())
}

fn run_export(args: ExportArgs, resolved: &ResolvedConfig) -> miette::Result<()> {
    let mut table = table_view(resolved)?;
    table.load_all()?;
    let rows = table.export_to(&args.output)?;
    JsonOutput::print_export(&ExportSummary {
        path: args.output.to_string(),
        rows,
    })
    .into_diagnostic()?;
    Ok(())
}

fn run_show(args: ShowArgs, resolved: &ResolvedConfig) -> miette::Result<()> {
    let selected = SelectedRecord::restore(&SelectedRecord::default_path()?);
    let mut table = table_view(resolved)?;
    table.load_all()?;
    match detail::resolve(&args.id, &selected, table.records()) {
        Detail::Found(record) => {
            JsonOutput::print_record(record).into_diagnostic()?;
            Ok(())
        }
        Detail::Pending => Err(LensError::RecordNotFound(args.id).into()),
    }
}

fn run_tui(resolved: &ResolvedConfig) -> miette::Result<()> {
    let table = table_view(resolved)?;
    let mut tui = Tui::new(table, Utf8PathBuf::from(EXPORT_FILE_NAME))
        .with_selection_file(SelectedRecord::default_path()?);
    tui.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interactive_mode_logs_to_file() {
        let cli = Cli::try_parse_from(["company-lens"]).unwrap();
        let target = log_target(cli.command.as_ref()).unwrap();
        let LogTarget::File(path) = target else {
            panic!("the TUI must not log to the terminal");
        };
        assert_eq!(path.file_name(), Some(TUI_LOG_FILE));
    }

    #[test]
    fn subcommands_log_to_stderr() {
        for args in [
            vec!["company-lens", "list"],
            vec!["company-lens", "serve", "--bind", "127.0.0.1:0"],
            vec!["company-lens", "show", "abc"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert_eq!(log_target(cli.command.as_ref()).unwrap(), LogTarget::Stderr);
        }
    }

    #[test]
    fn exit_codes_follow_error_source() {
        assert_eq!(map_exit_code(&LensError::RecordNotFound("x".to_string())), 2);
        assert_eq!(map_exit_code(&LensError::InvalidUrl("x".to_string())), 2);
        assert_eq!(map_exit_code(&LensError::ApiHttp("down".to_string())), 3);
        assert_eq!(map_exit_code(&LensError::Filesystem("disk".to_string())), 1);
    }
}
