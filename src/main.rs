mod debug_report;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use debug_report::{LineReport, RunReport};
use parsegate::{ContentItem, GatewayConfig, InputFormat, LexiconFactory, ready, server};
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Multi-tenant parsing gateway.
#[derive(Parser)]
#[command(name = "parsegate", version, about, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    gateway: GatewayArgs,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Overrides applied on top of the configuration file.
#[derive(Args)]
struct GatewayArgs {
    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "PATH", env = "PARSEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Model directory holding the `lexicon` file
    #[arg(long, global = true, value_name = "DIR", env = "PARSEGATE_MODEL")]
    model: Option<PathBuf>,

    /// tokenized, postagged or posandnertagged
    #[arg(long, global = true, env = "PARSEGATE_INPUT_FORMAT")]
    input_format: Option<InputFormat>,

    /// Output format of the default session
    #[arg(long, global = true, env = "PARSEGATE_DEFAULT_FORMAT")]
    default_format: Option<String>,

    /// Longest sentence, in words, that gets a parse
    #[arg(long, global = true, env = "PARSEGATE_MAX_LENGTH")]
    max_length: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Address to listen on
        #[arg(long, env = "PARSEGATE_BIND")]
        bind: Option<String>,
    },

    /// Parse text locally and print a report
    ///
    /// Reads stdin (one sentence per line) when no text is given.
    Parse {
        /// Output format (defaults to the default session's format)
        #[arg(long)]
        format: Option<String>,

        /// Force ANSI color output
        #[arg(long, conflicts_with = "no_color")]
        color: bool,

        /// Disable ANSI color output
        #[arg(long)]
        no_color: bool,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(&cli.gateway) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Commands::Serve { bind } => run_serve(config, bind),
        Commands::Parse { format, color, no_color, text } => {
            let color = if no_color { false } else { color || io::stdout().is_terminal() };
            run_parse(config, format, text, color)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "parsegate=debug,tower_http=debug" } else { "parsegate=info,tower_http=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_config(args: &GatewayArgs) -> Result<GatewayConfig, parsegate::ConfigError> {
    let mut config = match &args.config {
        Some(path) => GatewayConfig::load(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(model) = &args.model {
        config.lexicon.model_dir = model.clone();
    }
    if let Some(input_format) = args.input_format {
        config.lexicon.input_format = input_format;
    }
    if let Some(format) = &args.default_format {
        config.default_format = format.clone();
    }
    if let Some(max_length) = args.max_length {
        config.lexicon.max_length = max_length;
    }
    Ok(config)
}

fn run_serve(mut config: GatewayConfig, bind: Option<String>) -> ExitCode {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    info!(
        model = %config.lexicon.model_dir.display(),
        input = %config.lexicon.input_format,
        default_format = %config.default_format,
        "starting parsegate"
    );

    let router = match ready(LexiconFactory::new(config.lexicon.clone()), &config.default_format) {
        Ok(router) => router,
        Err(err) => {
            error!(error = %err, "default session could not be built");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "failed to start the async runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server::serve(router, &config.server)) {
        Ok(()) => {
            info!("server stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "server failed");
            ExitCode::FAILURE
        }
    }
}

fn run_parse(config: GatewayConfig, format: Option<String>, text: Vec<String>, color: bool) -> ExitCode {
    let input = if text.is_empty() {
        match read_stdin_input() {
            Ok(input) => input,
            Err(err) => {
                eprintln!("error: {err:#}");
                return ExitCode::from(2);
            }
        }
    } else {
        text.join(" ")
    };
    let lines: Vec<&str> = input.lines().map(str::trim).filter(|line| !line.is_empty()).collect();
    if lines.is_empty() {
        eprintln!("error: no input provided");
        return ExitCode::from(2);
    }

    let started = Instant::now();
    let format = format.unwrap_or(config.default_format);
    let router = match ready(LexiconFactory::new(config.lexicon), &format) {
        Ok(router) => router,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let build = started.elapsed();

    let reports: Vec<LineReport> = lines
        .iter()
        .map(|line| {
            let line_started = Instant::now();
            let outcome = router
                .infer("", &[ContentItem::text(*line)])
                .map(|out| Some(out.message).filter(|message| !message.is_empty()))
                .map_err(|err| err.to_string());
            LineReport { input: line.to_string(), outcome, elapsed: line_started.elapsed() }
        })
        .collect();
    let failed = reports.iter().any(|report| report.outcome.is_err());

    let run = RunReport {
        format: router.gateway().default_session().format().to_string(),
        lines: reports,
        build,
        total: started.elapsed(),
        metrics: router.gateway().metrics().snapshot(),
    };
    debug_report::print_run(&run, color);

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn read_stdin_input() -> anyhow::Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).context("failed to read stdin")?;
    Ok(buffer)
}
