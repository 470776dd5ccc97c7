use anyhow::Context;
use clap::Parser;
use pingwatch::{
    Host,
    config::{Config, read_config_file},
    monitor::scheduler::MonitorHandle,
    notifier::DesktopNotifier,
    prober::PingProber,
    report::Reporter,
    util::get_config_path,
};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Ping a fixed set of hosts and alert when any is unreachable")]
struct Args {
    /// Config file (JSON), falls back to $PINGWATCH_CONFIG
    #[arg(short, long)]
    file: Option<String>,

    /// Host to monitor, may be repeated; replaces the configured hosts
    #[arg(long = "host", value_name = "HOST")]
    hosts: Vec<String>,

    /// Seconds between checks
    #[arg(long)]
    interval: Option<u64>,

    /// Seconds to wait for each ping reply
    #[arg(long)]
    timeout: Option<u64>,

    /// Ping all hosts at the same time
    #[arg(long)]
    parallel: bool,

    /// Run a single check and exit
    #[arg(long)]
    once: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init(verbose: u8) {
    dotenv::dotenv().ok();

    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = filter::Targets::new().with_targets(vec![("pingwatch", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match args.file.clone().or_else(get_config_path) {
        Some(path) => read_config_file(&path)?,
        None => Config::default(),
    };

    if !args.hosts.is_empty() {
        config.hosts = Some(args.hosts.iter().cloned().map(Host::from).collect());
    }
    if let Some(interval) = args.interval {
        config.interval = Some(interval);
    }
    if let Some(timeout) = args.timeout {
        config.probe_timeout = Some(timeout);
    }
    config.parallel |= args.parallel;

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let config = load_config(&args)?
        .resolve()
        .context("invalid configuration")?;

    let prober = PingProber::new();
    let notifier = DesktopNotifier::new();
    let reporter = Reporter::stdout();

    let handle = if args.once {
        MonitorHandle::spawn_once(config, prober, notifier, reporter)
    } else {
        MonitorHandle::spawn(config, prober, notifier, reporter)
    };
    handle.stop_on(shutdown_signal());

    let stats = handle.join().await?;
    info!("finished: {stats:?}");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("received terminate signal");
        }
    }
}
