//! ozone-bridge - host-side channel and pointer input bridge
//!
//! Replays a recorded session trace through the channel host and the
//! pointer translator, logging everything the core does with it.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

use ozone_bridge::channel::{
    ChannelError, ChannelHandler, ChannelObserver, ChannelSender, ChannelSupportHost, HostId,
    Message, SendFn,
};
use ozone_bridge::config::Config;
use ozone_bridge::dispatch::{EventDispatcher, EventSink, ThreadTaskRunner};
use ozone_bridge::factory::{EventFactory, WindowChangeObserver};
use ozone_bridge::input::{HeadlessPointerBackend, InputTranslator, PortableEvent, SurfaceId};
use ozone_bridge::trace::{load_trace, read_trace, TraceRecord};
use ozone_bridge::utils::{format_user_error, MetricsCollector};

/// Command-line arguments for ozone-bridge
#[derive(Parser, Debug)]
#[command(name = "ozone-bridge")]
#[command(version, about = "Host-side channel and pointer input bridge", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        env = "OZONE_BRIDGE_CONFIG",
        default_value = "/etc/ozone-bridge/config.toml"
    )]
    pub config: PathBuf,

    /// Session trace to replay (JSON lines); stdin when omitted
    #[arg(short, long)]
    pub trace: Option<PathBuf>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "pretty")]
    pub log_format: String,

    /// Write logs to file (in addition to stdout)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = Config::load(&args.config);
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default_config(),
    };

    let _log_guard = init_logging(&args, &config)?;

    info!("════════════════════════════════════════════════════════");
    info!("  {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!(
        "  Threads: ui={} send={}",
        config.dispatch.ui_thread_name, config.dispatch.send_thread_name
    );
    info!("════════════════════════════════════════════════════════");

    if let Err(e) = &loaded {
        warn!("Failed to load config: {:#}, using defaults", e);
    }
    if let Err(e) = config.validate() {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }
    debug!("Config: {:?}", config);

    let records = match &args.trace {
        Some(path) => load_trace(path)
            .with_context(|| format!("Failed to load trace {}", path.display()))?,
        None => read_trace(io::stdin().lock()).context("Failed to read trace from stdin")?,
    };
    info!(records = records.len(), "Trace loaded");

    let replay_task = tokio::task::spawn_blocking(move || replay(&config, records));

    tokio::select! {
        joined = replay_task => {
            let outcome = joined.context("Replay thread panicked")?;
            match outcome {
                Ok(summary) => {
                    info!(
                        records = summary.records,
                        events = summary.events,
                        "Replay finished"
                    );
                }
                Err(e) => {
                    eprintln!("{}", format_user_error(&e));
                    return Err(e);
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping replay");
        }
    }

    Ok(())
}

/// Totals reported after a replay
#[derive(Debug, Default)]
struct ReplaySummary {
    records: usize,
    events: u64,
}

/// Drive the channel host and the translator with `records`
fn replay(config: &Config, records: Vec<TraceRecord>) -> Result<ReplaySummary> {
    let metrics = Arc::new(MetricsCollector::new());

    let ui_runner = ThreadTaskRunner::spawn(&config.dispatch.ui_thread_name)
        .context("Failed to start UI thread")?;
    let send_runner = ThreadTaskRunner::spawn(&config.dispatch.send_thread_name)
        .context("Failed to start channel send thread")?;

    let sink = Arc::new(LoggingEventSink::default());
    let factory = Arc::new(EventFactory::new());
    factory.set_event_dispatcher(EventDispatcher::new(
        ui_runner.clone(),
        sink.clone(),
        metrics.clone(),
    ));
    factory.set_window_change_observer(Some(Arc::new(LoggingWindowObserver)));
    let factory = EventFactory::install(factory);

    let dispatcher = factory
        .event_dispatcher()
        .context("EventFactory has no event dispatcher")?;
    let mut translator = InputTranslator::new(
        Box::new(HeadlessPointerBackend::new()),
        dispatcher,
        metrics.clone(),
    )
    .with_default_cursor(config.default_cursor()?);
    translator.set_window_change_observer(factory.window_change_observer());
    info!(seat = %config.input.seat_name, "Pointer translator ready");

    let mut host = ChannelSupportHost::new(metrics.clone());
    let handler = Arc::new(LoggingChannelHandler::default());
    let observer = Arc::new(LoggingChannelObserver);
    host.register_handler(handler.clone());
    host.add_channel_observer(observer.clone());

    let transport: SendFn = Arc::new(|message: Message| {
        debug!(
            routing_id = message.routing_id,
            msg_type = message.msg_type,
            bytes = message.len(),
            "Transport send"
        );
    });

    let total = records.len();
    for record in records {
        match record {
            TraceRecord::ChannelEstablished { host_id } => {
                if let Err(e) = host.on_channel_established(
                    HostId(host_id),
                    send_runner.clone(),
                    Arc::clone(&transport),
                ) {
                    warn!("Establish rejected: {}", e);
                }
            }
            TraceRecord::ChannelDestroyed { host_id } => {
                host.on_channel_destroyed(HostId(host_id));
            }
            TraceRecord::Message { .. } => {
                if let Some(message) = record.message() {
                    host.on_message_received(&message);
                }
            }
            TraceRecord::Send { .. } => {
                if let Some(message) = record.message() {
                    match host.send(message) {
                        Ok(()) => {}
                        Err(ChannelError::NotConnected) => {
                            warn!("Send dropped, no channel connected")
                        }
                        Err(e) => warn!("Send failed: {}", e),
                    }
                }
            }
            TraceRecord::Device { callback } => {
                translator
                    .handle_callback(callback)
                    .with_context(|| format!("Failed to handle {} callback", callback.name()))?;
            }
        }
    }

    ui_runner.flush().context("UI thread stopped during replay")?;
    send_runner
        .flush()
        .context("Send thread stopped during replay")?;

    if config.logging.metrics {
        info!("Metrics:\n{}", metrics.export_prometheus());
    }

    Ok(ReplaySummary {
        records: total,
        events: sink.delivered.load(Ordering::Relaxed),
    })
}

/// Consumes portable events on the UI thread by logging them
#[derive(Default)]
struct LoggingEventSink {
    delivered: AtomicU64,
}

impl EventSink for LoggingEventSink {
    fn dispatch_event(&self, event: PortableEvent) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        info!(
            kind = ?event.kind(),
            x = event.location().x,
            y = event.location().y,
            flags = ?event.flags(),
            "Pointer event"
        );
    }
}

/// Logs pointer surface changes
struct LoggingWindowObserver;

impl WindowChangeObserver for LoggingWindowObserver {
    fn on_window_enter(&self, surface: SurfaceId) {
        debug!(surface = surface.0, "Pointer entered surface");
    }

    fn on_window_leave(&self, surface: SurfaceId) {
        debug!(surface = surface.0, "Pointer left surface");
    }
}

/// Handler claiming control messages (routing id 0)
#[derive(Default)]
struct LoggingChannelHandler {
    sender: parking_lot::Mutex<Option<ChannelSender>>,
}

impl ChannelHandler for LoggingChannelHandler {
    fn on_channel_established(&self, host_id: HostId, sender: ChannelSender) {
        info!(%host_id, "Handler attached to channel");
        *self.sender.lock() = Some(sender);
    }

    fn on_channel_destroyed(&self, host_id: HostId) {
        info!(%host_id, "Handler detached from channel");
        *self.sender.lock() = None;
    }

    fn on_message_received(&self, message: &Message) -> bool {
        if message.routing_id != 0 {
            return false;
        }
        info!(
            msg_type = message.msg_type,
            bytes = message.len(),
            "Control message"
        );
        true
    }
}

/// Logs channel availability
struct LoggingChannelObserver;

impl ChannelObserver for LoggingChannelObserver {
    fn on_channel_established(&self) {
        info!("Channel available");
    }

    fn on_channel_destroyed(&self) {
        info!("Channel gone");
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn format_layer<W>(format: &str, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);
    match format {
        "json" => Box::new(layer.json()),
        "compact" => Box::new(layer.compact()),
        _ => Box::new(layer.pretty()),
    }
}

fn init_logging(args: &Args, config: &Config) -> Result<Option<WorkerGuard>> {
    let log_level = match args.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "ozone_bridge={level},warn",
            level = log_level
        ))
    });

    let mut layers: Vec<BoxedLayer> = vec![format_layer(&args.log_format, io::stdout, true)];

    if let Some(log_file_path) = &args.log_file {
        let file = File::create(log_file_path).with_context(|| {
            format!("Failed to create log file {}", log_file_path.display())
        })?;
        layers.push(format_layer(&args.log_format, Mutex::new(file), false));
    }

    let mut guard = None;
    if let Some(log_dir) = &config.logging.log_dir {
        let appender = tracing_appender::rolling::daily(log_dir, "ozone-bridge.log");
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        layers.push(format_layer(&args.log_format, writer, false));
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    if let Some(log_file_path) = &args.log_file {
        info!("Logging to file: {}", log_file_path.display());
    }
    if let Some(log_dir) = &config.logging.log_dir {
        info!("Logging to directory: {}", log_dir.display());
    }

    Ok(guard)
}
