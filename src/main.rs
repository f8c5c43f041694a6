use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info, warn};
use rand::Rng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tickhud::config::{AppConfig, JsonFileStore, PermissionChecker};
use tickhud::core::{Engine, HostAdapters, SurfaceWriters};
use tickhud_core::{PersistenceStore, SurfaceWriter, UserHandle, MSPT_BUDGET};
use tickhud_sources::{SystemProbe, TickTracker};
use tickhud_types::{SurfaceFrame, SurfaceKind};
use uuid::Uuid;

/// tickhud - per-user server performance overlays, demonstrated on a simulated host
#[derive(Parser, Debug, Clone)]
#[command(name = "tickhud")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to load (defaults to the platform config directory)
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory for per-user display settings
    #[arg(long = "data-dir", value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Number of simulated users
    #[arg(short = 'u', long = "users", default_value = "3")]
    users: usize,

    /// How long to run the simulation
    #[arg(short = 's', long = "seconds", default_value = "6")]
    seconds: u64,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

/// A connected user on the simulated host
struct SimUser {
    id: Uuid,
    name: String,
    online: AtomicBool,
    ping: AtomicU32,
}

impl SimUser {
    fn new(id: Uuid, name: String) -> Arc<Self> {
        let ping = rand::thread_rng().gen_range(20..300);
        Arc::new(Self {
            id,
            name,
            online: AtomicBool::new(true),
            ping: AtomicU32::new(ping),
        })
    }
}

impl UserHandle for SimUser {
    fn identity(&self) -> Uuid {
        self.id
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn ping_ms(&self) -> Option<u32> {
        Some(self.ping.load(Ordering::Relaxed))
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

/// Prints frames instead of sending them to a client
struct LogWriter {
    surface: SurfaceKind,
}

impl SurfaceWriter for LogWriter {
    fn write(&self, user: Uuid, frame: &SurfaceFrame) {
        match frame {
            SurfaceFrame::BossBar { text, progress, color, .. } => {
                info!("[{}] {} {:?} {:.0}%: {}", self.surface, user, color, progress * 100.0, text)
            }
            _ => info!("[{}] {}: {}", self.surface, user, frame.text()),
        }
    }

    fn clear(&self, user: Uuid) {
        debug!("[{}] {} cleared", self.surface, user);
    }
}

struct AllowAll;

impl PermissionChecker for AllowAll {
    fn has_permission(&self, _user: Uuid, _permission: &str) -> bool {
        true
    }
}

/// Runs a 20 TPS tick loop with jittered tick durations
struct SimulatedServer {
    running: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

impl SimulatedServer {
    fn start(ticks: Arc<TickTracker>) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let tick_budget = Duration::from_millis(MSPT_BUDGET as u64);

        let handle = thread::Builder::new()
            .name("sim-server".to_string())
            .spawn(move || {
                let epoch = Instant::now();
                let mut rng = rand::thread_rng();
                let mut tick = 0u64;
                while flag.load(Ordering::Relaxed) {
                    let start = epoch.elapsed();
                    // occasional lag spike
                    let work_ms = if rng.gen_ratio(1, 40) {
                        rng.gen_range(60..120)
                    } else {
                        rng.gen_range(2..25)
                    };
                    thread::sleep(Duration::from_millis(work_ms));
                    let duration = epoch.elapsed() - start;

                    tick += 1;
                    ticks.record_tick(tick, start.as_nanos() as u64, duration.as_nanos() as u64);
                    if let Some(rest) = tick_budget.checked_sub(duration) {
                        thread::sleep(rest);
                    }
                }
            })
            .context("Failed to spawn simulated server thread")?;

        Ok(Self { running, handle })
    }

    fn stop(self) {
        self.running.store(false, Ordering::Relaxed);
        if self.handle.join().is_err() {
            warn!("Simulated server thread panicked");
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info, shows rendered frames
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    warn!("Starting tickhud v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load()?,
    };
    let store: Arc<dyn PersistenceStore> = match &cli.data_dir {
        Some(dir) => Arc::new(JsonFileStore::new(dir)),
        None => Arc::new(JsonFileStore::in_project_dirs()?),
    };

    let ticks = Arc::new(TickTracker::new());
    let probe = Arc::new(SystemProbe::new());
    let host = HostAdapters {
        ticks: ticks.clone(),
        load: probe.clone(),
        memory: probe,
        permissions: Arc::new(AllowAll),
        writers: SurfaceWriters {
            tab: Arc::new(LogWriter { surface: SurfaceKind::Tab }),
            action_bar: Arc::new(LogWriter { surface: SurfaceKind::ActionBar }),
            boss_bar: Arc::new(LogWriter { surface: SurfaceKind::BossBar }),
        },
        store,
        render_fn: None,
    };

    let server = SimulatedServer::start(ticks)?;
    let engine = Engine::new(config, host)?;
    engine.telemetry().set_max_players(cli.users.max(1) * 2);
    let registry = engine.registry();

    let users: Vec<Arc<SimUser>> = (0..cli.users)
        .map(|i| SimUser::new(Uuid::new_v4(), format!("player{}", i + 1)))
        .collect();
    for (i, user) in users.iter().enumerate() {
        let session = registry.handle_join(user.clone());
        let kind = SurfaceKind::ALL[i % SurfaceKind::ALL.len()];
        match session.toggle(kind) {
            Ok(enabled) => info!("{} toggled {} -> {}", user.name, kind, enabled),
            Err(e) => warn!("{} cannot use {}: {}", user.name, kind, e),
        }
    }

    let step = Duration::from_secs(cli.seconds.max(1)) / 3;
    thread::sleep(step);

    // Respawn: same identity, new entity handle
    if let Some(first) = users.first() {
        first.online.store(false, Ordering::SeqCst);
        let respawned = SimUser::new(first.id, first.name.clone());
        if let Err(e) = registry.replace(respawned) {
            warn!("Respawn of {} failed: {}", first.name, e);
        }
    }
    thread::sleep(step);

    if let Some(last) = users.last() {
        last.online.store(false, Ordering::SeqCst);
        if let Err(e) = registry.handle_quit(last.id) {
            warn!("Quit of {} failed: {}", last.name, e);
        }
    }
    thread::sleep(step);

    let telemetry = engine.telemetry();
    let tps = telemetry.recent_tps();
    println!("TPS (5s, 1m, 5m, 15m): {:.2?}", tps);
    println!("MSPT: {:.2}", telemetry.average_mspt());
    let load = telemetry.recent_cpu_load();
    println!("CPU: process {:.2}%, system {:.2}%", load.process, load.system);
    for report in telemetry.tick_report() {
        match report.summary {
            Some(summary) => println!(
                "Last {} ticks: avg {:.2}ms, min {:.2}ms, max {:.2}ms",
                report.window,
                summary.average_ms(),
                summary.min_ms(),
                summary.max_ms()
            ),
            None => println!("Last {} ticks: no data", report.window),
        }
    }
    println!("Sessions: {}", registry.len());

    if !engine.shutdown() {
        warn!("Display jobs did not stop in time");
    }
    server.stop();
    Ok(())
}
