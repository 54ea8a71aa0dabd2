//! Desktop simulator for the shift-register bug.
//!
//! Drives a simulated 74HC595 and prints every latched frame as a bar of
//! `#` and `.`. The three switches are flipped from the keyboard: type a
//! letter and press Enter.
//!
//! | Key | Switch |
//! |-----|--------|
//! | `r` | run/stop |
//! | `w` | wrap toggle |
//! | `s` | speed |
//! | `q` | quit |
//!
//! Ctrl-C also quits. Shutdown stops the poller first, then the engine, and
//! finally drives every register line low.
//!
//! ```bash
//! RUST_LOG=shift_bug=debug cargo run --features sim --bin shift-bug-sim -- --wrap
//! cargo run --features sim --bin shift-bug-sim -- --demo sweep
//! ```

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::{info, warn};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use shift_bug::hal::{Hc595, SimLine, SimSwitch, StdDelay};
use shift_bug::walk::BAR_LEN;
use shift_bug::{
    demo, Config, InputPoller, PollConfig, RandomSteps, SerialLink, SwitchMonitor, Switches,
    WalkConfig, WalkEngine,
};

#[derive(Parser)]
#[command(name = "shift-bug-sim")]
#[command(about = "Random-walk LED bug on a simulated 74HC595")]
struct Args {
    /// Base time between steps, in milliseconds
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    /// Starting position (0-7, larger values are clamped)
    #[arg(long, default_value_t = 3)]
    position: u8,

    /// Start in wrap mode
    #[arg(long)]
    wrap: bool,

    /// Time between switch polls, in milliseconds
    #[arg(long, default_value_t = 50)]
    poll_ms: u64,

    /// Hold after a wrap-switch flip, in milliseconds
    #[arg(long, default_value_t = 100)]
    debounce_ms: u64,

    /// Interval divisor while the speed switch is on
    #[arg(long, default_value_t = 3)]
    speed_divisor: u32,

    /// Seed for reproducible walks
    #[arg(long)]
    seed: Option<u64>,

    /// Log every switch change
    #[arg(long)]
    monitor: bool,

    /// Run a bench pattern instead of the interactive walk
    #[arg(long, value_enum)]
    demo: Option<DemoMode>,

    /// Number of steps for `--demo walk`
    #[arg(long, default_value_t = 40)]
    steps: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DemoMode {
    /// Light each output in turn, then all, then clear
    Sweep,
    /// Clamped walk for a fixed number of steps
    Walk,
}

impl Args {
    fn config(&self) -> Config {
        Config::default()
            .with_walk(
                WalkConfig::default()
                    .with_interval(Duration::from_millis(self.interval_ms))
                    .with_start_position(self.position)
                    .with_wrap(self.wrap),
            )
            .with_poll(
                PollConfig::default()
                    .with_period(Duration::from_millis(self.poll_ms))
                    .with_debounce(Duration::from_millis(self.debounce_ms))
                    .with_speed_divisor(self.speed_divisor),
            )
    }

    fn step_source(&self) -> RandomSteps {
        match self.seed {
            Some(seed) => RandomSteps::seeded(seed),
            None => RandomSteps::from_entropy(),
        }
    }
}

/// Renders a frame with output 0 on the left.
fn bar(frame: u8) -> String {
    (0..BAR_LEN)
        .map(|bit| if frame & (1 << bit) != 0 { '#' } else { '.' })
        .collect()
}

fn on_off(level: bool) -> &'static str {
    if level {
        "ON"
    } else {
        "OFF"
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.config();
    config.validate()?;
    info!("{} simulator starting", config.device.name);

    let chip = Hc595::new();
    chip.on_latch(|frame| info!("[{}]", bar(frame)));
    let [data, clock, latch] = chip.lines();
    let mut link = SerialLink::new(data, clock, latch)?;

    if let Some(mode) = args.demo {
        run_demo(mode, &mut link, &args, &config)?;
        link.release()?;
        return Ok(());
    }

    run_interactive(link, &args, &config)
}

fn run_demo(
    mode: DemoMode,
    link: &mut SerialLink<SimLine>,
    args: &Args,
    config: &Config,
) -> anyhow::Result<()> {
    match mode {
        DemoMode::Sweep => demo::sweep(link)?,
        DemoMode::Walk => {
            let end = demo::clamped_walk(
                link,
                config.walk.position(),
                &mut args.step_source(),
                args.steps,
                &mut StdDelay,
                config.walk.interval,
            )?;
            info!("walk demo ended at position {}", end.index());
        }
    }
    Ok(())
}

fn run_interactive(
    link: SerialLink<SimLine>,
    args: &Args,
    config: &Config,
) -> anyhow::Result<()> {
    let engine = Arc::new(WalkEngine::with_steps(link, &config.walk, args.step_source())?);

    let run = SimSwitch::new(false);
    let wrap = SimSwitch::new(false);
    let speed = SimSwitch::new(false);

    let shutdown = Arc::new(AtomicBool::new(false));
    let quit = Arc::new(Notify::new());

    let poller = spawn_poller(
        Switches::new(run.clone(), wrap.clone(), speed.clone()),
        Arc::clone(&engine),
        config,
        Arc::clone(&shutdown),
        Arc::clone(&quit),
    )?;

    let monitor = if args.monitor {
        let switches = Switches::new(run.clone(), wrap.clone(), speed.clone());
        Some(spawn_monitor(switches, config.poll.period, Arc::clone(&shutdown))?)
    } else {
        None
    };

    spawn_keyboard(run, wrap, speed, Arc::clone(&quit))?;
    info!("switches: r = run, w = wrap, s = speed, q = quit (then Enter)");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Ctrl-C received"),
                Err(e) => warn!("cannot listen for Ctrl-C: {e}"),
            },
            _ = quit.notified() => info!("quit requested"),
        }
    });

    shutdown.store(true, Ordering::SeqCst);
    let polled = join_poller(poller);
    if let Some(monitor) = monitor {
        let _ = monitor.join();
    }
    let stopped = engine.shutdown();
    finish(polled, stopped.map_err(anyhow::Error::from))
}

fn join_poller(poller: JoinHandle<anyhow::Result<()>>) -> anyhow::Result<()> {
    match poller.join() {
        Ok(outcome) => outcome,
        Err(_) => Err(anyhow::anyhow!("switch poller panicked")),
    }
}

/// Combines the poller and engine outcomes; the poller's error wins.
fn finish(polled: anyhow::Result<()>, stopped: anyhow::Result<()>) -> anyhow::Result<()> {
    match (polled, stopped) {
        (Ok(()), stopped) => {
            stopped?;
            info!("simulator stopped");
            Ok(())
        }
        (Err(e), Ok(())) => Err(e.context("switch poller failed")),
        (Err(e), Err(stop)) => {
            warn!("engine shutdown after poller failure also failed: {stop:#}");
            Err(e.context("switch poller failed"))
        }
    }
}

fn spawn_poller(
    switches: Switches<SimSwitch>,
    engine: Arc<WalkEngine<SimLine>>,
    config: &Config,
    shutdown: Arc<AtomicBool>,
    quit: Arc<Notify>,
) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
    let poll = config.poll.clone();
    let base = config.walk.interval;
    let handle = thread::Builder::new()
        .name("switch-poller".into())
        .spawn(move || {
            let outcome = InputPoller::new(switches, engine, StdDelay, &poll, base)
                .and_then(|mut poller| poller.run(&shutdown))
                .map_err(anyhow::Error::from);
            if outcome.is_err() {
                // Nothing steers the walk any more.
                quit.notify_one();
            }
            outcome
        })?;
    Ok(handle)
}

fn spawn_monitor(
    switches: Switches<SimSwitch>,
    period: Duration,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<JoinHandle<()>> {
    let mut monitor = SwitchMonitor::new(switches)?;
    let handle = thread::Builder::new()
        .name("switch-monitor".into())
        .spawn(move || {
            while !shutdown.load(Ordering::SeqCst) {
                match monitor.poll() {
                    Ok(changes) => {
                        for change in changes {
                            info!("{} {}", change.role.as_str(), on_off(change.level));
                        }
                    }
                    Err(never) => match never {},
                }
                thread::sleep(period);
            }
        })?;
    Ok(handle)
}

fn spawn_keyboard(
    run: SimSwitch,
    wrap: SimSwitch,
    speed: SimSwitch,
    quit: Arc<Notify>,
) -> anyhow::Result<()> {
    // Left detached: a blocked stdin read cannot be interrupted.
    thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                for key in line.chars() {
                    match key.to_ascii_lowercase() {
                        'r' => info!("run switch {}", on_off(run.toggle())),
                        'w' => info!("wrap switch {}", on_off(wrap.toggle())),
                        's' => info!("speed switch {}", on_off(speed.toggle())),
                        'q' => {
                            quit.notify_one();
                            return;
                        }
                        c if c.is_whitespace() => {}
                        other => warn!("unknown key {other:?}"),
                    }
                }
            }
        })?;
    Ok(())
}
