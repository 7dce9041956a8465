//! Native Ogar - headless simulation driver

use engine::{Config, World};
use futures_util::FutureExt;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Commands accepted on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Pause,
    Resume,
    Restart,
    Stats,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "pause" | "freeze" => Some(Self::Pause),
            "resume" | "unpause" => Some(Self::Resume),
            "restart" | "reset" => Some(Self::Restart),
            "stats" | "status" => Some(Self::Stats),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Native Ogar simulation v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Loaded configuration");
    info!("  Border: {}x{}", config.border.width, config.border.height);
    info!("  Game mode: {}", config.server.gamemode);
    info!("  Tick interval: {}ms", config.server.tick_interval_ms);

    let tick_interval_ms = config.server.tick_interval_ms;
    let mut world = World::new(config)?;

    let (viruses, food) = (world.config().virus.min_amount, world.config().food.min_amount);
    world.spawn_cells(viruses, food);

    run(world, tick_interval_ms).await;
    info!("Shutting down");
    Ok(())
}

/// Drive the world at a fixed rate until `quit` or Ctrl+C.
async fn run(mut world: World, tick_interval_ms: u64) {
    let period = Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut console = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;

    loop {
        tokio::select! {
            scheduled = ticker.tick() => {
                // Drain any backlog so the world only runs the latest tick
                let mut skipped = 0u32;
                while ticker.tick().now_or_never().is_some() {
                    skipped += 1;
                }
                if skipped > 0 {
                    debug!(
                        "Skipped {} ticks to stay current (lag: {:?})",
                        skipped,
                        Instant::now().saturating_duration_since(scheduled)
                    );
                }
                step(&mut world, tick_interval_ms);
            }
            line = console.next_line(), if console_open => {
                match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match Command::parse(&line) {
                            Some(Command::Quit) => break,
                            Some(command) => execute(&mut world, command),
                            None => warn!("Unknown command: {}", line.trim()),
                        }
                    }
                    Ok(None) => console_open = false,
                    Err(e) => {
                        warn!("Console read failed: {}", e);
                        console_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C");
                break;
            }
        }
    }
}

/// Run one tick and record its duration.
fn step(world: &mut World, tick_interval_ms: u64) {
    let tick_start = std::time::Instant::now();
    let diff = world.tick();
    let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;

    // Exponential moving average, weight 0.5
    world.update_time_avg = world.update_time_avg * 0.5 + tick_ms * 0.5;

    let tick_budget = tick_interval_ms as f64 * 0.9;
    if tick_ms > tick_budget {
        let counts = world.cell_counts();
        warn!(
            "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} cells total, {} moving",
            world.tick_count(),
            tick_ms,
            tick_budget,
            counts.total,
            counts.moving
        );
    }
    if diff.reset {
        info!("World reset at tick {}", world.tick_count());
    }
}

fn execute(world: &mut World, command: Command) {
    match command {
        Command::Pause => world.freeze(),
        Command::Resume => world.resume(),
        Command::Restart => {
            world.restart();
            let (viruses, food) = (world.config().virus.min_amount, world.config().food.min_amount);
            world.spawn_cells(viruses, food);
        }
        Command::Stats => info!("{}", world.stats()),
        Command::Quit => {}
    }
}
