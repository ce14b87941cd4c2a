//! Reel CLI
//!
//! Usage:
//!   reel-cli play [--bet N] [--lines N] [--spins N]   - Play spins in the terminal
//!   reel-cli paytable [--top N]                       - Print the paytable
//!   reel-cli paylines                                 - Draw the payline catalog
//!   reel-cli dump-config [--yaml]                     - Print the machine config
//!
//! Global flags: --config FILE, --mode strips|weighted, --profile, --seed

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crossbeam_channel::Receiver;
use reel_engine::{
    GridSnapshot, ImmediateScheduler, MachineConfig, RealTimeScheduler, SpinEngine, SpinEvent,
    SpinResult, SymbolSet, TickScheduler, TimingConfig, TimingProfile, run_spin,
};

#[derive(Parser)]
#[command(name = "reel-cli", about = "Terminal slot machine", version)]
struct Cli {
    /// Machine config file (.json, .yaml or .yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Built-in machine used when no config file is given
    #[arg(short, long, value_enum, default_value_t = Mode::Strips, global = true)]
    mode: Mode,

    /// Override the machine's animation timing
    #[arg(short, long, value_enum, global = true)]
    profile: Option<Profile>,

    /// Seed for reproducible play
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Strips,
    Weighted,
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Normal,
    Turbo,
    Studio,
}

impl From<Profile> for TimingProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Normal => TimingProfile::Normal,
            Profile::Turbo => TimingProfile::Turbo,
            Profile::Studio => TimingProfile::Studio,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play spins, animating the reels
    Play {
        /// Bet per line (defaults to the machine's default bet)
        #[arg(short, long)]
        bet: Option<u64>,
        /// Active paylines (defaults to the machine's default)
        #[arg(short, long)]
        lines: Option<usize>,
        /// Number of spins
        #[arg(short = 'n', long, default_value_t = 1)]
        spins: u32,
        /// Skip the animation and only print results
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print the paytable
    Paytable {
        /// Only the N best-paying symbols for a full line
        #[arg(short, long)]
        top: Option<usize>,
    },
    /// Draw every payline on the grid
    Paylines,
    /// Print the machine configuration
    DumpConfig {
        /// YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let mut cli = Cli::parse();

    let config = load_config(&cli)?;
    log::info!("machine '{}' loaded", config.name);

    let command = cli.command.take().unwrap_or(Commands::Play {
        bet: None,
        lines: None,
        spins: 1,
        quiet: false,
    });

    match command {
        Commands::Play {
            bet,
            lines,
            spins,
            quiet,
        } => {
            let mut engine = build_engine(&config, &cli)?;
            play(&mut engine, bet, lines, spins, quiet)
        }
        Commands::Paytable { top } => {
            let engine = build_engine(&config, &cli)?;
            print_paytable(&engine, top);
            Ok(())
        }
        Commands::Paylines => {
            let engine = build_engine(&config, &cli)?;
            print_paylines(&engine);
            Ok(())
        }
        Commands::DumpConfig { yaml } => {
            let text = if yaml { config.to_yaml() } else { config.to_json() };
            let text = text.context("Failed to serialize config")?;
            println!("{}", text);
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<MachineConfig> {
    let mut config = match &cli.config {
        Some(path) => MachineConfig::from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match cli.mode {
            Mode::Strips => MachineConfig::classic_strips(),
            Mode::Weighted => MachineConfig::classic_weighted(),
        },
    };
    if let Some(profile) = cli.profile {
        config.timing = TimingConfig::from_profile(profile.into());
    }
    Ok(config)
}

fn build_engine(config: &MachineConfig, cli: &Cli) -> Result<SpinEngine> {
    let engine = match cli.seed {
        Some(seed) => SpinEngine::with_seed(config, seed),
        None => SpinEngine::new(config),
    };
    engine.with_context(|| format!("Invalid machine '{}'", config.name))
}

fn play(
    engine: &mut SpinEngine,
    bet: Option<u64>,
    lines: Option<usize>,
    spins: u32,
    quiet: bool,
) -> Result<()> {
    let events = engine.subscribe();
    if let Some(lines) = lines {
        engine.set_active_lines(lines);
    }
    if let Some(bet) = bet {
        let target = engine.clamp_bet(bet);
        while engine.selection().bet_per_line < target {
            engine.bet_up();
        }
        while engine.selection().bet_per_line > target {
            engine.bet_down();
        }
    }

    let rows = engine.machine().grid.rows as usize;
    println!("{}", engine.status());
    println!("Credits: {}", engine.current_bankroll());

    for _ in 0..spins {
        if let Err(rejected) = engine.request_spin_with_selection() {
            log::debug!("{}", rejected);
            println!("{}", engine.status());
            break;
        }

        let result = if quiet {
            spin(engine, &mut ImmediateScheduler::new(), rows, false)
        } else {
            spin(engine, &mut RealTimeScheduler, rows, true)
        };
        let result = result?.context("Spin did not settle")?;

        print_result(engine, &result);
        report_events(&events);

        if engine.current_bankroll() == 0 {
            break;
        }
    }
    Ok(())
}

fn spin<S: TickScheduler>(
    engine: &mut SpinEngine,
    scheduler: &mut S,
    rows: usize,
    animate: bool,
) -> Result<Option<SpinResult>> {
    let symbols = engine.symbols().clone();
    let mut drawn = false;
    let mut draw_error = None;
    let result = run_spin(engine, scheduler, |outcome| {
        if animate && draw_error.is_none() {
            match redraw(&mut io::stdout().lock(), &outcome.snapshot, &symbols, rows, drawn) {
                Ok(()) => drawn = true,
                Err(e) => draw_error = Some(e),
            }
        }
    });
    if let Some(e) = draw_error {
        return Err(e).context("Failed to draw reels");
    }
    if !animate {
        println!("{}", engine.snapshot().render(&symbols));
    }
    Ok(result)
}

fn redraw<W: Write>(
    out: &mut W,
    snapshot: &GridSnapshot,
    symbols: &SymbolSet,
    rows: usize,
    drawn: bool,
) -> io::Result<()> {
    if drawn {
        write!(out, "\x1b[{}A", rows)?;
    }
    for line in snapshot.render(symbols).lines() {
        writeln!(out, "\x1b[2K{}", line)?;
    }
    out.flush()
}

fn print_result(engine: &SpinEngine, result: &SpinResult) {
    for win in &result.wins {
        println!(
            "  line {}: {} x{} pays {} (x{})",
            win.line_index,
            engine.symbols().glyph(win.symbol),
            win.run_length,
            win.amount_won,
            win.multiplier
        );
    }
    println!("{}", engine.status());
    println!(
        "Bet: {} x {} = {}  Credits: {}",
        result.bet_per_line,
        result.active_lines,
        result.stake,
        engine.current_bankroll()
    );
}

fn report_events(events: &Receiver<SpinEvent>) {
    for event in events.try_iter() {
        match &event {
            SpinEvent::ReelStopped { reel_index, .. } => log::debug!("reel {} stopped", reel_index),
            SpinEvent::Tick { .. } => {}
            other => log::debug!("event {}", other.type_name()),
        }
    }
}

fn print_paytable(engine: &SpinEngine, top: Option<usize>) {
    let symbols = engine.symbols();
    let reels = engine.machine().grid.reels;

    if let Some(n) = top {
        let paytable = engine.machine().evaluator.paytable();
        for (symbol, multiplier) in paytable.top_wins(symbols, reels, n) {
            println!("{} x{}  pays x{}", symbols.glyph(symbol), reels, multiplier);
        }
        return;
    }

    for def in &symbols.symbols {
        let Some(pays) = engine.paytable_for(def.id) else {
            continue;
        };
        let pays: Vec<String> = pays.iter().map(|(run, m)| format!("{}: x{}", run, m)).collect();
        println!("{} {:<8} {}", def.glyph, def.name, pays.join("  "));
    }
}

fn print_paylines(engine: &SpinEngine) {
    let rows = engine.machine().grid.rows;
    for line in engine.all_paylines() {
        println!("Line {}", line.index);
        for row in 0..rows {
            let cells: Vec<&str> = line
                .rows
                .iter()
                .map(|&r| if r == row { "■" } else { "·" })
                .collect();
            println!("  {}", cells.join(" "));
        }
    }
}
