mod shared;
mod tui;
mod audio_api;
mod audio;
mod config;
mod controls;
mod loader;
mod middle;
mod remote;
mod sequencer;
mod stats;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use crossterm::terminal;
use env_logger::Env;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use audio::MixingEngine;
use audio_api::Mixer;
use config::Config;
use controls::{HeldDirection, InputPoller, LocalControls, ShakenAccel, VolumeArbitrator};
use middle::Middle;
use remote::RemoteServer;
use sequencer::BeatSequencer;
use stats::IntervalTimer;

const USAGE: &str = "usage: beatbox [CONFIG] [--headless] [--no-audio]";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[derive(Debug, PartialEq)]
struct Args {
    config: PathBuf,
    headless: bool,
    no_audio: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args {
        config: PathBuf::from(config::DEFAULT_CONFIG_FILE),
        headless: false,
        no_audio: false,
    };
    let mut config_seen = false;
    for arg in args {
        match arg.as_str() {
            "--headless" => parsed.headless = true,
            "--no-audio" => parsed.no_audio = true,
            flag if flag.starts_with('-') => anyhow::bail!("unknown option {flag}\n{USAGE}"),
            _ if config_seen => anyhow::bail!("more than one config file given\n{USAGE}"),
            path => {
                parsed.config = PathBuf::from(path);
                config_seen = true;
            }
        }
    }
    Ok(parsed)
}

// The front panel owns the terminal, so its logs go to a file
fn init_logging(to_file: bool, config: &Config) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    if to_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.log_file())?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

// The two interval timers the status line reports on
struct Timers {
    audio: Arc<IntervalTimer>,
    controls: Arc<IntervalTimer>,
}

fn run() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    let config = config::load_config(&args.config)?;
    let headless = args.headless || !std::io::stdout().is_terminal();
    init_logging(!headless, &config)?;

    let mut settings = config.engine_settings();
    if args.no_audio {
        settings.enabled = false;
    }
    let timers = Timers {
        audio: Arc::new(IntervalTimer::new()),
        controls: Arc::new(IntervalTimer::new()),
    };

    // startup order: engine, assets at the engine's rate, then the producers
    let mut engine = MixingEngine::start(&settings, Some(timers.audio.clone()));
    log::info!(
        "engine at {} Hz, volume {}{}",
        engine.sample_rate(),
        engine.volume(),
        if engine.is_silent() { ", silent" } else { "" }
    );
    let kit = loader::sample_loader::load_kit(&config.assets, engine.sample_rate())?;
    let mixer: Arc<dyn Mixer> = Arc::new(engine.mixer());

    let sequencer = BeatSequencer::new(config.sequencer.tempo, config.sequencer.mode);
    let mut beat = sequencer.spawn(mixer.clone(), kit.clone())?;

    let arbitrator = Arc::new(VolumeArbitrator::new(config.arbitration_settings()));
    let direction = Arc::new(HeldDirection::default());
    let accel = Arc::new(ShakenAccel::default());
    let local = LocalControls {
        direction: direction.clone(),
        accel: accel.clone(),
        air_drum: config.air_drum_settings(),
        kit: kit.clone(),
    };
    let mut poller = InputPoller::spawn(
        arbitrator.clone(),
        mixer,
        local,
        config.poll_period(),
        Some(timers.controls.clone()),
    )?;

    let (quit_tx, quit_rx) = crossbeam_channel::bounded(1);
    let middle = Arc::new(Middle::new(engine.mixer(), sequencer, arbitrator, kit, quit_tx));
    let mut server = RemoteServer::bind(&config.remote.bind, middle.clone())?;

    let result = if headless {
        run_headless(&middle, &quit_rx, &timers, config.stats_period());
        Ok(())
    } else {
        let panel = tui::mode::TuiState::new(direction, accel);
        run_tui(&middle, &quit_rx, &timers, config.stats_period(), panel)
    };

    // producers first so nothing enqueues into a stopped engine
    server.stop();
    poller.stop();
    beat.stop();
    engine.stop();
    log::info!("shut down");
    result
}

fn run_headless(middle: &Middle, quit_rx: &Receiver<()>, timers: &Timers, period: Duration) {
    log::info!("running headless, send 'stop' to quit");
    loop {
        match quit_rx.recv_timeout(period) {
            Err(RecvTimeoutError::Timeout) => log::info!(
                "{}",
                middle::status_line(
                    &middle.status(),
                    timers.audio.take_summary(),
                    timers.controls.take_summary()
                )
            ),
            _ => return,
        }
    }
}

fn run_tui(
    middle: &Middle,
    quit_rx: &Receiver<()>,
    timers: &Timers,
    period: Duration,
    mut tui_state: tui::mode::TuiState,
) -> anyhow::Result<()> {
    terminal::enable_raw_mode()?;
    // Key release events let the arrow keys behave like a held joystick.
    // Terminals without it fall back to the repeat timeout.
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        )
    );
    let _guard = RawModeGuard; // auto drops when out of scope
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    let mut next_report = Instant::now() + period;

    while quit_rx.try_recv().is_err() {
        if Instant::now() >= next_report {
            tui_state.audio_stats = timers.audio.take_summary();
            tui_state.control_stats = timers.controls.take_summary();
            next_report += period;
        }

        let status = middle.status();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &status, &tui_state);
        })?;

        for event in tui::input::poll_input(tick_rate, &mut tui_state)? {
            middle.handle_event(event);
        }
    }
    term.clear()?;
    Ok(())
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = terminal::disable_raw_mode();
    }
}
