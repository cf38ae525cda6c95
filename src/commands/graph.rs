//! Graph command implementation
//!
//! Scrapes the endpoints once to populate the picker, then hands the chosen
//! series to the poll loop and redraws the dashboard after every event.

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::collections::HashSet;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use promgraph::{
    config::Config,
    poll::{PollEvent, PollHandle, PollRunner, PollState},
    source::{parser::SampleFilter, MetricSample, MetricSource, MultiSource, PrometheusSource},
    ui::{Dashboard, Picker, PickerAction},
};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// How long the input thread waits before rechecking for loop exit
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Execute the graph command
///
/// # Arguments
/// * `cfg` - Validated configuration
/// * `preselected` - Series to graph; when empty the picker is shown
pub async fn execute(cfg: &Config, preselected: Vec<String>) -> Result<()> {
    let filter = SampleFilter::new(cfg.filter.metrics.clone(), &cfg.filter.labels)?;
    let source = MultiSource::from_urls(&cfg.sources.urls, &filter, cfg.sources.timeout())?;

    let series = if preselected.is_empty() {
        let samples = initial_scrape(&source).await;
        if samples.is_empty() {
            println!("No metrics found");
            return Ok(());
        }
        match run_picker(&samples)? {
            Some(names) => names,
            None => return Ok(()),
        }
    } else {
        preselected
    };

    info!(series = series.len(), "Starting dashboard");
    let state = PollState::new(series, cfg.poll.interval(), cfg.poll.history);
    run_dashboard(state, Arc::new(source)).await
}

/// Fetch each endpoint once, reporting and skipping the ones that fail
async fn initial_scrape(source: &MultiSource<PrometheusSource>) -> Vec<MetricSample> {
    let mut seen = HashSet::new();
    let mut samples = Vec::new();

    for endpoint in source.sources() {
        match endpoint.fetch().await {
            Ok(batch) => {
                samples.extend(batch.into_iter().filter(|s| seen.insert(s.name.clone())));
            }
            Err(e) => {
                warn!(url = endpoint.url(), error = %e, "Initial scrape failed");
                eprintln!("{} {}", "Error fetching metrics:".red(), e);
            }
        }
    }

    samples
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the picker until the user confirms a selection or quits
fn run_picker(samples: &[MetricSample]) -> Result<Option<Vec<String>>> {
    let mut terminal = setup_terminal()?;
    let mut picker = Picker::new(samples);

    let result = loop {
        if let Err(e) = terminal.draw(|f| picker.render(f)) {
            break Err(e.into());
        }

        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                match picker.handle_key(key) {
                    PickerAction::None => {}
                    PickerAction::Confirm(names) => break Ok(Some(names)),
                    PickerAction::Quit => break Ok(None),
                }
            }
            Ok(_) => {}
            Err(e) => break Err(e.into()),
        }
    };

    restore_terminal(&mut terminal)?;
    result
}

/// Run the poll loop with the dashboard as its observer
async fn run_dashboard(state: PollState, source: Arc<MultiSource<PrometheusSource>>) -> Result<()> {
    let mut terminal = setup_terminal()?;

    let runner = PollRunner::new(state, source);
    let handle = runner.handle();
    let input = tokio::task::spawn_blocking(move || forward_input(handle));

    let result = runner
        .run(|state| {
            terminal.draw(|f| Dashboard::new(state, Utc::now()).render(f))?;
            Ok(())
        })
        .await;

    restore_terminal(&mut terminal)?;
    if let Err(e) = input.await {
        warn!(error = %e, "Input thread ended abnormally");
    }

    result.map(|_| ())
}

/// Translate terminal input into poll events until the loop stops
fn forward_input(handle: PollHandle) {
    while !handle.is_closed() {
        match event::poll(INPUT_POLL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!(error = %e, "Failed to poll terminal input");
                handle.shutdown();
                return;
            }
        }

        let event = match event::read() {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Failed to read terminal input");
                handle.shutdown();
                return;
            }
        };

        if let Some(poll_event) = map_terminal_event(&event) {
            if !handle.send(poll_event) {
                return;
            }
        }
    }
}

/// Dashboard key bindings
fn map_terminal_event(event: &Event) -> Option<PollEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(PollEvent::Shutdown)
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(PollEvent::Shutdown),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(PollEvent::Refresh),
            _ => None,
        },
        Event::Resize(_, _) => Some(PollEvent::Redraw),
        _ => None,
    }
}
