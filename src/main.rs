use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::{error, info};

use fission_flow::app::{App, View};
use fission_flow::config::Settings;
use fission_flow::data::{export, ExportFormat, GraphModel};
use fission_flow::events;
use fission_flow::form::Form;
use fission_flow::logging::{self, LogTarget};
use fission_flow::source::{
    DataSource, FileSource, FlowQuery, HttpSource, MetricsClient, RawResultSet,
};
use fission_flow::ui;

#[derive(Parser, Debug)]
#[command(name = "fission-flow")]
#[command(about = "Terminal data-flow visualizer for Fission functions")]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (e.g. http://192.168.39.129:31314)
    #[arg(short, long)]
    url: Option<String>,

    /// Replay a saved data-flow response instead of querying the backend
    #[arg(short, long, conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Initial query instant in Unix seconds
    #[arg(long)]
    time: Option<String>,

    /// Initial query span (e.g. "5m")
    #[arg(long)]
    step: Option<String>,

    /// Export the graph to a file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Export format: json or dot
    #[arg(long, default_value = "json", requires = "export")]
    format: ExportFormat,

    /// Log file for the interactive UI (overrides settings)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(ref url) = args.url {
        settings.backend.base_url = url.clone();
    }
    if let Some(ref file) = args.log_file {
        settings.logging.file = file.clone();
    }

    let query = FlowQuery::new(
        args.time.clone().unwrap_or_default(),
        args.step.clone().unwrap_or_default(),
    );

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        logging::init(&settings.logging, LogTarget::Stderr)?;
        return export_to_file(&args, &settings, &query, export_path);
    }

    logging::init(&settings.logging, LogTarget::File)?;
    let refresh = Duration::from_millis(settings.refresh_ms);

    match args.file {
        Some(ref path) => {
            info!(path = %path.display(), "replaying data-flow file");
            run_tui(Box::new(FileSource::new(path)), &settings, query, refresh)
        }
        None => {
            // Requests run on the runtime while the TUI owns the main thread
            let rt = tokio::runtime::Runtime::new()?;
            let client = MetricsClient::from_settings(&settings.backend)?;
            info!(url = %client.url(), "querying data-flow backend");
            let source = HttpSource::new(client, rt.handle().clone());

            let result = run_tui(Box::new(source), &settings, query, refresh);
            rt.shutdown_background();
            result
        }
    }
}

/// Run the TUI with the given data source
fn run_tui(
    source: Box<dyn DataSource>,
    settings: &Settings,
    query: FlowQuery,
    refresh_interval: Duration,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = restore_screen(&mut io::stdout());
        original_hook(panic);
    }));

    // Create app and issue the first request
    let mut app = App::new(source, settings.canvas.clone());
    if query == FlowQuery::default() {
        app.start();
    } else {
        preset_form(&mut app, &query);
        app.request(query);
    }

    // Run the main loop
    let result = run_app(&mut terminal, &mut app, refresh_interval);

    // Restore terminal
    disable_raw_mode()?;
    restore_screen(terminal.backend_mut())?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        error!(error = %e, "UI loop failed");
    }
    result
}

/// Leave the alternate screen and stop mouse reporting.
fn restore_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, LeaveAlternateScreen, DisableMouseCapture)
}

/// Show the initial query in the form.
fn preset_form(app: &mut App, query: &FlowQuery) {
    let at = query
        .time
        .as_deref()
        .and_then(|t| t.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    if let Some(at) = at {
        app.form = Form::at(at.with_timezone(&Local));
    }
    app.form.span = query.step.clone().unwrap_or_default();
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 14;

    while app.running {
        // Draw UI
        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered =
                    ratatui::layout::Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5)
                        .intersection(area);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Length(1), // Query form
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);
            ui::form::render(frame, app, chunks[2]);

            // Render current view
            match app.current_view {
                View::Graph => ui::graph::render(frame, app, chunks[3]),
                View::Edges => ui::edges::render(frame, app, chunks[3]),
            }

            ui::common::render_status_bar(frame, app, chunks[4]);

            // Render help overlay if active
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    // Content starts after header (1) + tabs (1) + form (1)
                    events::handle_mouse_event(app, mouse, 3);
                }
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Pick up finished requests periodically
        if last_refresh.elapsed() >= refresh_interval {
            let _ = app.reload_data();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Fetch once and write the graph to a file
fn export_to_file(
    args: &Args,
    settings: &Settings,
    query: &FlowQuery,
    export_path: &Path,
) -> Result<()> {
    let set = match args.file {
        Some(ref path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            RawResultSet::from_json(&content)?
        }
        None => {
            let client = MetricsClient::from_settings(&settings.backend)?;
            info!(url = %client.url(), query = %query.describe(), "fetching data flow");
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(client.fetch(query))?
        }
    };

    let model = GraphModel::build(&set);
    info!(
        nodes = model.nodes.len(),
        edges = model.edges.len(),
        "graph built"
    );
    export::write_to_file(&model, args.format, export_path)?;

    println!("Exported data flow graph to: {}", export_path.display());
    Ok(())
}
