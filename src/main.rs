use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use notify_rust::{Notification, Urgency};
use ratatui::{prelude::*, widgets::*};
use std::{
    fs, io,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Mutex,
    time::{Duration, Instant},
};
use timetasker::{
    format_clock, parse_duration, paths::APP_NAME, CompletionLog, Config, CountdownTimer, Overrides, ProjectDirs,
    Settings, Tick,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Type Aliases & Constants
// ============================================================================

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
const TICK_RATE: Duration = Duration::from_secs(1);
const FLUSH_RETRY_INTERVAL: Duration = Duration::from_secs(30);
const LOG_ENV: &str = "TIMETASKER_LOG";

const COUNTDOWN_COLOR: Color = Color::Rgb(100, 181, 246);
const OVERTIME_COLOR: Color = Color::Rgb(0, 255, 150);
const BORDER_COLOR: Color = Color::Rgb(0, 200, 255);
const ACCENT_COLOR: Color = Color::Rgb(255, 100, 0);

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser)]
#[command(author, version, about = "timetasker - a terminal Pomodoro timer")]
struct Args {
    /// Work interval such as 25m or 1h30m, overriding the config file
    #[arg(short, long, value_parser = parse_duration)]
    work: Option<Duration>,
    /// Read configuration from this file instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Do not show a desktop notification when an interval completes
    #[arg(long)]
    no_notify: bool,
}

// ============================================================================
// Application State
// ============================================================================

#[derive(PartialEq, Clone, Copy, Debug)]
enum View {
    Timer,
    Help,
}

struct App {
    timer: CountdownTimer,
    view: View,
    notify: bool,
    persist_error: Option<String>,
    last_flush_attempt: Instant,
}

impl App {
    fn new(settings: &Settings, log: CompletionLog) -> Self {
        Self {
            timer: CountdownTimer::new(settings.work_interval, log),
            view: View::Timer,
            notify: settings.notify,
            persist_error: None,
            last_flush_attempt: Instant::now(),
        }
    }

    fn completed_today(&self) -> usize {
        self.timer.log().count_today(Local::now())
    }

    fn phase_color(&self) -> Color {
        if self.timer.is_counting_down() {
            COUNTDOWN_COLOR
        } else {
            OVERTIME_COLOR
        }
    }

    fn update(&mut self) {
        let tick = self.timer.tick();
        self.after_tick(tick);
        self.retry_flush();
    }

    fn toggle(&mut self) {
        let tick = self.timer.toggle();
        self.after_tick(tick);
    }

    fn reset(&mut self) {
        let tick = self.timer.reset();
        self.after_tick(tick);
    }

    fn after_tick(&mut self, tick: Tick) {
        let Tick::Completed(result) = tick else {
            return;
        };

        let today = self.completed_today();
        info!(today, "work interval complete");
        match result {
            Ok(()) => self.persist_error = None,
            Err(e) => {
                error!(error = %e, "completion was counted but not saved");
                self.persist_error = Some(e.to_string());
                self.last_flush_attempt = Instant::now();
            }
        }

        if self.notify {
            notify(today);
        }
    }

    fn retry_flush(&mut self) {
        if !self.timer.log().is_dirty() || self.last_flush_attempt.elapsed() < FLUSH_RETRY_INTERVAL {
            return;
        }
        self.last_flush_attempt = Instant::now();
        match self.timer.log_mut().flush() {
            Ok(()) => {
                info!("completion log saved after retry");
                self.persist_error = None;
            }
            Err(e) => self.persist_error = Some(e.to_string()),
        }
    }

    fn save_on_quit(&mut self) {
        if let Err(e) = self.timer.log_mut().flush() {
            error!(error = %e, "unsaved completions lost on exit");
            eprintln!("timetasker: {e}");
        }
    }
}

// ============================================================================
// Event Handlers
// ============================================================================

/// Apply a key press. Returns true when the application should quit.
fn handle_input(key: KeyEvent, app: &mut App) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    // Any key dismisses help.
    if app.view == View::Help {
        app.view = View::Timer;
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('b') | KeyCode::Char(' ') => app.toggle(),
        KeyCode::Char('r') => app.reset(),
        KeyCode::Char('?') => app.view = View::Help,
        _ => {}
    }

    false
}

// ============================================================================
// UI Rendering
// ============================================================================

fn render_ui(f: &mut Frame, app: &App) {
    match app.view {
        View::Timer => render_timer(f, app),
        View::Help => render_help(f),
    }
}

fn render_timer(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(f.size());

    let header = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(Span::styled(" TIMETASKER ", Style::default()
            .fg(ACCENT_COLOR).add_modifier(Modifier::BOLD)));
    f.render_widget(header, chunks[0]);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(15),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(3), Constraint::Length(1),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Percentage(15),
        ])
        .split(chunks[1]);

    let label = if app.timer.is_counting_down() { "FOCUS" } else { "OVERTIME" };
    f.render_widget(
        Paragraph::new(label)
            .style(Style::default().fg(app.phase_color()).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[1]
    );

    let sign = if app.timer.is_counting_down() { "" } else { "+" };
    let time_str = format!("{sign}{}", format_clock(app.timer.display_seconds()));
    f.render_widget(
        Paragraph::new(time_str)
            .style(Style::default().fg(app.phase_color()).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[3]
    );

    let running = app.timer.is_running();
    let status = if running { "● RUNNING" } else { "⏸  PAUSED" };
    f.render_widget(
        Paragraph::new(status)
            .style(Style::default()
                .fg(if running { Color::Green } else { Color::Yellow })
                .add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[5]
    );

    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded))
            .gauge_style(Style::default().fg(app.phase_color()).bg(Color::Black))
            .percent((app.timer.progress() * 100.0) as u16),
        sections[7]
    );

    let today = app.completed_today();
    let count_text = format!(
        "{today} {} completed today",
        if today == 1 { "interval" } else { "intervals" }
    );
    f.render_widget(
        Paragraph::new(count_text).style(Style::default().fg(Color::Gray)).alignment(Alignment::Center),
        sections[9]
    );

    if let Some(err) = &app.persist_error {
        f.render_widget(
            Paragraph::new(format!("⚠ not saved, retrying: {err}"))
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center),
            sections[11]
        );
    }

    let controls = Line::from(vec![
        span_key("B"), Span::raw(" Start/Pause  •  "),
        span_key("R"), Span::raw(" Reset  •  "),
        span_key("?"), Span::raw(" Help  •  "),
        span_key("Q"), Span::raw(" Quit"),
    ]);
    f.render_widget(
        Paragraph::new(controls).alignment(Alignment::Center).style(Style::default().fg(Color::DarkGray)),
        chunks[2]
    );
}

fn span_key(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD))
}

fn render_help(f: &mut Frame) {
    let area = centered_rect(60, 60, f.size());

    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("CONTROLS", Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD))),
        Line::from(""),
        help_line("B / Space", "Start or pause the timer"),
        help_line("R", "Reset to a fresh interval"),
        help_line("Q / Esc", "Quit"),
        help_line("Ctrl+C", "Force quit"),
        help_line("?", "Show this help"),
        Line::from(""),
        Line::from(Span::styled("  When the countdown reaches zero the interval is logged",
            Style::default().fg(Color::Gray))),
        Line::from(Span::styled("  and the clock keeps counting overtime until reset.",
            Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from(Span::styled("  (press any key to close)",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))),
    ];

    f.render_widget(
        Paragraph::new(help_text)
            .alignment(Alignment::Left)
            .block(Block::default()
                .title(" Help ")
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR))),
        area
    );
}

fn help_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("    "),
        Span::styled(format!("{key:<10}"), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {}", desc)),
    ])
}

fn centered_rect(w: u16, h: u16, r: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h) / 2),
            Constraint::Percentage(h),
            Constraint::Percentage((100 - h) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w) / 2),
            Constraint::Percentage(w),
            Constraint::Percentage((100 - w) / 2),
        ])
        .split(v[1])[1]
}

// ============================================================================
// Utilities
// ============================================================================

fn notify(completed_today: usize) {
    let result = Notification::new()
        .summary("Work interval complete")
        .body(&format!("{completed_today} completed today. Counting overtime until you reset."))
        .appname(APP_NAME)
        .icon("alarm-clock")
        .urgency(Urgency::Normal)
        .show();

    if let Err(e) = result {
        warn!(error = %e, "desktop notification failed");
    }
}

/// Send tracing output to a file; the terminal belongs to the UI.
fn init_logging(path: &Path) {
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let Ok(file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("timetasker: {e}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let dirs = ProjectDirs::resolve()?;
    init_logging(&dirs.log_file());

    let config_path = args.config.clone().unwrap_or_else(|| dirs.config_file());
    let config = Config::load(&config_path)?;
    let overrides = Overrides {
        work_interval: args.work,
        no_notify: args.no_notify,
    };
    let settings = Settings::resolve(&config, &overrides, &dirs)?;
    info!(work_interval = ?settings.work_interval, config = %config_path.display(), "starting");

    let log = CompletionLog::load_or_recover(&settings.completions_file)?;
    let mut app = App::new(&settings, log);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    app.save_on_quit();
    info!("exiting");
    res
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| render_ui(f, app))?;

        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_input(key, app) {
                    return Ok(());
                }
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.update();
            last_tick = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(dir: &Path) -> App {
        let settings = Settings {
            work_interval: Duration::from_secs(1500),
            notify: false,
            completions_file: dir.join("completions.json"),
        };
        let log = CompletionLog::load(&settings.completions_file).unwrap();
        App::new(&settings, log)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn toggle_keys_start_and_pause() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());

        assert!(!handle_input(press(KeyCode::Char('b')), &mut app));
        assert!(app.timer.is_running());
        assert!(!handle_input(press(KeyCode::Char(' ')), &mut app));
        assert!(!app.timer.is_running());
    }

    #[test]
    fn reset_key_stops_the_timer() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());

        handle_input(press(KeyCode::Char('b')), &mut app);
        handle_input(press(KeyCode::Char('r')), &mut app);
        assert!(!app.timer.is_running());
        assert_eq!(app.timer.remaining(), Duration::from_secs(1500));
    }

    #[test]
    fn help_is_dismissed_by_any_key() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());

        handle_input(press(KeyCode::Char('?')), &mut app);
        assert_eq!(app.view, View::Help);
        assert!(!handle_input(press(KeyCode::Char('q')), &mut app));
        assert_eq!(app.view, View::Timer);
        assert!(!app.timer.is_running());
    }

    #[test]
    fn quit_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(tmp.path());

        assert!(handle_input(press(KeyCode::Char('q')), &mut app));
        assert!(handle_input(press(KeyCode::Esc), &mut app));
        app.view = View::Help;
        assert!(handle_input(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), &mut app));
    }
}
