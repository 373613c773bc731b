use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, Paragraph, Row, Table};

use fpl_terminal::config::Config;
use fpl_terminal::dashboard;
use fpl_terminal::fetch::{CancelToken, Fetcher};
use fpl_terminal::http_client::ReqwestTransport;
use fpl_terminal::logging::{self, LogTarget};
use fpl_terminal::session::Session;
use fpl_terminal::state::{AppState, Delta, Screen, apply_delta};

const CAPTAIN_BG: Color = Color::Rgb(255, 165, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    All,
    Squad,
    Values,
}

struct App {
    state: AppState,
    session: Session<ReqwestTransport>,
    pending: Option<Pending>,
    loading: bool,
    should_quit: bool,
}

impl App {
    fn new(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        let fetcher = Fetcher::new(transport, config.api_base.clone(), config.retry.clone());
        Ok(Self {
            state: AppState::new(config.manager_id),
            session: Session::new(fetcher, config.manager_id),
            pending: Some(Pending::All),
            loading: false,
            should_quit: false,
        })
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.input.is_some() {
            match key.code {
                KeyCode::Enter => {
                    if let Some(id) = self.state.commit_input() {
                        self.session.set_manager(id);
                        self.state.push_log(format!("[INFO] Switching to manager {id}"));
                        self.pending = Some(Pending::All);
                    }
                }
                KeyCode::Esc => self.state.cancel_input(),
                KeyCode::Backspace => self.state.input_backspace(),
                KeyCode::Char(c) => self.state.input_char(c),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Overview,
            KeyCode::Char('2') => self.state.screen = Screen::Manager,
            KeyCode::Char('3') => self.state.screen = Screen::Gameweek,
            KeyCode::Char('4') => self.state.screen = Screen::Captains,
            KeyCode::Char('m') => self.state.begin_input(),
            KeyCode::Char('r') => {
                self.session.reload();
                self.state.push_log("[INFO] Reload requested");
                self.pending = Some(Pending::All);
            }
            KeyCode::Char('p') => {
                self.state.cycle_position();
                self.pending = Some(Pending::Values);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.state.next_gameweek() {
                    self.pending = Some(Pending::Squad);
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                if self.state.prev_gameweek() {
                    self.pending = Some(Pending::Squad);
                }
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn run_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let result = match pending {
            Pending::All => dashboard::load_all(
                &mut self.session,
                self.state.position,
                self.state.selected_gameweek,
            ),
            Pending::Squad => {
                dashboard::load_squad(&mut self.session, self.state.selected_gameweek)
            }
            Pending::Values => dashboard::load_values(&mut self.session, self.state.position),
        };
        match result {
            Ok(deltas) => {
                for delta in deltas {
                    apply_delta(&mut self.state, delta);
                }
            }
            Err(err) => apply_delta(&mut self.state, Delta::Log(format!("[WARN] {err}"))),
        }
    }
}

fn main() -> Result<()> {
    let config = Config::from_env();
    logging::init(LogTarget::file_from_env())?;
    let mut app = App::new(&config).context("failed to start session")?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        if app.pending.is_some() {
            app.loading = true;
            terminal.draw(|f| ui(f, app))?;
            let cancel = app.session.fetcher().cancel_token();
            let watch = EscWatch::spawn(cancel.clone());
            app.run_pending();
            watch.finish();
            cancel.reset();
            app.loading = false;
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Watches for Esc while a blocking load runs on the UI thread.
struct EscWatch {
    done: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

impl EscWatch {
    fn spawn(cancel: CancelToken) -> Self {
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        let handle = thread::spawn(move || {
            while !flag.load(Ordering::SeqCst) {
                match event::poll(Duration::from_millis(50)) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(_) => return,
                }
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press && key.code == KeyCode::Esc {
                        cancel.cancel();
                        return;
                    }
                }
            }
        });
        Self { done, handle }
    }

    fn finish(self) {
        self.done.store(true, Ordering::SeqCst);
        let _ = self.handle.join();
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header =
        Paragraph::new(header_text(app)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let state = &app.state;
    match state.screen {
        Screen::Overview => render_overview(frame, chunks[1], state),
        Screen::Manager => render_manager(frame, chunks[1], state),
        Screen::Gameweek => render_gameweek(frame, chunks[1], state),
        Screen::Captains => render_captains(frame, chunks[1], state),
    }

    render_console(frame, chunks[2], state);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if let Some(input) = &state.input {
        render_input(frame, frame.size(), input);
    }
    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let state = &app.state;
    let screen = match state.screen {
        Screen::Overview => "Overall",
        Screen::Manager => "My Season",
        Screen::Gameweek => "Gameweek",
        Screen::Captains => "Captains",
    };
    let status = if app.loading {
        "Loading… (Esc to cancel)".to_string()
    } else {
        state
            .loaded_at
            .as_ref()
            .map(|at| format!("Updated {at}"))
            .unwrap_or_else(|| "Not loaded".to_string())
    };
    format!(
        "FPL TERMINAL | {screen} | Manager {} | {} GWs played | {status}",
        state.manager_id,
        state.played()
    )
}

fn footer_text(state: &AppState) -> String {
    let extra = match state.screen {
        Screen::Overview => " | p Position",
        Screen::Gameweek => " | ←/→ Gameweek",
        _ => "",
    };
    format!("1-4 Screens{extra} | m Manager | r Reload | ? Help | q Quit")
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn empty_note(frame: &mut Frame, area: Rect, title: &str, text: &str) {
    let note = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(note, area);
}

fn render_overview(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(28),
            Constraint::Length(34),
            Constraint::Min(40),
        ])
        .split(area);

    let Some(league) = &state.league else {
        empty_note(frame, area, "Overall", "League data not loaded");
        return;
    };

    let rows = league.overview.iter().map(|r| {
        Row::new(vec![
            r.gameweek.to_string(),
            r.average_score.to_string(),
            r.highest_score.to_string(),
        ])
    });
    let widths = [
        Constraint::Length(4),
        Constraint::Length(8),
        Constraint::Length(8),
    ];
    let table = Table::new(rows, widths)
        .header(Row::new(vec!["GW", "Average", "Highest"]).style(bold()))
        .block(Block::default().title("Season so far").borders(Borders::ALL));
    frame.render_widget(table, columns[0]);

    let rows = league.top_players.iter().map(|r| {
        Row::new(vec![
            r.gameweek_index.to_string(),
            r.top_player_display_name.clone(),
            r.points_scored.to_string(),
        ])
    });
    let widths = [
        Constraint::Length(4),
        Constraint::Min(16),
        Constraint::Length(5),
    ];
    let table = Table::new(rows, widths)
        .header(Row::new(vec!["GW", "Top player", "Pts"]).style(bold()))
        .block(Block::default().title("Top performers").borders(Borders::ALL));
    frame.render_widget(table, columns[1]);

    let rows = state.values.iter().map(|r| {
        Row::new(vec![
            r.display_name.clone(),
            format!("{:.1}", r.cost),
            r.total_points.to_string(),
            format!("{:.1}", r.points_per_million),
        ])
    });
    let title = format!("Value: {} (p to cycle)", state.position.label());
    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(8),
        ],
    )
    .header(Row::new(vec!["Player", "Cost", "Pts", "Pts/£m"]).style(bold()))
    .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, columns[2]);
}

fn render_manager(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(manager) = &state.manager else {
        empty_note(frame, area, "My Season", "Manager data not loaded");
        return;
    };
    let snapshot = &manager.snapshot;
    let leagues_height = (snapshot.league_memberships.len() as u16 + 3).min(10);
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(leagues_height),
            Constraint::Min(1),
        ])
        .split(area);

    let rank = snapshot
        .world_rank
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());
    let welcome = format!(
        "Welcome, {} {}.\nYou are currently ranked {rank} in the world.",
        snapshot.first_name, snapshot.last_name
    );
    frame.render_widget(Paragraph::new(welcome), sections[0]);

    let rows = snapshot.league_memberships.iter().map(|l| {
        Row::new(vec![
            l.league_name.clone(),
            opt_rank(l.current_rank),
            opt_rank(l.previous_rank),
        ])
    });
    let widths = [
        Constraint::Min(24),
        Constraint::Length(10),
        Constraint::Length(10),
    ];
    let table = Table::new(rows, widths)
        .header(Row::new(vec!["League", "Rank", "Last"]).style(bold()))
        .block(Block::default().title("Leagues").borders(Borders::ALL));
    frame.render_widget(table, sections[1]);

    let rows = manager.season.iter().map(|r| {
        Row::new(vec![
            r.gameweek.to_string(),
            r.points.to_string(),
            r.points_after_hits.to_string(),
            r.average_points
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            r.total_points.to_string(),
            opt_rank(r.overall_rank),
            format!("{:.1}", r.value),
            format!("{:.1}", r.bank),
            r.transfers.to_string(),
            r.points_on_bench.to_string(),
        ])
    });
    let widths = [
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(7),
        Constraint::Length(5),
        Constraint::Length(6),
        Constraint::Length(10),
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Length(4),
        Constraint::Length(6),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec![
                "GW", "Pts", "NetPts", "Avg", "Total", "Rank", "Value", "Bank", "TR", "Bench",
            ])
            .style(bold()),
        )
        .block(Block::default().title("Season so far").borders(Borders::ALL));
    frame.render_widget(table, sections[2]);
}

fn opt_rank(rank: Option<u64>) -> String {
    rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())
}

fn render_gameweek(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(squad) = &state.squad else {
        let title = format!("Gameweek {}", state.selected_gameweek);
        empty_note(frame, area, &title, "No squad loaded for this gameweek");
        return;
    };
    let chip = squad
        .chip
        .as_deref()
        .map(|c| format!(" | chip {c}"))
        .unwrap_or_default();
    let title = format!(
        "Gameweek {} of {}{chip} (sorted by raw points, captain highlighted)",
        squad.gameweek,
        state.played()
    );

    let rows = squad.rows.iter().map(|r| {
        let style = if r.is_captain {
            Style::default().fg(Color::Black).bg(CAPTAIN_BG)
        } else if r.is_benched() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let flag = if r.is_captain {
            "C"
        } else if r.is_vice_captain {
            "V"
        } else {
            ""
        };
        Row::new(vec![
            Cell::from(r.display_name.clone()),
            Cell::from(r.multiplier.to_string()),
            Cell::from(flag),
            Cell::from(opt_points(r.raw_points)),
            Cell::from(opt_points(r.effective_points)),
        ])
        .style(style)
    });
    let table = Table::new(
        rows,
        [
            Constraint::Min(18),
            Constraint::Length(5),
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Length(9),
        ],
    )
    .header(Row::new(vec!["Player", "Mult", "C/V", "Pts", "Eff. pts"]).style(bold()))
    .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn opt_points(points: Option<i32>) -> String {
    points.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string())
}

fn render_captains(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(view) = &state.captains else {
        empty_note(frame, area, "Captains", "Captain data not loaded");
        return;
    };
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let rows = view.comparison.iter().map(|r| {
        Row::new(vec![
            r.gameweek_index.to_string(),
            r.captain_name.clone(),
            r.captain_points.to_string(),
            r.top_performer_name.clone(),
            r.top_performer_points.to_string(),
            r.missed_points().to_string(),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(14),
            Constraint::Length(5),
            Constraint::Min(14),
            Constraint::Length(5),
            Constraint::Length(7),
        ],
    )
    .header(Row::new(vec!["GW", "Captain", "Pts", "Top player", "Pts", "Missed"]).style(bold()))
    .block(
        Block::default()
            .title(format!(
                "Captain vs top performer ({} captains, {} top performers)",
                view.captains.len(),
                view.tops.len()
            ))
            .borders(Borders::ALL),
    );
    frame.render_widget(table, sections[0]);

    let groups: Vec<BarGroup> = view
        .comparison
        .iter()
        .map(|r| {
            let captain = Bar::default()
                .value(r.captain_points.max(0) as u64)
                .style(Style::default().fg(Color::Rgb(55, 83, 109)));
            let top = Bar::default()
                .value(r.top_performer_points.max(0) as u64)
                .style(Style::default().fg(Color::Rgb(26, 118, 255)));
            BarGroup::default()
                .label(Line::from(format!("GW{}", r.gameweek_index)))
                .bars(&[captain, top])
        })
        .collect();
    let mut chart = BarChart::default()
        .block(
            Block::default()
                .title("Captain (dark) vs top player (light)")
                .borders(Borders::ALL),
        )
        .bar_width(2)
        .bar_gap(0)
        .group_gap(2);
    for group in groups {
        chart = chart.data(group);
    }
    frame.render_widget(chart, sections[1]);
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = state.logs.len().saturating_sub(visible);
    let text = state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let console =
        Paragraph::new(text).block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, area);
}

fn render_input(frame: &mut Frame, area: Rect, input: &str) {
    let popup_area = centered_rect(40, 20, area);
    frame.render_widget(Clear, popup_area);
    let prompt = Paragraph::new(format!("{input}_\n\nEnter to load, Esc to cancel"))
        .block(Block::default().title("Manager ID").borders(Borders::ALL));
    frame.render_widget(prompt, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "FPL Terminal - Help",
        "",
        "Screens:",
        "  1            Overall league data",
        "  2            My season",
        "  3            Gameweek drill-down",
        "  4            Captains vs top performers",
        "",
        "Keys:",
        "  ←/→ or h/l   Previous/next gameweek",
        "  p            Cycle value-table position",
        "  m            Enter manager id",
        "  r            Reload everything",
        "  Esc          Cancel a running load",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Multiplier 0 = bench, 2 = captain, 3 = triple captain.",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
