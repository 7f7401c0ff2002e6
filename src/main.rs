use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
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
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Wrap};

use prono_terminal::feed;
use prono_terminal::match_source::SourceConfig;
use prono_terminal::model::{DateTab, FORM_SENTINEL, Match, MatchStatus, OutcomeProbabilities};
use prono_terminal::state::{self, AppState, ProviderCommand, apply_delta, group_by_competition};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let cmd = match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('1') => self.state.set_tab(DateTab::Today),
            KeyCode::Char('2') => self.state.set_tab(DateTab::Tomorrow),
            KeyCode::Char('3') => self.state.set_tab(DateTab::LastMatches),
            KeyCode::Tab => self.state.cycle_tab(),
            KeyCode::Char('c') => self.state.cycle_competition(true),
            KeyCode::Char('C') => self.state.cycle_competition(false),
            KeyCode::Char('r') | KeyCode::Char('R') => self.state.refresh(),
            KeyCode::Char('j') | KeyCode::Down => {
                let len = self.state.visible(&Local::now()).len();
                self.state.select_next(len);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.select_prev();
                None
            }
            KeyCode::Char('?') => {
                self.state.help_overlay = !self.state.help_overlay;
                None
            }
            _ => None,
        };
        if let Some(cmd) = cmd {
            self.send(cmd);
        }
    }

    fn send(&mut self, cmd: ProviderCommand) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Match fetch unavailable");
            return;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Match request failed");
            self.state.loading = false;
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = SourceConfig::from_env();
    let startup_check = config.check();
    let source_label = config.describe();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let mut app = match startup_check {
        Ok(()) => {
            let (cmd_tx, cmd_rx) = mpsc::channel();
            feed::spawn_provider(config, tx, cmd_rx);
            let mut app = App::new(Some(cmd_tx));
            app.state
                .push_log(format!("[INFO] Match source: {source_label}"));
            app
        }
        Err(err) => {
            let mut app = App::new(None);
            app.state.set_config_error(err.user_message());
            app
        }
    };

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
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

fn ui(frame: &mut Frame, app: &App) {
    let now = Local::now();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(38)])
        .split(chunks[1]);
    render_match_list(frame, body[0], &app.state, &now);
    render_details(frame, body[1], &app.state, &now);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(
        "1/2/3 Tab | Tab Next tab | c/C Competition | r Refetch | j/k/↑/↓ Move | ? Help | q Quit",
    )
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let tabs = DateTab::ALL
        .iter()
        .map(|tab| {
            if *tab == state.tab {
                format!("[{}]", tab.label().to_uppercase())
            } else {
                format!(" {} ", tab.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let competition = state
        .selected_competition()
        .map(|c| c.name)
        .unwrap_or("Select a competition");
    let loading = if state.loading { " | loading..." } else { "" };
    format!("  PRONO TERMINAL | {tabs}\n  Competition: {competition}{loading}")
}

fn render_match_list(frame: &mut Frame, area: Rect, state: &AppState, now: &DateTime<Local>) {
    let block = Block::default().title("Matches").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(err) = &state.error {
        let msg = Paragraph::new(format!("Error\n{err}"))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(msg, inner);
        return;
    }
    if state.loading {
        let msg = Paragraph::new("Loading matches...").style(Style::default().fg(Color::Blue));
        frame.render_widget(msg, inner);
        return;
    }
    if state.competition.is_none() {
        let msg = Paragraph::new("Select a competition (c) to show matches.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(msg, inner);
        return;
    }

    let visible = state.visible(now);
    if visible.is_empty() {
        let msg = Paragraph::new("No matches found for the selected filters.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(msg, inner);
        return;
    }

    let selected_id = visible.get(state.selected).map(|m| m.id.as_str());
    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0usize;
    for (competition, rows) in group_by_competition(&visible) {
        lines.push(Line::styled(
            competition,
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for m in rows {
            let style = if Some(m.id.as_str()) == selected_id {
                selected_line = lines.len();
                Style::default().fg(Color::White).bg(Color::DarkGray)
            } else {
                Style::default()
            };
            lines.push(Line::styled(match_row_text(m), style));
        }
    }

    // Keep the selected row on screen.
    let scroll = (selected_line as u16).saturating_sub(inner.height.saturating_sub(1));
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
}

fn match_row_text(m: &Match) -> String {
    let badge = status_badge(m);
    let teams = format!("{} vs {}", m.home_team.name, m.away_team.name);
    let score = score_text(m).unwrap_or_default();
    let probs = match m.outcome_probabilities {
        Some(p) if m.recent_form.has_data() => hda_text(&p),
        _ => String::new(),
    };
    format!("  {badge:<11} {teams:<40} {score:<14} {probs}")
}

fn status_badge(m: &Match) -> String {
    match &m.status {
        MatchStatus::Scheduled => m
            .kickoff
            .map(|k| k.with_timezone(&Local).format("%H:%M").to_string())
            .unwrap_or_else(|| "TBD".to_string()),
        MatchStatus::InProgress => "LIVE".to_string(),
        MatchStatus::Finished => "FT".to_string(),
        MatchStatus::Cancelled => "CANCELLED".to_string(),
        MatchStatus::Postponed => "POSTPONED".to_string(),
        MatchStatus::Unknown(raw) if raw.is_empty() => "?".to_string(),
        MatchStatus::Unknown(raw) => raw.clone(),
    }
}

fn score_text(m: &Match) -> Option<String> {
    let (home, away) = (m.home_score?, m.away_score?);
    if !matches!(m.status, MatchStatus::Finished | MatchStatus::InProgress) {
        return None;
    }
    let mut out = format!("{home} - {away}");
    if m.status == MatchStatus::Finished
        && let (Some(hh), Some(ha)) = (m.home_half_time_score, m.away_half_time_score)
    {
        out.push_str(&format!(" ({hh} - {ha})"));
    }
    Some(out)
}

fn hda_text(p: &OutcomeProbabilities) -> String {
    format!("H{} D{} A{}", p.home_win, p.draw, p.away_win)
}

fn render_details(frame: &mut Frame, area: Rect, state: &AppState, now: &DateTime<Local>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(1)])
        .split(area);

    let selected = if state.error.is_none() && !state.loading {
        state.selected_match(now)
    } else {
        None
    };

    let bar_block = Block::default().title("Prediction").borders(Borders::ALL);
    match selected.and_then(|m| {
        m.outcome_probabilities
            .filter(|_| m.recent_form.has_data())
    }) {
        Some(p) => frame.render_widget(win_bar_chart(&p).block(bar_block), rows[0]),
        None => frame.render_widget(
            Paragraph::new("No prediction data").block(bar_block),
            rows[0],
        ),
    }

    let details = Paragraph::new(details_text(selected))
        .block(Block::default().title("Details").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(details, rows[1]);
}

fn details_text(selected: Option<&Match>) -> String {
    let Some(m) = selected else {
        return "No match selected".to_string();
    };
    let mut lines = vec![
        format!("{} vs {}", m.home_team.name, m.away_team.name),
        format!("{} | {}", m.league, m.round),
        format!("Status: {}", m.status.label()),
    ];
    if let Some(score) = score_text(m) {
        lines.push(format!("Score: {score}"));
    }
    if m.recent_form.has_data() {
        lines.push(String::new());
        lines.push("Recent form (last 15):".to_string());
        if m.recent_form.home != FORM_SENTINEL {
            lines.push(format!("{}: {}", m.home_team.name, m.recent_form.home));
        }
        if m.recent_form.away != FORM_SENTINEL {
            lines.push(format!("{}: {}", m.away_team.name, m.recent_form.away));
        }
    }
    if let Some(note) = m.details_error.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(String::new());
        lines.push(format!("Note: {note}"));
    }
    lines.join("\n")
}

fn win_bar_chart(p: &OutcomeProbabilities) -> BarChart<'static> {
    let home = Bar::default()
        .value(p.home_win as u64)
        .text_value(format!("H {}%", p.home_win))
        .style(Style::default().fg(Color::Green));
    let draw = Bar::default()
        .value(p.draw as u64)
        .text_value(format!("D {}%", p.draw))
        .style(Style::default().fg(Color::Yellow));
    let away = Bar::default()
        .value(p.away_win as u64)
        .text_value(format!("A {}%", p.away_win))
        .style(Style::default().fg(Color::Red));

    BarChart::default()
        .data(BarGroup::default().bars(&[home, draw, away]))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(0)
        .max(100)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Prono Terminal - Help",
        "",
        "Tabs:",
        "  1 / 2 / 3    Today / Tomorrow / Last matches",
        "  Tab          Next tab",
        "",
        "Filters:",
        "  c / C        Next / previous competition",
        "  r            Refetch",
        "",
        "List:",
        "  j/k or ↑/↓   Move",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "H/D/A columns are a rough estimate from each side's last 15 results.",
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
