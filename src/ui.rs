use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use plate_ledger::{CaptureController, CaptureMode, ReplaySource};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

pub struct App {
    controller: CaptureController,
    total_frames: usize,
    frames_played: usize,
    pub state: TableState,
}

impl App {
    pub fn new(source: ReplaySource) -> Self {
        let total_frames = source.frame_count();

        App {
            controller: CaptureController::new(Box::new(source), CaptureMode::Video),
            total_frames,
            frames_played: 0,
            state: TableState::default(),
        }
    }

    /// Replay the next recorded frame into the ledger
    pub fn step(&mut self) {
        if self.frames_played >= self.total_frames {
            return;
        }
        // ReplaySource never fails mid-session once loaded
        if let Ok(Some(_)) = self.controller.capture(&[]) {
            self.frames_played += 1;
        }

        if self.state.selected().is_none() && !self.controller.ledger().is_empty() {
            self.state.select(Some(0));
        }
    }

    /// Clear the ledger without rewinding the recorded session
    pub fn clear(&mut self) {
        self.controller.ledger_mut().reset();
        self.state.select(None);
    }

    pub fn is_done(&self) -> bool {
        self.frames_played >= self.total_frames
    }

    pub fn next(&mut self) {
        let len = self.controller.ledger().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.controller.ledger().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('n') | KeyCode::Char(' ') | KeyCode::Right => app.step(),
                KeyCode::Char('r') => app.clear(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    let len = app.controller.ledger().len();
                    if len > 0 {
                        app.state.select(Some(len - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with session info
            Constraint::Min(0),    // Ledger table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_ledger(f, chunks[1], app);
    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let ledger = app.controller.ledger();

    let spans = vec![
        Span::styled(
            "🚘 Plate Ledger",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  │  "),
        Span::raw(format!("Source: {}", app.controller.mode().name())),
        Span::raw("  │  "),
        Span::styled(
            format!("Frame {}/{}", app.frames_played, app.total_frames),
            Style::default().fg(if app.is_done() {
                Color::Green
            } else {
                Color::Yellow
            }),
        ),
        Span::raw("  │  "),
        Span::raw(format!("Session: {:.8}", ledger.session_id())),
    ];

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_ledger(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Plate", "Seen", "First seen", "Last updated"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.controller.ledger().entries().iter().map(|entry| {
        let cells = vec![
            Cell::from(entry.plate.clone()).style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Cell::from(format!("{}×", entry.observations)),
            Cell::from(entry.first_seen.format("%H:%M:%S").to_string()),
            Cell::from(entry.last_updated.format("%H:%M:%S").to_string()),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Min(24),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Distinct Plates "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let count = app.controller.ledger().len();

    let status_spans = vec![
        Span::styled(
            format!(" Plates: {} ", count),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" │ "),
        Span::styled(
            if app.is_done() {
                " session complete ".to_string()
            } else {
                " n/space: next frame ".to_string()
            },
            Style::default().fg(Color::Green),
        ),
        Span::raw(" │ "),
        Span::raw(" r: clear ledger   j/k: move   q: quit "),
    ];

    let status = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(status, area);
}
