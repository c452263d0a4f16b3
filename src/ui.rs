// 🖥️ Admin console - read-only browser over predictions and uploads

use anyhow::Result;
use bcc_dashboard::{Prediction, UploadedFile};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;

const PAGE_STEP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Predictions,
    Uploads,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Predictions => Page::Uploads,
            Page::Uploads => Page::Predictions,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Predictions => "Predictions",
            Page::Uploads => "Uploaded Files",
        }
    }
}

pub struct App {
    pub predictions: Vec<Prediction>,
    pub uploads: Vec<UploadedFile>,
    pub current_page: Page,
    pub prediction_state: TableState,
    pub upload_state: TableState,
    pub show_detail: bool,
}

impl App {
    pub fn new(predictions: Vec<Prediction>, uploads: Vec<UploadedFile>) -> Self {
        let mut prediction_state = TableState::default();
        if !predictions.is_empty() {
            prediction_state.select(Some(0));
        }

        let mut upload_state = TableState::default();
        if !uploads.is_empty() {
            upload_state.select(Some(0));
        }

        Self {
            predictions,
            uploads,
            current_page: Page::Predictions,
            prediction_state,
            upload_state,
            show_detail: false,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    fn current_len(&self) -> usize {
        match self.current_page {
            Page::Predictions => self.predictions.len(),
            Page::Uploads => self.uploads.len(),
        }
    }

    fn current_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Predictions => &mut self.prediction_state,
            Page::Uploads => &mut self.upload_state,
        }
    }

    /// Move the selection by `delta` rows; wraps when `wrap` is set.
    fn move_selection(&mut self, delta: isize, wrap: bool) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let last = (len - 1) as isize;
        let state = self.current_state();
        let current = state.selected().unwrap_or(0) as isize;
        let target = current + delta;

        let i = if wrap {
            target.rem_euclid(len as isize)
        } else {
            target.clamp(0, last)
        };
        state.select(Some(i as usize));
    }

    pub fn next(&mut self) {
        self.move_selection(1, true);
    }

    pub fn previous(&mut self) {
        self.move_selection(-1, true);
    }

    pub fn page_down(&mut self) {
        self.move_selection(PAGE_STEP as isize, false);
    }

    pub fn page_up(&mut self) {
        self.move_selection(-(PAGE_STEP as isize), false);
    }

    pub fn first(&mut self) {
        if self.current_len() > 0 {
            self.current_state().select(Some(0));
        }
    }

    pub fn last(&mut self) {
        let len = self.current_len();
        if len > 0 {
            self.current_state().select(Some(len - 1));
        }
    }

    pub fn selected_prediction(&self) -> Option<&Prediction> {
        self.prediction_state
            .selected()
            .and_then(|i| self.predictions.get(i))
    }

    pub fn selected_upload(&self) -> Option<&UploadedFile> {
        self.upload_state.selected().and_then(|i| self.uploads.get(i))
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

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
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(())
                }
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab | KeyCode::BackTab => app.next_page(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let content = if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        render_detail_panel(f, content_chunks[1], app);
        content_chunks[0]
    } else {
        chunks[1]
    };

    match app.current_page {
        Page::Predictions => render_predictions(f, content, app),
        Page::Uploads => render_uploads(f, content, app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Predictions, Page::Uploads].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Predictions: {}", app.predictions.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Files: {}", app.uploads.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn opt_rate(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}%", v)).unwrap_or_else(|| "-".to_string())
}

fn render_predictions(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.predictions.iter().map(|p| {
        Row::new(vec![
            Cell::from(p.year.to_string()),
            Cell::from(format!("{:.2}", p.exchange_rate)),
            Cell::from(format!("{:.2}", p.money_supply)),
            Cell::from(opt_rate(p.observed_inflation)),
            Cell::from(opt_rate(p.predicted_inflation)).style(Style::default().fg(Color::Green)),
            Cell::from(p.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(14),
            Constraint::Length(18),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(17),
        ],
    )
    .header(header_row(&[
        "Year",
        "Exchange rate",
        "Money supply",
        "Observed",
        "Predicted",
        "Recorded",
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Predictions "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.prediction_state);
}

fn render_uploads(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.uploads.iter().map(|u| {
        Row::new(vec![
            Cell::from(truncate(&u.name, 30)),
            Cell::from(truncate(&u.file_path, 36)),
            Cell::from(format_size(u.size_bytes)),
            Cell::from(u.uploaded_at.format("%Y-%m-%d %H:%M").to_string()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(38),
            Constraint::Length(10),
            Constraint::Length(17),
        ],
    )
    .header(header_row(&["Name", "File", "Size", "Uploaded"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Uploaded Files "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.upload_state);
}

fn detail_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{:<14}", label),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(value),
    ])
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let lines = match app.current_page {
        Page::Predictions => match app.selected_prediction() {
            Some(p) => vec![
                Line::from(Span::styled(
                    p.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                detail_line("ID", p.id.to_string()),
                detail_line("Year", p.year.to_string()),
                detail_line("Exchange rate", p.exchange_rate.to_string()),
                detail_line("Money supply", p.money_supply.to_string()),
                detail_line("Observed", opt_rate(p.observed_inflation)),
                detail_line("Predicted", opt_rate(p.predicted_inflation)),
                detail_line("Recorded", p.created_at.to_rfc3339()),
            ],
            None => vec![Line::from("No prediction selected")],
        },
        Page::Uploads => match app.selected_upload() {
            Some(u) => vec![
                Line::from(Span::styled(
                    u.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                detail_line("ID", u.id.to_string()),
                detail_line("File", u.file_path.clone()),
                detail_line("Size", format_size(u.size_bytes)),
                detail_line("SHA-256", u.sha256.clone()),
                detail_line("Uploaded", u.uploaded_at.to_rfc3339()),
                Line::from(""),
                detail_line("Observation", u.observation.clone()),
            ],
            None => vec![Line::from("No file selected")],
        },
    };

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Details "),
        );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (selected, total) = match app.current_page {
        Page::Predictions => (app.prediction_state.selected(), app.predictions.len()),
        Page::Uploads => (app.upload_state.selected(), app.uploads.len()),
    };
    let selected = selected.map(|i| i + 1).unwrap_or(0);

    let status_spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, total),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Details | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Page | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Fast | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn format_size(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn prediction(id: i64, year: i64) -> Prediction {
        Prediction {
            id,
            year,
            exchange_rate: 2000.0,
            money_supply: 100.0,
            observed_inflation: None,
            predicted_inflation: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_navigation_wraps_and_clamps() {
        let predictions = (0..25).map(|i| prediction(i, 2000 + i)).collect();
        let mut app = App::new(predictions, Vec::new());

        app.previous();
        assert_eq!(app.prediction_state.selected(), Some(24));
        app.next();
        assert_eq!(app.prediction_state.selected(), Some(0));

        app.page_down();
        assert_eq!(app.prediction_state.selected(), Some(20));
        app.page_down();
        assert_eq!(app.prediction_state.selected(), Some(24));
        app.page_up();
        assert_eq!(app.prediction_state.selected(), Some(4));
    }

    #[test]
    fn test_empty_page_has_no_selection() {
        let mut app = App::new(vec![prediction(1, 2020)], Vec::new());
        app.next_page();

        app.next();
        app.last();
        assert_eq!(app.current_page, Page::Uploads);
        assert_eq!(app.upload_state.selected(), None);
        assert!(app.selected_upload().is_none());
    }

    #[test]
    fn test_truncate_and_size() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long file name", 10), "a long ...");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
    }
}
