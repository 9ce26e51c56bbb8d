use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use community_portal::format::{long_date, month_name, WEEKDAY_HEADERS};
use community_portal::{calendar_for_month, CalendarGrid, GridCell, NewsItem, Store};
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
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    News,
    Calendar,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::News => Page::Calendar,
            Page::Calendar => Page::News,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::News => "Noticias",
            Page::Calendar => "Calendario",
        }
    }
}

pub struct App<'a> {
    store: &'a Store,
    pub news: Vec<NewsItem>,
    /// Month selector index, January = 0
    pub month_index: u32,
    pub year: i32,
    pub grid: CalendarGrid,
    pub selected_day: u32,
    pub current_page: Page,
    pub show_detail: bool,
}

impl<'a> App<'a> {
    pub fn new(store: &'a Store, news_limit: usize, today: NaiveDate) -> Result<Self> {
        let month_index = today.month0();
        let year = today.year();
        let grid = calendar_for_month(store, month_index, year)?;

        Ok(Self {
            store,
            news: store.latest_news(news_limit),
            month_index,
            year,
            grid,
            selected_day: today.day(),
            current_page: Page::Calendar,
            show_detail: false,
        })
    }

    fn days_in_month(&self) -> u32 {
        self.grid.days_in_month() as u32
    }

    fn reload_grid(&mut self) -> Result<()> {
        self.grid = calendar_for_month(self.store, self.month_index, self.year)?;
        self.selected_day = self.selected_day.min(self.days_in_month());
        Ok(())
    }

    pub fn next_month(&mut self) -> Result<()> {
        if self.month_index == 11 {
            self.month_index = 0;
            self.year += 1;
        } else {
            self.month_index += 1;
        }
        self.reload_grid()
    }

    pub fn previous_month(&mut self) -> Result<()> {
        if self.month_index == 0 {
            self.month_index = 11;
            self.year -= 1;
        } else {
            self.month_index -= 1;
        }
        self.reload_grid()
    }

    /// Move the selection by `delta` days, clamped to the month.
    pub fn move_selection(&mut self, delta: i64) {
        let target = self.selected_day as i64 + delta;
        self.selected_day = target.clamp(1, self.days_in_month() as i64) as u32;
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_cell(&self) -> Option<&GridCell> {
        self.grid.cell_for_day(self.selected_day)
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

    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(())
                }
                KeyCode::Tab => app.current_page = app.current_page.next(),
                _ if app.current_page == Page::News => {}
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Right | KeyCode::Char('l') => app.move_selection(1),
                KeyCode::Left | KeyCode::Char('h') => app.move_selection(-1),
                KeyCode::Down | KeyCode::Char('j') => app.move_selection(7),
                KeyCode::Up | KeyCode::Char('k') => app.move_selection(-7),
                KeyCode::PageDown | KeyCode::Char('n') => app.next_month()?,
                KeyCode::PageUp | KeyCode::Char('p') => app.previous_month()?,
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::News => render_news(f, chunks[1], app),
        Page::Calendar if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            render_calendar(f, content_chunks[0], app);
            render_day_detail(f, content_chunks[1], app);
        }
        Page::Calendar => render_calendar(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::News, Page::Calendar].iter().enumerate() {
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

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Portal Residencial "),
    );

    f.render_widget(header, area);
}

fn render_news(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![];

    if app.news.is_empty() {
        lines.push(Line::from("No hay noticias disponibles."));
    }

    for item in &app.news {
        lines.push(Line::from(Span::styled(
            long_date(item.date),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(item.body.clone()));
        lines.push(Line::from(""));
    }

    let news = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Últimas noticias "),
    );

    f.render_widget(news, area);
}

fn render_calendar(f: &mut Frame, area: Rect, app: &App) {
    let header = Row::new(WEEKDAY_HEADERS.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .height(1);

    let rows = app.grid.weeks().map(|week| {
        let cells = week.iter().map(|cell| match cell {
            GridCell::Empty => Cell::from(""),
            GridCell::Day { day, events, .. } => {
                let mut lines = vec![Line::from(day.to_string())];
                for event in events {
                    lines.push(Line::from(Span::styled(
                        event.title.clone(),
                        Style::default().fg(Color::Green),
                    )));
                }

                let style = if *day == app.selected_day {
                    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Cell::from(lines).style(style)
            }
        });
        Row::new(cells).height(3)
    });

    let title = format!(
        " {} {} ",
        month_name(app.grid.month).unwrap_or_default(),
        app.year
    );

    let table = Table::new(rows, [Constraint::Ratio(1, 7); 7])
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(table, area);
}

fn render_day_detail(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![];

    if let Some(GridCell::Day { date, events, .. }) = app.selected_cell() {
        lines.push(Line::from(Span::styled(
            long_date(*date),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));

        if events.is_empty() {
            lines.push(Line::from("Sin eventos"));
        }

        for event in events {
            lines.push(Line::from(Span::styled(
                event.title.clone(),
                Style::default().fg(Color::Yellow),
            )));
            lines.push(Line::from(event.description.clone()));
            lines.push(Line::from(""));
        }
    }

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Detalle "));

    f.render_widget(detail, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let mut spans = vec![key("Tab"), Span::raw(" Página | ")];
    if app.current_page == Page::Calendar {
        spans.extend([
            key("←/→/↑/↓"),
            Span::raw(" Día | "),
            key("n/p"),
            Span::raw(" Mes | "),
            key("Enter"),
            Span::raw(" Detalle | "),
        ]);
    }
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Salir"));

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use community_portal::FixedClock;

    fn app_store() -> Store {
        Store::bootstrap(&FixedClock::new(NaiveDate::from_ymd_opt(2025, 8, 20).unwrap())).unwrap()
    }

    #[test]
    fn test_month_navigation_wraps_year() {
        let store = app_store();
        let mut app = App::new(&store, 3, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()).unwrap();

        app.next_month().unwrap();
        assert_eq!((app.month_index, app.year), (0, 2026));
        assert_eq!(app.grid.month, 1);

        app.previous_month().unwrap();
        app.previous_month().unwrap();
        assert_eq!((app.month_index, app.year), (10, 2025));
        assert_eq!(app.grid.month, 11);
        // 31 does not exist in November
        assert_eq!(app.selected_day, 30);
    }

    #[test]
    fn test_selection_clamped_to_month() {
        let store = app_store();
        let mut app = App::new(&store, 3, NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()).unwrap();

        app.move_selection(-100);
        assert_eq!(app.selected_day, 1);
        app.move_selection(100);
        assert_eq!(app.selected_day, 31);
    }

    #[test]
    fn test_selected_cell_events() {
        let store = app_store();
        let mut app = App::new(&store, 3, NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()).unwrap();

        app.move_selection(2);
        assert_eq!(app.selected_cell().unwrap().events().len(), 2);
        assert_eq!(app.news.len(), 3);
    }

    #[test]
    fn test_initial_grid_from_month_index() {
        let store = app_store();
        let app = App::new(&store, 3, NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()).unwrap();

        assert_eq!(app.month_index, 7);
        assert_eq!((app.grid.month, app.grid.year), (8, 2025));
        assert_eq!(
            app.grid.cell_for_day(15).unwrap().events()[0].title,
            "Mantenimiento Piscina"
        );
    }
}
