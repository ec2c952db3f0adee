use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

use crate::api::MetadataApi;
use crate::detail::{self, Detail, SelectedRecord};
use crate::domain::Record;
use crate::table::{NoticeKind, TableView};

const LOGS_MAX: usize = 200;
const HINTS: &[&str] = &[
    "Tip: i enters a URL, Enter fetches and saves it",
    "Tip: space selects a row, a selects the whole page",
    "Tip: d deletes the selection, e exports companies.csv",
    "Tip: F1 help, F4 logs, Enter opens the detail view",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Table,
    Detail,
    Logs,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Browse,
    Url,
    ConfirmDelete,
}

enum KeyAction {
    Continue,
    Submit,
    Quit,
}

/// Interactive record table with a detail pane.
pub struct Tui<A: MetadataApi> {
    table: TableView<A>,
    selected: SelectedRecord,
    selected_path: Option<Utf8PathBuf>,
    export_path: Utf8PathBuf,
    view: View,
    input_mode: InputMode,
    cursor: usize,
    detail_id: Option<String>,
    logs: VecDeque<String>,
    log_scroll: u16,
    status: String,
    fetching: bool,
    hint_index: usize,
    last_hint_update: Instant,
}

impl<A: MetadataApi> Tui<A> {
    pub fn new(table: TableView<A>, export_path: Utf8PathBuf) -> Self {
        Self {
            table,
            selected: SelectedRecord::new(),
            selected_path: None,
            export_path,
            view: View::Table,
            input_mode: InputMode::Browse,
            cursor: 0,
            detail_id: None,
            logs: VecDeque::new(),
            log_scroll: 0,
            status: "ready".to_string(),
            fetching: false,
            hint_index: 0,
            last_hint_update: Instant::now(),
        }
    }

    /// Persist the opened record so `show` can resolve it later.
    pub fn with_selection_file(mut self, path: Utf8PathBuf) -> Self {
        self.selected = SelectedRecord::restore(&path);
        self.selected_path = Some(path);
        self
    }

    pub fn run(&mut self) -> miette::Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).into_diagnostic()?;
        terminal.clear().into_diagnostic()?;

        self.reload();
        let result = self.event_loop(&mut terminal);

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> miette::Result<()> {
        loop {
            let now = Instant::now();
            self.table.expire_notices(now);
            self.rotate_hint();
            terminal
                .draw(|frame| draw_ui(frame, self, now))
                .into_diagnostic()?;

            if !event::poll(Duration::from_millis(120)).into_diagnostic()? {
                continue;
            }
            let Event::Key(key) = event::read().into_diagnostic()? else {
                continue;
            };
            match self.handle_key(key) {
                KeyAction::Continue => {}
                KeyAction::Quit => break,
                KeyAction::Submit => {
                    self.fetching = true;
                    terminal
                        .draw(|frame| draw_ui(frame, self, Instant::now()))
                        .into_diagnostic()?;
                    self.submit_url();
                    self.fetching = false;
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.kind != KeyEventKind::Press {
            return KeyAction::Continue;
        }
        match self.input_mode {
            InputMode::Url => return self.handle_url_key(key),
            InputMode::ConfirmDelete => {
                self.handle_confirm_key(key);
                return KeyAction::Continue;
            }
            InputMode::Browse => {}
        }

        match key.code {
            KeyCode::F(1) | KeyCode::Char('?') => {
                self.view = View::Help;
                return KeyAction::Continue;
            }
            KeyCode::F(4) => {
                self.view = View::Logs;
                return KeyAction::Continue;
            }
            KeyCode::Char('q') => return KeyAction::Quit,
            KeyCode::Esc => {
                if self.view == View::Table {
                    return KeyAction::Quit;
                }
                self.view = View::Table;
                return KeyAction::Continue;
            }
            _ => {}
        }

        // Table actions only apply while the table and its prompts are shown.
        if self.view != View::Table {
            match key.code {
                KeyCode::PageUp if self.view == View::Logs => self.scroll_logs(5),
                KeyCode::PageDown if self.view == View::Logs => self.scroll_logs(-5),
                _ => {}
            }
            return KeyAction::Continue;
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                let last = self.table.page_window().len().saturating_sub(1);
                self.cursor = (self.cursor + 1).min(last);
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => {
                self.table.prev_page();
                self.clamp_cursor();
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown => {
                self.table.next_page();
                self.clamp_cursor();
            }
            KeyCode::Char(' ') => {
                if let Some(id) = self.cursor_record().map(|record| record.id.clone()) {
                    self.table.toggle_select(&id);
                }
            }
            KeyCode::Char('a') => {
                let checked = !self.table.page_fully_selected();
                self.table.toggle_select_page(checked);
            }
            KeyCode::Char('d') => {
                if !self.table.selection().is_empty() {
                    self.input_mode = InputMode::ConfirmDelete;
                }
            }
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('i') | KeyCode::Char('/') => self.input_mode = InputMode::Url,
            KeyCode::Enter => self.open_detail(),
            _ => {}
        }
        KeyAction::Continue
    }

    fn handle_url_key(&mut self, key: KeyEvent) -> KeyAction {
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Browse,
            KeyCode::Enter => return KeyAction::Submit,
            KeyCode::Backspace => {
                self.table.input_mut().pop();
            }
            KeyCode::Char(ch) => self.table.input_mut().push(ch),
            _ => {}
        }
        KeyAction::Continue
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.input_mode = InputMode::Browse;
                self.delete_selected();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.input_mode = InputMode::Browse;
            }
            _ => {}
        }
    }

    fn reload(&mut self) {
        match self.table.load_all() {
            Ok(count) => self.log(format!("loaded {count} records")),
            Err(err) => self.log(format!("load failed: {err}")),
        }
        self.clamp_cursor();
    }

    fn submit_url(&mut self) {
        match self.table.submit_input(Instant::now()) {
            Ok(record) => {
                self.log(format!("added {} ({})", record.display_name(), record.id));
                self.input_mode = InputMode::Browse;
            }
            Err(err) => self.log(format!("add failed: {err}")),
        }
        self.status = "ready".to_string();
        self.clamp_cursor();
    }

    fn delete_selected(&mut self) {
        match self.table.delete_selected(Instant::now()) {
            Ok(count) => self.log(format!("deleted {count} records")),
            Err(err) => self.log(format!("delete failed: {err}")),
        }
        self.clamp_cursor();
    }

    fn export(&mut self) {
        let path = self.export_path.clone();
        match self.table.export_to(&path) {
            Ok(rows) => {
                self.status = format!("exported {rows} rows to {path}");
                self.log(self.status.clone());
            }
            Err(err) => self.log(format!("export failed: {err}")),
        }
    }

    fn open_detail(&mut self) {
        let Some(record) = self.cursor_record().cloned() else {
            return;
        };
        self.detail_id = Some(record.id.to_string());
        self.selected.select(record);
        if let Some(path) = self.selected_path.clone() {
            self.persist_selection(&path);
        }
        self.view = View::Detail;
    }

    fn persist_selection(&mut self, path: &Utf8Path) {
        if let Err(err) = self.selected.persist(path) {
            tracing::warn!(error = %err, "failed to persist selected record");
            self.log(format!("could not save selection: {err}"));
        }
    }

    fn cursor_record(&self) -> Option<&Record> {
        self.table.page_window().get(self.cursor)
    }

    fn clamp_cursor(&mut self) {
        let len = self.table.page_window().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn scroll_logs(&mut self, delta: i16) {
        let max_scroll = self.logs.len().saturating_sub(1) as i16;
        let next = (self.log_scroll as i16 + delta).clamp(0, max_scroll);
        self.log_scroll = next as u16;
    }

    fn rotate_hint(&mut self) {
        if self.last_hint_update.elapsed() >= Duration::from_secs(5) {
            self.hint_index = (self.hint_index + 1) % HINTS.len();
            self.last_hint_update = Instant::now();
        }
    }

    fn log(&mut self, message: String) {
        self.logs.push_back(format!("[{}] {message}", timestamp()));
        while self.logs.len() > LOGS_MAX {
            self.logs.pop_front();
        }
    }
}

fn draw_ui<A: MetadataApi>(frame: &mut ratatui::Frame, tui: &Tui<A>, now: Instant) {
    match tui.view {
        View::Table => draw_table_view(frame, tui, now),
        View::Detail => draw_detail_view(frame, tui),
        View::Logs => draw_logs(frame, tui),
        View::Help => draw_help(frame),
    }
}

fn draw_table_view<A: MetadataApi>(frame: &mut ratatui::Frame, tui: &Tui<A>, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(2),
            Constraint::Length(4),
        ])
        .split(frame.area());

    frame.render_widget(draw_header(tui), chunks[0]);

    let mut state = TableState::default().with_selected(Some(tui.cursor));
    frame.render_stateful_widget(draw_records(tui), chunks[1], &mut state);

    let footer = Line::from(vec![
        Span::styled(tui.table.range_label(), Style::default().fg(Color::Gray)),
        Span::raw("   "),
        Span::styled(
            format!(
                "Page {}/{}",
                tui.table.current_page() + 1,
                tui.table.page_count().max(1)
            ),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("   "),
        Span::styled(HINTS[tui.hint_index], Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(
        Paragraph::new(footer).block(Block::default().borders(Borders::TOP)),
        chunks[2],
    );

    draw_command_line(frame, tui, now, chunks[3]);
}

fn draw_header<A: MetadataApi>(tui: &Tui<A>) -> Paragraph<'static> {
    let title = Line::from(vec![
        Span::styled(
            "COMPANY-LENS",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(env!("CARGO_PKG_VERSION"), Style::default().fg(Color::Gray)),
        Span::raw("   Records: "),
        Span::styled(
            tui.table.records().len().to_string(),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("   "),
        Span::styled(
            format!("{} selected", tui.table.selection().len()),
            Style::default().fg(Color::Yellow),
        ),
    ]);
    let status = Line::from(vec![
        Span::styled("Status: ", Style::default().fg(Color::Gray)),
        Span::raw(tui.status.clone()),
    ]);
    Paragraph::new(vec![title, status])
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::BOTTOM))
}

fn draw_records<A: MetadataApi>(tui: &Tui<A>) -> Table<'static> {
    let header_box = checkbox(tui.table.page_fully_selected());
    let header = Row::new(vec![
        Cell::from(header_box),
        Cell::from("Company"),
        Cell::from("Social Profiles"),
        Cell::from("Description"),
        Cell::from("Address"),
        Cell::from("Phone No."),
        Cell::from("Email"),
    ])
    .style(
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::BOLD),
    );

    let rows = tui
        .table
        .page_window()
        .iter()
        .map(|record| {
            let socials = detail::social_links(record)
                .into_iter()
                .map(|(label, _)| label)
                .collect::<Vec<_>>()
                .join(" ");
            Row::new(vec![
                Cell::from(checkbox(tui.table.selection().contains(&record.id))),
                Cell::from(record.display_name().to_string())
                    .style(Style::default().fg(Color::Cyan)),
                Cell::from(socials),
                Cell::from(record.description.clone().unwrap_or_default()),
                Cell::from(detail::address(record).to_string()),
                Cell::from(detail::phone(record).to_string()),
                Cell::from(detail::email(record).to_string()),
            ])
        })
        .collect::<Vec<_>>();

    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Percentage(18),
            Constraint::Percentage(12),
            Constraint::Percentage(30),
            Constraint::Percentage(16),
            Constraint::Percentage(10),
            Constraint::Percentage(14),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
}

fn draw_command_line<A: MetadataApi>(
    frame: &mut ratatui::Frame,
    tui: &Tui<A>,
    now: Instant,
    area: Rect,
) {
    let mut lines = Vec::new();
    match tui.input_mode {
        InputMode::ConfirmDelete => lines.push(Line::from(Span::styled(
            format!(
                "Delete {} selected records? y to confirm, n to cancel.",
                tui.table.selection().len()
            ),
            Style::default().fg(Color::Yellow),
        ))),
        InputMode::Url | InputMode::Browse => {
            let action = if tui.fetching {
                "Fetching..."
            } else {
                "Enter: Fetch & Save Details"
            };
            let prompt_style = if tui.input_mode == InputMode::Url {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            lines.push(Line::from(vec![
                Span::styled("URL: ", prompt_style),
                Span::raw(tui.table.input().to_string()),
                Span::raw("   "),
                Span::styled(action, Style::default().fg(Color::DarkGray)),
            ]));
        }
    }
    for notice in tui.table.notices(now) {
        let color = match notice.kind {
            NoticeKind::Success => Color::Green,
            NoticeKind::Error => Color::Red,
        };
        lines.push(Line::from(Span::styled(
            notice.message.clone(),
            Style::default().fg(color),
        )));
    }
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::TOP)),
        area,
    );

    if tui.input_mode == InputMode::Url {
        let cursor_x = area
            .x
            .saturating_add(("URL: ".len() + tui.table.input().len()) as u16)
            .min(area.x.saturating_add(area.width.saturating_sub(1)));
        frame.set_cursor_position((cursor_x, area.y.saturating_add(1)));
    }
}

fn draw_detail_view<A: MetadataApi>(frame: &mut ratatui::Frame, tui: &Tui<A>) {
    let id = tui.detail_id.as_deref().unwrap_or_default();
    let resolved = detail::resolve(id, &tui.selected, tui.table.records());
    let Detail::Found(record) = resolved else {
        let pending = Paragraph::new(detail::PENDING_MESSAGE)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Company"));
        frame.render_widget(pending, frame.area());
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(8)])
        .split(frame.area());

    let crumbs = Paragraph::new(Line::from(vec![
        Span::styled("Home", Style::default().fg(Color::Cyan)),
        Span::styled(" > ", Style::default().fg(Color::DarkGray)),
        Span::raw(record.display_name().to_string()),
        Span::styled("   Esc to go back", Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(crumbs, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let mut lines = vec![
        Line::from(Span::styled(
            record.display_name().to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        field_line("Website: ", &record.url),
        field_line(
            "About: ",
            record.description.as_deref().unwrap_or(detail::MISSING_VALUE),
        ),
        field_line("Phone: ", detail::phone(record)),
        field_line("Email: ", detail::email(record)),
    ];
    for (label, url) in detail::social_links(record) {
        lines.push(field_line(&format!("{label}: "), url));
    }
    lines.push(field_line("Address: ", detail::address(record)));
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::RIGHT).title("Company Details"))
            .wrap(Wrap { trim: true }),
        body[0],
    );

    let media = vec![
        field_line(
            "Logo: ",
            record.company_logo.as_deref().unwrap_or(detail::MISSING_VALUE),
        ),
        field_line(
            "Screenshot: ",
            record.screenshot.as_deref().unwrap_or(detail::MISSING_VALUE),
        ),
        field_line("Added: ", &record.created_at.to_rfc3339()),
        field_line("Id: ", record.id.as_str()),
    ];
    frame.render_widget(
        Paragraph::new(media)
            .block(Block::default().title("Screenshot of Webpage"))
            .wrap(Wrap { trim: true }),
        body[1],
    );
}

fn draw_logs<A: MetadataApi>(frame: &mut ratatui::Frame, tui: &Tui<A>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4)])
        .split(frame.area());
    frame.render_widget(draw_header(tui), chunks[0]);

    let visible = chunks[1].height.saturating_sub(1) as usize;
    let total = tui.logs.len();
    let start = total.saturating_sub(tui.log_scroll as usize + visible);
    let mut lines = vec![Line::from(Span::styled(
        "LOGS (PgUp/PgDown to scroll, Esc to go back)",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))];
    lines.extend(
        tui.logs
            .iter()
            .skip(start)
            .take(visible)
            .map(|line| Line::from(line.clone())),
    );
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[1]);
}

fn draw_help(frame: &mut ratatui::Frame) {
    let block = Block::default().borders(Borders::ALL).title("Help");
    let lines = vec![
        Line::from("Up/Down move   Left/Right change page   Enter open detail"),
        Line::from("space select row   a select page   d delete selection"),
        Line::from("i enter URL   e export CSV   r reload   F4 logs"),
        Line::from("Esc back   q quit"),
        Line::from("URL format: https://(sub.)domain.tld/optional/path"),
    ];
    let view = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(view, frame.area());
}

fn field_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(label.to_string(), Style::default().fg(Color::Gray)),
        Span::raw(value.to_string()),
    ])
}

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
