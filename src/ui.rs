use crate::app::{App, Event as AppEvent, Snapshot};
use crate::schedule::{ViewMode, VisibleTask};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

pub fn run(app: App) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut screen = Screen::new(app);
    let result = screen.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct Screen {
    app: App,
    snapshot: Snapshot,
    selected: usize,
    last_save: Option<Instant>,
    status: String,
    mode: Mode,
}

enum Mode {
    Normal,
    Adding(String),
    ConfirmDelete { date_key: String, index: usize, text: String },
}

impl Screen {
    fn new(app: App) -> Self {
        let status = format!(
            "Loaded {} tasks from {} ({})",
            app.store().len(),
            app.location().path.display(),
            app.location().scope_label()
        );
        let snapshot = app.snapshot();
        Screen {
            app,
            snapshot,
            selected: 0,
            last_save: None,
            status,
            mode: Mode::Normal,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Adding(_) => self.handle_add_key(key),
            Mode::ConfirmDelete { .. } => self.handle_confirm_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(true);
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('d') => self.apply(AppEvent::SelectView(ViewMode::Day)),
            KeyCode::Char('w') => self.apply(AppEvent::SelectView(ViewMode::Week)),
            KeyCode::Char('m') => self.apply(AppEvent::SelectView(ViewMode::Month)),
            KeyCode::Char('y') => self.apply(AppEvent::SelectView(ViewMode::Year)),
            KeyCode::Left | KeyCode::Char('h') => self.apply(AppEvent::Navigate(-1)),
            KeyCode::Right | KeyCode::Char('l') => self.apply(AppEvent::Navigate(1)),
            KeyCode::Char('t') => self.apply(AppEvent::Today),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.snapshot.tasks.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('a') | KeyCode::Char('n') => {
                self.mode = Mode::Adding(String::new());
                self.status = format!(
                    "Adding task for {} (Enter save, Esc cancel)",
                    self.app.scheduler().current_key()
                );
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(entry) = self.current_task().cloned() {
                    self.apply(AppEvent::Toggle {
                        date_key: entry.date_key,
                        index: entry.index,
                    });
                } else {
                    self.status = "No task selected".into();
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(entry) = self.current_task().cloned() {
                    self.status = format!("Delete \"{}\"? (y to confirm, n/Esc to cancel)", entry.task.text);
                    self.mode = Mode::ConfirmDelete {
                        date_key: entry.date_key,
                        index: entry.index,
                        text: entry.task.text,
                    };
                } else {
                    self.status = "No task selected to delete".into();
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_add_key(&mut self, key: KeyEvent) -> Result<bool> {
        let Mode::Adding(buffer) = &mut self.mode else {
            return Ok(false);
        };
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.status = "Cancelled".into();
            }
            KeyCode::Enter => {
                let text = buffer.trim().to_string();
                self.mode = Mode::Normal;
                if text.is_empty() {
                    self.status = "Nothing to add".into();
                } else {
                    self.apply(AppEvent::AddTask(text));
                }
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(ch) => buffer.push(ch),
            _ => {}
        }
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let mode = std::mem::replace(&mut self.mode, Mode::Normal);
                if let Mode::ConfirmDelete { date_key, index, .. } = mode {
                    self.apply(AppEvent::Delete { date_key, index });
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.status = "Delete cancelled".into();
            }
            _ => {}
        }
        Ok(false)
    }

    /// Routes an event through the app and keeps the screen on the result.
    /// Failures land in the status line; the session carries on.
    fn apply(&mut self, event: AppEvent) {
        let message = match &event {
            AppEvent::AddTask(text) => Some(format!("Added \"{}\"", text)),
            AppEvent::Toggle { date_key, index } => Some(format!("Toggled {} #{}", date_key, index)),
            AppEvent::Delete { date_key, index } => Some(format!("Deleted {} #{}", date_key, index)),
            _ => None,
        };
        match self.app.dispatch(event) {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                if let Some(message) = message {
                    self.last_save = Some(Instant::now());
                    self.status = message;
                }
                self.ensure_bounds();
            }
            Err(err) => {
                tracing::warn!(error = %err, "event rejected");
                self.status = format!("Error: {:#}", err);
                self.snapshot = self.app.snapshot();
                self.ensure_bounds();
            }
        }
    }

    fn ensure_bounds(&mut self) {
        let len = self.snapshot.tasks.len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn current_task(&self) -> Option<&VisibleTask> {
        self.snapshot.tasks.get(self.selected)
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        self.draw_tasks(f, layout[1]);
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Adding(buffer) => self.draw_prompt(f, buffer),
            Mode::ConfirmDelete { text, .. } => self.draw_confirm(f, text),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let current = self.snapshot.state.mode;
        let mut tabs = vec![Span::styled(
            "dayplan  ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )];
        for mode in ViewMode::all() {
            let style = if mode == current {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            tabs.push(Span::styled(format!(" {} ", mode.label()), style));
            tabs.push(Span::raw(" "));
        }
        let saved = match self.last_save {
            Some(at) => format!("saved {}", format_elapsed(at)),
            None => "unsaved".into(),
        };
        tabs.push(Span::styled(saved, Style::default().fg(Color::DarkGray)));

        let title = Line::from(Span::styled(
            self.snapshot.label.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let date = Line::from(Span::styled(
            self.snapshot.date_number.clone(),
            Style::default().fg(Color::Magenta),
        ));

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(vec![Line::from(tabs), title, date])
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_tasks(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let show_dates = self.snapshot.state.mode != ViewMode::Day;
        let width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = if self.snapshot.tasks.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "No tasks in this view. Press a to add one.",
                Style::default().fg(Color::DarkGray),
            )))]
        } else {
            self.snapshot
                .tasks
                .iter()
                .map(|entry| task_item(entry, show_dates, width))
                .collect()
        };
        let mut state = ListState::default();
        if !self.snapshot.tasks.is_empty() {
            state.select(Some(self.selected));
        }
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(format!("{} tasks", self.snapshot.tasks.len())),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::LightCyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, rows[1]);
    }

    fn draw_prompt(&self, f: &mut ratatui::Frame<'_>, buffer: &str) {
        let area = centered_rect(60, 20, f.size());
        let body = vec![
            Line::from(vec![
                Span::raw(buffer.to_string()),
                Span::styled("█", Style::default().fg(Color::LightCyan)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to save • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let dialog = Paragraph::new(body)
            .block(
                Block::default()
                    .title(Span::styled(
                        format!("New task for {}", self.app.scheduler().current_key()),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, text: &str) {
        let area = centered_rect(50, 30, f.size());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", text),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

fn footer_help_line() -> Line<'static> {
    let key = Style::default().fg(Color::LightCyan);
    Line::from(vec![
        Span::styled("d/w/m/y", key),
        Span::raw(" view  "),
        Span::styled("←→ / h l", key),
        Span::raw(" navigate  "),
        Span::styled("t", key),
        Span::raw(" today  "),
        Span::styled("j k", key),
        Span::raw(" select  "),
        Span::styled("a", key),
        Span::raw(" add  "),
        Span::styled("space", key),
        Span::raw(" toggle  "),
        Span::styled("x", key),
        Span::raw(" delete  "),
        Span::styled("q", key),
        Span::raw(" quit"),
    ])
}

fn task_item(entry: &VisibleTask, show_date: bool, width: usize) -> ListItem<'static> {
    let mut spans = Vec::new();
    let (mark, style) = if entry.task.completed {
        (
            "[x]",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        )
    } else {
        ("[ ]", Style::default())
    };
    spans.push(Span::styled(mark, Style::default().fg(Color::Green)));
    spans.push(Span::raw(" "));
    let mut budget = width.saturating_sub(4);
    if show_date {
        spans.push(Span::styled(
            format!("{} ", entry.date_key),
            Style::default().fg(Color::Yellow),
        ));
        budget = budget.saturating_sub(entry.date_key.chars().count() + 1);
    }
    spans.push(Span::styled(truncate_text(&entry.task.text, budget), style));
    ListItem::new(Line::from(spans))
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}
