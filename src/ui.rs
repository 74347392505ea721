use std::cell::Cell;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::data::{FailureHook, FeedService, FetchFailure};
use crate::feed::{self, LoadOutcome};
use crate::pager::{PageCursor, ScrollController, ScrollMetrics};
use crate::popup::{Popup, UserDetails, CLOSE_LABEL};
use crate::render::{
    pad_lines_to_width, Document, COLOR_ACCENT, COLOR_BG, COLOR_BORDER_IDLE, COLOR_ERROR,
    COLOR_PANEL_BG, COLOR_PANEL_FOCUSED_BG, COLOR_PANEL_SELECTED_BG, COLOR_TEXT_PRIMARY,
    COLOR_TEXT_SECONDARY,
};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const MOUSE_SCROLL_LINES: i64 = 3;

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let percent_x = percent_x.min(100);
    let percent_y = percent_y.min(100);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage(100 - percent_x - (100 - percent_x) / 2),
        ])
        .split(area);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage(100 - percent_y - (100 - percent_y) / 2),
        ])
        .split(horizontal[1]);
    vertical[1]
}

struct Spinner {
    index: usize,
    last_tick: Instant,
}

impl Spinner {
    fn new() -> Self {
        Self {
            index: 0,
            last_tick: Instant::now(),
        }
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.index % SPINNER_FRAMES.len()]
    }

    fn advance(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) >= Duration::from_millis(120) {
            self.index = (self.index + 1) % SPINNER_FRAMES.len();
            self.last_tick = now;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.last_tick = Instant::now();
    }
}

struct PendingLoad {
    request_id: u64,
    page: usize,
}

enum AsyncResponse {
    Page {
        request_id: u64,
        outcome: LoadOutcome,
    },
    Failure {
        failure: FetchFailure,
    },
}

#[derive(Clone)]
pub struct Options {
    pub status_message: String,
    pub feed_service: Option<Arc<dyn FeedService + Send + Sync>>,
    pub page_size: usize,
    pub failure_hook: FailureHook,
}

pub struct Model {
    status_message: String,
    document: Document,
    scroll_offset: usize,
    feed_view_height: Cell<u16>,
    feed_area: Cell<Rect>,
    selected_link: Option<usize>,
    popup: Popup,
    pager: ScrollController,
    page_size: usize,
    feed_service: Option<Arc<dyn FeedService + Send + Sync>>,
    failure_hook: FailureHook,
    cycle_failures: Vec<FetchFailure>,
    spinner: Spinner,
    needs_redraw: bool,
    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
    next_request_id: u64,
    pending_load: Option<PendingLoad>,
}

impl Model {
    pub fn new(opts: Options) -> Self {
        let (response_tx, response_rx) = unbounded();

        let upstream = opts.failure_hook.clone();
        let failure_tx = response_tx.clone();
        let failure_hook: FailureHook = Arc::new(move |failure: &FetchFailure| {
            upstream(failure);
            let _ = failure_tx.send(AsyncResponse::Failure {
                failure: failure.clone(),
            });
        });

        let mut model = Self {
            status_message: opts.status_message,
            document: Document::default(),
            scroll_offset: 0,
            feed_view_height: Cell::new(0),
            feed_area: Cell::new(Rect::default()),
            selected_link: None,
            popup: Popup::default(),
            pager: ScrollController::new(),
            page_size: opts.page_size.max(1),
            feed_service: opts.feed_service,
            failure_hook,
            cycle_failures: Vec::new(),
            spinner: Spinner::new(),
            needs_redraw: true,
            response_tx,
            response_rx,
            next_request_id: 1,
            pending_load: None,
        };

        if let Some(cursor) = model.pager.begin() {
            model.start_cycle(cursor);
        }
        model
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(DisableMouseCapture)?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(120);

        loop {
            if self.poll_async() {
                self.mark_dirty();
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(key.code) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                self.status_message = format!("Error: {}", err);
                                self.mark_dirty();
                            }
                        }
                    }
                    Event::Mouse(mouse) => {
                        if let Err(err) = self.handle_mouse(mouse) {
                            self.status_message = format!("Error: {}", err);
                            self.mark_dirty();
                        }
                    }
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
                if self.is_loading() {
                    if self.spinner.advance() {
                        self.mark_dirty();
                    }
                } else {
                    self.spinner.reset();
                }
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn is_loading(&self) -> bool {
        self.pending_load.is_some()
    }

    fn start_cycle(&mut self, cursor: PageCursor) {
        let Some(service) = self.feed_service.clone() else {
            self.pager.abandon();
            self.status_message = "No feed service available.".to_string();
            return;
        };

        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.pending_load = Some(PendingLoad {
            request_id,
            page: cursor.page(),
        });
        self.cycle_failures.clear();
        self.status_message = format!("Loading page {}...", cursor.page());
        self.spinner.reset();
        tracing::debug!(page = cursor.page(), request_id, "starting load cycle");

        let tx = self.response_tx.clone();
        let hook = self.failure_hook.clone();
        let page_size = self.page_size;
        thread::spawn(move || {
            let outcome = feed::load_cycle(service.as_ref(), cursor, page_size, &hook);
            let _ = tx.send(AsyncResponse::Page {
                request_id,
                outcome,
            });
        });
    }

    fn poll_async(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.response_rx.try_recv() {
            self.handle_async_response(message);
            changed = true;
        }
        changed
    }

    fn handle_async_response(&mut self, message: AsyncResponse) {
        match message {
            AsyncResponse::Failure { failure } => {
                self.status_message = failure.to_string();
                self.cycle_failures.push(failure);
            }
            AsyncResponse::Page {
                request_id,
                outcome,
            } => {
                let Some(pending) = &self.pending_load else {
                    return;
                };
                if pending.request_id != request_id {
                    return;
                }
                let page = pending.page;
                self.pending_load = None;

                let LoadOutcome { page: rendered, next } = outcome;
                self.pager.finish(next);
                let count = rendered.blocks.len();
                self.document.append(rendered.blocks);

                let mut status = if count == 0 {
                    format!("Page {page} is empty. No more posts to show.")
                } else {
                    format!(
                        "Loaded page {page} ({count} posts, {} total).",
                        self.document.block_count()
                    )
                };
                if !self.cycle_failures.is_empty() {
                    let failed: Vec<&str> = self
                        .cycle_failures
                        .iter()
                        .map(|failure| failure.collection.as_str())
                        .collect();
                    status.push_str(&format!(" Unavailable: {}.", failed.join(", ")));
                }
                self.status_message = status;
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if self.popup.is_visible() {
            return self.handle_popup_key(code);
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('j') | KeyCode::Down => self.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_by(-1),
            KeyCode::Char(' ') | KeyCode::PageDown => self.scroll_by(self.page_step()),
            KeyCode::PageUp => self.scroll_by(-self.page_step()),
            KeyCode::Char('g') | KeyCode::Home => self.scroll_to(0),
            KeyCode::Char('G') | KeyCode::End => self.scroll_to(self.max_offset()),
            KeyCode::Tab => self.select_link(1),
            KeyCode::BackTab => self.select_link(-1),
            KeyCode::Enter => self.open_selected_link(),
            _ => {}
        }
        self.mark_dirty();
        Ok(false)
    }

    fn handle_popup_key(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('c') | KeyCode::Char('q') => {
                self.popup.dismiss();
            }
            KeyCode::Char('o') => self.open_avatar()?,
            _ => {}
        }
        self.mark_dirty();
        Ok(false)
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Result<()> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) if self.popup.is_visible() => {
                self.popup.dismiss();
            }
            _ if self.popup.is_visible() => return Ok(()),
            MouseEventKind::ScrollDown => self.scroll_by(MOUSE_SCROLL_LINES),
            MouseEventKind::ScrollUp => self.scroll_by(-MOUSE_SCROLL_LINES),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(line) = self.line_at(event.column, event.row) {
                    if let Some(link) = self.document.link_at(line) {
                        self.selected_link = Some(link);
                        self.open_selected_link();
                    }
                }
            }
            _ => return Ok(()),
        }
        self.mark_dirty();
        Ok(())
    }

    fn line_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.feed_area.get();
        if column < area.x
            || column >= area.x.saturating_add(area.width)
            || row < area.y
            || row >= area.y.saturating_add(area.height)
        {
            return None;
        }
        let line = self.scroll_offset + usize::from(row - area.y);
        (line < self.document.height()).then_some(line)
    }

    fn viewport_height(&self) -> usize {
        usize::from(self.feed_view_height.get())
    }

    fn page_step(&self) -> i64 {
        let height = self.viewport_height().saturating_sub(2).max(1);
        i64::try_from(height).unwrap_or(1)
    }

    fn max_offset(&self) -> usize {
        self.document
            .height()
            .saturating_sub(self.viewport_height())
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            viewport_height: self.viewport_height(),
            offset: self.scroll_offset,
            document_height: self.document.height(),
        }
    }

    fn scroll_by(&mut self, delta: i64) {
        let magnitude = usize::try_from(delta.unsigned_abs()).unwrap_or(usize::MAX);
        let target = if delta < 0 {
            self.scroll_offset.saturating_sub(magnitude)
        } else {
            self.scroll_offset.saturating_add(magnitude)
        };
        self.scroll_to(target);
    }

    /// Every viewport movement counts as a scroll event, even when clamped.
    fn scroll_to(&mut self, offset: usize) {
        self.scroll_offset = offset.min(self.max_offset());
        if let Some(cursor) = self.pager.on_scroll(self.scroll_metrics()) {
            self.start_cycle(cursor);
        }
    }

    fn select_link(&mut self, delta: i32) {
        let count = self.document.link_count();
        if count == 0 {
            self.selected_link = None;
            return;
        }
        let next = match self.selected_link {
            Some(current) if delta >= 0 => (current + 1).min(count - 1),
            Some(current) => current.saturating_sub(1),
            None => (0..count)
                .find(|&index| {
                    self.document
                        .link_line(index)
                        .is_some_and(|line| line >= self.scroll_offset)
                })
                .unwrap_or(count - 1),
        };
        self.selected_link = Some(next);
        self.ensure_link_visible(next);
    }

    fn ensure_link_visible(&mut self, index: usize) {
        let Some(line) = self.document.link_line(index) else {
            return;
        };
        let height = self.viewport_height().max(1);
        if line < self.scroll_offset {
            self.scroll_to(line);
        } else if line >= self.scroll_offset + height {
            self.scroll_to(line + 1 - height);
        }
    }

    fn open_selected_link(&mut self) {
        let Some(link) = self
            .selected_link
            .and_then(|index| self.document.link(index))
        else {
            self.status_message = "Select a username with Tab first.".to_string();
            return;
        };
        let details = link.details();
        tracing::debug!(username = %details.username, "showing user details");
        self.popup.show(details);
    }

    fn open_avatar(&mut self) -> Result<()> {
        let Some(details) = self.popup.details() else {
            return Ok(());
        };
        if details.image.trim().is_empty() {
            self.status_message = "No profile image for this user.".to_string();
            return Ok(());
        }
        let url = details.image.clone();
        webbrowser::open(&url).with_context(|| format!("open {url}"))?;
        self.status_message = format!("Opened {url}");
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        let status_text = if self.is_loading() {
            format!("{} {}", self.spinner.frame(), self.status_message)
                .trim()
                .to_string()
        } else {
            self.status_message.clone()
        };
        let status_color = if self.cycle_failures.is_empty() {
            COLOR_TEXT_PRIMARY
        } else {
            COLOR_ERROR
        };
        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .fg(status_color)
                .bg(COLOR_PANEL_FOCUSED_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, layout[0]);

        self.draw_feed(frame, layout[1]);

        let footer = Paragraph::new(self.footer_text())
            .style(
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .bg(COLOR_PANEL_BG)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(footer, layout[2]);

        if let Some(details) = self.popup.details() {
            draw_popup(frame, layout[1], details);
        }
    }

    fn draw_feed(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let title = format!("Feed · page {}", self.pager.cursor().page().saturating_sub(1));
        let block = Block::default()
            .title(Span::styled(
                title,
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_BORDER_IDLE))
            .style(Style::default().bg(COLOR_PANEL_BG))
            .padding(Padding::horizontal(1));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        self.feed_area.set(inner);
        self.feed_view_height.set(inner.height);
        if self.document.set_width(usize::from(inner.width)) {
            self.selected_link = None;
        }
        self.scroll_offset = self.scroll_offset.min(self.max_offset());

        if self.document.is_empty() {
            let message = if self.is_loading() {
                format!("{} Loading feed...", self.spinner.frame())
            } else {
                "No posts loaded yet.".to_string()
            };
            let placeholder = Paragraph::new(Line::from(Span::styled(
                message,
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .add_modifier(Modifier::ITALIC),
            )));
            frame.render_widget(placeholder, inner);
            return;
        }

        let height = usize::from(inner.height);
        let selected_line = self
            .selected_link
            .and_then(|index| self.document.link_line(index));
        let mut lines: Vec<Line<'static>> = self
            .document
            .lines()
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(height)
            .map(|(index, line)| {
                let mut line = line.clone();
                if Some(index) == selected_line {
                    for span in &mut line.spans {
                        span.style = span.style.bg(COLOR_PANEL_SELECTED_BG);
                    }
                }
                line
            })
            .collect();
        pad_lines_to_width(&mut lines, inner.width);
        frame.render_widget(Paragraph::new(Text::from(lines)), inner);
    }

    fn footer_text(&self) -> String {
        if self.popup.is_visible() {
            return "User details: o open image · Esc/Enter/c close".to_string();
        }

        let mut parts: Vec<String> = Vec::new();
        if self.document.is_empty() {
            parts.push("Waiting for posts…".to_string());
        } else {
            parts.push("j/k scroll · Space/PageDown page · g/G top/bottom".to_string());
            parts.push("Tab/Shift-Tab select user · Enter or click details".to_string());
        }
        if self.is_loading() {
            parts.push("Loading next page…".to_string());
        }
        parts.push("q quit".to_string());
        parts.join(" · ")
    }
}

fn draw_popup(frame: &mut Frame<'_>, area: Rect, details: &UserDetails) {
    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line<'static>> = details
        .lines()
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let style = if index == 0 {
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD)
            } else if text == CLOSE_LABEL {
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(COLOR_TEXT_SECONDARY)
            };
            Line::from(Span::styled(text, style))
        })
        .collect();

    let popup = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .title(Span::styled(
                    "User",
                    Style::default()
                        .fg(COLOR_ACCENT)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(COLOR_ACCENT))
                .style(Style::default().bg(COLOR_PANEL_BG))
                .padding(Padding::uniform(1)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(popup, popup_area);
}
