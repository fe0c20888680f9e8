//! Interactive terminal UI for the recording library.
//!
//! Two tabs (recordings and trash), a sortable list with duration, size and
//! creation time, and single-key management actions. Damaged files are listed in
//! red so they can still be trashed or deleted.

use super::Browser;
use crate::recording::AudioDevice;
use crate::storage::{EntryStatus, Location, RecordingEntry};
use crate::ui::play_until_key;
use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, HighlightSpacing, List, ListItem, ListState, Padding, Paragraph, Tabs,
    },
};
use std::io::{self, Stdout};
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(255, 255, 255);
const DIM_FG: Color = Color::Rgb(100, 100, 100);
const HIGHLIGHT_BG: Color = Color::Rgb(20, 20, 20);
const DAMAGED_FG: Color = Color::Rgb(220, 60, 60);

/// How long a notification stays on screen.
const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

enum Mode {
    Normal,
    Rename(Input),
    ConfirmPurge,
    ConfirmEmptyTrash,
}

struct Notification {
    message: String,
    is_error: bool,
    shown_at: Instant,
}

/// Library screen over a [`Browser`].
pub struct LibraryViewer<'v, D: AudioDevice> {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    browser: Browser<'v>,
    device: D,
    interrupt: &'v AtomicBool,
    list_state: ListState,
    mode: Mode,
    notification: Option<Notification>,
    cleaned_up: bool,
}

impl<'v, D: AudioDevice> LibraryViewer<'v, D> {
    /// Enters the alternate screen.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized
    pub fn new(browser: Browser<'v>, device: D, interrupt: &'v AtomicBool) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            browser,
            device,
            interrupt,
            list_state: ListState::default(),
            mode: Mode::Normal,
            notification: None,
            cleaned_up: false,
        })
    }

    /// Runs until the user quits or an interrupt arrives.
    pub fn run(&mut self) -> Result<()> {
        tracing::debug!(
            "Library opened with {} recordings",
            self.browser.entries().len()
        );

        loop {
            if self.interrupt.load(std::sync::atomic::Ordering::Acquire) {
                tracing::info!("Interrupt received: closing library");
                break;
            }
            if self
                .notification
                .as_ref()
                .is_some_and(|n| n.shown_at.elapsed() >= NOTIFICATION_TTL)
            {
                self.notification = None;
            }

            self.draw()?;

            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            match event::read()? {
                Event::Key(key) => {
                    if self.handle_key(key)? {
                        break;
                    }
                }
                Event::Mouse(mouse) if matches!(self.mode, Mode::Normal) => match mouse.kind {
                    MouseEventKind::ScrollUp => self.browser.select_previous(),
                    MouseEventKind::ScrollDown => self.browser.select_next(),
                    _ => {}
                },
                _ => {}
            }
        }

        self.cleanup()
    }

    /// Returns `Ok(true)` when the viewer should close.
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }

        match &mut self.mode {
            Mode::Rename(input) => match key.code {
                KeyCode::Enter => {
                    let new_name = input.value().to_string();
                    self.mode = Mode::Normal;
                    let result = self.browser.rename_selected(&new_name);
                    self.notify(result);
                }
                KeyCode::Esc => self.mode = Mode::Normal,
                _ => {
                    input.handle_event(&Event::Key(key));
                }
            },
            Mode::ConfirmPurge => {
                self.mode = Mode::Normal;
                if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                    let result = self.browser.purge_selected();
                    self.notify(result);
                }
            }
            Mode::ConfirmEmptyTrash => {
                self.mode = Mode::Normal;
                if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                    let message = self.browser.empty_trash();
                    self.notify(Ok(message));
                }
            }
            Mode::Normal => return self.handle_normal_key(key),
        }
        Ok(false)
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up | KeyCode::Char('k') => self.browser.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.browser.select_next(),
            KeyCode::Tab | KeyCode::BackTab => self.browser.switch_tab(),
            KeyCode::Char('o') => self.browser.cycle_sort(),
            KeyCode::Char('O') => self.browser.toggle_order(),
            KeyCode::Char('r') => self.browser.refresh(),
            KeyCode::Char('t') | KeyCode::Char('u') => {
                let result = self.browser.move_selected();
                self.notify(result);
            }
            KeyCode::Char('n') => {
                if let Some(entry) = self.browser.selected() {
                    self.mode = Mode::Rename(Input::new(entry.id.clone()));
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if self.browser.tab() == Location::Trash && self.browser.selected().is_some() {
                    self.mode = Mode::ConfirmPurge;
                } else if self.browser.tab() == Location::Active {
                    self.notify_error("Move a recording to the trash before deleting it");
                }
            }
            KeyCode::Char('E') if self.browser.tab() == Location::Trash => {
                if !self.browser.entries().is_empty() {
                    self.mode = Mode::ConfirmEmptyTrash;
                }
            }
            KeyCode::Enter | KeyCode::Char('p') => self.play_selected()?,
            _ => {}
        }
        Ok(false)
    }

    fn play_selected(&mut self) -> Result<()> {
        let Some(entry) = self.browser.selected() else {
            return Ok(());
        };
        self.notification = Some(Notification {
            message: format!("Playing '{}'... space pauses, any other key stops", entry.id),
            is_error: false,
            shown_at: Instant::now(),
        });
        self.draw()?;

        let browser = &self.browser;
        let device = &mut self.device;
        let result = play_until_key(self.interrupt, |control| {
            browser.play_selected(device, control)
        });
        self.notification = None;
        if let Err(e) = result {
            self.notify_error(e.to_string());
        }
        Ok(())
    }

    fn notify(&mut self, result: crate::error::Result<String>) {
        match result {
            Ok(message) => {
                self.notification = Some(Notification {
                    message,
                    is_error: false,
                    shown_at: Instant::now(),
                });
            }
            Err(e) => {
                tracing::warn!("Library action failed: {}", e);
                self.notify_error(e.to_string());
            }
        }
    }

    fn notify_error(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification {
            message: message.into(),
            is_error: true,
            shown_at: Instant::now(),
        });
    }

    fn draw(&mut self) -> Result<()> {
        self.list_state.select(self.browser.selected_index());

        let browser = &self.browser;
        let mode = &self.mode;
        let notification = self.notification.as_ref();
        let list_state = &mut self.list_state;

        self.terminal.draw(|frame| {
            let area = frame.area();
            let padding_block = Block::default()
                .padding(Padding::uniform(1))
                .style(Style::default().bg(BG));
            frame.render_widget(&padding_block, area);
            let inner = padding_block.inner(area);

            let [tabs_area, list_area, prompt_area, footer_area] = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(if matches!(mode, Mode::Normal) { 1 } else { 3 }),
                Constraint::Length(1),
            ])
            .areas(inner);

            let selected_tab = match browser.tab() {
                Location::Active => 0,
                Location::Trash => 1,
            };
            let (sort, order) = browser.sort();
            let tabs = Tabs::new(vec![" Recordings ", " Trash "])
                .select(selected_tab)
                .style(Style::default().fg(DIM_FG))
                .highlight_style(Style::default().fg(FG).add_modifier(Modifier::BOLD));
            frame.render_widget(tabs, tabs_area);

            let arrow = match order {
                crate::storage::SortOrder::Ascending => "↑",
                crate::storage::SortOrder::Descending => "↓",
            };
            let title = format!(
                " {} ({}) sorted by {sort} {arrow} ",
                browser.tab(),
                browser.entries().len()
            );
            let items: Vec<ListItem> = browser.entries().iter().map(entry_item).collect();
            let list = List::new(items)
                .block(Block::default().title(title).borders(Borders::ALL))
                .highlight_style(Style::default().bg(HIGHLIGHT_BG))
                .highlight_symbol("> ")
                .highlight_spacing(HighlightSpacing::Always);
            frame.render_stateful_widget(list, list_area, list_state);

            match mode {
                Mode::Rename(input) => {
                    let block = Block::default().title(" New name ").borders(Borders::ALL);
                    let input_inner = block.inner(prompt_area);
                    frame.render_widget(&block, prompt_area);
                    frame.render_widget(Paragraph::new(input.value()), input_inner);
                    frame.set_cursor_position(Position::new(
                        input_inner.x + input.visual_cursor() as u16,
                        input_inner.y,
                    ));
                }
                Mode::ConfirmPurge => {
                    render_confirm(frame, prompt_area, "Delete permanently? (y/N)")
                }
                Mode::ConfirmEmptyTrash => {
                    render_confirm(frame, prompt_area, "Delete everything in the trash? (y/N)")
                }
                Mode::Normal => {
                    if let Some(n) = notification {
                        let color = if n.is_error { DAMAGED_FG } else { Color::Green };
                        frame.render_widget(
                            Paragraph::new(n.message.as_str()).style(Style::default().fg(color)),
                            prompt_area,
                        );
                    }
                }
            }

            let help = match (mode, browser.tab()) {
                (Mode::Rename(_), _) => "↵ rename, esc cancel",
                (Mode::ConfirmPurge | Mode::ConfirmEmptyTrash, _) => {
                    "y confirm, any other key cancels"
                }
                (Mode::Normal, Location::Active) => {
                    "↑↓ select, ↵ play, t trash, n rename, o sort, O order, tab trash view, q quit"
                }
                (Mode::Normal, Location::Trash) => {
                    "↑↓ select, ↵ play, u restore, x delete, E empty, n rename, o sort, tab back, q quit"
                }
            };
            frame.render_widget(
                Paragraph::new(help)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(DIM_FG)),
                footer_area,
            );
        })?;
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        self.cleaned_up = true;

        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        tracing::debug!("Library terminal cleanup complete");
        Ok(())
    }
}

impl<D: AudioDevice> Drop for LibraryViewer<'_, D> {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn entry_item(entry: &RecordingEntry) -> ListItem<'static> {
    let created = entry.created_at.format("%Y-%m-%d %H:%M").to_string();
    match &entry.status {
        EntryStatus::Ok => {
            let preset = entry
                .preset
                .map(|p| p.to_string())
                .unwrap_or_else(|| "custom".to_string());
            let details = format!(
                "{created}  {}  {}  {preset}",
                entry.duration_label(),
                entry.size_label()
            );
            ListItem::new(vec![
                Line::styled(entry.id.clone(), Style::default().fg(FG)),
                Line::styled(details, Style::default().fg(DIM_FG)),
            ])
        }
        EntryStatus::Damaged(reason) => ListItem::new(vec![
            Line::styled(format!("{} (damaged)", entry.id), Style::default().fg(DAMAGED_FG)),
            Line::styled(format!("{created}  {reason}"), Style::default().fg(DAMAGED_FG)),
        ]),
    }
}

fn render_confirm(frame: &mut Frame, area: Rect, question: &str) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(&block, area);
    frame.render_widget(
        Paragraph::new(question).style(Style::default().fg(Color::Yellow)),
        inner,
    );
}
