//! Terminal screen shown while recording and after stopping.
//!
//! While capturing it draws a scrolling level meter with the elapsed time and a
//! state indicator. Once stopped it offers preview, save (with a name prompt) and
//! discard (with confirmation).

use super::session::SessionState;
use crate::storage::format_duration;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Sparkline, Wrap},
};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(206, 224, 220);
const ACCENT: Color = Color::Rgb(185, 207, 212);
const HELP_FG: Color = Color::Rgb(100, 100, 100);

/// Level at or above which the peak indicator turns red.
const PEAK_WARNING: u8 = 90;

/// User input during and after recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingCommand {
    /// No key pressed, or a key handled inside the screen
    Continue,
    /// Pause or resume capture (Space)
    TogglePause,
    /// Finish capturing (Enter or 's')
    Stop,
    /// Play back the stopped recording ('l')
    Preview,
    /// Save under the entered name; `None` means a timestamp id
    Save(Option<String>),
    /// Throw the recording away, after confirmation
    Discard,
    /// Ctrl+C
    Interrupt,
}

/// What the screen is currently asking of the user.
enum Prompt {
    None,
    Name(Input),
    ConfirmDiscard,
}

/// Snapshot of the session for one frame.
pub struct SessionView<'a> {
    pub state: SessionState,
    pub elapsed: Duration,
    pub captured_secs: f64,
    /// Most recent samples, used for the level meter
    pub recent: &'a [i16],
}

/// Recording screen backed by the alternate terminal screen.
pub struct RecorderTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    level_history: Vec<u64>,
    last_sample_time: Instant,
    sample_interval: Duration,
    last_level: u8,
    peak_hold: u8,
    peak_hold_time: Instant,
    reference_level_db: i8,
    prompt: Prompt,
    /// Pre-filled into the name prompt
    default_name: String,
    /// One-line message shown above the key hints, e.g. a failed save
    status: Option<String>,
    cleaned_up: bool,
}

impl RecorderTui {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If the terminal cannot be initialized
    pub fn new(reference_level_db: i8) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        let width = terminal.size()?.width as usize;
        let now = Instant::now();

        Ok(Self {
            terminal,
            level_history: vec![0; width],
            last_sample_time: now,
            sample_interval: Duration::from_millis(50),
            last_level: 0,
            peak_hold: 0,
            peak_hold_time: now,
            reference_level_db,
            prompt: Prompt::None,
            default_name: String::new(),
            status: None,
            cleaned_up: false,
        })
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn set_default_name(&mut self, name: &str) {
        self.default_name = name.to_string();
    }

    /// Opens the name prompt pre-filled with `initial`.
    pub fn prompt_for_name(&mut self, initial: &str) {
        self.prompt = Prompt::Name(Input::new(initial.to_string()));
    }

    /// Draws one frame.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, view: &SessionView<'_>) -> Result<()> {
        if view.state == SessionState::Recording {
            let level = level_percent(view.recent, self.reference_level_db);
            self.track_level(level);
        } else {
            self.last_level = 0;
        }
        self.fit_history_to_width()?;

        let level_history = &self.level_history;
        let (level, peak) = (self.last_level, self.peak_hold);
        let status = self.status.as_deref();
        let prompt = &self.prompt;

        self.terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Block::default().style(Style::default().bg(BG)), area);

            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(3),
                    Constraint::Length(3),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .split(area);

            if view.state.is_capturing() {
                let meter = Sparkline::default()
                    .data(level_history)
                    .max(100)
                    .style(Style::default().bg(BG).fg(FG));
                frame.render_widget(meter, layout[0]);
            } else {
                draw_summary(frame, layout[0], view);
            }

            match prompt {
                Prompt::Name(input) => draw_name_prompt(frame, layout[1], input),
                Prompt::ConfirmDiscard => {
                    let confirm = Paragraph::new("Discard this recording? (y/N)")
                        .alignment(Alignment::Center)
                        .style(Style::default().fg(Color::Yellow).bg(BG));
                    frame.render_widget(confirm, layout[1]);
                }
                Prompt::None => {}
            }

            if let Some(message) = status {
                let line = Paragraph::new(message)
                    .style(Style::default().fg(Color::Red).bg(BG))
                    .wrap(Wrap { trim: true });
                frame.render_widget(line, layout[2]);
            }

            frame.render_widget(footer(view, level, peak, prompt), layout[3]);
        })?;

        Ok(())
    }

    /// Polls for a key and translates it for the current session state.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, state: SessionState) -> Result<RecordingCommand> {
        if !event::poll(Duration::from_millis(50))? {
            return Ok(RecordingCommand::Continue);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(RecordingCommand::Continue);
        };

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            tracing::debug!("Ctrl+C pressed");
            return Ok(RecordingCommand::Interrupt);
        }

        Ok(match self.prompt {
            Prompt::Name(_) => self.handle_name_key(key),
            Prompt::ConfirmDiscard => {
                self.prompt = Prompt::None;
                match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => RecordingCommand::Discard,
                    _ => RecordingCommand::Continue,
                }
            }
            Prompt::None => self.handle_session_key(key, state),
        })
    }

    fn handle_session_key(&mut self, key: KeyEvent, state: SessionState) -> RecordingCommand {
        match (state, key.code) {
            (SessionState::Recording | SessionState::Paused, KeyCode::Char(' ')) => {
                RecordingCommand::TogglePause
            }
            (
                SessionState::Recording | SessionState::Paused,
                KeyCode::Enter | KeyCode::Char('s'),
            ) => RecordingCommand::Stop,
            (SessionState::Stopped, KeyCode::Char('l') | KeyCode::Char('p')) => {
                RecordingCommand::Preview
            }
            (SessionState::Stopped, KeyCode::Enter | KeyCode::Char('s')) => {
                self.prompt = Prompt::Name(Input::new(self.default_name.clone()));
                RecordingCommand::Continue
            }
            (_, KeyCode::Char('d') | KeyCode::Char('q') | KeyCode::Esc) => {
                self.prompt = Prompt::ConfirmDiscard;
                RecordingCommand::Continue
            }
            _ => RecordingCommand::Continue,
        }
    }

    fn handle_name_key(&mut self, key: KeyEvent) -> RecordingCommand {
        let Prompt::Name(input) = &mut self.prompt else {
            return RecordingCommand::Continue;
        };
        match key.code {
            KeyCode::Enter => {
                let value = input.value().trim().to_string();
                self.prompt = Prompt::None;
                RecordingCommand::Save((!value.is_empty()).then_some(value))
            }
            KeyCode::Esc => {
                self.prompt = Prompt::None;
                RecordingCommand::Continue
            }
            _ => {
                input.handle_event(&Event::Key(key));
                RecordingCommand::Continue
            }
        }
    }

    fn track_level(&mut self, level: u8) {
        self.last_level = level;
        if level > self.peak_hold || self.peak_hold_time.elapsed().as_secs() >= 3 {
            self.peak_hold = level;
            self.peak_hold_time = Instant::now();
        }
        if self.last_sample_time.elapsed() >= self.sample_interval {
            self.level_history.push(level as u64);
            self.last_sample_time = Instant::now();
        }
    }

    fn fit_history_to_width(&mut self) -> Result<()> {
        let width = self.terminal.size()?.width as usize;
        let len = self.level_history.len();
        if len > width {
            self.level_history.drain(..len - width);
        } else if len < width {
            let mut padded = vec![0; width - len];
            padded.append(&mut self.level_history);
            self.level_history = padded;
        }
        Ok(())
    }

    /// Restores the terminal.
    ///
    /// # Errors
    /// - If raw mode cannot be disabled
    /// - If the cursor cannot be shown
    pub fn cleanup(&mut self) -> Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        self.cleaned_up = true;

        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for RecorderTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn draw_summary(frame: &mut Frame, area: Rect, view: &SessionView<'_>) {
    let text = match view.state {
        SessionState::Previewing => "Playing back... space pauses, any other key stops".to_string(),
        _ => format!(
            "Recorded {} ({:.1}s of audio)",
            format_duration(view.elapsed.as_secs_f64()),
            view.captured_secs
        ),
    };
    let summary = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(FG).bg(BG));

    let centered = Rect {
        y: area.y + area.height / 2,
        height: 1.min(area.height),
        ..area
    };
    frame.render_widget(summary, centered);
}

fn draw_name_prompt(frame: &mut Frame, area: Rect, input: &Input) {
    let block = Block::default()
        .title(" Name (empty for timestamp) ")
        .borders(Borders::ALL)
        .style(Style::default().fg(ACCENT).bg(BG));
    let inner = block.inner(area);
    frame.render_widget(&block, area);
    frame.render_widget(
        Paragraph::new(input.value()).style(Style::default().fg(Color::White)),
        inner,
    );
    frame.set_cursor_position(Position::new(inner.x + input.visual_cursor() as u16, inner.y));
}

fn footer<'a>(view: &SessionView<'_>, level: u8, peak: u8, prompt: &Prompt) -> Paragraph<'a> {
    let indicator = match view.state {
        SessionState::Recording => Span::styled("● ", Style::default().fg(Color::Red)),
        SessionState::Paused => Span::styled("⏸ ", Style::default().fg(Color::Yellow)),
        SessionState::Previewing => Span::styled("▶ ", Style::default().fg(Color::Green)),
        _ => Span::styled("■ ", Style::default().fg(ACCENT)),
    };

    let mut spans = vec![indicator, Span::raw(format_duration(view.elapsed.as_secs_f64()))];
    if view.state.is_capturing() {
        let peak_style = if peak >= PEAK_WARNING {
            Style::default().bg(Color::Red).fg(Color::White)
        } else {
            Style::default()
        };
        spans.push(Span::raw(format!(" / {level}% / ")));
        spans.push(Span::styled(format!("{peak}%"), peak_style));
    }

    let hints = match (prompt, view.state) {
        (Prompt::Name(_), _) => "enter save, esc back",
        (Prompt::ConfirmDiscard, _) => "y discard, any other key keeps it",
        (_, SessionState::Recording | SessionState::Paused) => {
            "space pause/resume, enter stop, esc discard"
        }
        (_, SessionState::Previewing) => "space pause/resume, any other key stops",
        _ => "l listen, enter/s save, d discard",
    };
    spans.push(Span::styled(format!("   {hints}"), Style::default().fg(HELP_FG)));

    Paragraph::new(Line::from(spans)).style(Style::default().fg(ACCENT).bg(BG))
}

/// Converts the RMS of `samples` into a 0-100 meter reading.
///
/// The scale spans 40 dB ending at `reference_level_db` dBFS; silence reads as the
/// 4% floor so the meter never disappears entirely.
pub fn level_percent(samples: &[i16], reference_level_db: i8) -> u8 {
    if samples.is_empty() {
        return 0;
    }

    let sum_of_squares: i64 = samples.iter().map(|&x| (x as i64).pow(2)).sum();
    let mean_square = sum_of_squares / samples.len() as i64;
    let rms = (mean_square as f32).sqrt();

    let db_fs = if rms > 0.0 {
        20.0 * (rms / 32767.0).log10()
    } else {
        -160.0
    };

    let min_db = reference_level_db as f32 - 40.0;
    ((db_fs - min_db) / 40.0 * 100.0).clamp(4.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_percent_bounds() {
        assert_eq!(level_percent(&[], -20), 0);
        assert_eq!(level_percent(&[0; 64], -20), 4);
        assert_eq!(level_percent(&[i16::MAX; 64], -20), 100);
    }

    #[test]
    fn test_level_percent_tracks_reference() {
        // About -26 dBFS: below a -20 reference, above a -40 one.
        let quiet = vec![1600i16; 256];
        let against_loud_reference = level_percent(&quiet, -20);
        let against_quiet_reference = level_percent(&quiet, -40);
        assert!(against_loud_reference < 100);
        assert_eq!(against_quiet_reference, 100);
        assert!(against_loud_reference > 50);
    }
}
