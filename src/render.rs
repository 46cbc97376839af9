//! The two renderers: a full-screen refreshing view and a plain ANSI
//! streaming view.
//!
//! The refresh view owns the terminal for its lifetime through an RAII
//! guard, so cooked mode and the normal screen come back on every exit
//! path — including unwinds out of the tick loop. The streaming view holds
//! no terminal state at all and is safe for headless or log-captured runs.

use std::io::{self, stdout, Stdout, Write};

use crossterm::cursor::{Hide, Show};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};

use crate::error::Result;
use crate::stats::{ThreadId, ThreadRegistry};
use crate::text::{wrap_line, Chunk, StyledLine, Tone};
use crate::view;

/// A tick renderer: turns the ranked, enriched records into output.
pub trait ThreadView {
    fn display(&mut self, registry: &ThreadRegistry, selected: &[ThreadId], tick: u64);
}

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Plain => Style::default(),
        Tone::Header => Style::default().add_modifier(Modifier::BOLD),
        Tone::Ok => Style::default().fg(Color::Green),
        Tone::Warn => Style::default().fg(Color::Yellow),
        Tone::Critical => Style::default().fg(Color::Red),
    }
}

/// Scoped ownership of the terminal: echo and canonical input off,
/// alternate screen entered, cursor hidden. Signal generation stays
/// enabled — Ctrl-C must keep interrupting the pipeline, which blocks on
/// the sampling subprocess rather than on key events. Everything is
/// restored on drop.
struct TerminalGuard {
    saved: libc::termios,
}

impl TerminalGuard {
    fn acquire() -> Result<Self> {
        // SAFETY: plain termios calls against stdin.
        #[allow(unsafe_code)]
        let saved = unsafe {
            let mut saved: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &mut saved) != 0 {
                return Err(io::Error::last_os_error().into());
            }
            let mut cbreak = saved;
            cbreak.c_lflag &= !(libc::ECHO | libc::ICANON);
            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &cbreak) != 0 {
                return Err(io::Error::last_os_error().into());
            }
            saved
        };
        stdout().execute(EnterAlternateScreen)?;
        stdout().execute(Hide)?;
        Ok(Self { saved })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = stdout().execute(Show);
        let _ = stdout().execute(LeaveAlternateScreen);
        // SAFETY: restores the attributes captured in acquire().
        #[allow(unsafe_code)]
        unsafe {
            libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &self.saved);
        }
    }
}

/// Full-screen scrolling view.
pub struct RefreshView {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    title: String,
    _guard: TerminalGuard,
}

impl RefreshView {
    /// Acquires the terminal and prepares the paint surface.
    pub fn open(title: String) -> Result<Self> {
        log::debug!("Initializing refresh view ({title})");
        let guard = TerminalGuard::acquire()?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        Ok(Self {
            terminal,
            title,
            _guard: guard,
        })
    }
}

impl ThreadView for RefreshView {
    fn display(&mut self, registry: &ThreadRegistry, selected: &[ThreadId], tick: u64) {
        let title = &self.title;
        let result = self
            .terminal
            .draw(|frame| draw_tick(frame, title, registry, selected, tick));
        if let Err(err) = result {
            // Expected while the terminal resizes; the next tick repaints.
            log::debug!("Error raised painting the screen: {err}");
        }
    }
}

fn draw_tick(
    frame: &mut Frame,
    title: &str,
    registry: &ThreadRegistry,
    selected: &[ThreadId],
    tick: u64,
) {
    let area = frame.area();
    if area.width < 5 || area.height < 3 {
        return;
    }
    let reverse = Style::default().add_modifier(Modifier::REVERSED);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title.to_string(), reverse));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let logical = view::collect_lines(registry, selected, area.height as usize);
    let mut physical = Vec::new();
    for line in &logical {
        physical.extend(wrap_line(line, inner.width as usize));
    }
    physical.truncate(inner.height as usize);
    let text = Text::from(
        physical
            .iter()
            .map(styled_line_to_ratatui)
            .collect::<Vec<Line>>(),
    );
    frame.render_widget(Paragraph::new(text), inner);

    let footer = format!(
        "Iteration #{tick} | Press Ctrl + C to quit (pid {})",
        std::process::id()
    );
    let footer_area = Rect {
        x: area.x + 2,
        y: area.y + area.height - 1,
        width: area.width.saturating_sub(4),
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(footer, reverse))).centered(),
        footer_area,
    );
}

fn styled_line_to_ratatui(line: &StyledLine) -> Line<'_> {
    Line::from(
        line.iter()
            .map(|chunk| Span::styled(chunk.text.as_str(), tone_style(chunk.tone)))
            .collect::<Vec<Span>>(),
    )
}

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const RED: &str = "\x1b[91m";
const MAGENTA: &str = "\x1b[95m";

fn tone_escape(tone: Tone) -> Option<&'static str> {
    match tone {
        Tone::Plain => None,
        Tone::Header => Some(BOLD),
        Tone::Ok => Some(GREEN),
        Tone::Warn => Some(YELLOW),
        Tone::Critical => Some(RED),
    }
}

/// Append-only view: one self-contained colorized block per tick, no
/// wrapping, no truncation, no terminal-mode changes.
pub struct StreamView<W: Write> {
    writer: W,
    title: String,
}

impl StreamView<Stdout> {
    #[must_use]
    pub fn to_stdout(title: String) -> Self {
        Self::new(stdout(), title)
    }
}

impl<W: Write> StreamView<W> {
    pub fn new(writer: W, title: String) -> Self {
        Self { writer, title }
    }

    /// The underlying writer, for tests that capture output.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn write_tick(
        &mut self,
        registry: &ThreadRegistry,
        selected: &[ThreadId],
        tick: u64,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "{MAGENTA}-------------------------- Iteration #{tick:5}{RESET}"
        )?;
        writeln!(self.writer, "{MAGENTA}{}{RESET}", self.title)?;
        for tid in selected {
            let Some(record) = registry.get(*tid) else {
                continue;
            };
            let (lines, _) = view::thread_lines(record, 0, usize::MAX);
            for line in &lines {
                write_styled_line(&mut self.writer, line)?;
            }
        }
        self.writer.flush()
    }
}

fn write_styled_line<W: Write>(writer: &mut W, line: &StyledLine) -> io::Result<()> {
    for Chunk { text, tone } in line {
        match tone_escape(*tone) {
            Some(escape) => write!(writer, "{escape}{text}{RESET}")?,
            None => write!(writer, "{text}")?,
        }
    }
    writeln!(writer)
}

impl<W: Write> ThreadView for StreamView<W> {
    fn display(&mut self, registry: &ThreadRegistry, selected: &[ThreadId], tick: u64) {
        if let Err(err) = self.write_tick(registry, selected, tick) {
            log::info!("error writing to the output stream: {err}");
        }
    }
}
