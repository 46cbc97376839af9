//! Styled text chunks and the viewport wrapping algorithm.
//!
//! A logical output line mixes differently-styled runs of text (a bold
//! header next to magnitude-colored numbers), so wrapping has to operate on
//! chunks rather than raw strings: each chunk carries its attribute across
//! the wrap.

use std::collections::VecDeque;

/// Visual class of a chunk; each renderer maps tones to its own concrete
/// styling (terminal color pairs or ANSI escapes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Plain,
    /// Bold, used for the per-thread header line.
    Header,
    Ok,
    Warn,
    Critical,
}

/// A contiguous run of text sharing one visual attribute — the unit of
/// wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub tone: Tone,
}

impl Chunk {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Plain)
    }

    fn width(&self) -> usize {
        self.text.chars().count()
    }
}

/// One logical output line: an ordered chunk sequence.
pub type StyledLine = Vec<Chunk>;

/// Reflows one logical line into physical lines of exactly `width` columns.
///
/// Chunks are consumed in order with a carried column count; a chunk that
/// would overflow is sliced at the remaining width, the physical line is
/// closed, and the remainder opens the next one. The final physical line is
/// padded with a trailing space chunk for a clean background. Concatenating
/// the produced chunk texts (padding aside) reproduces the input exactly.
#[must_use]
pub fn wrap_line(line: &StyledLine, width: usize) -> Vec<StyledLine> {
    if width == 0 {
        // Degenerate viewport; nothing can be painted anyway.
        return vec![line.clone()];
    }
    let mut wrapped = Vec::new();
    let mut queue: VecDeque<Chunk> = line.iter().cloned().collect();
    let mut current: StyledLine = Vec::new();
    let mut carry = 0;
    while let Some(chunk) = queue.pop_front() {
        let available = width - carry;
        if chunk.width() > available {
            let (head, tail) = split_at_width(&chunk, available);
            if let Some(head) = head {
                current.push(head);
            }
            wrapped.push(current);
            current = Vec::new();
            carry = 0;
            queue.push_front(tail);
        } else {
            carry += chunk.width();
            current.push(chunk);
        }
    }
    if carry < width {
        current.push(Chunk::plain(" ".repeat(width - carry)));
    }
    wrapped.push(current);
    wrapped
}

fn split_at_width(chunk: &Chunk, width: usize) -> (Option<Chunk>, Chunk) {
    let head: String = chunk.text.chars().take(width).collect();
    let tail: String = chunk.text.chars().skip(width).collect();
    let head = if head.is_empty() {
        None
    } else {
        Some(Chunk::new(head, chunk.tone))
    };
    (head, Chunk::new(tail, chunk.tone))
}
