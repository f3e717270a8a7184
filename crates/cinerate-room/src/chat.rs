//! Bounded room chat log.

use std::collections::VecDeque;

use cinerate_protocol::ChatLine;

/// How many chat lines a room retains.
pub const CHAT_CAPACITY: usize = 10;

/// A FIFO chat log holding the newest [`CHAT_CAPACITY`] lines.
#[derive(Debug, Default)]
pub struct ChatLog {
    lines: VecDeque<ChatLine>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line, evicting the oldest when at capacity.
    pub fn push(&mut self, line: ChatLine) {
        if self.lines.len() == CHAT_CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// The retained lines, oldest first.
    pub fn lines(&self) -> Vec<ChatLine> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
