use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// What the typed text will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    CommitMessage,
    NewBranch,
}

impl PromptKind {
    fn label(self) -> &'static str {
        match self {
            PromptKind::CommitMessage => "Commit message:",
            PromptKind::NewBranch => "New branch name:",
        }
    }
}

/// Single-line text prompt
pub struct InputWidget {
    input: String,
    /// Cursor position in characters
    cursor_position: usize,
    kind: PromptKind,
}

impl InputWidget {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            input: String::new(),
            cursor_position: 0,
            kind,
        }
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    /// Handle keyboard input; returns whether the key was consumed
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return false;
                }

                let at = self.byte_index();
                self.input.insert(at, c);
                self.cursor_position += 1;
                true
            }
            KeyCode::Backspace => {
                if self.cursor_position > 0 {
                    self.cursor_position -= 1;
                    let at = self.byte_index();
                    self.input.remove(at);
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor_position < self.char_count() {
                    let at = self.byte_index();
                    self.input.remove(at);
                }
                true
            }
            KeyCode::Left => {
                self.cursor_position = self.cursor_position.saturating_sub(1);
                true
            }
            KeyCode::Right => {
                if self.cursor_position < self.char_count() {
                    self.cursor_position += 1;
                }
                true
            }
            KeyCode::Home => {
                self.cursor_position = 0;
                true
            }
            KeyCode::End => {
                self.cursor_position = self.char_count();
                true
            }
            _ => false,
        }
    }

    /// Take the current input and clear the widget
    pub fn take_input(&mut self) -> String {
        self.cursor_position = 0;
        std::mem::take(&mut self.input)
    }

    pub fn get_input(&self) -> &str {
        &self.input
    }

    fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map_or(self.input.len(), |(i, _)| i)
    }
}

impl Widget for &InputWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (before, after) = self.input.split_at(self.byte_index());
        let display_text = format!("{} {}▊{}", self.kind.label(), before, after);

        let style = Style::default().fg(Color::Yellow);
        let paragraph = Paragraph::new(display_text)
            .style(style)
            .block(Block::default().borders(Borders::ALL).border_style(style));

        paragraph.render(area, buf);
    }
}
