use crate::git::RepositorySnapshot;
use crate::git::parser;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// The three lists shown under an expanded repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelSection {
    Branches,
    Files,
    History,
}

impl PanelSection {
    pub fn next(self) -> Self {
        match self {
            PanelSection::Branches => PanelSection::Files,
            PanelSection::Files => PanelSection::History,
            PanelSection::History => PanelSection::Branches,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PanelSection::Branches => "Branches",
            PanelSection::Files => "Files",
            PanelSection::History => "History",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Staged,
    Unstaged,
    Untracked,
}

/// One selectable row of a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelItem {
    Branch {
        name: String,
        current: bool,
        remote_only: bool,
    },
    File {
        /// Status line as git printed it
        line: String,
        kind: FileKind,
    },
    Commit {
        descriptor: String,
        unpushed: bool,
    },
}

impl PanelItem {
    /// Path argument for file mutations. Untracked lines are bare paths.
    pub fn file_path(&self) -> Option<&str> {
        match self {
            PanelItem::File {
                line,
                kind: FileKind::Untracked,
            } => Some(line.trim()),
            PanelItem::File { line, .. } => Some(parser::status_entry_path(line)),
            _ => None,
        }
    }
}

/// Rows of `section`, in display order
pub fn section_items(snapshot: &RepositorySnapshot, section: PanelSection) -> Vec<PanelItem> {
    match section {
        PanelSection::Branches => {
            let branches = &snapshot.branches;
            let local = branches
                .local
                .iter()
                .chain(&branches.local_and_remote)
                .map(|name| PanelItem::Branch {
                    name: name.clone(),
                    current: *name == branches.current,
                    remote_only: false,
                });
            let remote = branches.remote.iter().map(|name| PanelItem::Branch {
                name: name.clone(),
                current: false,
                remote_only: true,
            });
            local.chain(remote).collect()
        }
        PanelSection::Files => {
            let status = &snapshot.status;
            let with_kind = |lines: &[String], kind: FileKind| -> Vec<PanelItem> {
                lines
                    .iter()
                    .map(|line| PanelItem::File {
                        line: line.clone(),
                        kind,
                    })
                    .collect()
            };
            let mut items = with_kind(&status.staged, FileKind::Staged);
            items.extend(with_kind(&status.unstaged, FileKind::Unstaged));
            items.extend(with_kind(&status.untracked, FileKind::Untracked));
            items
        }
        PanelSection::History => {
            let commits = &snapshot.commits;
            let unpushed = commits.new_commits.iter().map(|d| PanelItem::Commit {
                descriptor: d.clone(),
                unpushed: true,
            });
            let synced = commits.synced_commits.iter().map(|d| PanelItem::Commit {
                descriptor: d.clone(),
                unpushed: false,
            });
            unpushed.chain(synced).collect()
        }
    }
}

/// One working directory: title line, then its sections when expanded
pub struct RepositoryPanel<'a> {
    snapshot: &'a RepositorySnapshot,
    expanded: bool,
    /// Highlighted section and row, only for the selected repository
    cursor: Option<(PanelSection, usize)>,
}

impl<'a> RepositoryPanel<'a> {
    pub fn new(snapshot: &'a RepositorySnapshot, expanded: bool) -> Self {
        Self {
            snapshot,
            expanded,
            cursor: None,
        }
    }

    pub fn with_cursor(mut self, section: PanelSection, index: usize) -> Self {
        self.cursor = Some((section, index));
        self
    }

    /// Rows needed to draw the panel, borders included
    pub fn height(&self) -> u16 {
        let rows = self.build_content().len() as u16;
        rows.saturating_add(2)
    }

    fn build_content(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();

        let marker = if self.expanded { "▾ " } else { "▸ " };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(
                self.snapshot.title(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));

        if !self.expanded {
            return lines;
        }

        for section in [
            PanelSection::Branches,
            PanelSection::Files,
            PanelSection::History,
        ] {
            lines.push(Line::from(""));
            self.add_section(&mut lines, section);
        }

        lines
    }

    fn add_section(&self, lines: &mut Vec<Line<'a>>, section: PanelSection) {
        let items = section_items(self.snapshot, section);
        let focused = self.cursor.is_some_and(|(s, _)| s == section);

        let mut header_style = Style::default().add_modifier(Modifier::BOLD);
        if focused {
            header_style = header_style.fg(Color::Yellow);
        }
        lines.push(Line::from(Span::styled(
            format!("{} ({})", section.title(), items.len()),
            header_style,
        )));

        if section == PanelSection::Branches && self.snapshot.branches.is_detached() {
            lines.push(Line::from(Span::styled(
                "  (detached HEAD)",
                Style::default().fg(Color::DarkGray),
            )));
        }

        for (index, item) in items.iter().enumerate() {
            let selected = self.cursor == Some((section, index));
            let mut line = Self::item_line(item);
            if selected {
                line = line.style(Style::default().add_modifier(Modifier::REVERSED));
            }
            lines.push(line);
        }
    }

    fn item_line(item: &PanelItem) -> Line<'a> {
        match item {
            PanelItem::Branch {
                name,
                current,
                remote_only,
            } => {
                let (marker, color) = match (current, remote_only) {
                    (true, _) => ("* ", Color::Green),
                    (false, true) => ("  ", Color::DarkGray),
                    (false, false) => ("  ", Color::White),
                };
                let mut spans = vec![
                    Span::raw("  "),
                    Span::styled(format!("{}{}", marker, name), Style::default().fg(color)),
                ];
                if *remote_only {
                    spans.push(Span::styled(" (origin)", Style::default().fg(Color::DarkGray)));
                }
                Line::from(spans)
            }
            PanelItem::File { line, kind } => {
                let (label, color) = match kind {
                    FileKind::Staged => ("staged:    ", Color::Green),
                    FileKind::Unstaged => ("unstaged:  ", Color::Yellow),
                    FileKind::Untracked => ("untracked: ", Color::Red),
                };
                Line::from(vec![
                    Span::raw("  "),
                    Span::styled(label, Style::default().fg(color)),
                    Span::raw(line.clone()),
                ])
            }
            PanelItem::Commit {
                descriptor,
                unpushed,
            } => {
                let (hash, message) = descriptor
                    .split_once(' ')
                    .unwrap_or((descriptor.as_str(), ""));
                let arrow = if *unpushed { "↑ " } else { "  " };
                Line::from(vec![
                    Span::raw("  "),
                    Span::styled(arrow, Style::default().fg(Color::Cyan)),
                    Span::styled(hash.to_string(), Style::default().fg(Color::Yellow)),
                    Span::raw(" "),
                    Span::raw(message.to_string()),
                ])
            }
        }
    }
}

impl Widget for RepositoryPanel<'_> {
    fn render(self, area: ratatui::layout::Rect, buf: &mut ratatui::buffer::Buffer) {
        let border_style = if self.cursor.is_some() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let content = self.build_content();
        let paragraph = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style),
        );
        paragraph.render(area, buf);
    }
}
