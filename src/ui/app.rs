use crate::config::UiStateStore;
use crate::git::{
    Batch, BatchOutcome, Invalidation, Mutation, RepositoryController, RepositoryRegistry,
    RepositorySnapshot,
};
use crate::ui::input::{InputWidget, PromptKind};
use crate::ui::repo_panel::{section_items, FileKind, PanelItem, PanelSection, RepositoryPanel};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

const EXPANDED_FLAG: &str = "expanded";

/// Work the event loop hands to the controllers
#[derive(Debug)]
pub enum Action {
    Submit { repository: usize, batch: Batch },
    ShowCommitUrl { repository: usize, descriptor: String },
}

#[derive(Debug, Clone, PartialEq)]
struct StatusMessage {
    text: String,
    is_error: bool,
}

/// Main application state
pub struct App {
    registry: RepositoryRegistry,
    ui_state: UiStateStore,
    snapshots: Vec<RepositorySnapshot>,
    selected: usize,
    section: PanelSection,
    item: usize,
    prompt: Option<InputWidget>,
    message: Option<StatusMessage>,
    refresh_interval: Duration,
    last_refresh: Instant,
    should_quit: bool,
}

impl App {
    pub fn new(registry: RepositoryRegistry, ui_state: UiStateStore, refresh_interval: Duration) -> Self {
        let mut app = Self {
            registry,
            ui_state,
            snapshots: Vec::new(),
            selected: 0,
            section: PanelSection::Branches,
            item: 0,
            prompt: None,
            message: None,
            refresh_interval,
            last_refresh: Instant::now(),
            should_quit: false,
        };
        app.sync_snapshots();
        app
    }

    /// Run the application event loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.sync_snapshots();
            terminal.draw(|f| self.render(f))?;

            // Poll for events with 100ms timeout so refreshes keep ticking
            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()?
                    && let Some(action) = self.handle_key(key)
                {
                    self.perform(action).await;
                }
            } else if self.last_refresh.elapsed() >= self.refresh_interval {
                self.refresh().await;
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Re-read every repository
    pub async fn refresh(&mut self) {
        if let Err(e) = self.registry.refresh_all().await {
            warn!("refresh failed: {}", e);
            self.set_error(e.to_string());
        }
        self.last_refresh = Instant::now();
        self.sync_snapshots();
    }

    fn sync_snapshots(&mut self) {
        self.snapshots = self
            .registry
            .controllers()
            .iter()
            .map(|c| c.snapshot())
            .collect();
        self.selected = self.selected.min(self.snapshots.len().saturating_sub(1));
        self.item = self.item.min(self.current_items().len().saturating_sub(1));
    }

    fn controller(&self, index: usize) -> Option<&Arc<RepositoryController>> {
        self.registry.controllers().get(index)
    }

    fn is_expanded(&self, index: usize) -> bool {
        self.snapshots.get(index).is_some_and(|snapshot| {
            self.ui_state
                .get_flag(snapshot.working_directory.path(), EXPANDED_FLAG, index == 0)
        })
    }

    fn current_items(&self) -> Vec<PanelItem> {
        self.snapshots
            .get(self.selected)
            .map(|snapshot| section_items(snapshot, self.section))
            .unwrap_or_default()
    }

    fn selected_item(&self) -> Option<PanelItem> {
        if !self.is_expanded(self.selected) {
            return None;
        }
        self.current_items().into_iter().nth(self.item)
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.message = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    fn set_info(&mut self, text: impl Into<String>) {
        self.message = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        frame.render_widget(ratatui::widgets::Clear, frame.area());

        let panels: Vec<RepositoryPanel<'_>> = self
            .snapshots
            .iter()
            .enumerate()
            .map(|(index, snapshot)| {
                let expanded = self.is_expanded(index);
                let panel = RepositoryPanel::new(snapshot, expanded);
                if index == self.selected && expanded {
                    panel.with_cursor(self.section, self.item)
                } else {
                    panel
                }
            })
            .collect();

        let mut constraints: Vec<Constraint> =
            panels.iter().map(|p| Constraint::Length(p.height())).collect();
        constraints.push(Constraint::Min(0));
        let prompt_height = if self.prompt.is_some() { 3 } else { 0 };
        constraints.push(Constraint::Length(prompt_height));
        constraints.push(Constraint::Length(1));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(frame.area());

        let panel_count = panels.len();
        for (panel, area) in panels.into_iter().zip(chunks.iter()) {
            frame.render_widget(panel, *area);
        }

        if let Some(ref prompt) = self.prompt {
            frame.render_widget(prompt, chunks[panel_count + 1]);
        }

        let status_area = chunks[panel_count + 2];
        match &self.message {
            Some(message) => {
                let color = if message.is_error { Color::Red } else { Color::Green };
                frame.render_widget(
                    Paragraph::new(message.text.as_str()).style(Style::default().fg(color)),
                    status_area,
                );
            }
            None => {
                let hints = if self.prompt.is_some() {
                    "Enter: confirm | Esc: cancel"
                } else {
                    "←/→ repo | Tab section | ↑/↓ item | Enter expand | f fetch p pull P push | c checkout b branch d delete | a add u unstage r revert x remove C commit | z reset o link | q quit"
                };
                frame.render_widget(
                    Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
                    status_area,
                );
            }
        }
    }

    /// Map a key press to UI changes and, possibly, an action to run
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        // Only handle key press events (not release or repeat)
        if key.kind != KeyEventKind::Press {
            return None;
        }

        // An error stays until acknowledged
        if self.message.as_ref().is_some_and(|m| m.is_error) {
            self.message = None;
            return None;
        }
        self.message = None;

        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.select_repository(self.selected.saturating_sub(1));
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.select_repository(self.selected + 1);
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.item = self.item.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.item + 1 < self.current_items().len() {
                    self.item += 1;
                }
                None
            }
            KeyCode::Tab => {
                self.section = self.section.next();
                self.item = 0;
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.toggle_expanded();
                None
            }
            KeyCode::Char(c) => self.mutation_key(c),
            _ => None,
        }
    }

    fn select_repository(&mut self, index: usize) {
        if index < self.snapshots.len() && index != self.selected {
            self.selected = index;
            self.section = PanelSection::Branches;
            self.item = 0;
        }
    }

    fn toggle_expanded(&mut self) {
        let Some(snapshot) = self.snapshots.get(self.selected) else {
            return;
        };
        let path = snapshot.working_directory.path().to_path_buf();
        let expanded = !self.is_expanded(self.selected);
        if let Err(e) = self.ui_state.set_flag(&path, EXPANDED_FLAG, expanded) {
            warn!(path = %path.display(), "could not store ui state: {}", e);
            self.set_error(format!("Could not save UI state: {}", e));
        }
    }

    fn mutation_key(&mut self, key: char) -> Option<Action> {
        let snapshot = self.snapshots.get(self.selected)?;
        let repository = self.selected;
        let item = self.selected_item();
        let path = item
            .as_ref()
            .and_then(PanelItem::file_path)
            .map(str::to_string)
            .unwrap_or_default();

        let submit = |batch: Batch| Some(Action::Submit { repository, batch });

        match (key, item) {
            ('f', _) => submit(Mutation::Fetch.into()),
            ('p', _) => submit(Mutation::Pull.into()),
            ('P', _) => {
                if snapshot.commits.can_push() {
                    submit(Mutation::Push.into())
                } else {
                    self.set_info("Nothing to push");
                    None
                }
            }
            ('c', Some(PanelItem::Branch { name, current: false, .. })) => {
                let mut batch = Batch::from(Mutation::checkout(name, &snapshot.branches));
                batch.refresh_also(Invalidation::BRANCH);
                submit(batch)
            }
            ('d', Some(PanelItem::Branch { name, current: false, remote_only: false })) => {
                let mut batch = Batch::from(Mutation::DeleteBranch { name });
                batch.refresh_also(Invalidation::BRANCH);
                submit(batch)
            }
            ('b', _) => {
                self.prompt = Some(InputWidget::new(PromptKind::NewBranch));
                None
            }
            ('C', _) => {
                if snapshot.status.staged.is_empty() {
                    self.set_info("Nothing staged to commit");
                } else {
                    self.prompt = Some(InputWidget::new(PromptKind::CommitMessage));
                }
                None
            }
            ('a', Some(PanelItem::File { kind, .. })) if kind != FileKind::Staged => {
                submit(Mutation::Add { path }.into())
            }
            ('u', Some(PanelItem::File { kind: FileKind::Staged, .. })) => {
                submit(Mutation::Unstage { path }.into())
            }
            ('r', Some(PanelItem::File { kind: FileKind::Unstaged, .. })) => {
                submit(Mutation::Revert { path }.into())
            }
            ('x', Some(PanelItem::File { kind: FileKind::Untracked, .. })) => {
                submit(Mutation::Remove { path }.into())
            }
            ('z', Some(PanelItem::Commit { descriptor, .. })) => {
                if snapshot.commits.can_reset(&descriptor) {
                    submit(Mutation::ResetCommit { descriptor }.into())
                } else {
                    self.set_info("Only the newest unpushed commit can be reset");
                    None
                }
            }
            ('o', Some(PanelItem::Commit { descriptor, .. })) => {
                Some(Action::ShowCommitUrl { repository, descriptor })
            }
            _ => None,
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                None
            }
            KeyCode::Enter => {
                let mut prompt = self.prompt.take()?;
                let kind = prompt.kind();
                let text = prompt.take_input().trim().to_string();
                let snapshot = self.snapshots.get(self.selected)?;
                let repository = self.selected;

                match kind {
                    PromptKind::CommitMessage if snapshot.status.can_commit(&text) => {
                        Some(Action::Submit {
                            repository,
                            batch: Mutation::Commit { message: text }.into(),
                        })
                    }
                    PromptKind::NewBranch if snapshot.branches.accepts_new_branch(&text) => {
                        let mut batch = Batch::from(Mutation::NewBranch { name: text });
                        batch.refresh_also(Invalidation::BRANCH);
                        Some(Action::Submit { repository, batch })
                    }
                    PromptKind::CommitMessage => {
                        self.set_info("Commit needs a message");
                        None
                    }
                    PromptKind::NewBranch => {
                        self.set_info(format!("Branch name '{}' is empty or already exists", text));
                        None
                    }
                }
            }
            _ => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.handle_key(key);
                }
                None
            }
        }
    }

    /// Run an action against its controller and report the result
    pub async fn perform(&mut self, action: Action) {
        match action {
            Action::Submit {
                repository,
                mut batch,
            } => {
                let Some(controller) = self.controller(repository).cloned() else {
                    return;
                };
                match controller.submit(&mut batch).await {
                    Ok(BatchOutcome::Applied(report)) => match report
                        .first_error()
                        .or(report.refresh_error.as_ref())
                    {
                        Some(e) => self.set_error(e.to_string()),
                        None => {
                            let done: Vec<String> =
                                report.commands.iter().map(|c| c.command.clone()).collect();
                            self.set_info(format!("Done: git {}", done.join(", git ")));
                        }
                    },
                    Ok(BatchOutcome::Rejected) => {
                        self.set_info("Another command is still running");
                    }
                    Err(e) => self.set_error(e.to_string()),
                }
            }
            Action::ShowCommitUrl {
                repository,
                descriptor,
            } => {
                let Some(controller) = self.controller(repository).cloned() else {
                    return;
                };
                match controller.commit_url(&descriptor).await {
                    Ok(Some(url)) => self.set_info(url),
                    Ok(None) => self.set_info("Remote has no web page"),
                    Err(e) => self.set_error(e.to_string()),
                }
            }
        }
        self.sync_snapshots();
    }

    /// Check if the app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}
