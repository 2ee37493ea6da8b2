pub mod app;
pub mod input;
pub mod repo_panel;

pub use app::{Action, App};
pub use input::{InputWidget, PromptKind};
pub use repo_panel::{PanelItem, PanelSection, RepositoryPanel};
