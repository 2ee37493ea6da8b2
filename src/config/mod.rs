pub mod settings;
pub mod ui_state;

pub use settings::{AuditConfig, Config, ConfigError, GitConfig, UIConfig};
pub use ui_state::UiStateStore;
