//! Terminal stylesheet built on owo-colors.

use owo_colors::{OwoColorize as _, Style};

use crate::application::services::check_service::CheckStatus;

/// Every style the CLI prints with. `Default` is the plain, uncolored sheet.
#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    /// Keys of key/value listings.
    pub dim: Style,
    /// Section titles and step arrows.
    pub header: Style,
}

impl Styles {
    /// The colored sheet used on terminals.
    #[must_use]
    pub fn colored() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red(),
            dim: Style::new().dimmed(),
            header: Style::new().bold().cyan(),
        }
    }

    /// `✓`, `⚠` or `✗` for a check outcome.
    #[must_use]
    pub fn status_mark(&self, status: CheckStatus) -> String {
        match status {
            CheckStatus::Ok => "✓".style(self.success).to_string(),
            CheckStatus::Warn => "⚠".style(self.warning).to_string(),
            CheckStatus::Error => "✗".style(self.error).to_string(),
        }
    }
}
