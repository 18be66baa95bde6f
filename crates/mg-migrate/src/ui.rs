//! Terminal styling for progress output.

use colored::{ColoredString, Colorize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Green,
    Red,
}

pub trait StyledText {
    fn with_style(&self, style: Style) -> ColoredString;
}

impl<T: AsRef<str> + ?Sized> StyledText for T {
    fn with_style(&self, style: Style) -> ColoredString {
        let text = self.as_ref();
        match style {
            Style::Green => text.green(),
            Style::Red => text.red(),
        }
    }
}

pub mod icons {
    use colored::{ColoredString, Colorize};

    pub fn success() -> ColoredString {
        "✓".green()
    }

    pub fn warning() -> ColoredString {
        "⚠".yellow()
    }

    pub fn error() -> ColoredString {
        "✗".red()
    }
}

/// Horizontal rule used around the banner and footer.
pub fn rule() -> String {
    "=".repeat(60)
}
