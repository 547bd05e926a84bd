use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    pub value: Style,
}

impl Theme {
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self::select(console::Term::stdout().is_term(), no_color)
    }

    /// Colors only on an interactive terminal, and never when `NO_COLOR` is set.
    /// Piped output (tables redirected to a file, JSON) stays free of escapes.
    pub fn select(interactive: bool, no_color: bool) -> Self {
        if interactive && !no_color {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn is_plain(&self) -> bool {
        [
            &self.header,
            &self.success,
            &self.error,
            &self.warn,
            &self.info,
            &self.dim,
            &self.value,
        ]
        .iter()
        .all(|style| style.is_plain())
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().blue().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().cyan(),
            dim: Style::new().dimmed(),
            value: Style::new().bold(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            value: Style::new(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_colors_only_interactive_terminals() {
        assert!(!Theme::select(true, false).is_plain());
        assert!(Theme::select(false, false).is_plain());
        assert!(Theme::select(true, true).is_plain());
        assert!(Theme::select(false, true).is_plain());
    }
}
