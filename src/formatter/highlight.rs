//! Level-based ANSI highlighting.

use std::collections::HashMap;

use thiserror::Error;

use super::{
    FemtoFormatter,
    ansi::{
        BLUE_BG, BLUE_FG, BOLD_ON, DEFAULT_BG, DEFAULT_FG, RED_BG, RESET, WHITE_FG, YELLOW_BG,
        YELLOW_FG, sgr,
    },
};
use crate::{level::FemtoLevel, log_event::FemtoLogEvent};

/// Errors raised while configuring highlight styles.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("unknown style template: {0}")]
    UnknownTemplate(u8),
    #[error("invalid SGR code {0:?}")]
    InvalidCode(String),
}

/// Escape sequences applied per level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightStyles {
    default_style: String,
    levels: HashMap<FemtoLevel, String>,
}

impl Default for HighlightStyles {
    fn default() -> Self {
        Self::template(0).unwrap_or_else(|_| Self::empty())
    }
}

impl HighlightStyles {
    fn empty() -> Self {
        Self {
            default_style: sgr(&[RESET]),
            levels: HashMap::new(),
        }
    }

    /// Build one of the predefined style templates (0, 1 or 2).
    pub fn template(id: u8) -> Result<Self, StyleError> {
        let table: [(FemtoLevel, &[&str]); 5] = match id {
            0 => [
                (FemtoLevel::Error, &[WHITE_FG, RED_BG, BOLD_ON]),
                (FemtoLevel::Warn, &[YELLOW_FG, BOLD_ON]),
                (FemtoLevel::Info, &[BLUE_FG]),
                (FemtoLevel::Debug, &[DEFAULT_FG]),
                (FemtoLevel::Trace, &[DEFAULT_FG]),
            ],
            1 => [
                (FemtoLevel::Error, &[WHITE_FG, RED_BG]),
                (FemtoLevel::Warn, &[WHITE_FG, YELLOW_BG]),
                (FemtoLevel::Info, &[WHITE_FG, BLUE_BG]),
                (FemtoLevel::Debug, &[DEFAULT_BG]),
                (FemtoLevel::Trace, &[DEFAULT_BG]),
            ],
            2 => [
                (FemtoLevel::Error, &[WHITE_FG, RED_BG, BOLD_ON]),
                (FemtoLevel::Warn, &[YELLOW_BG]),
                (FemtoLevel::Info, &[BLUE_FG]),
                (FemtoLevel::Debug, &[DEFAULT_FG]),
                (FemtoLevel::Trace, &[DEFAULT_FG]),
            ],
            other => return Err(StyleError::UnknownTemplate(other)),
        };
        let mut styles = Self::empty();
        for (level, codes) in table {
            styles.levels.insert(level, sgr(codes));
        }
        Ok(styles)
    }

    /// Override the style for `level` from `;`-separated SGR codes such as
    /// `"37;41;1"`.
    pub fn set_style(&mut self, level: FemtoLevel, codes: &str) -> Result<(), StyleError> {
        let parsed = codes
            .split(';')
            .map(|code| {
                let code = code.trim();
                code.parse::<u8>()
                    .map(|_| code)
                    .map_err(|_| StyleError::InvalidCode(code.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.levels.insert(level, sgr(&parsed));
        Ok(())
    }

    /// Builder-style variant of [`set_style`](Self::set_style).
    pub fn with_style(mut self, level: FemtoLevel, codes: &str) -> Result<Self, StyleError> {
        self.set_style(level, codes)?;
        Ok(self)
    }

    pub fn style(&self, level: FemtoLevel) -> &str {
        self.levels
            .get(&level)
            .map(String::as_str)
            .unwrap_or(&self.default_style)
    }

    pub fn default_style(&self) -> &str {
        &self.default_style
    }

    /// Wrap `text` in the style for `level`. Empty text yields only the style
    /// prefix so a following segment inherits it.
    pub fn apply(&self, level: FemtoLevel, text: &str) -> String {
        let style = self.style(level);
        let mut out = String::with_capacity(style.len() + text.len() + self.default_style.len());
        out.push_str(style);
        if !text.is_empty() {
            out.push_str(text);
            out.push_str(&self.default_style);
        }
        out
    }
}

/// Formatter that colours the output of an inner formatter by level.
#[derive(Clone, Debug)]
pub struct HighlightingFormatter<F> {
    inner: F,
    styles: HighlightStyles,
}

impl<F: FemtoFormatter> HighlightingFormatter<F> {
    pub fn new(inner: F) -> Self {
        Self::with_styles(inner, HighlightStyles::default())
    }

    pub fn with_styles(inner: F, styles: HighlightStyles) -> Self {
        Self { inner, styles }
    }

    pub fn styles(&self) -> &HighlightStyles {
        &self.styles
    }
}

impl<F: FemtoFormatter> FemtoFormatter for HighlightingFormatter<F> {
    fn format(&self, event: &FemtoLogEvent) -> String {
        self.styles.apply(event.level, &self.inner.format(event))
    }
}
