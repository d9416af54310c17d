use std::fmt;

use crate::error::ColorError;

pub const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Foreground, background and bold, emitted in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<Rgb>,
    pub bg: Option<Rgb>,
    pub bold: bool,
}

impl Style {
    pub const fn fg(r: u8, g: u8, b: u8) -> Self {
        Style {
            fg: Some(Rgb(r, g, b)),
            bg: None,
            bold: false,
        }
    }

    pub const fn on(self, r: u8, g: u8, b: u8) -> Self {
        Style {
            bg: Some(Rgb(r, g, b)),
            ..self
        }
    }

    pub const fn bold(self) -> Self {
        Style { bold: true, ..self }
    }

    /// Wraps `text` as a self-contained span: prefixes, text, reset.
    pub fn paint(&self, text: &str) -> String {
        format!("{self}{text}{RESET}")
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(Rgb(r, g, b)) = self.fg {
            write!(f, "\x1b[38;2;{r};{g};{b}m")?;
        }
        if let Some(Rgb(r, g, b)) = self.bg {
            write!(f, "\x1b[48;2;{r};{g};{b}m")?;
        }
        if self.bold {
            f.write_str("\x1b[1m")?;
        }
        Ok(())
    }
}

/// Read-only colour tables shared by every table build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub subject: Style,
    /// Indexed by weight - 1. `None` means plain text.
    pub weights: [Option<Style>; 3],
    /// Indexed by average bucket - 1.
    pub buckets: [Style; 6],
}

pub const DEFAULT_PALETTE: Palette = Palette {
    subject: Style::fg(19, 255, 255),
    weights: [None, Some(Style::fg(0, 255, 0)), Some(Style::fg(255, 0, 0))],
    buckets: [
        Style::fg(0, 255, 255).on(255, 0, 0).bold(),
        Style::fg(237, 120, 53),
        Style::fg(248, 212, 72),
        Style::fg(210, 249, 80),
        Style::fg(148, 250, 78),
        Style::fg(237, 120, 53).on(148, 250, 78).bold(),
    ],
};

pub const MIN_BUCKET: u8 = 1;
pub const MAX_BUCKET: u8 = 6;

impl Palette {
    pub fn weight_style(&self, weight: u32) -> Result<Option<Style>, ColorError> {
        usize::try_from(weight)
            .ok()
            .and_then(|w| w.checked_sub(1))
            .and_then(|i| self.weights.get(i))
            .copied()
            .ok_or(ColorError::UnknownWeight(weight))
    }

    pub fn bucket_style(&self, average: f64) -> Style {
        self.buckets[usize::from(clamped_bucket(average) - MIN_BUCKET)]
    }
}

/// `floor(average)` when it names a bucket.
pub fn average_bucket(average: f64) -> Result<u8, ColorError> {
    let floor = average.floor();
    if floor >= f64::from(MIN_BUCKET) && floor <= f64::from(MAX_BUCKET) {
        Ok(floor as u8)
    } else {
        Err(ColorError::UnknownAverageBucket(average))
    }
}

/// `floor(average)` clamped to the nearest defined bucket.
pub fn clamped_bucket(average: f64) -> u8 {
    average_bucket(average).unwrap_or_else(|_| {
        if average < f64::from(MIN_BUCKET) {
            MIN_BUCKET
        } else {
            MAX_BUCKET
        }
    })
}
