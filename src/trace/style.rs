//! StyleSpec: visual presentation of a trace, independent of its data.

use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Allowed line widths, in points.
pub const LINE_WIDTH_RANGE: RangeInclusive<f32> = 0.5..=5.0;

/// Named trace colours offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NamedColor {
    #[default]
    Blue,
    Red,
    Green,
    Black,
    Orange,
}

impl NamedColor {
    pub const ALL: [NamedColor; 5] = [
        NamedColor::Blue,
        NamedColor::Red,
        NamedColor::Green,
        NamedColor::Black,
        NamedColor::Orange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NamedColor::Blue => "blue",
            NamedColor::Red => "red",
            NamedColor::Green => "green",
            NamedColor::Black => "black",
            NamedColor::Orange => "orange",
        }
    }

    /// sRGB components.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            NamedColor::Blue => [31, 119, 180],
            NamedColor::Red => [214, 39, 40],
            NamedColor::Green => [44, 160, 44],
            NamedColor::Black => [0, 0, 0],
            NamedColor::Orange => [255, 127, 14],
        }
    }
}

impl fmt::Display for NamedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stroke pattern of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    DashDot,
    Dotted,
}

impl LineStyle {
    pub const ALL: [LineStyle; 4] = [
        LineStyle::Solid,
        LineStyle::Dashed,
        LineStyle::DashDot,
        LineStyle::Dotted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::DashDot => "dash-dot",
            LineStyle::Dotted => "dotted",
        }
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rendering parameters of one trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleSpec {
    pub color: NamedColor,
    pub line_style: LineStyle,
    /// Within [`LINE_WIDTH_RANGE`].
    pub line_width: f32,
    /// Cycle to show; 0 shows every cycle.
    pub cycle_filter: u64,
}

impl Default for StyleSpec {
    fn default() -> Self {
        Self {
            color: NamedColor::default(),
            line_style: LineStyle::Solid,
            line_width: 1.5,
            cycle_filter: 0,
        }
    }
}

impl StyleSpec {
    /// Copy of `self` with the patch's fields applied, or the first
    /// validation failure. `self` is never modified.
    pub fn merged(&self, patch: &StylePatch) -> Result<StyleSpec> {
        let mut next = *self;
        if let Some(color) = patch.color {
            next.color = color;
        }
        if let Some(line_style) = patch.line_style {
            next.line_style = line_style;
        }
        if let Some(width) = patch.line_width {
            if !LINE_WIDTH_RANGE.contains(&width) {
                return Err(Error::Validation {
                    field: "lineWidth",
                    reason: format!(
                        "{width} is outside [{}, {}]",
                        LINE_WIDTH_RANGE.start(),
                        LINE_WIDTH_RANGE.end()
                    ),
                });
            }
            next.line_width = width;
        }
        if let Some(cycle) = patch.cycle_filter {
            next.cycle_filter = u64::try_from(cycle).map_err(|_| Error::Validation {
                field: "cycleFilter",
                reason: format!("{cycle} is negative"),
            })?;
        }
        Ok(next)
    }
}

/// Partial style update; `None` fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StylePatch {
    pub color: Option<NamedColor>,
    pub line_style: Option<LineStyle>,
    pub line_width: Option<f32>,
    pub cycle_filter: Option<i64>,
}

impl StylePatch {
    pub fn color(mut self, color: NamedColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn line_style(mut self, line_style: LineStyle) -> Self {
        self.line_style = Some(line_style);
        self
    }

    pub fn line_width(mut self, width: f32) -> Self {
        self.line_width = Some(width);
        self
    }

    pub fn cycle_filter(mut self, cycle: i64) -> Self {
        self.cycle_filter = Some(cycle);
        self
    }
}

impl From<StyleSpec> for StylePatch {
    /// A patch that sets every field.
    fn from(spec: StyleSpec) -> Self {
        Self {
            color: Some(spec.color),
            line_style: Some(spec.line_style),
            line_width: Some(spec.line_width),
            cycle_filter: Some(i64::try_from(spec.cycle_filter).unwrap_or(i64::MAX)),
        }
    }
}
