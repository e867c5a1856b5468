//! Output aspect-ratio selection.

use std::fmt;

/// Output ratios the image model supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AspectRatio {
    #[default]
    Square,
    Portrait3x4,
    Landscape4x3,
    Portrait9x16,
    Landscape16x9,
}

impl AspectRatio {
    /// Candidates in tie-break order.
    pub const SUPPORTED: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
        }
    }

    /// Width divided by height.
    pub fn value(self) -> f64 {
        match self {
            AspectRatio::Square => 1.0,
            AspectRatio::Portrait3x4 => 3.0 / 4.0,
            AspectRatio::Landscape4x3 => 4.0 / 3.0,
            AspectRatio::Portrait9x16 => 9.0 / 16.0,
            AspectRatio::Landscape16x9 => 16.0 / 9.0,
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the supported ratio closest to `width / height`.
///
/// Unknown or zero dimensions give `1:1`. Ties go to the earlier entry of
/// [`AspectRatio::SUPPORTED`].
pub fn select_aspect_ratio(dimensions: Option<(u32, u32)>) -> AspectRatio {
    let Some((width, height)) = dimensions else {
        return AspectRatio::default();
    };
    if width == 0 || height == 0 {
        return AspectRatio::default();
    }

    let ratio = width as f64 / height as f64;
    let mut best = AspectRatio::SUPPORTED[0];
    let mut best_diff = (ratio - best.value()).abs();
    for candidate in &AspectRatio::SUPPORTED[1..] {
        let diff = (ratio - candidate.value()).abs();
        // strict comparison keeps the first-listed ratio on ties
        if diff < best_diff {
            best = *candidate;
            best_diff = diff;
        }
    }
    best
}
