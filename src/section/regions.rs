use std::fmt;

use serde::Serialize;

/// Kind of inert region in which heading-like lines carry no structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Fence,
    Math,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fence => f.write_str("code fence"),
            Self::Math => f.write_str("math block"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenRegion {
    kind: RegionKind,
    marker: char,
    width: usize,
    line: usize,
}

/// Line-by-line tracker for fenced code and `$$` math regions.
///
/// An unbalanced opener keeps the tracker inside the region until the end of
/// the input; callers read that back through [`RegionTracker::unclosed`].
#[derive(Debug, Default)]
pub struct RegionTracker {
    open: Option<OpenRegion>,
}

impl RegionTracker {
    /// Feeds one line (1-based `line_number`). Returns `true` when the line
    /// opens, closes or sits inside an inert region.
    pub fn observe(&mut self, line: &str, line_number: usize) -> bool {
        let trimmed = line.trim();

        if let Some(open) = self.open {
            let closes = match open.kind {
                RegionKind::Fence => closes_fence(trimmed, open.marker, open.width),
                RegionKind::Math => trimmed.starts_with("$$"),
            };
            if closes {
                self.open = None;
            }
            return true;
        }

        if let Some((marker, width)) = fence_opening(trimmed) {
            self.open = Some(OpenRegion {
                kind: RegionKind::Fence,
                marker,
                width,
                line: line_number,
            });
            return true;
        }

        if let Some(rest) = trimmed.strip_prefix("$$") {
            if !rest.contains("$$") {
                self.open = Some(OpenRegion {
                    kind: RegionKind::Math,
                    marker: '$',
                    width: 2,
                    line: line_number,
                });
            }
            return true;
        }

        false
    }

    /// The region still open after the last observed line, with its opening line.
    pub fn unclosed(&self) -> Option<(RegionKind, usize)> {
        self.open.map(|open| (open.kind, open.line))
    }
}

/// Scans a whole text and reports the first region left open at the end.
pub fn scan_regions(text: &str) -> Option<(RegionKind, usize)> {
    let mut tracker = RegionTracker::default();
    for (index, line) in text.lines().enumerate() {
        tracker.observe(line, index + 1);
    }
    tracker.unclosed()
}

fn fence_opening(trimmed: &str) -> Option<(char, usize)> {
    let marker = trimmed.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }

    let width = trimmed.chars().take_while(|ch| *ch == marker).count();
    if width < 3 {
        return None;
    }

    Some((marker, width))
}

fn closes_fence(trimmed: &str, marker: char, width: usize) -> bool {
    let run = trimmed.chars().take_while(|ch| *ch == marker).count();
    run >= width && trimmed.chars().all(|ch| ch == marker)
}
