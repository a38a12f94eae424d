//! Rendering options and configuration.

use std::ops::RangeInclusive;

/// Options for rendering document content.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Pages to render
    pub page_selection: PageSelection,

    /// Render tables
    pub include_tables: bool,

    /// Render key/value fields and checkboxes
    pub include_forms: bool,

    /// Render query answers
    pub include_queries: bool,

    /// Escape special Markdown characters
    pub escape_special_chars: bool,

    /// How to render tables with spanning cells
    pub table_fallback: TableFallback,

    /// Include YAML frontmatter with metadata
    pub include_frontmatter: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Set specific page range.
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.page_selection = PageSelection::Range(range);
        self
    }

    /// Enable or disable tables.
    pub fn with_tables(mut self, include: bool) -> Self {
        self.include_tables = include;
        self
    }

    /// Enable or disable form fields.
    pub fn with_forms(mut self, include: bool) -> Self {
        self.include_forms = include;
        self
    }

    /// Enable or disable query answers.
    pub fn with_queries(mut self, include: bool) -> Self {
        self.include_queries = include;
        self
    }

    /// Enable or disable Markdown escaping.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Set the table fallback mode.
    pub fn with_table_fallback(mut self, fallback: TableFallback) -> Self {
        self.table_fallback = fallback;
        self
    }

    /// Enable or disable frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_selection: PageSelection::All,
            include_tables: true,
            include_forms: true,
            include_queries: true,
            escape_special_chars: true,
            table_fallback: TableFallback::Markdown,
            include_frontmatter: false,
        }
    }
}

/// How to render tables with spanning cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFallback {
    /// Markdown table; spanned positions render empty
    #[default]
    Markdown,
    /// HTML table with rowspan/colspan
    Html,
}

/// Page selection for rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PageSelection {
    /// Render all pages
    #[default]
    All,
    /// Render a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Render specific pages (1-indexed)
    Pages(Vec<u32>),
    /// Render pages in any of several ranges (inclusive, 1-indexed)
    Ranges(Vec<RangeInclusive<u32>>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
            PageSelection::Ranges(ranges) => ranges.iter().any(|range| range.contains(&page)),
        }
    }

    /// Parse a page selection string (e.g., "all", "2-4", "1,3,5-7").
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let mut ranges = Vec::new();
        for part in s.split(',') {
            let range = parse_range(part.trim())?;
            ranges.push(range);
        }

        if ranges.iter().all(|range| range.start() == range.end()) {
            let mut pages: Vec<u32> = ranges.iter().map(|range| *range.start()).collect();
            pages.sort_unstable();
            pages.dedup();
            return Ok(PageSelection::Pages(pages));
        }

        match ranges.len() {
            1 => Ok(PageSelection::Range(ranges.remove(0))),
            _ => Ok(PageSelection::Ranges(ranges)),
        }
    }
}

fn parse_range(part: &str) -> Result<RangeInclusive<u32>, String> {
    let number = |text: &str| {
        text.trim()
            .parse::<u32>()
            .map_err(|_| format!("Invalid page number: {:?}", text.trim()))
    };

    match part.split_once('-') {
        Some((start, end)) => {
            let (start, end) = (number(start)?, number(end)?);
            if start > end {
                return Err(format!("Invalid page range: {}", part));
            }
            Ok(start..=end)
        }
        None => {
            let page = number(part)?;
            Ok(page..=page)
        }
    }
}
