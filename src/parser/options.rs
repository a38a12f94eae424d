//! Parsing options and configuration.

/// Options for building documents from block lists.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Minimum confidence (0-100) for lines, words and form fields
    pub confidence_threshold: f64,

    /// Whether to derive merged cells for spanning table cells
    pub merged_cells: bool,

    /// Whether to sort lines and tables into reading order
    pub reading_order: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip malformed blocks and pairs).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set the confidence threshold.
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 100.0);
        self
    }

    /// Enable or disable merged-cell derivation.
    pub fn with_merged_cells(mut self, enabled: bool) -> Self {
        self.merged_cells = enabled;
        self
    }

    /// Enable or disable reading-order sorting.
    pub fn with_reading_order(mut self, enabled: bool) -> Self {
        self.reading_order = enabled;
        self
    }

    /// Keep lines and tables in relationship order.
    pub fn relationship_order(mut self) -> Self {
        self.reading_order = false;
        self
    }

    pub(crate) fn is_lenient(&self) -> bool {
        self.error_mode == ErrorMode::Lenient
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            confidence_threshold: 0.0,
            merged_cells: true,
            reading_order: true,
        }
    }
}

/// Error handling mode during document building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any structural mismatch
    #[default]
    Strict,
    /// Skip malformed content and continue
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .lenient()
            .with_confidence_threshold(150.0)
            .with_merged_cells(false)
            .relationship_order();

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.confidence_threshold, 100.0);
        assert!(!options.merged_cells);
        assert!(!options.reading_order);
        assert!(options.is_lenient());
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.confidence_threshold, 0.0);
        assert!(options.merged_cells);
        assert!(options.reading_order);
    }
}
