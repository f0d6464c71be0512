use crate::analytics::{AnalyzeEntry, AnalyzedEmail};
use crate::intake::CorrelationId;

/// Lifecycle of one result panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState {
    /// Placeholder shown while the batch request is in flight.
    Loading,
    /// The backend reported a per-file error.
    Failed { error: String },
    Rendered(Box<AnalyzedEmail>),
}

/// What happened when a server row was applied to a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Rendered,
    Failed,
    /// The panel had already left the loading state; the row was ignored.
    AlreadyResolved,
}

/// Per-file UI state, created at intake and never removed.
#[derive(Debug, Clone)]
pub struct Panel {
    pub id: CorrelationId,
    pub filename: String,
    pub state: PanelState,
    pub expanded: bool,
}

impl Panel {
    pub fn placeholder(id: CorrelationId, filename: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
            state: PanelState::Loading,
            expanded: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, PanelState::Loading)
    }

    /// Only rendered panels can be expanded or previewed.
    pub fn is_openable(&self) -> bool {
        matches!(self.state, PanelState::Rendered(_))
    }

    pub fn email(&self) -> Option<&AnalyzedEmail> {
        match &self.state {
            PanelState::Rendered(email) => Some(email),
            _ => None,
        }
    }

    /// Replaces the placeholder with a server row. A panel is resolved at most once.
    pub fn resolve(&mut self, entry: AnalyzeEntry) -> Resolution {
        if !self.is_loading() {
            return Resolution::AlreadyResolved;
        }

        match entry {
            AnalyzeEntry::Failed { error, .. } => {
                self.state = PanelState::Failed { error };
                Resolution::Failed
            }
            AnalyzeEntry::Analyzed(email) => {
                self.state = PanelState::Rendered(Box::new(email));
                Resolution::Rendered
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Panel, PanelState, Resolution};
    use crate::analytics::AnalyzeEntry;
    use crate::intake::CorrelationId;

    fn failed(name: &str, error: &str) -> AnalyzeEntry {
        AnalyzeEntry::Failed {
            filename: name.to_string(),
            error: error.to_string(),
        }
    }

    #[test]
    fn test_placeholder_is_loading_and_closed() {
        let panel = Panel::placeholder(CorrelationId::generate(), "a.eml");
        assert!(panel.is_loading());
        assert!(!panel.is_openable());
        assert!(!panel.expanded);
    }

    #[test]
    fn test_resolve_only_once() {
        let mut panel = Panel::placeholder(CorrelationId::generate(), "a.eml");
        assert_eq!(panel.resolve(failed("a.eml", "first")), Resolution::Failed);
        assert_eq!(
            panel.resolve(failed("a.eml", "second")),
            Resolution::AlreadyResolved
        );
        assert_eq!(
            panel.state,
            PanelState::Failed {
                error: "first".to_string()
            }
        );
    }
}
