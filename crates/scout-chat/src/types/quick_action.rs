use serde::{Deserialize, Serialize};

/// Preset prompts sent as if the user had typed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    Summarize,
    ActionItems,
    Simplify,
}

impl QuickAction {
    pub const ALL: [QuickAction; 3] = [Self::Summarize, Self::ActionItems, Self::Simplify];

    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Summarize => "Summarize our conversation.",
            Self::ActionItems => "Extract action items.",
            Self::Simplify => "Explain simply.",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Summarize => "Summarize",
            Self::ActionItems => "Action Items",
            Self::Simplify => "Simplify",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let prompts: Vec<_> = QuickAction::ALL.iter().map(|a| a.prompt()).collect();
        assert_eq!(
            prompts,
            vec!["Summarize our conversation.", "Extract action items.", "Explain simply."]
        );
        assert_eq!(QuickAction::ActionItems.label(), "Action Items");
    }
}
