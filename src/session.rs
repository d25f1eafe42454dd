//! Session state for one homily drafting interaction.
//!
//! A `Session` is created empty when the program starts, mutated in place by
//! workflow actions, and discarded at exit. All selections live here as typed
//! fields; nothing is looked up through ambient globals.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reply language for every model call in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    French,
    English,
    Spanish,
}

impl Language {
    pub fn all() -> Vec<Self> {
        vec![Language::French, Language::English, Language::Spanish]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::French => "French",
            Language::English => "English",
            Language::Spanish => "Spanish",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::French
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How the key-message topic is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Method {
    /// Infer today's readings, no user input
    #[default]
    NoInput,
    /// Propose key messages for an explicit theme
    SelectTheme,
    /// The user's own prompt, used verbatim
    CustomInput,
}

impl Method {
    pub fn all() -> Vec<Self> {
        vec![Method::NoInput, Method::SelectTheme, Method::CustomInput]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Method::NoInput => "No Input",
            Method::SelectTheme => "Select a Theme",
            Method::CustomInput => "Custom Input",
        }
    }
}

/// Liturgical themes offered in the theme picker. "Others" is handled by the
/// wizard as free text.
pub const THEMES: &[&str] = &[
    "Mariage",
    "Enterrement",
    "Première Communion",
    "Confirmation",
    "Pâques",
    "Toussaint",
    "Noël",
];

/// The speaker/audience persona used to tailor the composition tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Profile {
    CatholicPriest,
    ProtestantPastor,
    EvangelicalPastor,
    Parent,
}

impl Profile {
    pub fn all() -> Vec<Self> {
        vec![
            Profile::CatholicPriest,
            Profile::ProtestantPastor,
            Profile::EvangelicalPastor,
            Profile::Parent,
        ]
    }

    /// Label as it appears inside the composition prompt
    pub fn label(&self) -> &'static str {
        match self {
            Profile::CatholicPriest => "Prêtre catholique",
            Profile::ProtestantPastor => "Pasteur protestant",
            Profile::EvangelicalPastor => "Pasteur évangélique",
            Profile::Parent => "Père ou mère de famille",
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The six fixed inspiration categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InspirationCategory {
    Joke,
    SemanticExplanation,
    DogmaReference,
    CurrentEvent,
    Metaphor,
    EverydayLifeSituation,
}

impl InspirationCategory {
    pub fn all() -> Vec<Self> {
        vec![
            InspirationCategory::Joke,
            InspirationCategory::SemanticExplanation,
            InspirationCategory::DogmaReference,
            InspirationCategory::CurrentEvent,
            InspirationCategory::Metaphor,
            InspirationCategory::EverydayLifeSituation,
        ]
    }

    /// Label used as the key in the serialized inspiration mapping
    pub fn label(&self) -> &'static str {
        match self {
            InspirationCategory::Joke => "Joke",
            InspirationCategory::SemanticExplanation => "Semantic Explanation",
            InspirationCategory::DogmaReference => "Dogma Reference",
            InspirationCategory::CurrentEvent => "Current Event",
            InspirationCategory::Metaphor => "Metaphor",
            InspirationCategory::EverydayLifeSituation => "Everyday Life Situation",
        }
    }
}

impl std::fmt::Display for InspirationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Workflow position derived from what the session already holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Start,
    KeyMessagesProposed,
    KeyMessageSelected,
    PredicationComposed,
    Delivered,
}

/// State for one drafting interaction, owned by the workflow controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub language: Language,
    pub method: Method,
    /// Present only when `method` is `SelectTheme`
    pub theme: Option<String>,
    /// Present only when `method` is `CustomInput`
    pub custom_prompt: Option<String>,
    /// Candidate key messages from the model, in reply order
    pub key_messages: Vec<String>,
    /// Always an element of the current `key_messages`
    pub selected_key_message: Option<String>,
    /// Currently included inspirations; a category is absent until generated
    pub inspirations: BTreeMap<InspirationCategory, String>,
    /// The composed homily text
    pub predication: Option<String>,
    pub profile: Option<Profile>,
    pub delivered: bool,
    pub started_at: DateTime<Local>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            language: Language::default(),
            method: Method::default(),
            theme: None,
            custom_prompt: None,
            key_messages: Vec::new(),
            selected_key_message: None,
            inspirations: BTreeMap::new(),
            predication: None,
            profile: None,
            delivered: false,
            started_at: Local::now(),
        }
    }

    /// Derive the workflow position from the populated fields
    pub fn state(&self) -> WorkflowState {
        if self.delivered {
            WorkflowState::Delivered
        } else if self.predication.is_some() {
            WorkflowState::PredicationComposed
        } else if self.selected_key_message.is_some() {
            WorkflowState::KeyMessageSelected
        } else if !self.key_messages.is_empty() {
            WorkflowState::KeyMessagesProposed
        } else {
            WorkflowState::Start
        }
    }

    /// Drop everything downstream of the key-message candidates. Called
    /// whenever the candidates are regenerated or the selection changes, so
    /// no stale selection or inspiration can survive.
    pub fn clear_downstream(&mut self) {
        self.selected_key_message = None;
        self.inspirations.clear();
        self.predication = None;
        self.delivered = false;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_session_starts_empty() {
        let session = Session::new();
        assert_eq!(session.language, Language::French);
        assert_eq!(session.method, Method::NoInput);
        assert_eq!(session.state(), WorkflowState::Start);
        assert!(session.key_messages.is_empty());
        assert!(session.inspirations.is_empty());
    }

    #[test]
    fn test_state_progression() {
        let mut session = Session::new();
        session.key_messages = vec!["a".to_string(), "b".to_string()];
        assert_eq!(session.state(), WorkflowState::KeyMessagesProposed);

        session.selected_key_message = Some("b".to_string());
        assert_eq!(session.state(), WorkflowState::KeyMessageSelected);

        session.predication = Some("homily text".to_string());
        assert_eq!(session.state(), WorkflowState::PredicationComposed);

        session.delivered = true;
        assert_eq!(session.state(), WorkflowState::Delivered);
    }

    #[test]
    fn test_clear_downstream_resets_everything_after_candidates() {
        let mut session = Session::new();
        session.key_messages = vec!["a".to_string()];
        session.selected_key_message = Some("a".to_string());
        session
            .inspirations
            .insert(InspirationCategory::Joke, "a joke".to_string());
        session.predication = Some("text".to_string());
        session.delivered = true;

        session.clear_downstream();

        assert_eq!(session.selected_key_message, None);
        assert!(session.inspirations.is_empty());
        assert_eq!(session.predication, None);
        assert!(!session.delivered);
        // candidates themselves survive
        assert_eq!(session.key_messages, vec!["a".to_string()]);
    }

    #[test]
    fn test_category_labels_match_mapping_keys() {
        assert_eq!(InspirationCategory::all().len(), 6);
        assert_eq!(
            InspirationCategory::SemanticExplanation.label(),
            "Semantic Explanation"
        );
        assert_eq!(
            InspirationCategory::EverydayLifeSituation.to_string(),
            "Everyday Life Situation"
        );
    }
}
