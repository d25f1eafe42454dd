//! Workflow controller: sequences the four drafting steps and is the sole
//! writer of session state.
//!
//! Every transition is an explicit named action that re-checks its own
//! precondition, whatever the rendering layer allowed. Failed actions leave
//! the session untouched; nothing is retried automatically.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::api::{CompletionClient, Reply, ResponseSchema};
use crate::error::{PredicaError, Result};
use crate::mailer::{validate_email, Mailer};
use crate::prompt::PromptBuilder;
use crate::session::{InspirationCategory, Language, Method, Profile, Session, WorkflowState};

/// Fixed subject line for delivered predications
pub const EMAIL_SUBJECT: &str = "Your predication for the day";

pub struct Workflow {
    session: Session,
    prompts: PromptBuilder,
    client: Arc<dyn CompletionClient>,
    mailer: Arc<dyn Mailer>,
    /// Generated inspiration texts for the current selection, including
    /// excluded ones, so toggling a category back in needs no new model call
    generated: BTreeMap<InspirationCategory, String>,
}

impl Workflow {
    pub fn new(client: Arc<dyn CompletionClient>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            session: Session::new(),
            prompts: PromptBuilder::new(),
            client,
            mailer,
            generated: BTreeMap::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> WorkflowState {
        self.session.state()
    }

    /// Whether a category has a generated text, included or not
    pub fn is_generated(&self, category: InspirationCategory) -> bool {
        self.generated.contains_key(&category)
    }

    pub fn set_language(&mut self, language: Language) {
        self.session.language = language;
    }

    /// Step 1 method: infer today's readings, no user input
    pub fn choose_no_input(&mut self) {
        self.session.method = Method::NoInput;
        self.session.theme = None;
        self.session.custom_prompt = None;
    }

    /// Step 1 method: explicit theme
    pub fn choose_theme(&mut self, theme: impl Into<String>) {
        self.session.method = Method::SelectTheme;
        self.session.theme = Some(theme.into());
        self.session.custom_prompt = None;
    }

    /// Step 1 method: the user's own prompt, used verbatim
    pub fn choose_custom_prompt(&mut self, prompt: impl Into<String>) {
        self.session.method = Method::CustomInput;
        self.session.custom_prompt = Some(prompt.into());
        self.session.theme = None;
    }

    fn topic_prompt(&self) -> Result<String> {
        match self.session.method {
            Method::NoInput => self.prompts.key_messages_no_input(),
            Method::SelectTheme => {
                let theme = self
                    .session
                    .theme
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .ok_or(PredicaError::PreconditionViolation(
                        "choose a theme before requesting key messages",
                    ))?;
                self.prompts.key_messages_for_theme(theme)
            }
            Method::CustomInput => {
                let prompt = self
                    .session
                    .custom_prompt
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .ok_or(PredicaError::PreconditionViolation(
                        "enter a topic prompt before requesting key messages",
                    ))?;
                Ok(prompt.to_string())
            }
        }
    }

    /// Ask the model for candidate key messages. On success the candidates
    /// replace the previous set and everything downstream is cleared, so no
    /// stale selection or inspiration can refer to a candidate that no
    /// longer exists. On failure the session is left exactly as it was.
    pub async fn request_key_messages(&mut self) -> Result<&[String]> {
        let prompt = self.topic_prompt()?;
        let reply = self
            .client
            .complete(&prompt, self.session.language, Some(ResponseSchema::KeyMessages))
            .await?;

        let messages = match reply {
            Reply::KeyMessages(messages) if !messages.is_empty() => messages,
            Reply::KeyMessages(_) => {
                return Err(PredicaError::schema("the key message list came back empty"))
            }
            Reply::Text(_) => {
                return Err(PredicaError::schema("expected a key message list, got plain text"))
            }
        };

        info!(count = messages.len(), "key messages generated");
        self.session.key_messages = messages;
        self.session.clear_downstream();
        self.generated.clear();
        Ok(&self.session.key_messages)
    }

    /// Pick one candidate by position. Clears inspirations and any composed
    /// predication from an earlier selection.
    pub fn select_key_message(&mut self, index: usize) -> Result<&str> {
        if self.session.key_messages.is_empty() {
            return Err(PredicaError::PreconditionViolation(
                "generate key messages first",
            ));
        }
        let Some(message) = self.session.key_messages.get(index).cloned() else {
            return Err(PredicaError::PreconditionViolation(
                "that key message is not among the current candidates",
            ));
        };

        self.session.clear_downstream();
        self.generated.clear();
        self.session.selected_key_message = Some(message);
        Ok(self.session.selected_key_message.as_deref().unwrap_or_default())
    }

    /// Generate one inspiration category, anchored to the selected key
    /// message. The category becomes included right away.
    pub async fn generate_inspiration(
        &mut self,
        category: InspirationCategory,
    ) -> Result<&str> {
        let key_message = self
            .session
            .selected_key_message
            .clone()
            .ok_or(PredicaError::PreconditionViolation(
                "select a key message before generating inspirations",
            ))?;

        let theme = self.session.theme.clone().unwrap_or_default();
        let prompt = self.prompts.inspiration(
            category,
            &theme,
            &key_message,
            self.session.language.label(),
            &key_message,
        )?;

        let reply = self
            .client
            .complete(&prompt, self.session.language, None)
            .await?;
        let Reply::Text(text) = reply else {
            return Err(PredicaError::schema("expected plain text for an inspiration"));
        };

        info!(category = %category, "inspiration generated");
        self.generated.insert(category, text.clone());
        self.session.inspirations.insert(category, text);
        Ok(self
            .session
            .inspirations
            .get(&category)
            .map(String::as_str)
            .unwrap_or_default())
    }

    /// Flip the include control for a generated category. Returns whether
    /// the category is included after the toggle.
    pub fn toggle_inspiration(&mut self, category: InspirationCategory) -> Result<bool> {
        if self.session.inspirations.remove(&category).is_some() {
            return Ok(false);
        }
        let Some(text) = self.generated.get(&category).cloned() else {
            return Err(PredicaError::PreconditionViolation(
                "generate this inspiration before toggling it",
            ));
        };
        self.session.inspirations.insert(category, text);
        Ok(true)
    }

    /// Compose the full predication from the profile, language, theme and
    /// every currently included inspiration. Inspirations may be empty.
    pub async fn compose_predication(&mut self, profile: Profile) -> Result<&str> {
        if self.session.selected_key_message.is_none() {
            return Err(PredicaError::PreconditionViolation(
                "select a key message before composing the predication",
            ));
        }

        let inspirations = serialize_inspirations(&self.session.inspirations);
        let theme = self.session.theme.clone().unwrap_or_default();
        let prompt = self.prompts.predication(
            profile.label(),
            self.session.language.label(),
            &theme,
            &inspirations,
        )?;

        let reply = self
            .client
            .complete(&prompt, self.session.language, None)
            .await?;
        let Reply::Text(text) = reply else {
            return Err(PredicaError::schema("expected plain text for the predication"));
        };

        info!("predication composed");
        self.session.profile = Some(profile);
        self.session.predication = Some(text);
        Ok(self.session.predication.as_deref().unwrap_or_default())
    }

    /// Email the composed predication. Rejects before the collaborator runs
    /// when there is nothing to send or the address is malformed.
    pub async fn send_predication(&mut self, to: &str) -> Result<()> {
        let Some(body) = self.session.predication.clone() else {
            return Err(PredicaError::PreconditionViolation(
                "compose the predication before sending it",
            ));
        };
        if !validate_email(to) {
            return Err(PredicaError::PreconditionViolation(
                "a valid recipient email address is required",
            ));
        }

        self.mailer.send(to.trim(), EMAIL_SUBJECT, &body).await?;
        self.session.delivered = true;
        Ok(())
    }
}

/// Serialize the included inspirations as pretty JSON keyed by category
/// label, so the composition prompt carries the actual generated content.
fn serialize_inspirations(inspirations: &BTreeMap<InspirationCategory, String>) -> String {
    let map: serde_json::Map<String, Value> = inspirations
        .iter()
        .map(|(category, text)| (category.label().to_string(), Value::String(text.clone())))
        .collect();
    serde_json::to_string_pretty(&Value::Object(map)).unwrap_or_else(|_| "{}".to_string())
}
