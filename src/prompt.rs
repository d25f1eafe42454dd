//! Prompt templates for every model call in the workflow.
//!
//! Uses Tera templates registered once at construction. Rendering is strict:
//! a placeholder with no corresponding variable fails with
//! `PredicaError::MissingVariable` instead of leaking literal placeholder
//! text into the request.

use tera::{Context, Tera};

use crate::error::{PredicaError, Result};
use crate::session::InspirationCategory;

const KEY_MESSAGES_NO_INPUT: &str = "Identifier l'évangile du jour, les lectures de l'ancien \
testament et du nouveau testament, du psaume. Proposer 5 messages clés qui pourraient être le \
message central de l'homélie du jour.";

const KEY_MESSAGES_THEME: &str = "Proposer 5 messages clés qui pourraient être le message \
central d'une homélie sur le thème {{ theme }}.";

const KEY_MESSAGE_ANCHOR: &str = "Tu devrais prendre en compte le message clé suivant pour la \
prédication : {{ key_message }}.";

const PREDICATION: &str = "Rédige une homélie de 8 minutes pour {{ profile }} en \
{{ language }} qui communique sur {{ theme }} et qui inclut comme inspiration: \
{{ inspirations }}";

/// Template body for one inspiration category. Every category ends with the
/// key-message anchor so generated inspirations stay on topic.
fn inspiration_body(category: InspirationCategory) -> String {
    let body = match category {
        InspirationCategory::Joke => {
            "Tu es un pasteur évangélique médiatique, propose 3 mots d'esprit ou blagues sur \
             le thème {{ theme }} en {{ language }}."
        }
        InspirationCategory::SemanticExplanation => {
            "Une explication sémantique pour un mot complexe utilisé dans les textes du jour \
             en {{ language }}."
        }
        InspirationCategory::DogmaReference => {
            "Une ouverture sur une référence des textes officiels de la doctrine, catéchisme, \
             pères de l'église en {{ language }}."
        }
        InspirationCategory::CurrentEvent => {
            "Un évènement actuel pertinent pour les chrétiens auquel on pourrait faire \
             référence en lien avec {{ topic }} en {{ language }}."
        }
        InspirationCategory::Metaphor => {
            "Une métaphore créative pour expliquer {{ topic }} en {{ language }}."
        }
        InspirationCategory::EverydayLifeSituation => {
            "Une situation de la vie quotidienne où ce message clé sera particulièrement \
             pertinent en {{ language }}."
        }
    };
    format!("{} {}", body, KEY_MESSAGE_ANCHOR)
}

fn template_name(category: InspirationCategory) -> &'static str {
    match category {
        InspirationCategory::Joke => "inspiration_joke",
        InspirationCategory::SemanticExplanation => "inspiration_semantic_explanation",
        InspirationCategory::DogmaReference => "inspiration_dogma_reference",
        InspirationCategory::CurrentEvent => "inspiration_current_event",
        InspirationCategory::Metaphor => "inspiration_metaphor",
        InspirationCategory::EverydayLifeSituation => "inspiration_everyday_life_situation",
    }
}

/// Renders named prompt templates with substitution variables. No side
/// effects; the workflow controller decides what to do with the text.
#[derive(Clone)]
pub struct PromptBuilder {
    tera: Tera,
}

impl PromptBuilder {
    pub fn new() -> Self {
        let mut tera = Tera::default();
        tera.add_raw_template("key_messages_no_input", KEY_MESSAGES_NO_INPUT)
            .expect("Failed to register key message template");
        tera.add_raw_template("key_messages_theme", KEY_MESSAGES_THEME)
            .expect("Failed to register key message theme template");
        tera.add_raw_template("predication", PREDICATION)
            .expect("Failed to register predication template");
        for category in InspirationCategory::all() {
            tera.add_raw_template(template_name(category), &inspiration_body(category))
                .expect("Failed to register inspiration template");
        }
        Self { tera }
    }

    /// Key-message prompt for the "no input" method
    pub fn key_messages_no_input(&self) -> Result<String> {
        self.render("key_messages_no_input", &Context::new())
    }

    /// Key-message prompt for an explicit theme
    pub fn key_messages_for_theme(&self, theme: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("theme", theme);
        self.render("key_messages_theme", &context)
    }

    /// Inspiration prompt for one category, anchored to the selected key message
    pub fn inspiration(
        &self,
        category: InspirationCategory,
        theme: &str,
        topic: &str,
        language: &str,
        key_message: &str,
    ) -> Result<String> {
        let mut context = Context::new();
        context.insert("theme", theme);
        context.insert("topic", topic);
        context.insert("language", language);
        context.insert("key_message", key_message);
        self.render(template_name(category), &context)
    }

    /// Composition prompt. `inspirations` is the included mapping serialized
    /// as structured text so the model sees the actual generated content.
    pub fn predication(
        &self,
        profile: &str,
        language: &str,
        theme: &str,
        inspirations: &str,
    ) -> Result<String> {
        let mut context = Context::new();
        context.insert("profile", profile);
        context.insert("language", language);
        context.insert("theme", theme);
        context.insert("inspirations", inspirations);
        self.render("predication", &context)
    }

    fn render(&self, name: &str, context: &Context) -> Result<String> {
        self.tera
            .render(name, context)
            .map_err(|e| map_template_error(name, e))
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Tera reports an undefined variable deep in its error chain; dig it out so
/// an under-filled template surfaces as `MissingVariable`.
fn map_template_error(template: &str, err: tera::Error) -> PredicaError {
    let mut detail = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(inner) = source {
        detail = inner.to_string();
        source = inner.source();
    }
    if detail.contains("not found in context") {
        PredicaError::MissingVariable {
            template: template.to_string(),
            detail,
        }
    } else {
        PredicaError::template(detail)
    }
}
