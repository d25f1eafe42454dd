//! Interactive wizard: the rendering/display layer of the four-step flow.
//!
//! The wizard only decides what to show for the current workflow state and
//! translates key presses into named workflow actions. All state checks and
//! mutations belong to the workflow controller, which re-verifies every
//! precondition itself.

use anyhow::Result;
use console::{style, Term};

use crate::output::OutputHandler;
use crate::session::{InspirationCategory, Language, Method, Profile, WorkflowState, THEMES};
use crate::workflow::Workflow;

pub struct Wizard {
    workflow: Workflow,
    output: OutputHandler,
    term: Term,
}

impl Wizard {
    pub fn new(workflow: Workflow, output: OutputHandler) -> Self {
        Self {
            workflow,
            output,
            term: Term::stdout(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.output.print_banner()?;
        self.choose_language()?;

        loop {
            let proceed = match self.workflow.state() {
                WorkflowState::Start => self.step_identify_key_message().await?,
                WorkflowState::KeyMessagesProposed => self.step_choose_key_message().await?,
                WorkflowState::KeyMessageSelected => self.step_inspirations().await?,
                WorkflowState::PredicationComposed => self.step_share().await?,
                WorkflowState::Delivered => {
                    self.output.print_success("Predication sent. À bientôt !")?;
                    return Ok(());
                }
            };
            if !proceed {
                return Ok(());
            }
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<String> {
        print!("{} ", style(prompt).cyan());
        use std::io::Write;
        std::io::stdout().flush()?;
        Ok(self.term.read_line()?.trim().to_string())
    }

    fn choose_language(&mut self) -> Result<()> {
        self.output.print_step("Language / Langue / Idioma")?;
        let languages = Language::all();
        for (i, language) in languages.iter().enumerate() {
            self.output.print_option(i + 1, language.label())?;
        }
        let input = self.read_line("Select language [1]:")?;
        let language = input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| languages.get(i).copied())
            .unwrap_or_default();
        self.workflow.set_language(language);
        self.output
            .print_system(&format!("Language set to {language}"))?;
        Ok(())
    }

    async fn step_identify_key_message(&mut self) -> Result<bool> {
        self.output.print_step("Step 1: Identify Key Message")?;
        let methods = Method::all();
        for (i, method) in methods.iter().enumerate() {
            self.output.print_option(i + 1, method.label())?;
        }
        let input = self.read_line("Choose a method (q to quit):")?;
        if input.eq_ignore_ascii_case("q") {
            return Ok(false);
        }

        let Some(method) = input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| methods.get(i).copied())
        else {
            self.output.print_error("Please enter a number from the list")?;
            return Ok(true);
        };

        match method {
            Method::NoInput => self.workflow.choose_no_input(),
            Method::SelectTheme => {
                for (i, theme) in THEMES.iter().enumerate() {
                    self.output.print_option(i + 1, theme)?;
                }
                self.output.print_option(THEMES.len() + 1, "Others")?;
                let input = self.read_line("Select theme:")?;
                let choice = input.parse::<usize>().ok().and_then(|n| n.checked_sub(1));
                match choice {
                    Some(i) if i < THEMES.len() => self.workflow.choose_theme(THEMES[i]),
                    Some(i) if i == THEMES.len() => {
                        let theme = self.read_line("Enter custom theme:")?;
                        self.workflow.choose_theme(theme);
                    }
                    _ => {
                        self.output.print_error("Please enter a number from the list")?;
                        return Ok(true);
                    }
                }
            }
            Method::CustomInput => {
                let prompt = self.read_line("Enter your custom topic prompt:")?;
                self.workflow.choose_custom_prompt(prompt);
            }
        }

        self.generate_key_messages().await?;
        Ok(true)
    }

    async fn generate_key_messages(&mut self) -> Result<()> {
        self.output.print_waiting("Generating key messages...")?;
        match self.workflow.request_key_messages().await {
            Ok(_) => self.output.print_success("Key messages generated")?,
            Err(e) => self.output.print_error(&e.to_string())?,
        }
        Ok(())
    }

    async fn step_choose_key_message(&mut self) -> Result<bool> {
        self.output.print_step("Choose a Key Message")?;
        let messages = self.workflow.session().key_messages.clone();
        for (i, message) in messages.iter().enumerate() {
            self.output.print_option(i + 1, message)?;
        }
        let input = self.read_line("Select a key message (r to regenerate, q to quit):")?;
        if input.eq_ignore_ascii_case("q") {
            return Ok(false);
        }
        if input.eq_ignore_ascii_case("r") {
            self.generate_key_messages().await?;
            return Ok(true);
        }

        match input.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
            Some(index) => match self.workflow.select_key_message(index) {
                Ok(selected) => {
                    let selected = selected.to_string();
                    self.output.print_success(&format!("Selected: {selected}"))?;
                }
                Err(e) => self.output.print_error(&e.to_string())?,
            },
            None => self.output.print_error("Please enter a number from the list")?,
        }
        Ok(true)
    }

    async fn step_inspirations(&mut self) -> Result<bool> {
        self.output.print_step("Step 2: Generate Inspirations")?;
        if let Some(selected) = &self.workflow.session().selected_key_message {
            self.output
                .print_system(&format!("Key message selected: {selected}"))?;
        }

        let categories = InspirationCategory::all();
        for (i, category) in categories.iter().enumerate() {
            let marker = if self.workflow.session().inspirations.contains_key(category) {
                style("[included]").green().to_string()
            } else if self.workflow.is_generated(*category) {
                style("[excluded]").yellow().to_string()
            } else {
                style("[not generated]").dim().to_string()
            };
            self.output
                .print_option(i + 1, &format!("{} {marker}", category.label()))?;
        }
        let input = self.read_line(
            "Generate <n>, toggle t <n>, compose c, regenerate key messages r, quit q:",
        )?;
        if input.eq_ignore_ascii_case("q") {
            return Ok(false);
        }
        if input.eq_ignore_ascii_case("r") {
            self.generate_key_messages().await?;
            return Ok(true);
        }
        if input.eq_ignore_ascii_case("c") {
            self.compose().await?;
            return Ok(true);
        }
        if let Some(rest) = input.strip_prefix("t ").or_else(|| input.strip_prefix("T ")) {
            match rest
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| categories.get(i).copied())
            {
                Some(category) => match self.workflow.toggle_inspiration(category) {
                    Ok(true) => self
                        .output
                        .print_success(&format!("{category} included"))?,
                    Ok(false) => self
                        .output
                        .print_system(&format!("{category} excluded"))?,
                    Err(e) => self.output.print_error(&e.to_string())?,
                },
                None => self.output.print_error("Unknown category number")?,
            }
            return Ok(true);
        }

        match input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| categories.get(i).copied())
        {
            Some(category) => {
                self.output
                    .print_waiting(&format!("Generating {category}..."))?;
                match self.workflow.generate_inspiration(category).await {
                    Ok(text) => {
                        let text = text.to_string();
                        self.output.print_model_text(&text)?;
                    }
                    Err(e) => self.output.print_error(&e.to_string())?,
                }
            }
            None => self.output.print_error("Unknown command")?,
        }
        Ok(true)
    }

    async fn compose(&mut self) -> Result<()> {
        self.output.print_step("Step 3: Compose the Predication")?;
        let profiles = Profile::all();
        for (i, profile) in profiles.iter().enumerate() {
            self.output.print_option(i + 1, profile.label())?;
        }
        let input = self.read_line("Who are we writing this for? [1]:")?;
        let profile = input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| profiles.get(i).copied())
            .unwrap_or(Profile::CatholicPriest);

        self.output.print_waiting("Composing the predication...")?;
        match self.workflow.compose_predication(profile).await {
            Ok(text) => {
                let text = text.to_string();
                self.output.print_model_text(&text)?;
            }
            Err(e) => self.output.print_error(&e.to_string())?,
        }
        Ok(())
    }

    async fn step_share(&mut self) -> Result<bool> {
        self.output.print_step("Step 4: Share")?;
        let input =
            self.read_line("Send by email s, recompose c, finish without sending n, quit q:")?;
        if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("n") {
            return Ok(false);
        }
        if input.eq_ignore_ascii_case("c") {
            self.compose().await?;
            return Ok(true);
        }
        if input.eq_ignore_ascii_case("s") {
            let to = self.read_line("Enter your email address:")?;
            self.output.print_waiting("Sending...")?;
            match self.workflow.send_predication(&to).await {
                Ok(()) => {}
                Err(e) => self.output.print_error(&e.to_string())?,
            }
            return Ok(true);
        }
        self.output.print_error("Unknown command")?;
        Ok(true)
    }
}
