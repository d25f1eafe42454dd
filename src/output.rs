use console::style;
use std::io;

pub struct OutputHandler {
    debug: bool,
}

impl OutputHandler {
    pub fn new() -> Self {
        Self { debug: false }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn print_banner(&mut self) -> io::Result<()> {
        println!("{}", style("╔═══════════════════════════════════════╗").cyan().bold());
        println!("{}", style("║        Predica - Mon homélie          ║").cyan().bold());
        println!("{}", style("╚═══════════════════════════════════════╝").cyan().bold());
        println!(
            "{}",
            style("Cet assistant vous guide pour identifier un thème, trouver des références et rédiger une homélie personnalisée.")
                .dim()
        );
        Ok(())
    }

    pub fn print_step(&mut self, title: &str) -> io::Result<()> {
        println!();
        println!("{}", style(title).cyan().bold());
        Ok(())
    }

    pub fn print_option(&mut self, index: usize, label: &str) -> io::Result<()> {
        println!("  {} {}", style(format!("{index}.")).cyan(), label);
        Ok(())
    }

    pub fn print_model_text(&mut self, content: &str) -> io::Result<()> {
        println!("{} {}", style("Predica:").green().bold(), content);
        Ok(())
    }

    pub fn print_success(&mut self, content: &str) -> io::Result<()> {
        println!("{} {}", style("✓").green().bold(), content);
        Ok(())
    }

    pub fn print_error(&mut self, content: &str) -> io::Result<()> {
        println!("{} {}", style("Error:").red().bold(), content);
        Ok(())
    }

    pub fn print_system(&mut self, content: &str) -> io::Result<()> {
        println!("{}", style(content).yellow().dim());
        Ok(())
    }

    pub fn print_waiting(&mut self, content: &str) -> io::Result<()> {
        println!("{}", style(content).dim());
        Ok(())
    }

    pub fn print_debug(&mut self, content: &str) -> io::Result<()> {
        if self.debug {
            eprintln!("{} {}", style("DEBUG:").magenta().bold(), content);
        }
        Ok(())
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
