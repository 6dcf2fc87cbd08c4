//! Interactive run selection
//!
//! Reads answers line by line from any `BufRead` and writes prompts to any
//! `Write`, so the whole dialogue can be driven from tests.

use crate::crawler::{RunRequest, Source};
use std::io::{self, BufRead, Write};

/// Page bound used when the answer is blank or not a number
pub const DEFAULT_PAGES: u32 = 10;

const RULE_WIDTH: usize = 70;

/// Parses a page-count answer
///
/// Only plain digits are accepted; anything else (blank, negative, words,
/// overflow) falls back to [`DEFAULT_PAGES`].
pub fn parse_page_count(input: &str) -> u32 {
    let input = input.trim();
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return DEFAULT_PAGES;
    }
    input.parse().unwrap_or(DEFAULT_PAGES)
}

/// What the user chose in one pass through the menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Harvest the given sources
    Run {
        sources: Vec<Source>,
        request: RunRequest,
    },

    /// The answer was rejected; the message was already shown
    Invalid,

    /// Leave the program
    Exit,
}

/// Prompt-driven front end
pub struct Menu<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Shows the main menu and collects one run plan
    pub fn next_action(&mut self) -> io::Result<MenuAction> {
        self.header()?;
        writeln!(self.output, "Available Scrapers:\n")?;
        writeln!(self.output, "  1. Dubizzle Scraper (rendered pages)")?;
        writeln!(self.output, "  2. MobileMasr Scraper (search index)")?;
        writeln!(self.output, "  3. Run Both Scrapers")?;
        writeln!(self.output, "  4. Exit\n")?;

        let choice = match self.ask("Select an option (1-4): ")? {
            Some(choice) => choice,
            None => return Ok(MenuAction::Exit),
        };

        match choice.as_str() {
            "1" => self.single_source(Source::Dubizzle),
            "2" => self.single_source(Source::MobileMasr),
            "3" => self.both_sources(),
            "4" => {
                writeln!(self.output, "\nExiting... Goodbye!")?;
                Ok(MenuAction::Exit)
            }
            _ => self.reject("Invalid choice. Please select 1-4."),
        }
    }

    /// Asks whether to go around again; only an explicit `n` (or end of input) stops
    pub fn ask_continue(&mut self) -> io::Result<bool> {
        writeln!(self.output)?;
        match self.ask("Run another scraper? (Y/n): ")? {
            Some(answer) if answer.to_lowercase() != "n" => {
                writeln!(self.output, "\n")?;
                Ok(true)
            }
            _ => {
                writeln!(self.output, "\nExiting... Goodbye!")?;
                Ok(false)
            }
        }
    }

    fn single_source(&mut self, source: Source) -> io::Result<MenuAction> {
        self.banner(&format!("{} SCRAPER", source.to_string().to_uppercase()))?;
        writeln!(self.output, "Options:")?;
        writeln!(self.output, "  1. Search for specific product")?;
        writeln!(self.output, "  2. Scrape all mobile phones\n")?;

        let choice = self.ask("Choice (1 or 2): ")?.unwrap_or_default();
        let request = match choice.as_str() {
            "1" => match self.search_request()? {
                Some(request) => request,
                None => return Ok(MenuAction::Invalid),
            },
            "2" => RunRequest::full_catalog(self.page_count()?),
            _ => return self.reject("Invalid choice"),
        };

        Ok(MenuAction::Run {
            sources: vec![source],
            request,
        })
    }

    fn both_sources(&mut self) -> io::Result<MenuAction> {
        self.banner("RUNNING BOTH SCRAPERS")?;
        writeln!(self.output, "Common Settings:")?;

        let search_mode = self
            .ask("Search mode? (y/N): ")?
            .map(|answer| answer.to_lowercase() == "y")
            .unwrap_or(false);

        let request = if search_mode {
            match self.search_request()? {
                Some(request) => request,
                None => return Ok(MenuAction::Invalid),
            }
        } else {
            RunRequest::full_catalog(self.page_count()?)
        };

        Ok(MenuAction::Run {
            sources: Source::ALL.to_vec(),
            request,
        })
    }

    fn search_request(&mut self) -> io::Result<Option<RunRequest>> {
        let query = self.ask("Product name: ")?.unwrap_or_default();
        if query.is_empty() {
            self.reject("Search query cannot be empty")?;
            return Ok(None);
        }
        Ok(Some(RunRequest::search(query, self.page_count()?)))
    }

    fn page_count(&mut self) -> io::Result<u32> {
        let answer = self.ask(&format!("Max pages (default {}): ", DEFAULT_PAGES))?;
        Ok(parse_page_count(&answer.unwrap_or_default()))
    }

    /// Prompts and reads one trimmed line; `None` at end of input
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn reject(&mut self, message: &str) -> io::Result<MenuAction> {
        writeln!(self.output, "\n[Error] {}", message)?;
        Ok(MenuAction::Invalid)
    }

    fn header(&mut self) -> io::Result<()> {
        writeln!(self.output, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(self.output, "{:^width$}", "MOBILE PHONE DATA SCRAPER", width = RULE_WIDTH)?;
        writeln!(
            self.output,
            "{:^width$}",
            "Unified Interactive CLI for Dubizzle & MobileMasr",
            width = RULE_WIDTH
        )?;
        writeln!(self.output, "{}\n", "=".repeat(RULE_WIDTH))
    }

    fn banner(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.output, "\n{}", "=".repeat(RULE_WIDTH))?;
        writeln!(self.output, "{:^width$}", title, width = RULE_WIDTH)?;
        writeln!(self.output, "{}\n", "=".repeat(RULE_WIDTH))
    }
}
