use console::{strip_ansi_codes, Term};
use owo_colors::OwoColorize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use techfeed::notify::{Navigator, Notifier};
use techfeed::protocol::common::{Keyword, Post};

/// Terminal output for the CLI
pub struct UI {
    term: Term,
}

impl UI {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Helper method to conditionally apply color based on terminal support
    fn colorize<F>(&self, text: &str, color_fn: F) -> String
    where
        F: FnOnce(&str) -> String,
    {
        if self.supports_color() {
            color_fn(text)
        } else {
            text.to_string()
        }
    }

    pub fn success(&self, message: &str) {
        let output = self.colorize(message, |m| m.green().bold().to_string());
        println!("{}", output);
    }

    pub fn error(&self, message: &str) {
        let output = self.colorize(message, |m| m.red().bold().to_string());
        eprintln!("{}", output);
    }

    pub fn warning(&self, message: &str) {
        let output = self.colorize(message, |m| m.yellow().bold().to_string());
        println!("{}", output);
    }

    pub fn info(&self, message: &str) {
        let output = self.colorize(message, |m| m.blue().bold().to_string());
        println!("{}", output);
    }

    /// Session state with a color per tier
    pub fn format_session_status(&self, has_session: bool, authenticated: bool, expired: bool) -> String {
        let text = match (has_session, authenticated, expired) {
            (false, _, _) => "No session",
            (true, _, true) => "Access token expired",
            (true, true, false) => "Signed in",
            (true, false, false) => "Guest",
        };

        if !self.supports_color() {
            return text.to_string();
        }
        match (has_session, expired) {
            (false, _) => text.red().to_string(),
            (true, true) => text.yellow().to_string(),
            (true, false) => text.green().to_string(),
        }
    }

    pub fn format_optional(&self, value: Option<String>) -> String {
        value.unwrap_or_else(|| "-".to_string())
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        let term_width = self.width();
        let title_len = title.width() + 4;
        let line_len = term_width.saturating_sub(title_len) / 2;
        let line = "═".repeat(line_len.min(38));

        println!();
        if self.supports_color() {
            println!("{} {} {}", line.cyan(), title.cyan().bold(), line.cyan());
        } else {
            println!("{} {} {}", line, title, line);
        }
        println!();
    }

    pub fn separator(&self) {
        let line = "─".repeat(self.width().min(80));
        if self.supports_color() {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line);
        }
    }

    /// Create a card-style display for information
    pub fn card(&self, title: &str, content: Vec<(&str, String)>) {
        let card_width = self.width().saturating_sub(4).clamp(50, 80);
        let supports_color = self.supports_color();

        println!("╭{}╮", "─".repeat(card_width - 2));
        let title_spaces = card_width.saturating_sub(title.width() + 4);
        if supports_color {
            println!("│ {} {}│", title.cyan().bold(), " ".repeat(title_spaces));
        } else {
            println!("│ {} {}│", title, " ".repeat(title_spaces));
        }
        println!("├{}┤", "─".repeat(card_width - 2));

        for (label, value) in content {
            // Strip ANSI codes for width calculations
            let label_width = strip_ansi_codes(label).width();
            let value_width = strip_ansi_codes(&value).width();
            let content_width = label_width + value_width + 4;
            let spaces = if content_width < card_width - 1 {
                card_width - content_width - 1
            } else {
                1
            };

            if supports_color {
                println!("│ {}: {}{}│", label.dimmed(), value, " ".repeat(spaces));
            } else {
                println!("│ {}: {}{}│", label, value, " ".repeat(spaces));
            }
        }

        println!("╰{}╯", "─".repeat(card_width - 2));
        println!();
    }

    /// One post per block: title, then a dimmed meta line
    pub fn post(&self, post: &Post) {
        let max = self.width().clamp(40, 100);
        let title = truncate(&post.title, max);
        if self.supports_color() {
            println!("{} {}", format!("#{}", post.id).dimmed(), title.bold());
        } else {
            println!("#{} {}", post.id, title);
        }

        let mut meta = Vec::new();
        if let Some(published) = &post.published_at {
            meta.push(published.clone());
        }
        if !post.authors.is_empty() {
            let names: Vec<&str> = post.authors.iter().map(|a| a.name.as_str()).collect();
            meta.push(names.join(", "));
        }
        if !post.keywords.is_empty() {
            let tags: Vec<&str> = post.keywords.iter().map(|k| k.display_name()).collect();
            meta.push(tags.join(" · "));
        }
        if !meta.is_empty() {
            let line = truncate(&meta.join("  |  "), max);
            println!("   {}", self.colorize(&line, |m| m.dimmed().to_string()));
        }
        if let Some(summary) = post.summary.as_deref().filter(|s| !s.is_empty()) {
            println!("   {}", truncate(summary, max));
        }
        if let Some(link) = &post.link {
            println!("   {}", self.colorize(link, |m| m.blue().underline().to_string()));
        }
        println!();
    }

    pub fn keyword(&self, keyword: &Keyword) {
        let marker = if keyword.selected == Some(true) { "●" } else { "○" };
        let name = keyword.display_name();
        let padding = 20usize.saturating_sub(name.width());
        let line = format!("{} {:>4}  {}{}{}", marker, keyword.keyword_id, name, " ".repeat(padding), keyword.en_name);
        if keyword.selected == Some(true) {
            println!("{}", self.colorize(&line, |m| m.green().to_string()));
        } else {
            println!("{}", line);
        }
    }

    /// Get terminal width for responsive layout
    pub fn width(&self) -> usize {
        self.term.size().1 as usize
    }

    pub fn supports_color(&self) -> bool {
        self.term.features().colors_supported()
    }
}

impl Default for UI {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for UI {
    fn error(&self, message: &str) {
        UI::error(self, message);
    }
}

impl Navigator for UI {
    fn navigate(&self, route: &str) {
        self.warning(&format!("Session ended ({}). Run `techfeed login` to start a new one.", route));
    }
}

/// Cut `text` to at most `max` display columns, marking the cut with an ellipsis
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}
