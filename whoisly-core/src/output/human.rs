use colored::Colorize;

use super::OutputFormatter;
use crate::lookup::LookupOutcome;
use crate::whois::WhoisRecord;

/// "registrantOrganization" -> "Registrant Organization"; trailing acronyms stay together.
fn humanize(name: &str) -> String {
    let mut label = String::with_capacity(name.len() + 4);
    let mut prev_upper = true;
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            label.extend(c.to_uppercase());
        } else {
            if c.is_ascii_uppercase() && !prev_upper {
                label.push(' ');
            }
            label.push(c);
        }
        prev_upper = c.is_ascii_uppercase();
    }
    label
}

pub struct HumanFormatter {
    use_colors: bool,
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    fn label(&self, text: &str) -> String {
        if self.use_colors {
            text.bright_cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn value(&self, text: &str) -> String {
        if self.use_colors {
            text.bright_white().to_string()
        } else {
            text.to_string()
        }
    }

    fn muted(&self, text: &str) -> String {
        if self.use_colors {
            text.bright_black().to_string()
        } else {
            text.to_string()
        }
    }

    fn error(&self, text: &str) -> String {
        if self.use_colors {
            text.bright_red().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn header(&self, text: &str) -> String {
        if self.use_colors {
            format!(
                "\n{}\n{}",
                text.bright_blue().bold(),
                "─".repeat(text.chars().count()).bright_black()
            )
        } else {
            format!("\n{}\n{}", text, "-".repeat(text.chars().count()))
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_record(&self, record: &WhoisRecord) -> String {
        let title = record.domain.as_deref().unwrap_or("WHOIS record");
        let mut output = vec![self.header(&format!("WHOIS: {}", title))];

        // Absent fields are left out; JSON output keeps them as "Unknown"
        for (name, field) in record.scalar_fields().iter().skip(1) {
            if let Some(value) = field {
                output.push(format!("  {}: {}", self.label(&humanize(name)), self.value(value)));
            }
        }

        if !record.status.is_empty() {
            output.push(format!("  {}:", self.label("Status")));
            for entry in &record.status {
                if entry.url.is_empty() {
                    output.push(format!("    - {}", self.value(&entry.status)));
                } else {
                    output.push(format!(
                        "    - {} {}",
                        self.value(&entry.status),
                        self.muted(&format!("({})", entry.url))
                    ));
                }
            }
        }

        if !record.name_servers.is_empty() {
            output.push(format!("  {}:", self.label("Name Servers")));
            for ns in &record.name_servers {
                output.push(format!("    - {}", self.value(ns)));
            }
        }

        if output.len() == 1 {
            output.push(format!("  {}", self.muted("No recognizable fields")));
        }

        output.join("\n")
    }

    fn format_outcome(&self, outcome: &LookupOutcome) -> String {
        let mut output = Vec::new();

        match (&outcome.result, &outcome.error) {
            (Some(record), _) if outcome.status => output.push(self.format_record(record)),
            (_, Some(error)) => output.push(format!("{} {}", self.error("✗"), error)),
            _ => output.push(self.error("✗ lookup failed")),
        }

        let timing = match outcome.cached {
            Some(true) => "served from cache".to_string(),
            _ => format!("{:.2}s", outcome.time),
        };
        output.push(format!("\n  {}", self.muted(&timing)));

        output.join("\n")
    }
}
