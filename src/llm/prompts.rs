//! Prompt templates for roster, waiver and trade analysis.
//!
//! Templates live in plain text files with `{name}` placeholders. Each file is
//! checked once at load time against the placeholder set of its kind, so a
//! typo in a template stops the program before any network traffic.

use crate::error::{AdvisorError, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// The kinds of prompt sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// Persona and instructions shared by every request.
    System,
    /// Start/sit review for one position.
    Substitution,
    /// Waiver search for one position.
    FreeAgent,
    /// Trade proposal against one opposing team.
    Trade,
}

impl PromptKind {
    /// All kinds, in load order.
    #[cfg(test)]
    pub const ALL: [PromptKind; 4] = [
        PromptKind::System,
        PromptKind::Substitution,
        PromptKind::FreeAgent,
        PromptKind::Trade,
    ];

    /// Template file name inside the prompt directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            PromptKind::System => "system.txt",
            PromptKind::Substitution => "substitution.txt",
            PromptKind::FreeAgent => "free_agents.txt",
            PromptKind::Trade => "trade.txt",
        }
    }

    /// Placeholders a template of this kind must use, and may only use.
    pub fn placeholders(&self) -> &'static [&'static str] {
        match self {
            PromptKind::System => &[],
            PromptKind::Substitution => &["position", "starters", "eligible"],
            PromptKind::FreeAgent => &["position", "my_roster", "free_agents"],
            PromptKind::Trade => &["my_roster", "opponent_team_name", "opponent_roster"],
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PromptKind::System => "system",
            PromptKind::Substitution => "substitution",
            PromptKind::FreeAgent => "free-agent",
            PromptKind::Trade => "trade",
        };
        f.write_str(name)
    }
}

/// Values supplied to a template, keyed by placeholder name.
pub trait PromptValues {
    /// Kind of template these values fill.
    fn kind(&self) -> PromptKind;

    /// Value for a placeholder, if this record has one.
    fn value(&self, name: &str) -> Option<&str>;
}

/// Start/sit review values.
#[derive(Debug, Clone)]
pub struct SubstitutionPrompt {
    pub position: String,
    pub starters: String,
    pub eligible: String,
}

impl PromptValues for SubstitutionPrompt {
    fn kind(&self) -> PromptKind {
        PromptKind::Substitution
    }

    fn value(&self, name: &str) -> Option<&str> {
        match name {
            "position" => Some(self.position.as_str()),
            "starters" => Some(self.starters.as_str()),
            "eligible" => Some(self.eligible.as_str()),
            _ => None,
        }
    }
}

/// Waiver search values.
#[derive(Debug, Clone)]
pub struct FreeAgentPrompt {
    pub position: String,
    pub my_roster: String,
    pub free_agents: String,
}

impl PromptValues for FreeAgentPrompt {
    fn kind(&self) -> PromptKind {
        PromptKind::FreeAgent
    }

    fn value(&self, name: &str) -> Option<&str> {
        match name {
            "position" => Some(self.position.as_str()),
            "my_roster" => Some(self.my_roster.as_str()),
            "free_agents" => Some(self.free_agents.as_str()),
            _ => None,
        }
    }
}

/// Trade evaluation values.
#[derive(Debug, Clone)]
pub struct TradePrompt {
    pub my_roster: String,
    pub opponent_team_name: String,
    pub opponent_roster: String,
}

impl PromptValues for TradePrompt {
    fn kind(&self) -> PromptKind {
        PromptKind::Trade
    }

    fn value(&self, name: &str) -> Option<&str> {
        match name {
            "my_roster" => Some(self.my_roster.as_str()),
            "opponent_team_name" => Some(self.opponent_team_name.as_str()),
            "opponent_roster" => Some(self.opponent_roster.as_str()),
            _ => None,
        }
    }
}

/// A `{name}` marker in template text.
#[derive(Debug, PartialEq)]
struct Marker<'a> {
    start: usize,
    end: usize,
    name: &'a str,
}

fn is_placeholder_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_'
}

/// Find every marker in `text`. Braces that do not enclose a placeholder
/// name (JSON examples, `{ }`, `{Name}`) are left as literal text.
fn markers(text: &str) -> Vec<Marker<'_>> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;
        let name_start = start + 1;
        let name_len = bytes[name_start..]
            .iter()
            .take_while(|b| is_placeholder_byte(**b))
            .count();
        let close = name_start + name_len;

        if name_len > 0 && bytes.get(close) == Some(&b'}') {
            found.push(Marker {
                start,
                end: close + 1,
                name: &text[name_start..close],
            });
            pos = close + 1;
        } else {
            pos = name_start;
        }
    }

    found
}

/// A validated prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    kind: PromptKind,
    text: String,
}

impl PromptTemplate {
    /// Validate `text` against the placeholder set of `kind`.
    pub fn parse(kind: PromptKind, text: impl Into<String>) -> Result<Self> {
        let text = text.into();

        let found: BTreeSet<&str> = markers(&text).into_iter().map(|m| m.name).collect();
        let required: BTreeSet<&str> = kind.placeholders().iter().copied().collect();

        let missing: Vec<&str> = required.difference(&found).copied().collect();
        let unexpected: Vec<&str> = found.difference(&required).copied().collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            let mut problems = Vec::new();
            if !missing.is_empty() {
                problems.push(format!("missing placeholders {{{}}}", missing.join("}, {")));
            }
            if !unexpected.is_empty() {
                problems.push(format!(
                    "unknown placeholders {{{}}}",
                    unexpected.join("}, {")
                ));
            }
            return Err(AdvisorError::template(kind, problems.join("; ")));
        }

        Ok(Self { kind, text })
    }

    /// Read and validate a template file.
    pub fn load(kind: PromptKind, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AdvisorError::io(path, e))?;
        Self::parse(kind, text)
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitute every placeholder in one pass. Values are inserted verbatim
    /// and never scanned for further placeholders.
    pub fn render(&self, values: &dyn PromptValues) -> Result<String> {
        if values.kind() != self.kind {
            return Err(AdvisorError::template(
                self.kind,
                format!("cannot render with {} values", values.kind()),
            ));
        }

        let mut rendered = String::with_capacity(self.text.len());
        let mut last = 0;

        for marker in markers(&self.text) {
            let value = values.value(marker.name).ok_or_else(|| {
                AdvisorError::template(self.kind, format!("no value for {{{}}}", marker.name))
            })?;
            rendered.push_str(&self.text[last..marker.start]);
            rendered.push_str(value);
            last = marker.end;
        }
        rendered.push_str(&self.text[last..]);

        Ok(rendered)
    }
}

/// The full set of templates, loaded once at startup.
#[derive(Debug, Clone)]
pub struct PromptSet {
    system: PromptTemplate,
    substitution: PromptTemplate,
    free_agent: PromptTemplate,
    trade: PromptTemplate,
}

impl PromptSet {
    /// Load and validate every template from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let load = |kind: PromptKind| PromptTemplate::load(kind, &dir.join(kind.file_name()));

        Ok(Self {
            system: load(PromptKind::System)?,
            substitution: load(PromptKind::Substitution)?,
            free_agent: load(PromptKind::FreeAgent)?,
            trade: load(PromptKind::Trade)?,
        })
    }

    /// The templates shipped in the repository's `prompts/` directory.
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            system: PromptTemplate::parse(
                PromptKind::System,
                include_str!("../../prompts/system.txt"),
            )?,
            substitution: PromptTemplate::parse(
                PromptKind::Substitution,
                include_str!("../../prompts/substitution.txt"),
            )?,
            free_agent: PromptTemplate::parse(
                PromptKind::FreeAgent,
                include_str!("../../prompts/free_agents.txt"),
            )?,
            trade: PromptTemplate::parse(
                PromptKind::Trade,
                include_str!("../../prompts/trade.txt"),
            )?,
        })
    }

    /// System prompt text.
    pub fn system(&self) -> &str {
        self.system.text()
    }

    /// Template for a kind.
    pub fn get(&self, kind: PromptKind) -> &PromptTemplate {
        match kind {
            PromptKind::System => &self.system,
            PromptKind::Substitution => &self.substitution,
            PromptKind::FreeAgent => &self.free_agent,
            PromptKind::Trade => &self.trade,
        }
    }

    /// Render values with the template of their kind.
    pub fn render(&self, values: &dyn PromptValues) -> Result<String> {
        self.get(values.kind()).render(values)
    }
}
