//! Keyword Responder
//!
//! Canned replies selected by trigger words. Rules are kept in the order
//! they were declared and the first rule with a matching trigger wins, so the
//! declaration order decides between rules whose triggers both appear in a
//! message. Before matching, whole-word substitutions rewrite common
//! misspellings to their canonical trigger (`wacmr` -> `1`).
//!
//! Each rule compares its triggers in one [`TriggerMatch`] mode: as a
//! substring, as a whole word, or against the whole message.

use crate::config::{KeywordsConfig, TriggerMatch};
use regex::Regex;

#[derive(Debug, Clone)]
enum Trigger {
    Contains(String),
    Word(Regex),
    Exact(String),
}

impl Trigger {
    fn compile(mode: TriggerMatch, trigger: String) -> Result<Self, regex::Error> {
        Ok(match mode {
            TriggerMatch::Contains => Trigger::Contains(trigger),
            TriggerMatch::Word => Trigger::Word(whole_word(&trigger)?),
            TriggerMatch::Exact => Trigger::Exact(trigger),
        })
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Trigger::Contains(t) => text.contains(t.as_str()),
            Trigger::Word(re) => re.is_match(text),
            Trigger::Exact(t) => text.trim() == t,
        }
    }
}

fn whole_word(word: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\b{}\b", regex::escape(word)))
}

/// One ordered rule: any matching trigger selects `response`.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    triggers: Vec<Trigger>,
    response: String,
}

impl KeywordRule {
    fn matches(&self, text: &str) -> bool {
        self.triggers.iter().any(|t| t.matches(text))
    }
}

#[derive(Debug, Clone)]
struct Substitution {
    pattern: Regex,
    replacement: String,
}

/// Ordered keyword table with misspelling normalization.
#[derive(Debug, Clone, Default)]
pub struct KeywordResponder {
    substitutions: Vec<Substitution>,
    rules: Vec<KeywordRule>,
}

impl KeywordResponder {
    pub fn builder() -> KeywordResponderBuilder {
        KeywordResponderBuilder::default()
    }

    /// Build from the `[keywords]` section.
    pub fn from_config(config: &KeywordsConfig) -> Result<Self, regex::Error> {
        let builder = config
            .substitutions
            .iter()
            .fold(Self::builder(), |b, s| b.substitution(&s.from, &s.to));
        config
            .rules
            .iter()
            .fold(builder, |b, r| {
                b.rule_matching(r.matching, r.triggers.iter().map(String::as_str), &r.response)
            })
            .build()
    }

    /// Apply the substitution table to already lower-cased text.
    pub fn normalize(&self, lower_text: &str) -> String {
        self.substitutions
            .iter()
            .fold(lower_text.to_string(), |text, s| {
                s.pattern.replace_all(&text, s.replacement.as_str()).into_owned()
            })
    }

    /// Canned response for a lower-cased message, or `None` when no rule matches.
    pub fn match_keyword(&self, lower_text: &str) -> Option<&str> {
        let normalized = self.normalize(lower_text);
        self.rules
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| rule.response.as_str())
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

#[derive(Debug)]
struct PendingRule {
    matching: TriggerMatch,
    triggers: Vec<String>,
    response: String,
}

/// Builder for [`KeywordResponder`]. Rules are tried in the order added.
#[derive(Debug, Default)]
pub struct KeywordResponderBuilder {
    substitutions: Vec<(String, String)>,
    rules: Vec<PendingRule>,
}

impl KeywordResponderBuilder {
    /// Rewrite the whole word `from` to `to` before matching.
    pub fn substitution(mut self, from: &str, to: &str) -> Self {
        let from = from.trim().to_lowercase();
        if !from.is_empty() {
            self.substitutions.push((from, to.to_lowercase()));
        }
        self
    }

    /// Append a rule whose triggers match as substrings.
    pub fn rule<'a>(self, triggers: impl IntoIterator<Item = &'a str>, response: &str) -> Self {
        self.rule_matching(TriggerMatch::Contains, triggers, response)
    }

    /// Append a rule compared in `matching` mode. Blank triggers are dropped;
    /// a rule left with no triggers never matches.
    pub fn rule_matching<'a>(
        mut self,
        matching: TriggerMatch,
        triggers: impl IntoIterator<Item = &'a str>,
        response: &str,
    ) -> Self {
        let triggers = triggers
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        self.rules.push(PendingRule {
            matching,
            triggers,
            response: response.to_string(),
        });
        self
    }

    pub fn build(self) -> Result<KeywordResponder, regex::Error> {
        let substitutions = self
            .substitutions
            .into_iter()
            .map(|(from, to)| {
                Ok(Substitution {
                    pattern: whole_word(&from)?,
                    replacement: to,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let rules = self
            .rules
            .into_iter()
            .map(|rule| {
                let triggers = rule
                    .triggers
                    .into_iter()
                    .map(|t| Trigger::compile(rule.matching, t))
                    .collect::<Result<Vec<_>, regex::Error>>()?;
                Ok(KeywordRule {
                    triggers,
                    response: rule.response,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(KeywordResponder {
            substitutions,
            rules,
        })
    }
}
