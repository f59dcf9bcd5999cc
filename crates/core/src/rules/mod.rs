//! Rule tree, compiled rule database and the depth-first probe walk.

pub mod kernel;
pub mod registry;

use serde::{Deserialize, Serialize};

use crate::message::RenderOptions;
use crate::source::ByteSource;
use crate::tester::{Outcome, TestKind, TestResult, Tester};

pub use kernel::KernelRules;
pub use registry::{default_registry, MagicFileRules, RuleContributor, RuleRegistry};

/// Description reported when no rule matches.
pub const UNKNOWN_DESCRIPTION: &str = "data";

/// Message prefix that suppresses the space normally joining messages.
const NO_SPACE_PREFIX: &str = "\\b";

/// One pattern test with the message it renders and its child rules.
///
/// Children are only consulted after their parent matched.
#[derive(Debug, Clone)]
pub struct Rule {
    pub test: Tester,
    pub message: String,
    pub children: Vec<Rule>,
}

impl Rule {
    pub fn new(test: Tester, message: impl Into<String>) -> Self {
        Self { test, message: message.into(), children: Vec::new() }
    }

    pub fn with_child(mut self, child: Rule) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Rule>) -> Self {
        self.children.extend(children);
        self
    }

    /// Evaluate this rule and, if it matches, its subtree.
    ///
    /// Rendered messages are appended to `messages` in depth-first order.
    pub fn walk<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        options: &RenderOptions,
        messages: &mut Vec<String>,
    ) -> TestResult<bool> {
        let outcome = self.test.evaluate_with(source, &self.message, options)?;
        let Outcome::Match(message) = outcome else {
            return Ok(false);
        };
        tracing::trace!(kind = self.test.kind().name(), message = %message, "rule matched");
        messages.push(message);
        walk_siblings(&self.children, source, options, messages)?;
        Ok(true)
    }

    /// Number of rules in this subtree, this one included.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Rule::subtree_size).sum::<usize>()
    }
}

/// Evaluate sibling rules in order.
///
/// A `default` rule only runs when none of the siblings before it matched.
fn walk_siblings<S: ByteSource + ?Sized>(
    rules: &[Rule],
    source: &S,
    options: &RenderOptions,
    messages: &mut Vec<String>,
) -> TestResult<bool> {
    let mut matched = false;
    for rule in rules {
        if matched && matches!(rule.test.kind(), TestKind::Default) {
            continue;
        }
        matched |= rule.walk(source, options, messages)?;
    }
    Ok(matched)
}

/// Join rendered messages into one description.
pub fn join_messages<I, M>(messages: I) -> String
where
    I: IntoIterator<Item = M>,
    M: AsRef<str>,
{
    let mut out = String::new();
    for message in messages {
        let message = message.as_ref();
        if let Some(glued) = message.strip_prefix(NO_SPACE_PREFIX) {
            out.push_str(glued);
            continue;
        }
        if message.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(message);
    }
    out
}

/// Rules supplied by one contributor.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    pub name: String,
    pub rules: Vec<Rule>,
}

impl RuleGroup {
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self { name: name.into(), rules }
    }
}

/// Result of a successful probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Contributor whose rule matched.
    pub group: String,
    pub description: String,
    /// Individual rendered messages, in match order.
    pub messages: Vec<String>,
}

/// Immutable, compiled rule set shared read-only across probes.
#[derive(Debug, Clone, Default)]
pub struct MagicDatabase {
    groups: Vec<RuleGroup>,
    options: RenderOptions,
}

impl MagicDatabase {
    pub fn new(groups: Vec<RuleGroup>) -> Self {
        Self { groups, options: RenderOptions::default() }
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.options
    }

    /// Total number of rules across all groups, children included.
    pub fn rule_count(&self) -> usize {
        self.groups.iter().flat_map(|g| g.rules.iter()).map(Rule::subtree_size).sum()
    }

    /// Walk the rule set and report the first top-level rule that matches.
    ///
    /// A read failure abandons only the rule tree it occurred in. It is
    /// returned when no other top-level rule matches.
    pub fn detect<S: ByteSource + ?Sized>(&self, source: &S) -> TestResult<Option<Detection>> {
        let mut failure = None;
        for group in &self.groups {
            for rule in &group.rules {
                let mut messages = Vec::new();
                let matched = match rule.walk(source, &self.options, &mut messages) {
                    Ok(matched) => matched,
                    Err(e) => {
                        tracing::warn!(group = %group.name, error = %e, "rule abandoned");
                        failure.get_or_insert(e);
                        continue;
                    }
                };
                if matched {
                    let description = join_messages(&messages);
                    tracing::debug!(
                        group = %group.name,
                        description = %description,
                        "probe matched"
                    );
                    return Ok(Some(Detection {
                        group: group.name.clone(),
                        description,
                        messages,
                    }));
                }
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Describe `source`, falling back to [`UNKNOWN_DESCRIPTION`].
    pub fn describe<S: ByteSource + ?Sized>(&self, source: &S) -> TestResult<String> {
        let description = self
            .detect(source)?
            .map(|d| d.description)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string());
        Ok(description)
    }
}
