//! The rule table and its record types.

/// Opaque handle to a rule body held by the script host.
///
/// The engine never looks inside a body; it only hands the id back to the
/// host when the body should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(usize);

impl BodyId {
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A registered rule: how one target (literal or `%`-pattern) depends on
/// other targets and, optionally, how to build it.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Literal target name, or a pattern containing one `%` stem wildcard.
    pub target: String,
    /// Dependency names; each may contain one `%` substituted with the stem
    /// when the rule fires.
    pub deps: Vec<String>,
    /// Body handle; `None` for pure dependency edges.
    pub body: Option<BodyId>,
    /// Phony action: the body runs unconditionally, mtimes are never
    /// consulted.
    pub action: bool,
}

/// A resolved match of a rule against a concrete target.
///
/// `stem` is the substring that matched `%`, empty for an exact match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRule {
    /// Index into the rule table.
    pub rule: usize,
    pub stem: String,
}

impl SubRule {
    #[must_use]
    pub fn exact(rule: usize) -> Self {
        Self {
            rule,
            stem: String::new(),
        }
    }

    #[must_use]
    pub fn pattern(rule: usize, stem: impl Into<String>) -> Self {
        Self {
            rule,
            stem: stem.into(),
        }
    }
}

/// Append-only table of registered rules.
///
/// The script populates the table during configuration; the driver only
/// reads it, addressing rules by index through [`SubRule`].
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one rule per target name.
    pub fn register<I>(&mut self, targets: I, deps: Vec<String>, body: Option<BodyId>, action: bool)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for target in targets {
            let target = target.into();
            tracing::debug!(target = %target, deps = ?deps, action, has_body = body.is_some(), "registered rule");
            self.rules.push(Rule {
                target,
                deps: deps.clone(),
                body,
                action,
            });
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> &Rule {
        &self.rules[index]
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Rule)> {
        self.rules.iter().enumerate()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}
