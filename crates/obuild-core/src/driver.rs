//! The engine driver: resolution, dependency-ordered execution, and the
//! wait-scope discipline.
//!
//! Execution is a single recursive chain on the caller's task. Each target's
//! dependency expansion runs inside its own [`WaitScope`]; rule bodies run
//! *after* that scope is popped, so the shell commands they enqueue land in
//! the enclosing scope and are drained before the enclosing target's body
//! starts. Only shell commands run concurrently; resolution never leaves
//! the driver chain, so the caches need no locking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_recursion::async_recursion;

use crate::error::{Error, Result};
use crate::pattern::{expand_stem, match_stem};
use crate::pool::TaskPool;
use crate::rule::{BodyId, RuleSet, SubRule};
use crate::scope::WaitScope;
use crate::stale::needs_run;

/// Script aliases bound for the duration of one body invocation.
#[derive(Debug)]
pub struct BodyBindings<'a> {
    /// The concrete target being built.
    pub target: &'a str,
    /// First resolved dependency, when there is one.
    pub source: Option<&'a str>,
    /// All resolved dependencies joined by single spaces, when non-empty.
    pub sources: Option<String>,
}

/// The seam between the engine and the script host.
///
/// The driver owns control flow; the host owns the script evaluator. When a
/// rule body must run, the driver hands its opaque [`BodyId`] back to the
/// host along with the alias bindings. The host may re-enter the engine
/// (`shell`, `invoke`) through the [`Build`] it exposes here.
#[allow(async_fn_in_trait)]
pub trait BuildContext {
    /// Access the engine state.
    fn build(&mut self) -> &mut Build;

    /// Evaluate a rule body with the given aliases bound.
    async fn eval_body(&mut self, body: BodyId, binds: &BodyBindings<'_>) -> Result<()>;
}

/// Engine state: the rule table, the per-target resolution caches, the
/// wait-scope stack, and the task pool.
#[derive(Debug)]
pub struct Build {
    rules: RuleSet,
    /// Concrete target -> resolved rule selection, filled on first visit.
    resolved: HashMap<String, Arc<Vec<SubRule>>>,
    /// Targets whose `exec_rule` already completed successfully.
    done: HashSet<String>,
    /// Targets currently on the recursion path.
    visiting: HashSet<String>,
    scopes: Vec<WaitScope>,
    pool: TaskPool,
}

impl Build {
    #[must_use]
    pub fn new(jobs: usize) -> Self {
        Self {
            rules: RuleSet::new(),
            resolved: HashMap::new(),
            done: HashSet::new(),
            visiting: HashSet::new(),
            scopes: Vec::new(),
            pool: TaskPool::new(jobs),
        }
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleSet {
        &mut self.rules
    }

    #[must_use]
    pub fn jobs(&self) -> usize {
        self.pool.jobs()
    }

    /// Enqueue a shell command against the innermost wait scope.
    pub fn enqueue_shell(&mut self, command: String) -> Result<()> {
        let pool = self.pool.clone();
        let Some(scope) = self.scopes.last_mut() else {
            return Err(Error::ShellOutsideBuild);
        };
        pool.spawn_shell(scope, command);
        Ok(())
    }
}

/// Drive a whole build of `target`: a root wait scope around `exec_rule`,
/// drained before the result is reported.
#[async_recursion(?Send)]
pub async fn exec_main<C: BuildContext>(ctx: &mut C, target: &str) -> Result<()> {
    tracing::debug!(target, "starting build");
    ctx.build().scopes.push(WaitScope::new());
    let chain = exec_rule(ctx, target, None).await;
    let task_failure = match ctx.build().scopes.pop() {
        Some(scope) => scope.drain().await,
        None => None,
    };
    chain?;
    match task_failure {
        Some(status) => Err(Error::CommandFailed { status }),
        None => Ok(()),
    }
}

/// Build one concrete target, resolving it on first visit.
///
/// Completed targets return immediately; re-entering a target that is still
/// on the recursion path is a dependency cycle.
#[async_recursion(?Send)]
pub async fn exec_rule<C: BuildContext>(
    ctx: &mut C,
    target: &str,
    from: Option<&str>,
) -> Result<()> {
    {
        let build = ctx.build();
        if build.done.contains(target) {
            tracing::trace!(target, "already built");
            return Ok(());
        }
        if !build.visiting.insert(target.to_string()) {
            return Err(Error::DependencyCycle(target.to_string()));
        }
    }
    let result = visit_rule(ctx, target, from).await;
    let build = ctx.build();
    build.visiting.remove(target);
    if result.is_ok() {
        build.done.insert(target.to_string());
    }
    result
}

async fn visit_rule<C: BuildContext>(ctx: &mut C, target: &str, from: Option<&str>) -> Result<()> {
    let subrules = {
        let build = ctx.build();
        match build.resolved.get(target) {
            Some(list) => Arc::clone(list),
            None => {
                let list = Arc::new(resolve(&build.rules, target)?);
                build.resolved.insert(target.to_string(), Arc::clone(&list));
                list
            }
        }
    };

    // A phony action that is the only match runs immediately: no dep
    // expansion, no staleness check, only `target` bound.
    if let [only] = subrules.as_slice() {
        let rule = ctx.build().rules.get(only.rule);
        if rule.action {
            let body = rule.body;
            if let Some(body) = body {
                tracing::info!(target, "running action");
                let binds = BodyBindings {
                    target,
                    source: None,
                    sources: None,
                };
                ctx.eval_body(body, &binds).await?;
            }
            return Ok(());
        }
    }

    if subrules.is_empty() {
        if crate::stale::file_exists(target) {
            tracing::trace!(target, "source file leaf");
            return Ok(());
        }
        return Err(Error::no_rule(target, from));
    }

    exec_func(ctx, target, &subrules).await
}

/// Select the applicable rules for a concrete target.
///
/// Dep-only rules accumulate; among body rules an exact match beats every
/// pattern and otherwise the shortest stem wins. Equal-specificity body
/// rules are a redefinition. Dep-only pattern rules only fire when some body
/// rule matched, so their `%`-deps always have a stem to expand against.
fn resolve(rules: &RuleSet, target: &str) -> Result<Vec<SubRule>> {
    let mut exact_body: Vec<usize> = Vec::new();
    let mut pattern_body: Vec<SubRule> = Vec::new();
    let mut dep_only: Vec<(SubRule, bool)> = Vec::new();

    for (index, rule) in rules.iter() {
        if rule.target == target {
            if rule.body.is_some() {
                exact_body.push(index);
            } else {
                dep_only.push((SubRule::exact(index), false));
            }
        } else if let Some(stem) = match_stem(target, &rule.target) {
            if rule.body.is_some() {
                pattern_body.push(SubRule::pattern(index, stem));
            } else {
                dep_only.push((SubRule::pattern(index, stem), true));
            }
        }
    }

    let winner = if exact_body.len() > 1 {
        return Err(Error::Redefinition(target.to_string()));
    } else if let Some(&index) = exact_body.first() {
        Some(SubRule::exact(index))
    } else if let Some(best) = pattern_body.iter().map(|sr| sr.stem.len()).min() {
        let mut at_best = pattern_body.iter().filter(|sr| sr.stem.len() == best);
        let selected = at_best.next().cloned();
        if at_best.next().is_some() {
            return Err(Error::Redefinition(target.to_string()));
        }
        selected
    } else {
        None
    };

    let has_body = winner.is_some();
    let mut selected: Vec<SubRule> = winner.into_iter().collect();
    for (sr, is_pattern) in dep_only {
        if is_pattern && !has_body {
            tracing::debug!(target, "ignoring dep-only pattern rule without a body rule");
            continue;
        }
        selected.push(sr);
    }
    Ok(selected)
}

/// Expand and build a target's dependencies inside a fresh wait scope, then
/// run its body if it is an action or stale.
#[async_recursion(?Send)]
async fn exec_func<C: BuildContext>(ctx: &mut C, target: &str, subrules: &[SubRule]) -> Result<()> {
    ctx.build().scopes.push(WaitScope::new());

    let mut subdeps: Vec<String> = Vec::new();
    {
        let build = ctx.build();
        for sr in subrules {
            for dep in &build.rules.get(sr.rule).deps {
                subdeps.push(expand_stem(dep, &sr.stem));
            }
        }
    }

    let mut chain = Ok(());
    for dep in &subdeps {
        if let Err(err) = exec_rule(ctx, dep, Some(target)).await {
            chain = Err(err);
            break;
        }
    }

    // Always drain: queued tasks run to completion even when the synchronous
    // chain already failed. The chain's error takes precedence.
    let task_failure = match ctx.build().scopes.pop() {
        Some(scope) => scope.drain().await,
        None => None,
    };
    chain?;
    if let Some(status) = task_failure {
        return Err(Error::CommandFailed { status });
    }

    let selected = {
        let build = ctx.build();
        subrules.iter().find_map(|sr| {
            let rule = build.rules.get(sr.rule);
            rule.body.map(|body| (body, rule.action))
        })
    };
    if let Some((body, action)) = selected {
        if action || needs_run(target, &subdeps) {
            tracing::info!(target, "running rule body");
            let binds = BodyBindings {
                target,
                source: subdeps.first().map(String::as_str),
                sources: (!subdeps.is_empty()).then(|| subdeps.join(" ")),
            };
            ctx.eval_body(body, &binds).await?;
        } else {
            tracing::debug!(target, "up to date");
        }
    }
    Ok(())
}
