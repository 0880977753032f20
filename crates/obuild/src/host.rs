//! The script host: wires the command language to the build engine.

use std::collections::HashMap;

use obuild_core::{BodyBindings, BodyId, Build, BuildContext, driver};
use obuild_script::Error as ScriptError;

/// Everything one `obuild` run owns: the engine state, the script variable
/// scopes, the arena of registered rule bodies, and the environment policy.
///
/// `App` is both the evaluator's [`obuild_script::Host`] (command dispatch,
/// variable lookup) and the engine's [`BuildContext`] (body evaluation), so
/// `invoke` and rule bodies re-enter the engine through one `&mut` chain.
pub struct App {
    build: Build,
    /// Variable scopes, innermost last. The outermost scope holds the
    /// engine-seeded identifiers and everything `set` at configuration time.
    scopes: Vec<HashMap<String, String>>,
    /// Raw block text of every registered rule body, indexed by [`BodyId`].
    bodies: Vec<String>,
    ignore_env: bool,
}

impl App {
    #[must_use]
    pub fn new(jobs: usize, ignore_env: bool) -> Self {
        let mut app = Self {
            build: Build::new(jobs),
            scopes: vec![HashMap::new()],
            bodies: Vec::new(),
            ignore_env,
        };
        let jobs = app.build.jobs().to_string();
        app.set_var("numcpus", num_cpus::get().to_string());
        app.set_var("numjobs", jobs);
        app
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.build.rules().len()
    }

    fn set_var(&mut self, name: &str, value: String) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Register one body's block text and hand back its engine handle.
    fn intern_body(&mut self, code: &str) -> BodyId {
        self.bodies.push(code.to_string());
        BodyId::new(self.bodies.len() - 1)
    }

    /// `rule T D [B]` / `action N [B]` / `depend T D` all funnel here.
    fn register(&mut self, targets: &str, deps: &str, body: Option<&str>, action: bool) {
        let body = body.map(|code| self.intern_body(code));
        let deps: Vec<String> = deps.split_whitespace().map(str::to_string).collect();
        self.build
            .rules_mut()
            .register(targets.split_whitespace(), deps, body, action);
    }

    fn getenv(&self, name: &str, default: &str) -> String {
        if self.ignore_env {
            return default.to_string();
        }
        match std::env::var(name) {
            Ok(value) if !value.is_empty() => value,
            _ => default.to_string(),
        }
    }
}

fn arity<'a>(
    command: &'static str,
    expected: &'static str,
    args: &'a [String],
    min: usize,
    max: usize,
) -> Result<&'a [String], ScriptError> {
    if args.len() < min || args.len() > max {
        return Err(ScriptError::wrong_arity(command, expected, args.len()));
    }
    Ok(args)
}

impl obuild_script::Host for App {
    fn get_var(&self, name: &str) -> Option<String> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
    }

    async fn command(&mut self, name: &str, args: &[String]) -> obuild_script::Result<String> {
        match name {
            "rule" => {
                let args = arity("rule", "2 or 3", args, 2, 3)?;
                self.register(&args[0], &args[1], args.get(2).map(String::as_str), false);
                Ok(String::new())
            }
            "action" => {
                let args = arity("action", "2", args, 2, 2)?;
                self.register(&args[0], "", Some(&args[1]), true);
                Ok(String::new())
            }
            "depend" => {
                let args = arity("depend", "2", args, 2, 2)?;
                self.register(&args[0], &args[1], None, false);
                Ok(String::new())
            }
            "shell" => {
                if args.is_empty() {
                    return Err(ScriptError::wrong_arity("shell", "1 or more", 0));
                }
                self.build.enqueue_shell(args.join(" "))?;
                Ok(String::new())
            }
            "invoke" => {
                let args = arity("invoke", "1", args, 1, 1)?;
                driver::exec_main(self, &args[0]).await?;
                Ok(String::new())
            }
            "glob" => {
                if args.is_empty() {
                    return Err(ScriptError::wrong_arity("glob", "1 or more", 0));
                }
                Ok(obuild_core::expand_glob_list(&args.join(" ")))
            }
            "extreplace" => {
                let args = arity("extreplace", "3", args, 3, 3)?;
                Ok(obuild_core::replace_ext_list(&args[0], &args[1], &args[2]))
            }
            "getenv" => {
                let args = arity("getenv", "1 or 2", args, 1, 2)?;
                Ok(self.getenv(&args[0], args.get(1).map_or("", String::as_str)))
            }
            "echo" => {
                println!("{}", args.join(" "));
                Ok(String::new())
            }
            "set" => {
                let args = arity("set", "2", args, 2, 2)?;
                self.set_var(&args[0], args[1].clone());
                Ok(String::new())
            }
            other => Err(ScriptError::UnknownCommand(other.to_string())),
        }
    }
}

impl BuildContext for App {
    fn build(&mut self) -> &mut Build {
        &mut self.build
    }

    async fn eval_body(
        &mut self,
        body: BodyId,
        binds: &BodyBindings<'_>,
    ) -> obuild_core::Result<()> {
        let code = self
            .bodies
            .get(body.index())
            .cloned()
            .ok_or_else(|| obuild_core::Error::script("rule body is not registered"))?;

        let mut scope = HashMap::new();
        scope.insert("target".to_string(), binds.target.to_string());
        if let Some(source) = binds.source {
            scope.insert("source".to_string(), source.to_string());
        }
        if let Some(sources) = &binds.sources {
            scope.insert("sources".to_string(), sources.clone());
        }
        self.scopes.push(scope);
        let result = obuild_script::run(self, &code).await;
        self.scopes.pop();
        result.map(drop).map_err(ScriptError::into_engine)
    }
}
