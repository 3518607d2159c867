use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use rand::Rng;

use lliq_parser::ast::{AssignFallback, Stmt, StmtKind};
use lliq_parser::link::split_args;
use lliq_parser::parse_program;

use crate::environment::{lookup, Environment, ScopeHandle};
use crate::error::{caveman, Oops};
use crate::evaluator::{evaluate, interpolate};
use crate::helpers::Helper;
use crate::value::{ClassDef, FunctionDef, Instance, Value};

/// Hard bound on loop iterations. Hitting it raises a catchable
/// "infinite loop detected" exception instead of hanging the host.
const LOOP_CEILING: usize = 1_000_000;

/// Hard bound on nested calls. Hitting it raises a catchable
/// "too much recursion" exception before the native stack runs out.
const CALL_CEILING: usize = 200;

/// What a statement did to control flow. `Return` carries a `giveback`
/// value up to the enclosing call; `Quit` unwinds the whole program.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
    Quit,
}

enum CallOutcome {
    Value(Value),
    Quit,
}

/// One interpreter instance: global scope, function and class tables, the
/// module-loaded set and the output sink. Instances are independent; run
/// two programs concurrently by creating two interpreters.
pub struct Interpreter {
    pub(crate) globals: ScopeHandle,
    pub(crate) functions: HashMap<String, FunctionDef>,
    pub(crate) classes: HashMap<String, ClassDef>,
    pub(crate) loaded: HashSet<PathBuf>,
    pub(crate) base_path: PathBuf,
    pub(crate) libs_path: PathBuf,
    pub(crate) modules_path: PathBuf,
    depth: usize,
    out: Box<dyn FnMut(&str)>,
}

impl Interpreter {
    /// Create an interpreter rooted at `base_path`. The `libs/` and
    /// `modules/` search roots are created on demand and the built-in
    /// library files are written if missing.
    pub fn new(base_path: impl AsRef<Path>, out: Box<dyn FnMut(&str)>) -> io::Result<Interpreter> {
        let base_path = base_path.as_ref().to_path_buf();
        let libs_path = base_path.join("libs");
        let modules_path = base_path.join("modules");
        std::fs::create_dir_all(&libs_path)?;
        std::fs::create_dir_all(&modules_path)?;

        let mut interpreter = Interpreter {
            globals: Environment::new().handle(),
            functions: HashMap::new(),
            classes: HashMap::new(),
            loaded: HashSet::new(),
            base_path,
            libs_path,
            modules_path,
            depth: 0,
            out,
        };
        interpreter.ensure_builtin_libs()?;
        Ok(interpreter)
    }

    pub(crate) fn report(&mut self, line: &str) {
        (self.out)(line);
    }

    /// Parse and execute a whole program against the global scope. An
    /// uncaught exception becomes a single diagnostic line; the
    /// interpreter itself never fails.
    pub fn run(&mut self, source: &str) {
        let program = parse_program(source);
        let globals = self.globals.clone();
        if let Err(oops) = self.exec_block(&program, &globals) {
            let line = match oops.line_number {
                Some(_) => oops.to_string(),
                None => format!("[oops] brain hurt: {}", oops.message),
            };
            self.report(&line);
        }
    }

    pub(crate) fn exec_block(&mut self, stmts: &[Stmt], env: &ScopeHandle) -> Result<Flow, Oops> {
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &ScopeHandle) -> Result<Flow, Oops> {
        let line = stmt.line_number;
        match &stmt.kind {
            StmtKind::Comment => {}

            StmtKind::Say { parts } => {
                let text = self.join_parts(parts, env);
                self.report(&text);
            }
            StmtKind::Yell { parts } => {
                let text = format!("{}!!!", self.join_parts(parts, env).to_uppercase());
                self.report(&text);
            }
            StmtKind::Whisper { parts } => {
                let text = self.join_parts(parts, env).to_lowercase();
                self.report(&text);
            }
            StmtKind::Maybe { parts } => {
                if rand::thread_rng().gen_bool(0.5) {
                    let text = self.join_parts(parts, env);
                    self.report(&text);
                }
            }
            StmtKind::ShoutRandom { options } => {
                if let Some(option) = pick(options) {
                    let text = format!("{}!!!", option.to_uppercase());
                    self.report(&text);
                }
            }
            StmtKind::ListVars => {
                let entries = env.borrow().sorted_entries();
                for (name, value) in entries {
                    self.report(&format!("{} = {}", name, value));
                }
            }
            StmtKind::TrashMath { expr } => {
                let answer: i64 = rand::thread_rng().gen_range(0..=100);
                self.report(&format!("{} = {} (probably wrong)", expr, answer));
            }
            StmtKind::BrainFreeze => {
                let millis = rand::thread_rng().gen_range(500..=2000);
                thread::sleep(Duration::from_millis(millis));
            }
            StmtKind::RageQuit => {
                self.report("ragequitting... 😡");
                return Ok(Flow::Quit);
            }

            StmtKind::Assign {
                name,
                rhs,
                fallback,
            } => {
                if let Some(rest) = rhs.strip_prefix("new ") {
                    let mut tokens = split_args(rest).into_iter();
                    let class_name = tokens.next().unwrap_or_default();
                    let values: Vec<Value> =
                        tokens.map(|tok| self.resolve_token(&tok, env)).collect();
                    let (instance, flow) = self.instantiate(&class_name, &values)?;
                    self.assign(name, Value::Instance(instance), env);
                    if flow == Flow::Quit {
                        return Ok(Flow::Quit);
                    }
                } else if rhs.starts_with("yo ") || rhs.starts_with("do ") {
                    let mut tokens = split_args(rhs).into_iter();
                    tokens.next();
                    let target = tokens.next().unwrap_or_default();
                    let values: Vec<Value> =
                        tokens.map(|tok| self.resolve_token(&tok, env)).collect();
                    match self.call(&target, &values, env)? {
                        CallOutcome::Value(value) => self.assign(name, value, env),
                        CallOutcome::Quit => return Ok(Flow::Quit),
                    }
                } else {
                    let value = self.resolve_rhs(rhs, env, *fallback);
                    self.assign(name, value, env);
                }
            }

            StmtKind::MathLikeAnIdiot { expr } => {
                match evaluate(expr, env, &self.globals.clone()) {
                    Ok(value) => self.report(&format!("{} = {}", expr, value)),
                    Err(err) => self.report(&format!("[oops] can't eval `{}`: {}", expr, err)),
                }
            }

            StmtKind::Giveback { expr } => {
                let value = self.resolve_rhs(expr, env, AssignFallback::Nothing);
                return Ok(Flow::Return(value));
            }

            StmtKind::Call { target, args } => {
                let values: Vec<Value> =
                    args.iter().map(|tok| self.resolve_token(tok, env)).collect();
                if let CallOutcome::Quit = self.call(target, &values, env)? {
                    return Ok(Flow::Quit);
                }
            }

            StmtKind::Random { var, low, high } => {
                let globals = self.globals.clone();
                let low = evaluate(low, env, &globals).ok().and_then(|v| v.as_int());
                let high = evaluate(high, env, &globals).ok().and_then(|v| v.as_int());
                match (low, high) {
                    (Some(low), Some(high)) if low <= high => {
                        let picked: i64 = rand::thread_rng().gen_range(low..=high);
                        env.borrow_mut().set(var, Value::Integer(picked));
                    }
                    _ => {
                        self.report(&caveman(line, "random wants low to high numbers", ""));
                    }
                }
            }
            StmtKind::Wait { seconds } => {
                let duration = seconds
                    .parse::<f64>()
                    .ok()
                    .filter(|secs| *secs >= 0.0)
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
                match duration {
                    Some(duration) => thread::sleep(duration),
                    None => self.report(&caveman(line, "wait wants seconds", seconds)),
                }
            }

            StmtKind::Steal { name } => {
                self.steal(name);
            }
            StmtKind::StealFromInternet { target } => {
                self.steal_from_internet(target);
            }

            StmtKind::Scribble {
                path,
                content,
                append,
            } => {
                let path = self.resolve_path(path);
                let content = self.resolve_content(content, env);
                let result = if *append {
                    append_file(&path, &content)
                } else {
                    std::fs::write(&path, content.as_bytes())
                };
                let verb = if *append { "scribblemore" } else { "scribble" };
                match result {
                    Ok(()) if *append => {
                        self.report(&format!("[scribblemore] appended {}", path.display()))
                    }
                    Ok(()) => self.report(&format!("[scribble] wrote {}", path.display())),
                    Err(err) => {
                        self.report(&caveman(line, &format!("{} fail", verb), &err.to_string()))
                    }
                }
            }
            StmtKind::Fetch { path, var } => {
                let path = self.resolve_path(path);
                match std::fs::read_to_string(&path) {
                    Ok(data) => {
                        env.borrow_mut().set(var, Value::Str(data));
                        self.report(&format!("[fetch] {} -> {}", path.display(), var));
                    }
                    Err(err) => {
                        env.borrow_mut().set(var, Value::Str(String::new()));
                        self.report(&caveman(line, "fetch fail", &err.to_string()));
                    }
                }
            }

            StmtKind::Oops { message, body } => {
                if let Some(raw) = message {
                    let text = match unquote(raw) {
                        Some(inner) => interpolate(inner, env, &self.globals.clone()),
                        None => raw.clone(),
                    };
                    return Err(Oops::new(text, Some(line)));
                }
                if !body.is_empty() {
                    // a child exception wins over the generic one
                    if let Flow::Quit = self.exec_block(body, env)? {
                        return Ok(Flow::Quit);
                    }
                }
                return Err(Oops::new("oop happened", Some(line)));
            }

            StmtKind::DoThing { name, params, body } => {
                self.functions.insert(
                    name.clone(),
                    FunctionDef {
                        params: params.clone(),
                        body: Rc::new(body.clone()),
                    },
                );
            }
            StmtKind::Thingy { name, body } => {
                let mut methods = HashMap::new();
                let mut names = Vec::new();
                for child in body {
                    if let StmtKind::DoThing {
                        name: method_name,
                        params,
                        body: method_body,
                    } = &child.kind
                    {
                        names.push(method_name.clone());
                        methods.insert(
                            method_name.clone(),
                            FunctionDef {
                                params: params.clone(),
                                body: Rc::new(method_body.clone()),
                            },
                        );
                    }
                }
                self.classes.insert(
                    name.clone(),
                    ClassDef {
                        name: name.clone(),
                        methods,
                    },
                );
                self.report(&format!(
                    "[thingy] defined class '{}' with methods: {}",
                    name,
                    method_list(&names)
                ));
            }

            StmtKind::Conditional {
                branches,
                otherwise,
            } => {
                let globals = self.globals.clone();
                for branch in branches {
                    let truthy = evaluate(&branch.cond, env, &globals)
                        .map(|v| v.is_truthy())
                        .unwrap_or(false);
                    if truthy {
                        return self.exec_block(&branch.body, env);
                    }
                }
                if let Some(otherwise) = otherwise {
                    return self.exec_block(otherwise, env);
                }
            }

            StmtKind::RepeatUntil { cond, body } => {
                let globals = self.globals.clone();
                let mut guard = 0usize;
                loop {
                    let done = evaluate(cond, env, &globals)
                        .map(|v| v.is_truthy())
                        .unwrap_or(false);
                    if done {
                        break;
                    }
                    match self.exec_block(body, env)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                    guard += 1;
                    if guard > LOOP_CEILING {
                        return Err(Oops::new("infinite loop detected", Some(line)));
                    }
                }
            }
            StmtKind::KeepDoing { cond, body } => {
                let globals = self.globals.clone();
                let mut guard = 0usize;
                loop {
                    let keep = evaluate(cond, env, &globals)
                        .map(|v| v.is_truthy())
                        .unwrap_or(false);
                    if !keep {
                        break;
                    }
                    match self.exec_block(body, env)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                    guard += 1;
                    if guard > LOOP_CEILING {
                        return Err(Oops::new("infinite loop detected", Some(line)));
                    }
                }
            }
            StmtKind::LoopForever { body } => {
                let mut guard = 0usize;
                loop {
                    match self.exec_block(body, env)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                    guard += 1;
                    if guard > LOOP_CEILING {
                        return Err(Oops::new("infinite loop detected", Some(line)));
                    }
                }
            }
            StmtKind::DoSoMany {
                var,
                start,
                end,
                body,
            } => {
                let globals = self.globals.clone();
                let bounds = match (
                    evaluate(start, env, &globals).ok().and_then(|v| v.as_int()),
                    evaluate(end, env, &globals).ok().and_then(|v| v.as_int()),
                ) {
                    (Some(start), Some(end)) => (start, end),
                    _ => (0, -1),
                };
                for index in bounds.0..=bounds.1 {
                    env.borrow_mut().set(var, Value::Integer(index));
                    match self.exec_block(body, env)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                }
            }

            StmtKind::TryCatch { body, catch } => match self.exec_block(body, env) {
                Ok(Flow::Normal) => {}
                Ok(flow) => return Ok(flow),
                Err(oops) => match catch {
                    Some(clause) => {
                        env.borrow_mut()
                            .set(&clause.var, Value::Str(oops.to_string()));
                        // a `giveback` inside the catch body is discarded
                        if let Flow::Quit = self.exec_block(&clause.body, env)? {
                            return Ok(Flow::Quit);
                        }
                    }
                    None => return Err(oops),
                },
            },

            StmtKind::Unknown { text } => {
                self.report(&caveman(line, "me no know command", text));
            }
        }
        Ok(Flow::Normal)
    }

    /// Invoke a free function, a helper, or (when the target contains a
    /// dot) a method on an object.
    fn call(&mut self, name: &str, values: &[Value], env: &ScopeHandle) -> Result<CallOutcome, Oops> {
        log::debug!("calling {} with {} argument(s)", name, values.len());

        if let Some((obj_name, method_name)) = name.split_once('.') {
            let instance = match lookup(env, &self.globals, obj_name) {
                Some(Value::Instance(instance)) => instance,
                _ => return Err(Oops::new(format!("{} not object", obj_name), None)),
            };
            let class_name = instance.class_name();
            let method = self
                .classes
                .get(&class_name)
                .and_then(|class| class.methods.get(method_name))
                .cloned()
                .ok_or_else(|| {
                    Oops::new(format!("{} not in {}", method_name, class_name), None)
                })?;

            let local = self.call_scope();
            local
                .borrow_mut()
                .set("self", Value::Instance(instance.clone()));
            bind_params(&local, method.params.iter().skip(1), values);
            return self.run_body(&method.body, &local);
        }

        if let Some(function) = self.functions.get(name).cloned() {
            let local = self.call_scope();
            bind_params(&local, function.params.iter(), values);
            return self.run_body(&function.body, &local);
        }

        if let Some(helper) = Helper::lookup(name) {
            let value = helper
                .apply(values)
                .map_err(|err| Oops::new(err.to_string(), None))?;
            return Ok(CallOutcome::Value(value));
        }

        Err(Oops::new(format!("{} not function", name), None))
    }

    fn run_body(&mut self, body: &[Stmt], local: &ScopeHandle) -> Result<CallOutcome, Oops> {
        let flow = self.exec_call_frame(body, local)?;
        match flow {
            Flow::Return(value) => Ok(CallOutcome::Value(value)),
            Flow::Normal => Ok(CallOutcome::Value(Value::Nil)),
            Flow::Quit => Ok(CallOutcome::Quit),
        }
    }

    /// Run a function, method or init body one call level deeper. The depth
    /// counter is restored even when the body raises, so a caught exception
    /// leaves room for further calls.
    fn exec_call_frame(&mut self, body: &[Stmt], local: &ScopeHandle) -> Result<Flow, Oops> {
        if self.depth >= CALL_CEILING {
            return Err(Oops::new("too much recursion".to_string(), None));
        }
        self.depth += 1;
        let result = self.exec_block(body, local);
        self.depth -= 1;
        result
    }

    /// Build an instance of `class_name`. With an `init` method the method
    /// body runs against a fresh call scope and every scope entry except
    /// `self` is adopted as an initial property; without one the arguments
    /// become `arg0..argN` properties.
    fn instantiate(
        &mut self,
        class_name: &str,
        values: &[Value],
    ) -> Result<(Instance, Flow), Oops> {
        let class = self
            .classes
            .get(class_name)
            .cloned()
            .ok_or_else(|| Oops::new(format!("{} no exist", class_name), None))?;

        let instance = Instance::new(class_name);
        if let Some(init) = class.methods.get("init") {
            let local = self.call_scope();
            local
                .borrow_mut()
                .set("self", Value::Instance(instance.clone()));
            bind_params(&local, init.params.iter().skip(1), values);

            let flow = match self.exec_call_frame(&init.body, &local)? {
                Flow::Quit => Flow::Quit,
                _ => Flow::Normal,
            };
            for (name, value) in local.borrow().sorted_entries() {
                if name != "self" && !instance.has_prop(&name) {
                    instance.set_prop(&name, value);
                }
            }
            return Ok((instance, flow));
        }

        for (index, value) in values.iter().enumerate() {
            instance.set_prop(&format!("arg{}", index), value.clone());
        }
        Ok((instance, Flow::Normal))
    }

    /// Fresh call environment seeded with a snapshot of the globals.
    fn call_scope(&self) -> ScopeHandle {
        self.globals.borrow().snapshot().handle()
    }

    fn assign(&mut self, lhs: &str, value: Value, env: &ScopeHandle) {
        if let Some((obj_name, prop)) = lhs.split_once('.') {
            if let Some(Value::Instance(instance)) = lookup(env, &self.globals, obj_name) {
                instance.set_prop(prop, value);
                return;
            }
        }
        env.borrow_mut().set(lhs, value);
    }

    /// Resolve one statement argument: quoted strings interpolate, anything
    /// else evaluates, falls back to a scope lookup, then to its raw text.
    fn resolve_token(&mut self, token: &str, env: &ScopeHandle) -> Value {
        let token = token.trim();
        let globals = self.globals.clone();
        if let Some(inner) = unquote(token) {
            return Value::Str(interpolate(inner, env, &globals));
        }
        if let Ok(value) = evaluate(token, env, &globals) {
            return value;
        }
        match lookup(env, &globals, token) {
            Some(value) => value,
            None => Value::Str(token.to_string()),
        }
    }

    /// Resolve an assignment/`giveback` right-hand side; the fallback
    /// decides what an unresolvable expression becomes.
    fn resolve_rhs(&mut self, rhs: &str, env: &ScopeHandle, fallback: AssignFallback) -> Value {
        let globals = self.globals.clone();
        if let Ok(value) = evaluate(rhs, env, &globals) {
            return value;
        }
        let token = rhs.trim();
        if let Some(inner) = unquote(token) {
            return Value::Str(interpolate(inner, env, &globals));
        }
        if let Some(value) = lookup(env, &globals, token) {
            return value;
        }
        match fallback {
            AssignFallback::RawText => Value::Str(token.to_string()),
            AssignFallback::Nothing => Value::Nil,
        }
    }

    fn resolve_content(&mut self, content: &str, env: &ScopeHandle) -> String {
        let globals = self.globals.clone();
        match unquote(content) {
            Some(inner) => interpolate(inner, env, &globals),
            None => content.to_string(),
        }
    }

    pub(crate) fn resolve_path(&self, token: &str) -> PathBuf {
        let raw = unquote(token).unwrap_or(token).trim();
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(raw)
        }
    }

    fn join_parts(&mut self, parts: &[String], env: &ScopeHandle) -> String {
        let resolved: Vec<String> = parts
            .iter()
            .map(|part| self.resolve_token(part, env).to_string())
            .collect();
        resolved.join(" ")
    }
}

fn bind_params<'a>(
    scope: &ScopeHandle,
    params: impl Iterator<Item = &'a String>,
    values: &[Value],
) {
    let mut scope = scope.borrow_mut();
    for (index, param) in params.enumerate() {
        let value = values.get(index).cloned().unwrap_or(Value::Nil);
        scope.set(param, value);
    }
}

fn unquote(token: &str) -> Option<&str> {
    let token = token.trim();
    if token.len() >= 2
        && ((token.starts_with('"') && token.ends_with('"'))
            || (token.starts_with('\'') && token.ends_with('\'')))
    {
        Some(&token[1..token.len() - 1])
    } else {
        None
    }
}

fn pick(options: &[String]) -> Option<&String> {
    use rand::seq::SliceRandom;
    options.choose(&mut rand::thread_rng())
}

/// Python-list-style display of method names for the `thingy` report.
fn method_list(names: &[String]) -> String {
    if names.is_empty() {
        return "[]".to_string();
    }
    let quoted: Vec<String> = names.iter().map(|name| format!("'{}'", name)).collect();
    format!("[{}]", quoted.join(", "))
}

fn append_file(path: &Path, content: &str) -> io::Result<()> {
    use std::io::Write;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(content.as_bytes())
}
