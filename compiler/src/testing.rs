/**
Interpreter for generated parser classes

Runs the statement subset the code generator emits, so tests can check what
generated parsers do rather than how their text looks. Tokens are bound to
Rust matchers and semantic functions to Rust closures; the bodies of bound
functions are never parsed.

Supported statements: declarations and assignments, expression statements,
`if(..) {} else {}`, `for(;;) {}`, `break;` and `return ..;`.
*/
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Char(char),
    Text(String),
    Stream,
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

type Matcher = Box<dyn Fn(&[char]) -> Option<usize>>;
type Native = Box<dyn Fn(&[Value]) -> Value>;

/// Matcher for a single character
pub fn literal(expected: char) -> impl Fn(&[char]) -> Option<usize> {
    move |s: &[char]| (s.first() == Some(&expected)).then_some(1)
}

/// Matcher for one character satisfying `pred`
pub fn class(pred: fn(char) -> bool) -> impl Fn(&[char]) -> Option<usize> {
    move |s: &[char]| s.first().filter(|c| pred(**c)).map(|_| 1)
}

#[derive(Debug, Clone)]
enum Expr {
    Null,
    Bool(bool),
    Str(String),
    Var(String),
    Not(Box<Expr>),
    NotNull(Box<Expr>),
    Call {
        target: Option<String>,
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone)]
enum Stmt {
    Assign(String, Expr),
    Expr(Expr),
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    Loop(Vec<Stmt>),
    Break,
    Return(Expr),
}

#[derive(Debug)]
struct Method {
    params: Vec<String>,
    body: Vec<Stmt>,
}

enum Flow {
    Normal,
    Break,
    Return(Value),
}

#[derive(Debug, PartialEq)]
enum Terminator {
    Close,
    Else,
    End,
}

#[derive(Default)]
pub struct Machine {
    methods: HashMap<String, Method>,
    tokens: HashSet<String>,
    hidden: Vec<String>,
    matchers: HashMap<String, Matcher>,
    natives: HashMap<String, Native>,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a token (visible or hidden) to a matcher returning the match length
    pub fn token(mut self, name: &str, matcher: impl Fn(&[char]) -> Option<usize> + 'static) -> Self {
        self.matchers.insert(name.to_string(), Box::new(matcher));
        self
    }

    /// Bind a function or `object.method` to a closure
    pub fn native(mut self, name: &str, f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        self.natives.insert(name.to_string(), Box::new(f));
        self
    }

    /// Load a generated class; tokens and natives must be bound first
    pub fn load(mut self, source: &str) -> Result<Self, String> {
        let mut lines = source.lines().map(str::trim);
        let mut in_class = false;

        while let Some(line) = lines.next() {
            if line.is_empty() || line.starts_with("package ") || line.starts_with("import ") {
                continue;
            }
            if line.starts_with("public class ") {
                in_class = true;
                continue;
            }
            if !in_class {
                return Err(format!("Unexpected line outside of class: {}", line));
            }
            if line == "}" {
                in_class = false;
                continue;
            }
            if line.ends_with(';') {
                self.field(line)?;
                continue;
            }
            if !line.ends_with('{') {
                return Err(format!("Unrecognized member: {}", line));
            }

            let (name, params) = parse_header(line)?;
            let mut body = Vec::new();
            let mut depth = 1;
            for line in lines.by_ref() {
                depth += brace_delta(line);
                if depth == 0 {
                    break;
                }
                body.push(line);
            }
            if depth != 0 {
                return Err(format!("Unterminated method '{}'", name));
            }

            if self.natives.contains_key(&name) || name == "parsingError" {
                continue;
            }

            let (stmts, terminator) = parse_block(&mut body.into_iter())?;
            if terminator != Terminator::End {
                return Err(format!("Unbalanced blocks in method '{}'", name));
            }
            self.methods.insert(name, Method { params, body: stmts });
        }

        Ok(self)
    }

    fn field(&mut self, line: &str) -> Result<(), String> {
        let Some((lhs, rhs)) = line.split_once(" = ") else {
            return Err(format!("Unrecognized field: {}", line));
        };
        let name = lhs.split_whitespace().last().unwrap_or(lhs).to_string();

        if rhs.contains(".hidden(") {
            self.hidden.push(name.clone());
        } else if rhs.contains(".token(") {
            self.tokens.insert(name.clone());
        } else {
            return Ok(());
        }

        if !self.matchers.contains_key(&name) {
            return Err(format!("No matcher bound for token '{}'", name));
        }
        Ok(())
    }

    /// Call a generated method on `input`; the token stream is appended
    pub fn run(&self, method: &str, args: Vec<Value>, input: &str) -> Result<Value, String> {
        let mut run = Run {
            machine: self,
            input: input.chars().collect(),
            pos: 0,
        };
        let mut args = args;
        args.push(Value::Stream);
        run.invoke(method, args)
    }
}

struct Run<'m> {
    machine: &'m Machine,
    input: Vec<char>,
    pos: usize,
}

impl<'m> Run<'m> {
    fn invoke(&mut self, name: &str, args: Vec<Value>) -> Result<Value, String> {
        let machine: &'m Machine = self.machine;
        let method = machine
            .methods
            .get(name)
            .ok_or_else(|| format!("No method or binding for '{}'", name))?;
        if method.params.len() != args.len() {
            return Err(format!(
                "'{}' takes {} argument(s), got {}",
                name,
                method.params.len(),
                args.len()
            ));
        }

        let mut frame: HashMap<String, Value> =
            method.params.iter().cloned().zip(args).collect();
        match self.block(&method.body, &mut frame)? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Null),
        }
    }

    fn block(&mut self, stmts: &[Stmt], frame: &mut HashMap<String, Value>) -> Result<Flow, String> {
        for stmt in stmts {
            match stmt {
                Stmt::Assign(name, expr) => {
                    let value = self.eval(expr, frame)?;
                    frame.insert(name.clone(), value);
                }
                Stmt::Expr(expr) => {
                    self.eval(expr, frame)?;
                }
                Stmt::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    let branch = if self.truth(cond, frame)? { then } else { otherwise };
                    match self.block(branch, frame)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                }
                Stmt::Loop(body) => loop {
                    match self.block(body, frame)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        flow => return Ok(flow),
                    }
                },
                Stmt::Break => return Ok(Flow::Break),
                Stmt::Return(expr) => return Ok(Flow::Return(self.eval(expr, frame)?)),
            }
        }
        Ok(Flow::Normal)
    }

    fn truth(&mut self, expr: &Expr, frame: &HashMap<String, Value>) -> Result<bool, String> {
        match self.eval(expr, frame)? {
            Value::Bool(b) => Ok(b),
            other => Err(format!("Condition is not a boolean: {:?}", other)),
        }
    }

    fn eval(&mut self, expr: &Expr, frame: &HashMap<String, Value>) -> Result<Value, String> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Str(s) => Ok(Value::Text(s.clone())),
            Expr::Var(name) => frame
                .get(name)
                .cloned()
                .ok_or_else(|| format!("Undefined variable '{}'", name)),
            Expr::Not(inner) => Ok(Value::Bool(!self.truth(inner, frame)?)),
            Expr::NotNull(inner) => Ok(Value::Bool(self.eval(inner, frame)? != Value::Null)),
            Expr::Call { target, name, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.eval(arg, frame))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(target.as_deref(), name, values)
            }
        }
    }

    fn call(&mut self, target: Option<&str>, name: &str, args: Vec<Value>) -> Result<Value, String> {
        match (target, name) {
            (Some(token), "recognizeToken") => Ok(Value::Bool(self.recognize(token)?.is_some())),
            (Some(token), "parseToken") => {
                Ok(self.recognize(token)?.map(Value::Text).unwrap_or(Value::Null))
            }
            (None, "parsingError") => {
                let expected = args
                    .get(1)
                    .and_then(Value::as_text)
                    .unwrap_or("?")
                    .to_string();
                Err(format!("Expected {} at {}", expected, self.position()))
            }
            _ => {
                let key = match target {
                    Some(object) => format!("{}.{}", object, name),
                    None => name.to_string(),
                };
                if let Some(native) = self.machine.natives.get(&key) {
                    let values: Vec<Value> =
                        args.into_iter().filter(|v| *v != Value::Stream).collect();
                    return Ok(native(&values));
                }
                if target.is_some() {
                    return Err(format!("No binding for '{}'", key));
                }
                self.invoke(name, args)
            }
        }
    }

    fn recognize(&mut self, token: &str) -> Result<Option<String>, String> {
        let machine: &'m Machine = self.machine;
        if !machine.tokens.contains(token) {
            return Err(format!("Unknown token '{}'", token));
        }
        let matcher = machine
            .matchers
            .get(token)
            .ok_or_else(|| format!("No matcher bound for token '{}'", token))?;

        self.skip_hidden();
        match matcher(&self.input[self.pos..]) {
            Some(len) if len > 0 && self.pos + len <= self.input.len() => {
                let text: String = self.input[self.pos..self.pos + len].iter().collect();
                self.pos += len;
                Ok(Some(text))
            }
            _ => Ok(None),
        }
    }

    fn skip_hidden(&mut self) {
        let machine: &'m Machine = self.machine;
        loop {
            let mut skipped = false;
            for name in &machine.hidden {
                if let Some(matcher) = machine.matchers.get(name) {
                    if let Some(len) = matcher(&self.input[self.pos..]) {
                        if len > 0 && self.pos + len <= self.input.len() {
                            self.pos += len;
                            skipped = true;
                        }
                    }
                }
            }
            if !skipped {
                break;
            }
        }
    }

    fn position(&mut self) -> String {
        self.skip_hidden();
        if self.pos >= self.input.len() {
            "end of input".to_string()
        } else {
            format!("position {}", self.pos)
        }
    }
}

/// Net change of block depth on a line, ignoring string literals
fn brace_delta(line: &str) -> i32 {
    let mut delta = 0;
    let mut in_string = false;
    let mut escaped = false;
    for c in line.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => delta += 1,
            '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}

/// Name and parameter names of `public R name(T a, U b) {`
fn parse_header(line: &str) -> Result<(String, Vec<String>), String> {
    let (open, close) = match (line.find('('), line.rfind(')')) {
        (Some(open), Some(close)) if open < close => (open, close),
        _ => return Err(format!("Unrecognized method header: {}", line)),
    };
    let name = line[..open]
        .split_whitespace()
        .last()
        .ok_or_else(|| format!("Missing method name: {}", line))?
        .to_string();
    let params = line[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.split_whitespace().last().unwrap_or(p).to_string())
        .collect();
    Ok((name, params))
}

fn parse_block<'a, I>(lines: &mut I) -> Result<(Vec<Stmt>, Terminator), String>
where
    I: Iterator<Item = &'a str>,
{
    let mut stmts = Vec::new();
    while let Some(line) = lines.next() {
        if line.is_empty() || line.starts_with("/*") {
            continue;
        }
        match line {
            "}" => return Ok((stmts, Terminator::Close)),
            "} else {" => return Ok((stmts, Terminator::Else)),
            "break;" => stmts.push(Stmt::Break),
            "for(;;) {" => {
                let (body, terminator) = parse_block(lines)?;
                expect_close(terminator)?;
                stmts.push(Stmt::Loop(body));
            }
            _ if line.starts_with("if(") && line.ends_with(") {") => {
                let cond = parse_expr(&line[3..line.len() - 3])?;
                let (then, terminator) = parse_block(lines)?;
                let otherwise = match terminator {
                    Terminator::Close => Vec::new(),
                    Terminator::Else => {
                        let (otherwise, terminator) = parse_block(lines)?;
                        expect_close(terminator)?;
                        otherwise
                    }
                    Terminator::End => return Err("Unterminated if block".to_string()),
                };
                stmts.push(Stmt::If {
                    cond,
                    then,
                    otherwise,
                });
            }
            _ => {
                let stmt = line
                    .strip_suffix(';')
                    .ok_or_else(|| format!("Unrecognized statement: {}", line))?;
                stmts.push(parse_statement(stmt)?);
            }
        }
    }
    Ok((stmts, Terminator::End))
}

fn expect_close(terminator: Terminator) -> Result<(), String> {
    match terminator {
        Terminator::Close => Ok(()),
        other => Err(format!("Expected closing brace, found {:?}", other)),
    }
}

fn parse_statement(stmt: &str) -> Result<Stmt, String> {
    if let Some(rest) = stmt.strip_prefix("return ") {
        return Ok(Stmt::Return(parse_expr(rest)?));
    }

    if let Some((lhs, rhs)) = stmt.split_once(" = ") {
        if !lhs.contains('(') && !lhs.contains('"') {
            let name = lhs.split_whitespace().last().unwrap_or(lhs).to_string();
            return Ok(Stmt::Assign(name, parse_expr(rhs)?));
        }
    }

    Ok(Stmt::Expr(parse_expr(stmt)?))
}

fn parse_expr(text: &str) -> Result<Expr, String> {
    let text = text.trim();
    match text {
        "null" => return Ok(Expr::Null),
        "true" => return Ok(Expr::Bool(true)),
        "false" => return Ok(Expr::Bool(false)),
        _ => {}
    }

    if let Some(inner) = text.strip_suffix(" != null") {
        return Ok(Expr::NotNull(Box::new(parse_expr(inner)?)));
    }
    if let Some(inner) = text.strip_prefix('!') {
        return Ok(Expr::Not(Box::new(parse_expr(inner)?)));
    }
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        return Ok(Expr::Str(unescape(&text[1..text.len() - 1])));
    }

    if let (Some(open), true) = (text.find('('), text.ends_with(')')) {
        let head = &text[..open];
        let args = split_args(&text[open + 1..text.len() - 1])
            .into_iter()
            .map(|arg| parse_expr(&arg))
            .collect::<Result<Vec<_>, _>>()?;
        let (target, name) = match head.rsplit_once('.') {
            Some((target, name)) => (Some(target.to_string()), name.to_string()),
            None => (None, head.to_string()),
        };
        return Ok(Expr::Call { target, name, args });
    }

    if !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Ok(Expr::Var(text.to_string()));
    }

    Err(format!("Unsupported expression: {}", text))
}

/// Split call arguments at top-level commas
fn split_args(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                current.push(c);
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => args.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if !current.trim().is_empty() {
        args.push(current);
    }
    args.into_iter().map(|arg| arg.trim().to_string()).collect()
}

fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Unit;
    use crate::ast::types::Type;
    use crate::codegen::CodeGen;
    use crate::grammar::Grammar;

    fn counter_machine(source: &str) -> Machine {
        Machine::new()
            .token("x", literal('x'))
            .native("inc", |args| {
                Value::Int(args[0].as_int().unwrap() + 1)
            })
            .load(source)
            .unwrap()
    }

    /// many(n) = (x inc)*, maybe(n) = (x inc)?, wrapped(n) = many(n) between identities
    fn closure_source() -> String {
        let mut g = Grammar::new();
        let lexer = g.lexer("lexer").unwrap();
        let x = g.token("x", &lexer, "\"x\"").unwrap();
        let inc = g
            .function("inc", &["Integer"], &["Integer"], &["a"], "return a + 1;")
            .unwrap();

        let step = x.unit().then(inc.unit()).unwrap();
        let many = g.rule("many", &["Integer"], &["Integer"], &["n"]).unwrap();
        g.define(many, step.clone().rep().unwrap()).unwrap();
        let maybe = g.rule("maybe", &["Integer"], &["Integer"], &["n"]).unwrap();
        g.define(maybe, step.clone().opt().unwrap()).unwrap();

        let identity = || Unit::pass(Type::list(&["Integer"]));
        let wrapped = g.rule("wrapped", &["Integer"], &["Integer"], &["n"]).unwrap();
        let body = Unit::seq([identity(), step.rep().unwrap(), identity()]).unwrap();
        g.define(wrapped, body).unwrap();

        CodeGen::new().compile_grammar(&g).unwrap()
    }

    #[test]
    fn test_parse_statements() {
        let body = [
            "boolean status = true;",
            "Integer var0 = null;",
            "/* x */",
            "for(;;) {",
            "status = x.recognizeToken(stream, null);",
            "if(!status) {",
            "break;",
            "} else {",
            "var0 = inc(var0);",
            "}",
            "}",
            "return var0;",
        ];
        let (stmts, terminator) = parse_block(&mut body.into_iter()).unwrap();
        assert_eq!(terminator, Terminator::End);
        assert_eq!(stmts.len(), 4);
        assert!(matches!(stmts[2], Stmt::Loop(ref body) if body.len() == 2));
    }

    #[test]
    fn test_parse_expressions() {
        assert!(matches!(parse_expr("var0 != null"), Ok(Expr::NotNull(_))));
        assert!(matches!(parse_expr("!status"), Ok(Expr::Not(_))));
        assert!(matches!(
            parse_expr(r#"parsingError(stream, "a, b")"#),
            Ok(Expr::Call { ref args, .. }) if args.len() == 2
        ));
        assert!(matches!(
            parse_expr("sb.append(ch, stream)"),
            Ok(Expr::Call { target: Some(_), .. })
        ));
        assert!(parse_expr("a + b").is_err());
    }

    #[test]
    fn test_rep_of_failing_child_succeeds_unchanged() {
        let machine = counter_machine(&closure_source());
        assert_eq!(machine.run("many", vec![Value::Int(5)], ""), Ok(Value::Int(5)));
        assert_eq!(machine.run("many", vec![Value::Int(5)], "yyy"), Ok(Value::Int(5)));
        assert_eq!(machine.run("many", vec![Value::Int(5)], "xxx"), Ok(Value::Int(8)));
    }

    #[test]
    fn test_opt_always_succeeds() {
        let machine = counter_machine(&closure_source());
        assert_eq!(machine.run("maybe", vec![Value::Int(5)], ""), Ok(Value::Int(5)));
        assert_eq!(machine.run("maybe", vec![Value::Int(5)], "x"), Ok(Value::Int(6)));
        assert_eq!(machine.run("maybe", vec![Value::Int(5)], "xx"), Ok(Value::Int(6)));
    }

    #[test]
    fn test_identity_wrapping_is_transparent() {
        let machine = counter_machine(&closure_source());
        for input in ["", "x", "xxxx", "xy"] {
            assert_eq!(
                machine.run("wrapped", vec![Value::Int(1)], input),
                machine.run("many", vec![Value::Int(1)], input)
            );
        }
    }

    #[test]
    fn test_missing_matcher_is_reported() {
        let err = Machine::new()
            .native("inc", |args| args[0].clone())
            .load(&closure_source())
            .err()
            .unwrap();
        assert!(err.contains("'x'"));
    }
}
