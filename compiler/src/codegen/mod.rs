/**
Parser Code Generation via Text

This module turns a grammar into the source of a single class in a
Java-like target language. No combinators exist at runtime: every rule
becomes a method whose body is the flattened combinator tree, built from
variable declarations, `if` blocks and `for(;;)` loops around one success
flag.

## Architecture

- Lexers, tokens and external objects → fields
- Functions, token parsers and rules → methods
- Combinators → inline statements (see `units`)
- Commit-point failures → calls of the fixed `parsingError` routine

Example output for `term = num | open sum close`:

```java
public Integer term(TokStream stream) {
    boolean status = true;
    Integer var0 = null;
    /* num | open sum close */
    var0 = num(stream);
    status = var0 != null;

    if(!status) {
        ...
    }
    /* end num | open sum close */
    return var0;
}
```
*/
pub mod emitter;
pub mod error;
pub mod units;

pub use emitter::Emitter;
pub use error::{CodegenError, CodegenResult};
pub use units::{emit_call, emit_into};

use crate::ast::decl::{
    Declaration, ExternObject, Function, HiddenToken, Lexer, RuleDecl, Token, TokenParser,
};
use crate::ast::types::{MATCHED_TEXT, Signature};
use crate::config::OutputConfig;
use crate::grammar::Grammar;
use crate::typechecker::TypeError;

/// Name of the success flag in every generated method
pub const STATUS_VAR: &str = "status";

/// Name of the token stream parameter of failable methods
pub const STREAM_VAR: &str = "stream";

/// Type of the token stream parameter
pub const STREAM_TYPE: &str = "TokStream";

/// Name of the variable holding the text matched by a token parser
pub const MATCHED_VAR: &str = "seq";

/// Escape text for a target string literal
pub fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str(r"\\"),
            '"' => result.push_str(r#"\""#),
            '\n' => result.push_str(r"\n"),
            '\r' => result.push_str(r"\r"),
            '\t' => result.push_str(r"\t"),
            _ => result.push(ch),
        }
    }
    result
}

/// Method header: `public R name(T a, ..., TokStream stream)`
///
/// The return type is the single output, else `boolean` for failable
/// methods, else `void`.
fn signature(name: &str, sig: &Signature, params: &[String]) -> String {
    let returns = match sig.outputs().first() {
        Some(ty) => ty.name(),
        None if sig.failable => "boolean",
        None => "void",
    };

    let mut args: Vec<String> = sig
        .inputs()
        .iter()
        .zip(params)
        .map(|(ty, param)| format!("{} {}", ty, param))
        .collect();
    if sig.failable {
        args.push(format!("{} {}", STREAM_TYPE, STREAM_VAR));
    }

    format!("public {} {}({})", returns, name, args.join(", "))
}

/// Main code generator
pub struct CodeGen {
    out: Emitter,
    config: OutputConfig,
}

impl CodeGen {
    /// Create a code generator with the default header
    pub fn new() -> Self {
        Self::with_config(OutputConfig::default())
    }

    pub fn with_config(config: OutputConfig) -> Self {
        CodeGen {
            out: Emitter::with_indent(config.indent_width),
            config,
        }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Compile a complete grammar into one source unit
    ///
    /// Writes the header, then every declaration in registration order inside
    /// the class block, then the error routine. On error, declarations
    /// emitted before the failing one remain available through `emitted`.
    pub fn compile_grammar(&mut self, grammar: &Grammar) -> CodegenResult<String> {
        self.emit_header()?;
        self.out
            .begin_block(&format!("public class {}", self.config.class_name))?;

        for declaration in grammar.declarations() {
            self.declare(grammar, declaration)?;
        }

        self.emit_error_routine()?;
        self.out.end_block()?;

        Ok(self.out.take_output())
    }

    /// Text emitted so far
    pub fn emitted(&self) -> &str {
        self.out.output()
    }

    /// Package and import lines, passed through verbatim
    fn emit_header(&mut self) -> CodegenResult<()> {
        // The class block opens with its own blank line
        if let Some(package) = &self.config.package {
            self.out.line(&format!("package {};", package))?;
            if !self.config.imports.is_empty() {
                self.out.line("")?;
            }
        }

        for import in &self.config.imports {
            self.out.line(&format!("import {};", import))?;
        }
        Ok(())
    }

    /// Materialize a single declaration
    pub fn declare(&mut self, grammar: &Grammar, declaration: &Declaration) -> CodegenResult<()> {
        match declaration {
            Declaration::Lexer(lexer) => self.declare_lexer(lexer),
            Declaration::Token(token) => self.declare_token(token),
            Declaration::Hidden(token) => self.declare_hidden(token),
            Declaration::Object(object) => self.declare_object(object),
            Declaration::Function(func) => self.declare_function(func),
            Declaration::TokenParser(parser) => self.declare_token_parser(parser),
            Declaration::Rule(id) => {
                let rule = grammar.rule_decl(*id)?;
                self.declare_rule(rule)
            }
        }
    }

    pub fn declare_lexer(&mut self, lexer: &Lexer) -> CodegenResult<()> {
        log::debug!("declaring lexer '{}'", lexer.name);
        self.out
            .line(&format!("private final Lexer {} = new Lexer();", lexer.name))
    }

    pub fn declare_token(&mut self, token: &Token) -> CodegenResult<()> {
        log::debug!("declaring token '{}'", token.name);
        self.out.line(&format!(
            "public final Token {} = {}.token({});",
            token.name, token.lexer, token.pattern
        ))
    }

    pub fn declare_hidden(&mut self, token: &HiddenToken) -> CodegenResult<()> {
        log::debug!("declaring hidden token '{}'", token.name);
        self.out.line(&format!(
            "public final Token {} = {}.hidden({});",
            token.name, token.lexer, token.pattern
        ))
    }

    pub fn declare_object(&mut self, object: &ExternObject) -> CodegenResult<()> {
        log::debug!("declaring object '{}' of {}", object.name, object.class);
        self.out.line(&format!(
            "private final {} {} = new {}();",
            object.class, object.name, object.class
        ))
    }

    /// Method with the caller-supplied body, verbatim
    pub fn declare_function(&mut self, func: &Function) -> CodegenResult<()> {
        log::debug!("declaring function '{}' {}", func.name, func.sig);
        self.out
            .begin_member(&signature(&func.name, &func.sig, &func.params))?;
        self.out.line(&func.body)?;
        self.out.end_block()
    }

    /// Method recognizing the token and converting the matched text
    ///
    /// Returns the converted value, or the absence sentinel (`null`, or
    /// `false` without output) when the token is not present.
    pub fn declare_token_parser(&mut self, parser: &TokenParser) -> CodegenResult<()> {
        log::debug!("declaring token parser '{}' {}", parser.name, parser.sig);

        let params: Vec<String> = (0..parser.sig.inputs().len())
            .map(|i| format!("arg{}", i))
            .collect();

        self.out
            .begin_member(&signature(&parser.name, &parser.sig, &params))?;
        self.out.line(&format!(
            "{} {} = {}.parseToken({});",
            MATCHED_TEXT, MATCHED_VAR, parser.token, STREAM_VAR
        ))?;

        self.out
            .begin_block(&format!("if({} != null)", MATCHED_VAR))?;

        let mut args = params;
        args.push(MATCHED_VAR.to_string());
        let results = emit_call(&parser.converter.unit(), &mut self.out, &args, STREAM_VAR)?;

        match results.first() {
            Some(result) => {
                self.out.line(&format!("return {};", result))?;
                self.out.end_block()?;
                self.out.line("return null;")?;
            }
            None => {
                self.out.line("return true;")?;
                self.out.end_block()?;
                self.out.line("return false;")?;
            }
        }

        self.out.end_block()
    }

    /// Method running the rule's definition inline
    pub fn declare_rule(&mut self, rule: &RuleDecl) -> CodegenResult<()> {
        let definition = rule.definition.as_ref().ok_or_else(|| {
            CodegenError::Type(Box::new(TypeError::UndefinedRule {
                rule: rule.name.clone(),
            }))
        })?;
        log::debug!("declaring rule '{}' {} = {}", rule.name, rule.sig, definition);

        self.out
            .begin_member(&signature(&rule.name, &rule.sig, &rule.params))?;
        self.out.line(&format!("boolean {} = true;", STATUS_VAR))?;

        let results = emit_call(definition, &mut self.out, &rule.params, STREAM_VAR)?;

        match results.first() {
            Some(result) => self.out.line(&format!("return {};", result))?,
            None => self.out.line(&format!("return {};", STATUS_VAR))?,
        }

        self.out.end_block()
    }

    /// Routine called on commit-point failures; it never returns
    pub fn emit_error_routine(&mut self) -> CodegenResult<()> {
        self.out.begin_member(&format!(
            "private void parsingError({} {}, String expected)",
            STREAM_TYPE, STREAM_VAR
        ))?;
        self.out.line(&format!(
            "throw new IllegalArgumentException(\"Expected \" + expected + \" at \" + {});",
            STREAM_VAR
        ))?;
        self.out.end_block()
    }
}

impl Default for CodeGen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Unit;
    use crate::testing::{Machine, Value, class, literal};

    fn digit_grammar() -> Grammar {
        let mut g = Grammar::new();
        let lexer = g.lexer("lexer").unwrap();
        let digit = g
            .token("digit", &lexer, "CharSet.interval('0', '9')")
            .unwrap();
        let to_num = g
            .function(
                "toNum",
                &["CharSequence"],
                &["Integer"],
                &["seq"],
                "return seq.charAt(0) - '0';",
            )
            .unwrap();
        g.token_parser("num", &digit, &to_num).unwrap();
        g
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a | b"), "a | b");
        assert_eq!(escape_string(r#"say "hi"\"#), r#"say \"hi\"\\"#);
        assert_eq!(escape_string("x\ny"), r"x\ny");
    }

    #[test]
    fn test_signature() {
        let sig = Signature::new(
            crate::ast::types::Effect::from_names(&["StringBuilder"], &["StringBuilder"]),
            true,
        );
        assert_eq!(
            signature("string", &sig, &["sb".to_string()]),
            "public StringBuilder string(StringBuilder sb, TokStream stream)"
        );

        let recognizer = Signature::new(Default::default(), true);
        assert_eq!(
            signature("ws", &recognizer, &[]),
            "public boolean ws(TokStream stream)"
        );

        let action = Signature::new(Default::default(), false);
        assert_eq!(signature("log", &action, &[]), "public void log()");
    }

    #[test]
    fn test_token_parser_declaration() {
        let grammar = digit_grammar();
        let mut codegen = CodeGen::new();
        let parser = match &grammar.declarations()[3] {
            Declaration::TokenParser(parser) => parser.clone(),
            other => panic!("Expected token parser, got {}", other),
        };
        codegen.declare_token_parser(&parser).unwrap();

        let expected = "\
public Integer num(TokStream stream) {
    CharSequence seq = digit.parseToken(stream);

    if(seq != null) {
        Integer var0 = null;
        var0 = toNum(seq);
        return var0;
    }

    return null;
}
";
        assert_eq!(codegen.emitted(), expected);
    }

    #[test]
    fn test_compile_grammar_layout() {
        let mut grammar = digit_grammar();
        let digits = grammar.rule("digits", &[], &["Integer"], &[]).unwrap();
        let num = match &grammar.declarations()[3] {
            Declaration::TokenParser(parser) => parser.unit(),
            other => panic!("Expected token parser, got {}", other),
        };
        grammar.define(digits, num).unwrap();

        let config = OutputConfig {
            package: Some("demo".to_string()),
            imports: vec!["at.searles.parsing.lexer.Lexer".to_string()],
            class_name: "Digits".to_string(),
            indent_width: 4,
        };
        let mut codegen = CodeGen::with_config(config);
        let source = codegen.compile_grammar(&grammar).unwrap();

        assert!(source.starts_with("package demo;\n\nimport at.searles.parsing.lexer.Lexer;\n"));
        assert!(source.contains("public class Digits {"));
        assert!(source.contains("    private final Lexer lexer = new Lexer();"));
        assert!(source.contains("    public final Token digit = lexer.token(CharSet.interval('0', '9'));"));
        assert!(source.contains("    public Integer toNum(CharSequence seq) {"));
        assert!(source.contains("        return seq.charAt(0) - '0';"));
        assert!(source.contains("    public Integer digits(TokStream stream) {"));
        assert!(source.contains("        boolean status = true;"));
        assert!(source.contains("        var0 = num(stream);"));
        assert!(source.contains("private void parsingError(TokStream stream, String expected)"));
        assert!(source.ends_with("    }\n}\n"));
    }

    #[test]
    fn test_rule_without_output_returns_status() {
        let mut g = Grammar::new();
        let lexer = g.lexer("lexer").unwrap();
        let open = g.token("open", &lexer, "\"(\"").unwrap();
        let close = g.token("close", &lexer, "\")\"").unwrap();
        let parens = g.rule("parens", &[], &[], &[]).unwrap();
        g.define(parens, Unit::seq([open.unit(), close.unit()]).unwrap())
            .unwrap();

        let mut codegen = CodeGen::new();
        codegen.declare_rule(g.rule_decl(parens).unwrap()).unwrap();
        let text = codegen.emitted();

        assert!(text.starts_with("public boolean parens(TokStream stream) {"));
        assert!(text.contains("parsingError(stream, \"close\");"));
        assert!(text.contains("    return status;\n}"));
    }

    #[test]
    fn test_standalone_rule_temporaries_unique() {
        let mut g = digit_grammar();
        let num = match &g.declarations()[3] {
            Declaration::TokenParser(parser) => parser.unit(),
            other => panic!("Expected token parser, got {}", other),
        };
        let add = g
            .function(
                "add",
                &["Integer", "Integer"],
                &["Integer"],
                &["a", "b"],
                "return a + b;",
            )
            .unwrap();
        let pair = g.rule("pair", &[], &["Integer"], &[]).unwrap();
        g.define(pair, Unit::seq([num.clone(), num, add.unit()]).unwrap())
            .unwrap();

        // Every declaration at the top level, without a class block around it
        let mut codegen = CodeGen::new();
        for declaration in g.declarations() {
            codegen.declare(&g, declaration).unwrap();
        }
        let text = codegen.emitted().to_string();

        let body = &text[text.find("public Integer pair(").unwrap()..];
        let declared: Vec<&str> = body
            .lines()
            .map(str::trim)
            .filter_map(|line| line.strip_suffix(" = null;"))
            .filter_map(|decl| decl.split_whitespace().nth(1))
            .collect();
        let mut unique = declared.clone();
        unique.sort_unstable();
        unique.dedup();
        assert!(declared.len() > 3);
        assert_eq!(unique.len(), declared.len(), "in:\n{}", body);

        let machine = Machine::new()
            .token("digit", class(|c| c.is_ascii_digit()))
            .native("toNum", |args| {
                Value::Int(args[0].as_text().unwrap().parse().unwrap())
            })
            .native("add", |args| {
                Value::Int(args[0].as_int().unwrap() + args[1].as_int().unwrap())
            })
            .load(&format!("public class Pair {{\n{}}}\n", text))
            .unwrap();
        assert_eq!(machine.run("pair", vec![], "12"), Ok(Value::Int(3)));
        assert_eq!(machine.run("pair", vec![], "47"), Ok(Value::Int(11)));
    }

    #[test]
    fn test_object_field() {
        let mut g = Grammar::new();
        let sb = g.object("sb", "StringBuilder").unwrap();
        let mut codegen = CodeGen::new();
        codegen.declare_object(&sb).unwrap();
        assert_eq!(
            codegen.emitted(),
            "private final StringBuilder sb = new StringBuilder();\n"
        );
    }

    /// scaled(n) = (x counter.bump)*, checked(n) = counter.positive
    fn counter_grammar() -> Grammar {
        let mut g = Grammar::new();
        let lexer = g.lexer("lexer").unwrap();
        let x = g.token("x", &lexer, "\"x\"").unwrap();
        let counter = g.object("counter", "Counter").unwrap();
        let bump = g
            .extern_method(&counter, "bump", &["Integer"], Some("Integer"), false)
            .unwrap();
        let positive = g
            .extern_method(&counter, "positive", &["Integer"], Some("Integer"), true)
            .unwrap();

        let scaled = g.rule("scaled", &["Integer"], &["Integer"], &["n"]).unwrap();
        g.define(scaled, x.unit().then(bump).unwrap().rep().unwrap())
            .unwrap();
        let checked = g.rule("checked", &["Integer"], &["Integer"], &["n"]).unwrap();
        g.define(checked, positive).unwrap();
        g
    }

    #[test]
    fn test_extern_methods_run() {
        let source = CodeGen::new().compile_grammar(&counter_grammar()).unwrap();
        assert!(source.contains("    private final Counter counter = new Counter();"));
        assert!(source.contains("counter.bump(var"));
        assert!(source.contains("counter.positive(n, stream);"));

        let machine = Machine::new()
            .token("x", literal('x'))
            .native("counter.bump", |args| {
                Value::Int(args[0].as_int().unwrap() + 10)
            })
            .native("counter.positive", |args| match args[0].as_int() {
                Some(n) if n > 0 => Value::Int(n),
                _ => Value::Null,
            })
            .load(&source)
            .unwrap();

        assert_eq!(machine.run("scaled", vec![Value::Int(1)], "xx"), Ok(Value::Int(21)));
        assert_eq!(machine.run("scaled", vec![Value::Int(1)], ""), Ok(Value::Int(1)));
        assert_eq!(machine.run("checked", vec![Value::Int(5)], ""), Ok(Value::Int(5)));
        assert_eq!(machine.run("checked", vec![Value::Int(0)], ""), Ok(Value::Null));
    }

    #[test]
    fn test_undefined_rule_keeps_earlier_declarations() {
        let mut g = Grammar::new();
        g.lexer("lexer").unwrap();
        g.rule("missing", &[], &[], &[]).unwrap();

        let mut codegen = CodeGen::new();
        let err = codegen.compile_grammar(&g).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::Type(ref e) if matches!(**e, TypeError::UndefinedRule { .. })
        ));
        assert!(codegen.emitted().contains("private final Lexer lexer = new Lexer();"));
    }
}
