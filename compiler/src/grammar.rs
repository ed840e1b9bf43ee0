/**
Grammar authoring API

A `Grammar` registers named declarations in order and hands out the
combinators that refer to them. Rules are bound in two phases: `rule`
declares the name and effect, `define` attaches the body later, so rules
may refer to each other before they are defined.

```
use comboc::{Grammar, Unit};

let mut g = Grammar::new();
let lexer = g.lexer("lexer")?;
let digit = g.token("digit", &lexer, "CharSet.interval('0', '9')")?;
let to_num = g.function("toNum", &["CharSequence"], &["Integer"], &["seq"],
    "return seq.charAt(0) - '0';")?;
let num = g.token_parser("num", &digit, &to_num)?;

let digits = g.rule("digits", &[], &["Integer"], &[])?;
g.define(digits, Unit::seq([num.unit(), Unit::pass(vec!["Integer".into()])])?)?;
# Ok::<(), Box<comboc::TypeError>>(())
```
*/
use crate::ast::Unit;
use crate::ast::decl::{
    Declaration, ExternObject, Function, HiddenToken, Lexer, RuleDecl, RuleId, Token, TokenParser,
};
use crate::ast::types::{Effect, MATCHED_TEXT, Signature, Type};
use crate::ast::{Callee, CalleeKind};
use crate::typechecker::algebra;
use crate::typechecker::environment::Environment;
use crate::typechecker::errors::{TypeError, TypeResult};

#[derive(Debug, Clone, Default)]
pub struct Grammar {
    env: Environment,
}

/// Signature of an undeclared call with at most one output
fn call_signature(inputs: &[&str], output: Option<&str>, failable: bool) -> Signature {
    let outputs = output.map(Type::new).into_iter().collect();
    Signature::new(Effect::new(Type::list(inputs), outputs), failable)
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a lexer field
    pub fn lexer(&mut self, name: &str) -> TypeResult<Lexer> {
        self.env.add_field(name)?;
        let lexer = Lexer {
            name: name.to_string(),
        };
        self.env.push_declaration(Declaration::Lexer(lexer.clone()));
        Ok(lexer)
    }

    /// Declare a visible token bound to `lexer`
    pub fn token(&mut self, name: &str, lexer: &Lexer, pattern: &str) -> TypeResult<Token> {
        self.env.add_field(name)?;
        let token = Token {
            name: name.to_string(),
            lexer: lexer.name.clone(),
            pattern: pattern.to_string(),
        };
        self.env.push_declaration(Declaration::Token(token.clone()));
        Ok(token)
    }

    /// Declare a token the lexer skips on its own
    pub fn hidden_token(
        &mut self,
        name: &str,
        lexer: &Lexer,
        pattern: &str,
    ) -> TypeResult<HiddenToken> {
        self.env.add_field(name)?;
        let token = HiddenToken {
            name: name.to_string(),
            lexer: lexer.name.clone(),
            pattern: pattern.to_string(),
        };
        self.env.push_declaration(Declaration::Hidden(token.clone()));
        Ok(token)
    }

    /// Declare an external collaborator instance of `class`
    pub fn object(&mut self, name: &str, class: &str) -> TypeResult<ExternObject> {
        self.env.add_field(name)?;
        let object = ExternObject {
            name: name.to_string(),
            class: class.to_string(),
        };
        self.env.push_declaration(Declaration::Object(object.clone()));
        Ok(object)
    }

    /// Declare a semantic function with parameter names and an opaque body
    pub fn function(
        &mut self,
        name: &str,
        inputs: &[&str],
        outputs: &[&str],
        params: &[&str],
        body: &str,
    ) -> TypeResult<Function> {
        let effect = Effect::from_names(inputs, outputs);
        algebra::named(name, &effect)?;
        let params = owned(params);
        algebra::parameters(name, &effect.inputs, &params)?;

        let sig = Signature::new(effect, false);
        self.env.add_method(name, sig.clone())?;

        let func = Function {
            name: name.to_string(),
            sig,
            params,
            body: body.to_string(),
        };
        self.env.push_declaration(Declaration::Function(func.clone()));
        Ok(func)
    }

    /// Declare a token parser: recognize `token`, then convert the matched text
    ///
    /// The converter's last input receives the matched text; its other
    /// inputs become the token parser's inputs.
    pub fn token_parser(
        &mut self,
        name: &str,
        token: &Token,
        converter: &Function,
    ) -> TypeResult<TokenParser> {
        let invalid = |reason: String| {
            Box::new(TypeError::InvalidConverter {
                token_parser: name.to_string(),
                converter: converter.name.clone(),
                reason,
            })
        };

        let (last, extra) = converter
            .sig
            .inputs()
            .split_last()
            .ok_or_else(|| invalid("converter takes no inputs".to_string()))?;
        if last.name() != MATCHED_TEXT {
            return Err(invalid(format!(
                "last input must be {}, found {}",
                MATCHED_TEXT, last
            )));
        }
        if converter.sig.failable {
            return Err(invalid("converter must not be failable".to_string()));
        }

        let effect = Effect::new(extra.to_vec(), converter.sig.outputs().to_vec());
        let sig = Signature::new(effect, true);
        self.env.add_method(name, sig.clone())?;

        let parser = TokenParser {
            name: name.to_string(),
            token: token.name.clone(),
            converter: converter.clone(),
            sig,
        };
        self.env
            .push_declaration(Declaration::TokenParser(parser.clone()));
        Ok(parser)
    }

    /// Declare a rule without a definition
    pub fn rule(
        &mut self,
        name: &str,
        inputs: &[&str],
        outputs: &[&str],
        params: &[&str],
    ) -> TypeResult<RuleId> {
        let effect = Effect::from_names(inputs, outputs);
        algebra::named(name, &effect)?;
        let params = owned(params);
        algebra::parameters(name, &effect.inputs, &params)?;

        // Called as failable regardless of the body, which is unknown yet
        let sig = Signature::new(effect, true);
        self.env.add_method(name, sig.clone())?;

        let id = self.env.add_rule(name, sig, params);
        self.env.push_declaration(Declaration::Rule(id));
        Ok(id)
    }

    /// Attach the body of a declared rule
    pub fn define(&mut self, rule: RuleId, definition: Unit) -> TypeResult<()> {
        let rule = self.env.define_rule(rule, definition)?;
        log::debug!(
            "defined rule '{}' {} as {}",
            rule.name,
            rule.sig.effect,
            rule.definition.as_ref().map(Unit::to_string).unwrap_or_default()
        );
        Ok(())
    }

    /// Combinator calling a rule, usable before the rule is defined
    pub fn call(&self, rule: RuleId) -> TypeResult<Unit> {
        Ok(self.env.lookup_rule(rule)?.unit())
    }

    /// Combinator calling a method of an external object
    ///
    /// The object must have been declared in this grammar.
    pub fn extern_method(
        &self,
        object: &ExternObject,
        method: &str,
        inputs: &[&str],
        output: Option<&str>,
        failable: bool,
    ) -> TypeResult<Unit> {
        let declared = self
            .declarations()
            .iter()
            .any(|decl| matches!(decl, Declaration::Object(o) if o == object));
        if !declared {
            return Err(Box::new(TypeError::UnknownObject {
                name: object.name.clone(),
            }));
        }

        Ok(Unit::Call(Callee::new(
            format!("{}.{}", object.name, method),
            CalleeKind::Extern,
            call_signature(inputs, output, failable),
        )))
    }

    /// Combinator calling arbitrary code, e.g. `Math.max`, with its inputs
    ///
    /// Nothing is declared for it; the code is emitted verbatim at each call.
    pub fn expr(code: &str, inputs: &[&str], output: Option<&str>, failable: bool) -> Unit {
        Unit::Call(Callee::new(
            code,
            CalleeKind::Expr,
            call_signature(inputs, output, failable),
        ))
    }

    pub fn declarations(&self) -> &[Declaration] {
        self.env.declarations()
    }

    pub fn rule_decl(&self, rule: RuleId) -> TypeResult<&RuleDecl> {
        self.env.lookup_rule(rule)
    }

    pub fn rules(&self) -> &[RuleDecl] {
        self.env.rules()
    }

    /// Fail if any declared rule still lacks a definition
    pub fn check_complete(&self) -> TypeResult<()> {
        match self.env.undefined_rules().next() {
            Some(rule) => Err(Box::new(TypeError::UndefinedRule {
                rule: rule.name.clone(),
            })),
            None => Ok(()),
        }
    }
}
