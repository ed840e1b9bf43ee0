/**
Named declarations

Declarations take part in composition through `Unit::Call`, but each also
has its own callable identity in the generated class: a field (lexers,
tokens, external objects) or a method (functions, token parsers, rules).
*/
use super::types::{Effect, Signature};
use super::{Callee, CalleeKind, Unit};
use std::fmt;

/// Handle into a grammar's rule table
///
/// Rules are referenced by handle so that they can call each other
/// before their definitions are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Lexer instance owning a set of tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexer {
    pub name: String,
}

/// Visible token; recognizing it consumes input only on success
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub name: String,
    pub lexer: String,
    /// Pattern expression, emitted verbatim
    pub pattern: String,
}

impl Token {
    /// Zero-input, zero-output, always failable
    pub fn signature() -> Signature {
        Signature::new(Effect::default(), true)
    }

    pub fn unit(&self) -> Unit {
        Unit::Call(Callee::new(&self.name, CalleeKind::Token, Token::signature()))
    }
}

/// Token skipped automatically by the lexer; not callable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenToken {
    pub name: String,
    pub lexer: String,
    pub pattern: String,
}

/// Pure semantic action with an opaque body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub sig: Signature,
    pub params: Vec<String>,
    /// Body text, emitted line by line
    pub body: String,
}

impl Function {
    pub fn unit(&self) -> Unit {
        Unit::Call(Callee::new(&self.name, CalleeKind::Function, self.sig.clone()))
    }
}

/// Token followed by a converter of the matched text into a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParser {
    pub name: String,
    pub token: String,
    pub converter: Function,
    pub sig: Signature,
}

impl TokenParser {
    pub fn unit(&self) -> Unit {
        Unit::Call(Callee::new(
            &self.name,
            CalleeKind::TokenParser,
            self.sig.clone(),
        ))
    }
}

/// Grammar rule entry in the rule table
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDecl {
    pub id: RuleId,
    pub name: String,
    pub sig: Signature,
    pub params: Vec<String>,
    /// Attached once, after every rule it mentions has been declared
    pub definition: Option<Unit>,
}

impl RuleDecl {
    pub fn unit(&self) -> Unit {
        Unit::Call(Callee::new(
            &self.name,
            CalleeKind::Rule(self.id),
            self.sig.clone(),
        ))
    }
}

/// Previously declared external collaborator instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternObject {
    pub name: String,
    pub class: String,
}

/// A declaration in the order the author registered it
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Lexer(Lexer),
    Token(Token),
    Hidden(HiddenToken),
    Object(ExternObject),
    Function(Function),
    TokenParser(TokenParser),
    Rule(RuleId),
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::Lexer(lexer) => write!(f, "lexer {}", lexer.name),
            Declaration::Token(token) => write!(f, "token {} = {}", token.name, token.pattern),
            Declaration::Hidden(token) => {
                write!(f, "hidden {} = {}", token.name, token.pattern)
            }
            Declaration::Object(object) => write!(f, "object {}: {}", object.name, object.class),
            Declaration::Function(func) => write!(f, "function {} {}", func.name, func.sig),
            Declaration::TokenParser(parser) => write!(
                f,
                "token-parser {} {} = {} {}",
                parser.name, parser.sig, parser.token, parser.converter.name
            ),
            Declaration::Rule(id) => write!(f, "rule #{}", id.index()),
        }
    }
}
