/**
Construction errors for combinator grammars

Every variant indicates a grammar-authoring bug. They are reported when
combinators are composed or declarations registered, never at parse time.
*/
use crate::ast::types::{Effect, Type};
use std::fmt;

// Box the error type to reduce stack size (clippy::result_large_err)
pub type TypeResult<T> = Result<T, Box<TypeError>>;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeError {
    /// Values threaded from left to right in a sequence do not line up
    OverlapMismatch {
        left: Effect,
        right: Effect,
        sequence: String,
    },

    /// First operand of a choice can never fail, so the fallback is dead
    InfallibleChoice { first: String },

    /// Choice operands consume or produce different values
    ChoiceEffectMismatch {
        first: Effect,
        second: Effect,
        choice: String,
    },

    /// Repetition or option over a child that cannot fail
    InfallibleClosure { closure: &'static str, child: String },

    /// Repetition or option over a child whose outputs differ from its inputs
    ShapeChangingClosure {
        closure: &'static str,
        child: String,
        effect: Effect,
    },

    /// Named declarations return at most one value
    TooManyOutputs { name: String, outputs: Vec<Type> },

    /// Rule definition disagrees with the rule's declared effect
    RuleEffectMismatch {
        rule: String,
        expected: Effect,
        actual: Effect,
    },

    /// Rule definitions are attached exactly once
    RuleAlreadyDefined { rule: String },

    /// Rule was declared but never given a definition
    UndefinedRule { rule: String },

    /// Rule handle does not belong to this grammar
    UnknownRule { index: usize },

    /// External object was not declared in this grammar
    UnknownObject { name: String },

    /// Declaration received a different number of parameter names than inputs
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Token-parser converter cannot take the matched text
    InvalidConverter {
        token_parser: String,
        converter: String,
        reason: String,
    },

    /// Name already used in the same namespace
    DuplicateName { name: String, namespace: &'static str },

    /// Sequence or choice built from an empty list of operands
    EmptyComposition { combinator: &'static str },
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::OverlapMismatch {
                left,
                right,
                sequence,
            } => {
                write!(
                    f,
                    "Overlap mismatch in sequence '{}': {} cannot feed {}",
                    sequence, left, right
                )
            }

            TypeError::InfallibleChoice { first } => {
                write!(
                    f,
                    "First alternative '{}' of a choice can never fail; the second would be unreachable",
                    first
                )
            }

            TypeError::ChoiceEffectMismatch {
                first,
                second,
                choice,
            } => {
                write!(
                    f,
                    "Alternatives of choice '{}' have different effects: {} and {}",
                    choice, first, second
                )
            }

            TypeError::InfallibleClosure { closure, child } => {
                write!(
                    f,
                    "{} over '{}' requires a child that can fail",
                    closure, child
                )
            }

            TypeError::ShapeChangingClosure {
                closure,
                child,
                effect,
            } => {
                write!(
                    f,
                    "{} over '{}' requires matching inputs and outputs, but the child has effect {}",
                    closure, child, effect
                )
            }

            TypeError::TooManyOutputs { name, outputs } => {
                let names: Vec<&str> = outputs.iter().map(Type::name).collect();
                write!(
                    f,
                    "'{}' declares {} outputs ({}); named declarations return at most one value",
                    name,
                    outputs.len(),
                    names.join(", ")
                )
            }

            TypeError::RuleEffectMismatch {
                rule,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Effect mismatch in rule '{}': declared {}, but definition has {}",
                    rule, expected, actual
                )
            }

            TypeError::RuleAlreadyDefined { rule } => {
                write!(f, "Rule '{}' already has a definition", rule)
            }

            TypeError::UndefinedRule { rule } => {
                write!(f, "Rule '{}' was declared but never defined", rule)
            }

            TypeError::UnknownRule { index } => {
                write!(f, "Unknown rule handle #{}", index)
            }

            TypeError::UnknownObject { name } => {
                write!(f, "Object '{}' is not declared in this grammar", name)
            }

            TypeError::ArityMismatch {
                name,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "'{}' takes {} input(s), but {} parameter name(s) were supplied",
                    name, expected, actual
                )
            }

            TypeError::InvalidConverter {
                token_parser,
                converter,
                reason,
            } => {
                write!(
                    f,
                    "Invalid converter '{}' for token parser '{}': {}",
                    converter, token_parser, reason
                )
            }

            TypeError::DuplicateName { name, namespace } => {
                write!(f, "Duplicate {} name: '{}'", namespace, name)
            }

            TypeError::EmptyComposition { combinator } => {
                write!(f, "Cannot build a {} from zero operands", combinator)
            }
        }
    }
}

impl std::error::Error for TypeError {}
