/// Combo - grammar combinators compiled to parser source
///
/// This crate implements the Combo parser generator, including:
/// - Combinator tree and named declarations (AST)
/// - Stack-effect algebra checked while grammars are built
/// - Code generation of one parser class per grammar
/// - Built-in client grammars
pub mod ast;
pub mod codegen;
pub mod config;
pub mod grammar;
pub mod grammars;
pub mod typechecker;

#[cfg(test)]
mod testing;

pub use ast::Unit;
pub use ast::types::{Effect, Signature, Type};
pub use codegen::{CodeGen, CodegenError, CodegenResult};
pub use config::OutputConfig;
pub use grammar::Grammar;
pub use typechecker::{TypeError, TypeResult};
