/**
Type checker for combinator grammars

Checks are performed eagerly, while the grammar is built:
- Stack-effect algebra for sequence, choice and closures
- At most one output per named declaration
- Two-phase rule binding against declared effects
*/
pub mod algebra;
pub mod environment;
pub mod errors;

pub use environment::Environment;
pub use errors::{TypeError, TypeResult};
