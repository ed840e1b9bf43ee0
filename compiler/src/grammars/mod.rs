/**
Built-in client grammars

Each grammar is assembled through the public `Grammar` API and can be
emitted or inspected by the driver.
*/
pub mod arithmetic;
pub mod quoted;


use crate::grammar::Grammar;
use crate::typechecker::TypeResult;

/// A built-in grammar and the class it is emitted as by default
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub class_name: &'static str,
    pub build: fn() -> TypeResult<Grammar>,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "arithmetic",
        class_name: arithmetic::CLASS_NAME,
        build: arithmetic::arithmetic,
    },
    Builtin {
        name: "quoted",
        class_name: quoted::CLASS_NAME,
        build: quoted::quoted,
    },
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}
