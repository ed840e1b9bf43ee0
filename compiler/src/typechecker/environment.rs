/**
Declaration environment for grammars

Maintains the symbol tables a grammar is checked against:
- Declarations in author order
- The rule table, indexed by `RuleId`
- Method and field namespaces for uniqueness checks
*/
use crate::ast::Unit;
use crate::ast::decl::{Declaration, RuleDecl, RuleId};
use crate::ast::types::Signature;
use crate::typechecker::errors::{TypeError, TypeResult};
use std::collections::{HashMap, HashSet};

/// Generated methods: functions, token parsers and rules
const METHOD: &str = "method";

/// Generated fields: lexers, tokens and external objects
const FIELD: &str = "field";

#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Declarations in registration order
    declarations: Vec<Declaration>,

    /// Rule table: RuleId -> rule
    rules: Vec<RuleDecl>,

    /// Method names -> signature
    methods: HashMap<String, Signature>,

    /// Field names
    fields: HashSet<String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a method name, failing on duplicates
    pub fn add_method(&mut self, name: &str, sig: Signature) -> TypeResult<()> {
        if self.methods.contains_key(name) {
            return Err(Box::new(TypeError::DuplicateName {
                name: name.to_string(),
                namespace: METHOD,
            }));
        }
        self.methods.insert(name.to_string(), sig);
        Ok(())
    }

    /// Reserve a field name, failing on duplicates
    pub fn add_field(&mut self, name: &str) -> TypeResult<()> {
        if !self.fields.insert(name.to_string()) {
            return Err(Box::new(TypeError::DuplicateName {
                name: name.to_string(),
                namespace: FIELD,
            }));
        }
        Ok(())
    }

    /// Look up a method's signature
    pub fn lookup_method(&self, name: &str) -> Option<&Signature> {
        self.methods.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    pub fn push_declaration(&mut self, declaration: Declaration) {
        self.declarations.push(declaration);
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Add an undefined rule and return its handle
    pub fn add_rule(&mut self, name: &str, sig: Signature, params: Vec<String>) -> RuleId {
        let id = RuleId(self.rules.len());
        self.rules.push(RuleDecl {
            id,
            name: name.to_string(),
            sig,
            params,
            definition: None,
        });
        id
    }

    /// Look up a rule by handle
    pub fn lookup_rule(&self, id: RuleId) -> TypeResult<&RuleDecl> {
        self.rules
            .get(id.0)
            .ok_or_else(|| Box::new(TypeError::UnknownRule { index: id.0 }))
    }

    /// Attach a rule's definition
    ///
    /// The definition's effect must equal the declared effect, and a rule is
    /// defined at most once.
    pub fn define_rule(&mut self, id: RuleId, definition: Unit) -> TypeResult<&RuleDecl> {
        let rule = self
            .rules
            .get_mut(id.0)
            .ok_or_else(|| Box::new(TypeError::UnknownRule { index: id.0 }))?;

        if rule.definition.is_some() {
            return Err(Box::new(TypeError::RuleAlreadyDefined {
                rule: rule.name.clone(),
            }));
        }

        let actual = &definition.signature().effect;
        if *actual != rule.sig.effect {
            return Err(Box::new(TypeError::RuleEffectMismatch {
                rule: rule.name.clone(),
                expected: rule.sig.effect.clone(),
                actual: actual.clone(),
            }));
        }

        rule.definition = Some(definition);
        Ok(rule)
    }

    pub fn rules(&self) -> &[RuleDecl] {
        &self.rules
    }

    /// Rules still lacking a definition
    pub fn undefined_rules(&self) -> impl Iterator<Item = &RuleDecl> {
        self.rules.iter().filter(|rule| rule.definition.is_none())
    }
}
