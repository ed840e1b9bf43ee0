/**
Integer calculator over single digits

```text
sum     = product (plus product add | minus product sub)*
product = negated (times negated mul | slash negated div)*
negated = minus negated neg | term
term    = num | open sum close
```

Operators associate to the left; whitespace is a hidden token.
*/
use crate::ast::Unit;
use crate::ast::decl::Function;
use crate::grammar::Grammar;
use crate::typechecker::TypeResult;

pub const CLASS_NAME: &str = "Calculator";

fn binary(g: &mut Grammar, name: &str, op: &str) -> TypeResult<Function> {
    g.function(
        name,
        &["Integer", "Integer"],
        &["Integer"],
        &["a", "b"],
        &format!("return a {} b;", op),
    )
}

pub fn arithmetic() -> TypeResult<Grammar> {
    let mut g = Grammar::new();

    let to_num = g.function(
        "toNum",
        &["CharSequence"],
        &["Integer"],
        &["seq"],
        "return seq.charAt(0) - '0';",
    )?;
    let add = binary(&mut g, "add", "+")?;
    let sub = binary(&mut g, "sub", "-")?;
    let mul = binary(&mut g, "mul", "*")?;
    let div = binary(&mut g, "div", "/")?;
    let neg = g.function("neg", &["Integer"], &["Integer"], &["a"], "return -a;")?;

    let lexer = g.lexer("lexer")?;
    g.hidden_token("ws", &lexer, "CharSet.chars('\\n', ' ')")?;
    let plus = g.token("plus", &lexer, "\"+\"")?;
    let minus = g.token("minus", &lexer, "\"-\"")?;
    let times = g.token("times", &lexer, "\"*\"")?;
    let slash = g.token("slash", &lexer, "\"/\"")?;
    let open = g.token("open", &lexer, "\"(\"")?;
    let close = g.token("close", &lexer, "\")\"")?;
    let digit = g.token("num", &lexer, "CharSet.interval('0', '9')")?;

    let sum = g.rule("sum", &[], &["Integer"], &[])?;
    let product = g.rule("product", &[], &["Integer"], &[])?;
    let negated = g.rule("negated", &[], &["Integer"], &[])?;
    let term = g.rule("term", &[], &["Integer"], &[])?;
    // Method and field names are separate, so the parser may share the token's name
    let num = g.token_parser("num", &digit, &to_num)?;

    let (sum_call, product_call) = (g.call(sum)?, g.call(product)?);
    let (negated_call, term_call) = (g.call(negated)?, g.call(term)?);

    let additive = Unit::alt([
        Unit::seq([plus.unit(), product_call.clone(), add.unit()])?,
        Unit::seq([minus.unit(), product_call.clone(), sub.unit()])?,
    ])?;
    g.define(sum, product_call.then(additive.rep()?)?)?;

    let multiplicative = Unit::alt([
        Unit::seq([times.unit(), negated_call.clone(), mul.unit()])?,
        Unit::seq([slash.unit(), negated_call.clone(), div.unit()])?,
    ])?;
    g.define(product, negated_call.clone().then(multiplicative.rep()?)?)?;

    let negation = Unit::seq([minus.unit(), negated_call, neg.unit()])?;
    g.define(negated, negation.or(term_call)?)?;

    let nested = Unit::seq([open.unit(), sum_call, close.unit()])?;
    g.define(term, num.unit().or(nested)?)?;

    Ok(g)
}
