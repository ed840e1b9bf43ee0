/**
Body of a double-quoted string literal with escapes

```text
string(sb) = closeQuote | chr append string
chr        = backslash escapedChars | chars
```

`string` threads a `StringBuilder` through the recursion and returns it
once the closing quote is reached. Escapes cover `\n`, `\r`, `\t`, two-digit
`\xNN` and four-digit `\uNNNN` codes; any other escaped character stands for
itself.
*/
use crate::ast::Unit;
use crate::ast::types::Type;
use crate::grammar::Grammar;
use crate::typechecker::TypeResult;

pub const CLASS_NAME: &str = "QuotedGrammar";

const ESCAPED_BODY: &str = "\
switch(seq.charAt(0)) {
case 'x': return (char) ((seq.charAt(1) - '0') * 16 + seq.charAt(2) - '0');
case 'u': return (char) ((seq.charAt(1) - '0') * 4096 + (seq.charAt(2) - '0') * 256 + (seq.charAt(3) - '0') * 16 + seq.charAt(4) - '0');
case 'n': return '\\n';
case 'r': return '\\r';
case 't': return '\\t';
default: return seq.charAt(0);
}";

pub fn quoted() -> TypeResult<Grammar> {
    let mut g = Grammar::new();

    let lexer = g.lexer("lexer")?;
    let close_quote = g.token("closeQuote", &lexer, "\"\\\"\"")?;
    let backslash = g.token("backslash", &lexer, "\"\\\\\"")?;
    let all_chars = g.token("allChars", &lexer, "CharSet.all()")?;
    let escape_code = g.token(
        "escapedChars",
        &lexer,
        "CharSet.chars('x').then(CharSet.interval('0', '9').count(2))\
         .or(CharSet.chars('u').then(CharSet.interval('0', '9').count(4)))\
         .or(CharSet.all())",
    )?;

    let append = g.function(
        "append",
        &["StringBuilder", "Character"],
        &["StringBuilder"],
        &["sb", "ch"],
        "return sb.append(ch);",
    )?;
    let escaped = g.function(
        "escaped",
        &["CharSequence"],
        &["Character"],
        &["seq"],
        ESCAPED_BODY,
    )?;
    let normal = g.function(
        "normal",
        &["CharSequence"],
        &["Character"],
        &["seq"],
        "return seq.charAt(0);",
    )?;

    let chars = g.token_parser("chars", &all_chars, &normal)?;
    let escaped_chars = g.token_parser("escapedChars", &escape_code, &escaped)?;

    let string = g.rule("string", &["StringBuilder"], &["StringBuilder"], &["sb"])?;
    let chr = g.rule("chr", &[], &["Character"], &[])?;

    let closing = close_quote
        .unit()
        .then(Unit::pass(vec![Type::new("StringBuilder")]))?;
    let more = Unit::seq([g.call(chr)?, append.unit(), g.call(string)?])?;
    g.define(string, closing.or(more)?)?;

    let escape = backslash.unit().then(escaped_chars.unit())?;
    g.define(chr, escape.or(chars.unit())?)?;

    Ok(g)
}
