//! BNF-style grammar text parsing.
//!
//! ```text
//! # comments and blank lines are skipped
//! <expr> ::= <expr> <op> <expr> | ( <expr> ) | <var> <?kind=leaf?>
//! <op>   ::= + | - | *
//!          | /
//! <var>  ::= x | y
//! ```
//!
//! A definition runs until the next `<name> ::=` header, so long rules may
//! continue on following lines. A line is a comment when `#` sits in column 0
//! (or, before the first header, is its first non-blank character); an
//! indented line such as `    # | -` continues the current rule with a `#`
//! literal.
//!
//! Tokens are whitespace separated, then split further: a single `|` is an
//! alternative separator even without surrounding spaces (`x|y`), while runs
//! like `||` stay literals. A `<name>` inside a token is a rule reference and
//! the text around it becomes literals, so `(<e>)` is `(`, `<e>`, `)`.
//! Comparison tokens such as `<`, `<=` and `<>` are never references.

use crate::error::{GramevoError, Result};
use crate::grammar::analysis;
use crate::grammar::model::{Grammar, LiteralId, Production, Reach, Rule, RuleId, Symbol};
use std::collections::{BTreeMap, HashMap};

struct Definition<'a> {
    name: &'a str,
    body: String,
    line: usize,
}

enum Token<'a> {
    Ref(&'a str),
    Word(&'a str),
    Bar,
    Annotation(BTreeMap<String, String>),
}

enum Part<'a> {
    Ref(&'a str),
    Word(&'a str),
}

struct Alternative<'a> {
    parts: Vec<Part<'a>>,
    attributes: BTreeMap<String, String>,
}

pub(crate) fn parse(text: &str) -> Result<Grammar> {
    let definitions = split_definitions(text)?;
    if definitions.is_empty() {
        return Err(malformed("grammar defines no rules"));
    }

    let mut names = HashMap::with_capacity(definitions.len());
    for (i, def) in definitions.iter().enumerate() {
        if names.insert(def.name.to_string(), RuleId(i)).is_some() {
            return Err(malformed(format!(
                "rule <{}> is defined more than once (line {})",
                def.name, def.line
            )));
        }
    }

    let mut literals: Vec<String> = Vec::new();
    let mut interned: HashMap<String, LiteralId> = HashMap::new();
    let mut rules = Vec::with_capacity(definitions.len());

    for def in &definitions {
        let alternatives = split_alternatives(tokenize(&def.body, def.name)?, def.name)?;
        let mut productions = Vec::with_capacity(alternatives.len());

        for alternative in alternatives {
            let mut symbols = Vec::with_capacity(alternative.parts.len());
            for part in alternative.parts {
                match part {
                    Part::Ref(name) => {
                        let id = names.get(name).copied().ok_or_else(|| {
                            malformed(format!(
                                "rule <{}> references undefined rule <{}>",
                                def.name, name
                            ))
                        })?;
                        symbols.push(Symbol::Rule(id));
                    }
                    Part::Word(word) => {
                        let id = *interned.entry(word.to_string()).or_insert_with(|| {
                            literals.push(word.to_string());
                            LiteralId(literals.len() - 1)
                        });
                        symbols.push(Symbol::Literal(id));
                    }
                }
            }
            productions.push(Production {
                symbols,
                attributes: alternative.attributes,
                min_depth: None,
                max_depth: Reach::Unbounded,
            });
        }

        rules.push(Rule {
            name: def.name.to_string(),
            productions,
            recursive: false,
            min_depth: None,
            max_depth: Reach::Unbounded,
        });
    }

    let start = RuleId(0);
    analysis::analyze(&mut rules, start)?;

    Ok(Grammar {
        rules,
        names,
        literals,
        start,
    })
}

fn split_definitions(text: &str) -> Result<Vec<Definition<'_>>> {
    let mut definitions: Vec<Definition<'_>> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let comment = raw.starts_with('#') || (definitions.is_empty() && line.starts_with('#'));
        if line.is_empty() || comment {
            continue;
        }

        let header = line
            .split_once("::=")
            .and_then(|(lhs, rhs)| rule_name(lhs.trim()).map(|name| (name, rhs)));

        if let Some((name, rhs)) = header {
            definitions.push(Definition {
                name,
                body: rhs.trim().to_string(),
                line: index + 1,
            });
            continue;
        }

        match definitions.last_mut() {
            Some(current) => {
                current.body.push(' ');
                current.body.push_str(line);
            }
            None => {
                return Err(malformed(format!(
                    "line {}: expected a rule header like `<name> ::= ...`",
                    index + 1
                )));
            }
        }
    }

    Ok(definitions)
}

/// Returns the name inside `<name>`, or `None` if the token is not a rule reference.
fn rule_name(token: &str) -> Option<&str> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;
    let valid = !inner.is_empty()
        && !inner.starts_with('?')
        && !inner.contains(|c: char| c == '<' || c == '>' || c.is_whitespace());
    valid.then_some(inner)
}

fn tokenize<'a>(body: &'a str, rule: &str) -> Result<Vec<Token<'a>>> {
    let mut tokens = Vec::new();
    let mut rest = body.trim_start();

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<?") {
            let end = after.find("?>").ok_or_else(|| {
                malformed(format!("unterminated annotation in rule <{}>", rule))
            })?;
            tokens.push(Token::Annotation(parse_attributes(&after[..end], rule)?));
            rest = after[end + 2..].trim_start();
            continue;
        }

        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        split_word(&rest[..end], &mut tokens);
        rest = rest[end..].trim_start();
    }

    Ok(tokens)
}

/// Split one whitespace-delimited word on lone `|` separators.
fn split_word<'a>(word: &'a str, tokens: &mut Vec<Token<'a>>) {
    if word.bytes().all(|b| b == b'|') {
        tokens.push(if word.len() == 1 {
            Token::Bar
        } else {
            Token::Word(word)
        });
        return;
    }

    let bytes = word.as_bytes();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let lone_bar = b == b'|'
            && (i == 0 || bytes[i - 1] != b'|')
            && bytes.get(i + 1) != Some(&b'|');
        if lone_bar {
            split_references(&word[start..i], tokens);
            tokens.push(Token::Bar);
            start = i + 1;
        }
    }
    split_references(&word[start..], tokens);
}

/// Pull `<name>` references out of a piece, keeping the text around them as literals.
fn split_references<'a>(mut piece: &'a str, tokens: &mut Vec<Token<'a>>) {
    while !piece.is_empty() {
        match find_reference(piece) {
            Some((open, close, name)) => {
                if open > 0 {
                    tokens.push(Token::Word(&piece[..open]));
                }
                tokens.push(Token::Ref(name));
                piece = &piece[close..];
            }
            None => {
                tokens.push(Token::Word(piece));
                return;
            }
        }
    }
}

/// Byte span and name of the first `<name>` in `text`.
fn find_reference(text: &str) -> Option<(usize, usize, &str)> {
    let mut from = 0;
    while let Some(open) = text[from..].find('<').map(|i| from + i) {
        let close = open + 1 + text[open + 1..].find('>')?;
        if let Some(name) = rule_name(&text[open..=close]) {
            return Some((open, close + 1, name));
        }
        from = open + 1;
    }
    None
}

fn split_alternatives<'a>(tokens: Vec<Token<'a>>, rule: &str) -> Result<Vec<Alternative<'a>>> {
    if tokens.is_empty() {
        return Err(malformed(format!("rule <{}> has no alternatives", rule)));
    }

    let mut alternatives = Vec::new();
    let mut current: Vec<Part<'a>> = Vec::new();
    let mut attributes: Option<BTreeMap<String, String>> = None;

    let mut finish = |current: &mut Vec<Part<'a>>,
                      attributes: &mut Option<BTreeMap<String, String>>|
     -> Result<()> {
        if current.is_empty() {
            return Err(malformed(format!("rule <{}> has an empty alternative", rule)));
        }
        alternatives.push(Alternative {
            parts: std::mem::take(current),
            attributes: attributes.take().unwrap_or_default(),
        });
        Ok(())
    };

    for token in tokens {
        match token {
            Token::Bar => finish(&mut current, &mut attributes)?,
            Token::Annotation(map) => {
                if attributes.is_some() {
                    return Err(malformed(format!(
                        "rule <{}> has two annotations on one alternative",
                        rule
                    )));
                }
                attributes = Some(map);
            }
            Token::Ref(name) | Token::Word(name) if attributes.is_some() => {
                return Err(malformed(format!(
                    "annotation in rule <{}> must close its alternative, found `{}`",
                    rule, name
                )));
            }
            Token::Ref(name) => current.push(Part::Ref(name)),
            Token::Word(word) => current.push(Part::Word(word)),
        }
    }
    finish(&mut current, &mut attributes)?;

    Ok(alternatives)
}

fn parse_attributes(content: &str, rule: &str) -> Result<BTreeMap<String, String>> {
    let mut attributes = BTreeMap::new();
    for pair in content.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            malformed(format!(
                "annotation entry `{}` in rule <{}> is not key=value",
                pair, rule
            ))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(malformed(format!("annotation in rule <{}> has an empty key", rule)));
        }
        attributes.insert(key.to_string(), value.trim().to_string());
    }
    Ok(attributes)
}

fn malformed(message: impl Into<String>) -> GramevoError {
    GramevoError::GrammarMalformed(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_malformed(result: Result<Grammar>) -> bool {
        matches!(result, Err(GramevoError::GrammarMalformed(_)))
    }

    #[test]
    fn test_rule_name() {
        assert_eq!(rule_name("<expr>"), Some("expr"));
        assert_eq!(rule_name("<"), None);
        assert_eq!(rule_name("<="), None);
        assert_eq!(rule_name("<>"), None);
        assert_eq!(rule_name("<?a=b?>"), None);
    }

    #[test]
    fn test_comparison_literals_are_not_references() {
        let grammar = parse("<op> ::= < | <= | > | >= | ||").unwrap();
        assert_eq!(grammar.literals(), &["<", "<=", ">", ">=", "||"]);
        assert_eq!(grammar.start_rule().productions().len(), 5);
    }

    #[test]
    fn test_bars_without_spaces_separate_alternatives() {
        let grammar = parse("<a> ::= x|y").unwrap();
        assert_eq!(grammar.start_rule().productions().len(), 2);
        assert_eq!(grammar.literals(), &["x", "y"]);

        let grammar = parse("<a> ::= <b>|x\n<b> ::= y").unwrap();
        let a = grammar.start_rule();
        assert_eq!(a.productions().len(), 2);
        assert_eq!(
            a.productions()[0].symbols(),
            &[Symbol::Rule(grammar.rule_id("b").unwrap())]
        );
        assert_eq!(grammar.literals(), &["x", "y"]);
    }

    #[test]
    fn test_references_embedded_in_tokens() {
        let grammar = parse("<e> ::= (<e>) | f(<v>,<v>) | <v>\n<v> ::= x").unwrap();
        let e = grammar.start_rule();
        assert_eq!(e.productions().len(), 3);
        assert_eq!(e.productions()[0].symbols().len(), 3);
        assert_eq!(e.productions()[1].symbols().len(), 5);
        assert_eq!(grammar.literals(), &["(", ")", "f(", ",", "x"]);

        assert!(is_malformed(parse("<a> ::= <undefined>|x")));
        assert!(is_malformed(parse("<a> ::= x<undefined>")));
    }

    #[test]
    fn test_double_bar_inside_token_stays_literal() {
        let grammar = parse("<a> ::= x||y|z").unwrap();
        assert_eq!(grammar.start_rule().productions().len(), 2);
        assert_eq!(grammar.literals(), &["x||y", "z"]);

        let grammar = parse("<a> ::= <=<b> | <>\n<b> ::= y").unwrap();
        assert_eq!(grammar.literals(), &["<=", "<>", "y"]);
    }

    #[test]
    fn test_indented_hash_line_continues_rule() {
        let grammar = parse("# operators\n<op> ::= + |\n    # | -").unwrap();
        assert_eq!(grammar.start_rule().productions().len(), 3);
        assert_eq!(grammar.literals(), &["+", "#", "-"]);

        let grammar = parse("  # leading note\n<op> ::= +\n# | -").unwrap();
        assert_eq!(grammar.start_rule().productions().len(), 1);
    }

    #[test]
    fn test_multiline_definitions_and_comments() {
        let text = "# arithmetic\n<e> ::= <e> + <e>\n       | x\n\n<unused> ::= y\n";
        let grammar = parse(text).unwrap();
        assert_eq!(grammar.start_rule().productions().len(), 2);
        assert_eq!(grammar.rule_count(), 2);
    }

    #[test]
    fn test_annotations() {
        let grammar = parse("<a> ::= x <?weight=3; kind = leaf?> | y").unwrap();
        let rule = grammar.start_rule();
        assert_eq!(rule.productions()[0].attribute("weight"), Some("3"));
        assert_eq!(rule.productions()[0].attribute("kind"), Some("leaf"));
        assert!(rule.productions()[1].attributes().is_empty());
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(is_malformed(parse("")));
        assert!(is_malformed(parse("# only a comment\n")));
        assert!(is_malformed(parse("x ::= y")));
        assert!(is_malformed(parse("<a> ::= x |")));
        assert!(is_malformed(parse("<a> ::= | x")));
        assert!(is_malformed(parse("<a> ::=")));
        assert!(is_malformed(parse("<a> ::= x\n<a> ::= y")));
        assert!(is_malformed(parse("<a> ::= <b>")));
        assert!(is_malformed(parse("<a> ::= x <?broken")));
        assert!(is_malformed(parse("<a> ::= x <?novalue?>")));
        assert!(is_malformed(parse("<a> ::= x <?k=v?> y")));
        assert!(is_malformed(parse("stray text\n<a> ::= x")));
    }
}
