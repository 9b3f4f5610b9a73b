//! Call-shape recognition and the per-kind grammar table.

use super::{
    lexer::{Spanned, Token, tokenize},
    options::{COLUMN_OPTIONS, JOIN_TABLE_OPTIONS, OptionRule, RELATION_OPTIONS},
};
use crate::AnnotationKind;

/// One argument of an annotation call, classified by shape
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Arg<'a> {
    /// `'varchar'`
    Literal(&'a str),
    /// `() => Organization`
    Target(&'a str),
    /// `tagset => tagset.profile`
    Inverse {
        receiver: &'a str,
        root: &'a str,
        property: &'a str,
    },
    /// `{ key: value, ... }`; a malformed entry keeps its source text
    Record(Vec<Result<Entry<'a>, &'a str>>),
    /// Anything else
    Other,
}

/// `key: value` inside an options record
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Entry<'a> {
    pub key: &'a str,
    pub value: Vec<Token<'a>>,
    pub raw: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    Literal,
    Target,
    Inverse,
    Record,
}

impl Slot {
    fn accepts(self, arg: &Arg<'_>) -> bool {
        matches!(
            (self, arg),
            (Slot::Literal, Arg::Literal(_))
                | (Slot::Target, Arg::Target(_))
                | (Slot::Inverse, Arg::Inverse { .. })
                | (Slot::Record, Arg::Record(_))
        )
    }
}

/// The argument forms one annotation kind accepts, simplest first
#[derive(Debug)]
pub(crate) struct Grammar {
    pub forms: &'static [&'static [Slot]],
    /// Parameter a positional literal is stored as
    pub literal: &'static str,
    pub options: &'static [OptionRule],
}

impl Grammar {
    /// The first form the arguments fit
    pub fn select(&self, args: &[Arg<'_>]) -> Option<&'static [Slot]> {
        self.forms.iter().copied().find(|form| {
            form.len() == args.len() && form.iter().zip(args).all(|(slot, arg)| slot.accepts(arg))
        })
    }
}

static COLUMN: Grammar = Grammar {
    forms: &[
        &[],
        &[Slot::Literal],
        &[Slot::Record],
        &[Slot::Literal, Slot::Record],
    ],
    literal: "columnType",
    options: COLUMN_OPTIONS,
};

static OWNING_RELATION: Grammar = Grammar {
    forms: &[
        &[],
        &[Slot::Target],
        &[Slot::Target, Slot::Record],
        &[Slot::Target, Slot::Inverse],
        &[Slot::Target, Slot::Inverse, Slot::Record],
    ],
    literal: "columnType",
    options: RELATION_OPTIONS,
};

static INVERSE_COLLECTION: Grammar = Grammar {
    forms: &[
        &[],
        &[Slot::Target, Slot::Inverse],
        &[Slot::Target, Slot::Inverse, Slot::Record],
    ],
    literal: "columnType",
    options: RELATION_OPTIONS,
};

static JOIN_TABLE: Grammar = Grammar {
    forms: &[&[], &[Slot::Record]],
    literal: "value",
    options: JOIN_TABLE_OPTIONS,
};

static VALUE: Grammar = Grammar {
    forms: &[&[], &[Slot::Literal]],
    literal: "value",
    options: &[],
};

pub(crate) enum Interpretation {
    Parsed(&'static Grammar),
    /// Only the bare form carries meaning; anything else is left alone
    Marker,
    Unhandled,
}

pub(crate) fn interpretation(kind: &AnnotationKind) -> Interpretation {
    match kind {
        AnnotationKind::Column => Interpretation::Parsed(&COLUMN),
        AnnotationKind::OneToOne | AnnotationKind::ManyToOne | AnnotationKind::ManyToMany => {
            Interpretation::Parsed(&OWNING_RELATION)
        }
        AnnotationKind::OneToMany => Interpretation::Parsed(&INVERSE_COLLECTION),
        AnnotationKind::JoinTable => Interpretation::Parsed(&JOIN_TABLE),
        AnnotationKind::Scalar
        | AnnotationKind::PrimaryGeneratedColumn
        | AnnotationKind::Generated => Interpretation::Parsed(&VALUE),
        AnnotationKind::Entity
        | AnnotationKind::JoinColumn
        | AnnotationKind::CreateDateColumn
        | AnnotationKind::UpdateDateColumn
        | AnnotationKind::VersionColumn
        | AnnotationKind::InputType
        | AnnotationKind::ObjectType => Interpretation::Marker,
        AnnotationKind::Other(_) => Interpretation::Unhandled,
    }
}

fn opens(token: Token<'_>) -> bool {
    matches!(token, Token::Punct('(' | '[' | '{'))
}

fn closes(token: Token<'_>) -> bool {
    matches!(token, Token::Punct(')' | ']' | '}'))
}

/// Index of the bracket closing a group whose opener precedes `tokens`
fn closing(tokens: &[Spanned<'_>]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, spanned) in tokens.iter().enumerate() {
        if opens(spanned.token) {
            depth += 1;
        } else if closes(spanned.token) {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
    None
}

/// Split at `sep` outside of any bracket; empty pieces are kept
fn split_top_level<'t, 'a>(tokens: &'t [Spanned<'a>], sep: char) -> Vec<&'t [Spanned<'a>]> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut from = 0;
    for (i, spanned) in tokens.iter().enumerate() {
        if opens(spanned.token) {
            depth += 1;
        } else if closes(spanned.token) {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && spanned.token == Token::Punct(sep) {
            pieces.push(&tokens[from..i]);
            from = i + 1;
        }
    }
    pieces.push(&tokens[from..]);
    pieces
}

fn source<'a>(src: &'a str, tokens: &[Spanned<'a>]) -> &'a str {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => &src[first.start..last.end],
        _ => "",
    }
}

/// Non-empty pieces of a comma list; a trailing comma is allowed
fn list<'t, 'a>(tokens: &'t [Spanned<'a>]) -> Result<Vec<&'t [Spanned<'a>]>, String> {
    let mut pieces = split_top_level(tokens, ',');
    if pieces.last().is_some_and(|p| p.is_empty()) {
        pieces.pop();
    }
    if pieces.iter().any(|p| p.is_empty()) {
        return Err("empty argument".to_owned());
    }
    Ok(pieces)
}

/// Break `Name(arg, ...)` into classified arguments
pub(crate) fn parse_call<'a>(name: &str, src: &'a str) -> Result<Vec<Arg<'a>>, String> {
    let tokens = tokenize(src).map_err(|e| e.to_string())?;
    let Some((callee, rest)) = tokens.split_first() else {
        return Err("empty expression".to_owned());
    };
    match callee.token {
        Token::Ident(callee) if callee == name => {}
        Token::Ident(callee) => return Err(format!("expected `{name}(...)`, found `{callee}`")),
        _ => return Err(format!("expected `{name}(...)`")),
    }
    let Some((open, body)) = rest.split_first() else {
        return Err("missing argument list".to_owned());
    };
    if open.token != Token::Punct('(') {
        return Err("missing argument list".to_owned());
    }
    let Some(close) = closing(body) else {
        return Err("unbalanced brackets".to_owned());
    };
    if let Some(extra) = body.get(close + 1) {
        return Err(format!(
            "unexpected `{}` after the argument list",
            &src[extra.start..]
        ));
    }

    Ok(list(&body[..close])?
        .into_iter()
        .map(|arg| classify(src, arg))
        .collect())
}

fn classify<'a>(src: &'a str, arg: &[Spanned<'a>]) -> Arg<'a> {
    let tokens: Vec<Token<'a>> = arg.iter().map(|s| s.token).collect();
    match tokens.as_slice() {
        [Token::Str(literal)] => Arg::Literal(*literal),
        [Token::Punct('('), Token::Punct(')'), Token::Arrow, Token::Ident(target)] => {
            Arg::Target(*target)
        }
        [
            Token::Ident(receiver),
            Token::Arrow,
            Token::Ident(root),
            Token::Punct('.'),
            Token::Ident(property),
        ] => Arg::Inverse {
            receiver: *receiver,
            root: *root,
            property: *property,
        },
        [Token::Punct('{'), ..] if arg.len() >= 2 && closing(&arg[1..]) == Some(arg.len() - 2) => {
            Arg::Record(record(src, &arg[1..arg.len() - 1]))
        }
        _ => Arg::Other,
    }
}

fn record<'a>(src: &'a str, body: &[Spanned<'a>]) -> Vec<Result<Entry<'a>, &'a str>> {
    split_top_level(body, ',')
        .into_iter()
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry {
            [key, colon, value @ ..] if colon.token == Token::Punct(':') && !value.is_empty() => {
                match key.token {
                    Token::Ident(key) | Token::Str(key) => Ok(Entry {
                        key,
                        value: value.iter().map(|s| s.token).collect(),
                        raw: source(src, value),
                    }),
                    _ => Err(source(src, entry)),
                }
            }
            _ => Err(source(src, entry)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_relation_arguments() {
        assert_eq!(
            parse_call(
                "OneToMany",
                "OneToMany(() => Tagset, tagset => tagset.profile, { eager: true })"
            ),
            Ok(vec![
                Arg::Target("Tagset"),
                Arg::Inverse {
                    receiver: "tagset",
                    root: "tagset",
                    property: "profile",
                },
                Arg::Record(vec![Ok(Entry {
                    key: "eager",
                    value: vec![Token::Ident("true")],
                    raw: "true",
                })]),
            ])
        );
    }

    #[test]
    fn nested_values_stay_whole() {
        let args = parse_call(
            "Column",
            "Column({ default: fn(a, b), length: SMALL_TEXT_LENGTH, })",
        )
        .unwrap();
        let Arg::Record(entries) = &args[0] else {
            panic!("expected a record, got {args:?}");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].as_ref().map(|e| e.raw), Ok("fn(a, b)"));
        assert_eq!(entries[1].as_ref().map(|e| e.key), Ok("length"));
    }

    #[test]
    fn rejects_foreign_callee_and_trailing_text() {
        assert_eq!(
            parse_call("Column", "Entity()"),
            Err("expected `Column(...)`, found `Entity`".to_owned())
        );
        assert_eq!(
            parse_call("Column", "Column() extra"),
            Err("unexpected `extra` after the argument list".to_owned())
        );
        assert!(parse_call("Column", "Column('text'").is_err());
    }

    #[test]
    fn first_fitting_form_wins() {
        let args =
            parse_call("ManyToOne", "ManyToOne(() => Organization, { eager: false })").unwrap();
        assert_eq!(
            OWNING_RELATION.select(&args),
            Some([Slot::Target, Slot::Record].as_slice())
        );
        let args = parse_call("OneToMany", "OneToMany(() => Tagset)").unwrap();
        assert_eq!(INVERSE_COLLECTION.select(&args), None);
    }
}
