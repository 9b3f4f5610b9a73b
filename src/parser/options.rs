use super::{Diagnostic, grammar::Entry, lexer::Token};
use crate::{LengthCatalog, ParamValue, Parameter, report::FindingKind};

/// `column_type`s a column declared `type: 'boolean'` may have
pub const BOOLEAN_COLUMN_TYPES: [&str; 4] = ["boolean", "tinyint(1)", "bit", "bit(1)"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ValueRule {
    /// `true` or `false`
    Bool,
    /// Positive integer or a symbolic length class
    Length,
    /// Any expression, kept as written
    Verbatim,
    /// A quoted string
    Text,
    /// A quoted referential action such as `'SET NULL'`
    Action,
    /// A quoted type alias expanded to a set of column types
    TypeAlias,
}

/// How one key of an options record is read
#[derive(Clone, Copy, Debug)]
pub(crate) struct OptionRule {
    pub key: &'static str,
    pub param: &'static str,
    pub value: ValueRule,
}

const fn rule(key: &'static str, value: ValueRule) -> OptionRule {
    OptionRule {
        key,
        param: key,
        value,
    }
}

pub(crate) const COLUMN_OPTIONS: &[OptionRule] = &[
    rule("nullable", ValueRule::Bool),
    rule("unique", ValueRule::Bool),
    rule("length", ValueRule::Length),
    rule("default", ValueRule::Verbatim),
    rule("name", ValueRule::Text),
    rule("type", ValueRule::TypeAlias),
];

pub(crate) const RELATION_OPTIONS: &[OptionRule] = &[
    rule("eager", ValueRule::Bool),
    rule("cascade", ValueRule::Bool),
    rule("onDelete", ValueRule::Action),
];

pub(crate) const JOIN_TABLE_OPTIONS: &[OptionRule] = &[OptionRule {
    key: "name",
    param: "value",
    value: ValueRule::Text,
}];

/// Read the entries of one options record into `params`.
///
/// Every entry is looked at on its own: an unknown key, a duplicate or a
/// malformed value only costs that entry.
pub(crate) fn read_record(
    entries: &[Result<Entry<'_>, &str>],
    rules: &[OptionRule],
    lengths: &LengthCatalog,
    params: &mut Vec<Parameter>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut seen: Vec<&str> = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(raw) => {
                diagnostics.push(Diagnostic::warning(
                    FindingKind::ParseMismatch,
                    format!("malformed option `{raw}`"),
                ));
                continue;
            }
        };
        let repeated = seen.contains(&entry.key);
        if !repeated {
            seen.push(entry.key);
        }
        let Some(rule) = rules.iter().find(|r| r.key == entry.key) else {
            if !repeated {
                diagnostics.push(Diagnostic::warning(
                    FindingKind::UnrecognizedParameter,
                    format!("unrecognized parameter `{}`", entry.key),
                ));
            }
            continue;
        };
        if repeated {
            diagnostics.push(Diagnostic::warning(
                FindingKind::ParseMismatch,
                format!("duplicate parameter `{}`, keeping the first", entry.key),
            ));
            continue;
        }

        if let Some(value) = read_value(rule, entry, lengths, diagnostics) {
            params.push(Parameter::new(rule.param, value));
        }
    }
}

fn read_value(
    rule: &OptionRule,
    entry: &Entry<'_>,
    lengths: &LengthCatalog,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ParamValue> {
    let mismatch = |diagnostics: &mut Vec<Diagnostic>| -> Option<ParamValue> {
        diagnostics.push(Diagnostic::warning(
            FindingKind::ParseMismatch,
            format!("`{}: {}` is not a valid {}", entry.key, entry.raw, rule.key),
        ));
        None
    };

    match (rule.value, entry.value.as_slice()) {
        (ValueRule::Bool, [Token::Ident("true")]) => Some(ParamValue::Bool(true)),
        (ValueRule::Bool, [Token::Ident("false")]) => Some(ParamValue::Bool(false)),
        (ValueRule::Bool, _) => mismatch(diagnostics),

        (ValueRule::Length, [Token::Number(n) | Token::Str(n)]) => match n.parse::<u64>() {
            Ok(length) if length > 0 => Some(ParamValue::Int(length)),
            _ => Some(resolve_length(n, lengths, diagnostics)),
        },
        (ValueRule::Length, _) => Some(resolve_length(entry.raw, lengths, diagnostics)),

        (ValueRule::Verbatim, [Token::Str(s)]) => Some(ParamValue::Text((*s).to_owned())),
        (ValueRule::Verbatim, _) => Some(ParamValue::Token(entry.raw.to_owned())),

        (ValueRule::Text, [Token::Str(s)]) if !s.is_empty() => {
            Some(ParamValue::Text((*s).to_owned()))
        }
        (ValueRule::Text, _) => mismatch(diagnostics),

        (ValueRule::Action, [Token::Str(s)])
            if !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphabetic() || matches!(c, ' ' | '_' | '.')) =>
        {
            Some(ParamValue::Text((*s).to_owned()))
        }
        (ValueRule::Action, _) => mismatch(diagnostics),

        (ValueRule::TypeAlias, [Token::Str("boolean")]) => Some(ParamValue::ColumnTypes(
            BOOLEAN_COLUMN_TYPES.iter().map(|t| (*t).to_owned()).collect(),
        )),
        (ValueRule::TypeAlias, [Token::Str(other)]) => {
            diagnostics.push(Diagnostic::error(
                FindingKind::UnsupportedValue,
                format!("column type `{other}` is not supported"),
            ));
            None
        }
        (ValueRule::TypeAlias, _) => mismatch(diagnostics),
    }
}

/// A symbolic length through the catalog; unresolved names pass through
fn resolve_length(
    token: &str,
    lengths: &LengthCatalog,
    diagnostics: &mut Vec<Diagnostic>,
) -> ParamValue {
    match lengths.resolve(token) {
        Some(length) => ParamValue::Int(length),
        None => {
            diagnostics.push(Diagnostic::warning(
                FindingKind::UnresolvedLength,
                format!("length `{token}` is not a known length class"),
            ));
            ParamValue::Token(token.to_owned())
        }
    }
}
