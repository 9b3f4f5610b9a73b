use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Ident(&'a str),
    /// Content of a quoted literal, escapes left in place
    Str(&'a str),
    Number(&'a str),
    Arrow,
    Punct(char),
}

/// A token and the byte range it was read from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Spanned<'a> {
    pub token: Token<'a>,
    pub start: usize,
    pub end: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LexError {
    pub offset: usize,
    pub message: &'static str,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

pub(crate) fn tokenize(src: &str) -> Result<Vec<Spanned<'_>>, LexError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                while chars.next_if(|(_, c)| *c != '\n').is_some() {}
                continue;
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    if c == '*' && chars.next_if(|(_, c)| *c == '/').is_some() {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(LexError {
                        offset: start,
                        message: "unterminated comment",
                    });
                }
                continue;
            }
            '\'' | '"' | '`' => {
                let quote = c;
                let mut end = None;
                while let Some((i, c)) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        c if c == quote => {
                            end = Some(i);
                            break;
                        }
                        _ => {}
                    }
                }
                let Some(end) = end else {
                    return Err(LexError {
                        offset: start,
                        message: "unterminated string literal",
                    });
                };
                tokens.push(Spanned {
                    token: Token::Str(&src[start + 1..end]),
                    start,
                    end: end + 1,
                });
                continue;
            }
            '=' if chars.next_if(|(_, c)| *c == '>').is_some() => Token::Arrow,
            c if c.is_ascii_digit() => {
                let mut end = start + 1;
                while let Some((i, c)) =
                    chars.next_if(|(_, c)| c.is_ascii_alphanumeric() || matches!(c, '.' | '_'))
                {
                    end = i + c.len_utf8();
                }
                tokens.push(Spanned {
                    token: Token::Number(&src[start..end]),
                    start,
                    end,
                });
                continue;
            }
            c if is_ident_start(c) => {
                let mut end = start + c.len_utf8();
                while let Some((i, c)) = chars.next_if(|(_, c)| is_ident_continue(*c)) {
                    end = i + c.len_utf8();
                }
                tokens.push(Spanned {
                    token: Token::Ident(&src[start..end]),
                    start,
                    end,
                });
                continue;
            }
            c => Token::Punct(c),
        };
        let end = match token {
            Token::Arrow => start + 2,
            _ => start + c.len_utf8(),
        };
        tokens.push(Spanned { token, start, end });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(src: &str) -> Vec<Token<'_>> {
        tokenize(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn relation_expression() {
        assert_eq!(
            tokens("OneToMany(() => Tagset, tagset => tagset.profile)"),
            vec![
                Token::Ident("OneToMany"),
                Token::Punct('('),
                Token::Punct('('),
                Token::Punct(')'),
                Token::Arrow,
                Token::Ident("Tagset"),
                Token::Punct(','),
                Token::Ident("tagset"),
                Token::Arrow,
                Token::Ident("tagset"),
                Token::Punct('.'),
                Token::Ident("profile"),
                Token::Punct(')'),
            ]
        );
    }

    #[test]
    fn literals_and_comments() {
        assert_eq!(
            tokens("Column('varchar', { length: 255, /* max */ name: \"it's\" }) // trailing"),
            vec![
                Token::Ident("Column"),
                Token::Punct('('),
                Token::Str("varchar"),
                Token::Punct(','),
                Token::Punct('{'),
                Token::Ident("length"),
                Token::Punct(':'),
                Token::Number("255"),
                Token::Punct(','),
                Token::Ident("name"),
                Token::Punct(':'),
                Token::Str("it's"),
                Token::Punct('}'),
                Token::Punct(')'),
            ]
        );
    }

    #[test]
    fn spans_cover_source() {
        let src = "a => b";
        let spans = tokenize(src).unwrap();
        assert_eq!(&src[spans[1].start..spans[1].end], "=>");
        assert_eq!(&src[spans[2].start..spans[2].end], "b");
    }

    #[test]
    fn unterminated_string() {
        assert_eq!(
            tokenize("Column('varchar)"),
            Err(LexError {
                offset: 7,
                message: "unterminated string literal",
            })
        );
    }
}
