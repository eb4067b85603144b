//! Formula tokenizer

use sheetsql_model::ErrorCode;

use super::EvalError;

/// Formula tokens
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    /// Function names, cell references, booleans and unquoted sheet names
    Ident(String),
    /// `'My Sheet'`
    QuotedSheet(String),
    Error(ErrorCode),
    Bang,
    Colon,
    Comma,
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Amp,
    Percent,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Eof,
}

/// A token and the character offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

fn syntax(position: usize, message: impl Into<String>) -> EvalError {
    EvalError::Syntax {
        position,
        message: message.into(),
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '$')
}

/// Split a formula (without the leading `=`) into tokens
pub fn tokenize(formula: &str) -> Result<Vec<Spanned>, EvalError> {
    let chars: Vec<char> = formula.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let token = match c {
            '0'..='9' | '.' => {
                let (value, next) = lex_number(&chars, i)?;
                i = next;
                Token::Number(value)
            }
            '"' => {
                let (text, next) = lex_quoted(&chars, i, '"')?;
                i = next;
                Token::Str(text)
            }
            '\'' => {
                let (text, next) = lex_quoted(&chars, i, '\'')?;
                i = next;
                Token::QuotedSheet(text)
            }
            '#' => {
                let rest: String = chars[i..].iter().collect::<String>().to_ascii_uppercase();
                let code = ErrorCode::ALL
                    .into_iter()
                    .filter(|code| rest.starts_with(code.as_str()))
                    .max_by_key(|code| code.as_str().len())
                    .ok_or_else(|| syntax(i, "unknown error literal"))?;
                i += code.as_str().chars().count();
                Token::Error(code)
            }
            '<' => match chars.get(i + 1) {
                Some('=') => {
                    i += 2;
                    Token::Le
                }
                Some('>') => {
                    i += 2;
                    Token::Ne
                }
                _ => {
                    i += 1;
                    Token::Lt
                }
            },
            '>' => match chars.get(i + 1) {
                Some('=') => {
                    i += 2;
                    Token::Ge
                }
                _ => {
                    i += 1;
                    Token::Gt
                }
            },
            c if is_ident_char(c) => {
                let mut end = i;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                let ident: String = chars[i..end].iter().collect();
                i = end;
                Token::Ident(ident)
            }
            other => {
                let token = match other {
                    '!' => Token::Bang,
                    ':' => Token::Colon,
                    ',' => Token::Comma,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '^' => Token::Caret,
                    '&' => Token::Amp,
                    '%' => Token::Percent,
                    '=' => Token::Eq,
                    _ => return Err(syntax(i, format!("unexpected character '{}'", other))),
                };
                i += 1;
                token
            }
        };

        tokens.push(Spanned {
            token,
            position: start,
        });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        position: chars.len(),
    });
    Ok(tokens)
}

fn lex_number(chars: &[char], start: usize) -> Result<(f64, usize), EvalError> {
    let mut end = start;
    while end < chars.len() && (chars[end].is_ascii_digit() || chars[end] == '.') {
        end += 1;
    }
    if end < chars.len() && matches!(chars[end], 'e' | 'E') {
        let mut exp_end = end + 1;
        if exp_end < chars.len() && matches!(chars[exp_end], '+' | '-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < chars.len() && chars[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    let text: String = chars[start..end].iter().collect();
    text.parse::<f64>()
        .map(|value| (value, end))
        .map_err(|_| syntax(start, format!("invalid number '{}'", text)))
}

/// Quoted text where a doubled quote stands for one quote character
fn lex_quoted(chars: &[char], start: usize, quote: char) -> Result<(String, usize), EvalError> {
    let mut text = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                text.push(quote);
                i += 2;
                continue;
            }
            return Ok((text, i + 1));
        }
        text.push(chars[i]);
        i += 1;
    }
    Err(syntax(start, "unterminated quoted text"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(formula: &str) -> Vec<Token> {
        tokenize(formula)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("1+2<=3<>4"),
            vec![
                Token::Number(1.0),
                Token::Plus,
                Token::Number(2.0),
                Token::Le,
                Token::Number(3.0),
                Token::Ne,
                Token::Number(4.0),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_strings_and_sheets() {
        assert_eq!(
            kinds(r#""say ""hi""" & 'My Sheet'!A1"#),
            vec![
                Token::Str("say \"hi\"".to_string()),
                Token::Amp,
                Token::QuotedSheet("My Sheet".to_string()),
                Token::Bang,
                Token::Ident("A1".to_string()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("1.5e3")[0], Token::Number(1500.0));
        assert_eq!(kinds(".25")[0], Token::Number(0.25));
    }

    #[test]
    fn test_error_literals() {
        assert_eq!(kinds("#DIV/0!")[0], Token::Error(ErrorCode::Div0));
        assert_eq!(kinds("#n/a")[0], Token::Error(ErrorCode::NA));
        assert!(tokenize("#WHAT").is_err());
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            tokenize("\"abc"),
            Err(EvalError::Syntax { position: 0, .. })
        ));
    }
}
