#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// a letter or '_', then letters, digits, and '_'
    Ident,
    /// (
    LParen,
    /// )
    RParen,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// :
    Colon,
    /// *
    Star,
    /// ,
    Comma,
    /// .
    Dot,
    /// =>
    Arrow,
    /// ...
    Ellipsis,
    /// =value, the default of an optional argument
    Default,
    /// end of input, returned forever once reached
    End,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Ident => "a name",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Star => "'*'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Arrow => "'=>'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::Default => "a default value",
            TokenKind::End => "end of input",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'input> {
    pub pos: usize,
    pub kind: TokenKind,
    pub text: &'input str,
}

impl Token<'_> {
    fn found(&self) -> String {
        match self.kind {
            TokenKind::End => "end of input".to_string(),
            _ => self.text.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("unexpected character '{ch}' at offset {pos}")]
    BadCharacter { ch: char, pos: usize },
    #[error("expected {expected} but found '{found}' at offset {pos}")]
    Unexpected { found: String, expected: String, pos: usize },
}

pub type ScanResult<T> = Result<T, ScanError>;

/// Single-token-of-state tokenizer over a prototype string.
///
/// `current()` is the token under the cursor. `advance()` moves past it. Once
/// the input is exhausted every further token is `End`, so lookahead never runs
/// off the buffer.
#[derive(Debug)]
pub struct Lexer<'input> {
    input: &'input str,
    offset: usize,
    current: Token<'input>,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> ScanResult<Self> {
        let mut lexer = Self {
            input: "",
            offset: 0,
            current: Token { pos: 0, kind: TokenKind::End, text: "" },
        };
        lexer.reset(input)?;
        Ok(lexer)
    }

    /// Point the lexer at a new input and load its first token.
    pub fn reset(&mut self, input: &'input str) -> ScanResult<()> {
        self.input = input;
        self.offset = 0;
        self.current = self.lex()?;
        Ok(())
    }

    pub fn current(&self) -> Token<'input> {
        self.current
    }

    pub fn peek(&self) -> TokenKind {
        self.current.kind
    }

    pub fn advance(&mut self) -> ScanResult<Token<'input>> {
        let t = self.current;
        self.current = self.lex()?;
        Ok(t)
    }

    pub fn test_next_is(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consume the current token if it is a `kind`, failing otherwise.
    pub fn expect(&mut self, kind: TokenKind) -> ScanResult<Token<'input>> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    pub fn expect_identifier(&mut self) -> ScanResult<&'input str> {
        self.expect(TokenKind::Ident).map(|t| t.text)
    }

    pub fn unexpected(&self, expected: &str) -> ScanError {
        ScanError::Unexpected {
            found: self.current.found(),
            expected: expected.to_string(),
            pos: self.current.pos,
        }
    }

    fn rest(&self) -> &'input str {
        &self.input[self.offset..]
    }

    fn token(&mut self, kind: TokenKind, len: usize) -> Token<'input> {
        let pos = self.offset;
        self.offset += len;
        Token { pos, kind, text: &self.input[pos..self.offset] }
    }

    fn default_value(&mut self) -> ScanResult<Token<'input>> {
        let start = self.offset;
        let body = &self.rest()[1..];
        let len = match body.chars().next() {
            Some('"') => match body[1..].find('"') {
                Some(close) => close + 2,
                None => return Err(ScanError::BadCharacter { ch: '"', pos: start + 1 }),
            },
            Some(c) if c.is_ascii_alphanumeric() || c == '-' || c == '+' => body
                .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_')))
                .unwrap_or(body.len()),
            _ => return Err(ScanError::BadCharacter { ch: '=', pos: start }),
        };
        self.offset += 1 + len;
        Ok(Token { pos: start, kind: TokenKind::Default, text: &self.input[start + 1..self.offset] })
    }

    fn lex(&mut self) -> ScanResult<Token<'input>> {
        let skipped = self.rest().len() - self.rest().trim_start().len();
        self.offset += skipped;

        let mut chars = self.rest().chars();
        let Some(c) = chars.next() else {
            return Ok(Token { pos: self.offset, kind: TokenKind::End, text: "" });
        };

        let token = match c {
            '(' => self.token(TokenKind::LParen, 1),
            ')' => self.token(TokenKind::RParen, 1),
            '[' => self.token(TokenKind::LBracket, 1),
            ']' => self.token(TokenKind::RBracket, 1),
            ':' => self.token(TokenKind::Colon, 1),
            '*' => self.token(TokenKind::Star, 1),
            ',' => self.token(TokenKind::Comma, 1),
            '.' if self.rest().starts_with("...") => self.token(TokenKind::Ellipsis, 3),
            '.' if chars.next() != Some('.') => self.token(TokenKind::Dot, 1),
            '=' if chars.next() == Some('>') => self.token(TokenKind::Arrow, 2),
            '=' => self.default_value()?,
            c if c.is_alphabetic() || c == '_' => {
                let len = self.rest().find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(self.rest().len());
                self.token(TokenKind::Ident, len)
            }
            ch => return Err(ScanError::BadCharacter { ch, pos: self.offset }),
        };

        Ok(token)
    }

    pub fn lex_all(mut self) -> ScanResult<Vec<Token<'input>>> {
        let mut tokens = vec![];
        while self.peek() != TokenKind::End {
            tokens.push(self.advance()?);
        }
        Ok(tokens)
    }
}
