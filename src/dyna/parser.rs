use super::ast::{Arg, Signature, TypeExpr};
use super::lexer::{Lexer, ScanResult, TokenKind};

#[derive(Debug)]
pub struct Parser<'input> {
    lexer: Lexer<'input>,
}

impl<'input> Parser<'input> {
    pub fn new(input: &'input str) -> ScanResult<Self> {
        Ok(Self { lexer: Lexer::new(input)? })
    }

    pub fn lexer(&mut self) -> &mut Lexer<'input> {
        &mut self.lexer
    }

    /// Fail unless the whole input has been consumed.
    pub fn finish(&mut self) -> ScanResult<()> {
        self.lexer.expect(TokenKind::End).map(|_| ())
    }

    fn parse_separated<T>(&mut self, mut parse_fn: impl FnMut(&mut Self) -> ScanResult<T>, end: TokenKind) -> ScanResult<Vec<T>> {
        let mut v = vec![parse_fn(self)?];
        while self.lexer.test_next_is(TokenKind::Comma) {
            self.lexer.advance()?;
            v.push(parse_fn(self)?);
        }
        if !self.lexer.test_next_is(end) {
            return Err(self.lexer.unexpected(&format!("',' or {}", end.describe())));
        }
        self.lexer.advance()?;
        Ok(v)
    }

    pub fn parse_type(&mut self) -> ScanResult<TypeExpr> {
        let name = self.lexer.expect_identifier()?;
        match self.lexer.peek() {
            TokenKind::LBracket => {
                self.lexer.advance()?;
                let params = self.parse_separated(Self::parse_type, TokenKind::RBracket)?;
                Ok(TypeExpr::Generic(name.to_string(), params))
            }
            TokenKind::LParen => {
                self.lexer.advance()?;
                let args = if !self.lexer.test_next_is(TokenKind::Arrow) && !self.lexer.test_next_is(TokenKind::RParen) {
                    self.parse_nameless_args()?
                } else {
                    vec![]
                };

                let ret = if self.lexer.test_next_is(TokenKind::Arrow) {
                    self.lexer.advance()?;
                    Some(Box::new(self.parse_type()?))
                } else {
                    None
                };
                self.lexer.expect(TokenKind::RParen)?;
                Ok(TypeExpr::Function(args, ret))
            }
            _ => Ok(TypeExpr::Class(name.to_string())),
        }
    }

    fn parse_nameless_arg(&mut self) -> ScanResult<TypeExpr> {
        if self.lexer.test_next_is(TokenKind::Star) {
            self.lexer.advance()?;
            return Ok(TypeExpr::Optional(Box::new(self.parse_type()?)));
        }

        let ty = self.parse_type()?;
        if self.lexer.test_next_is(TokenKind::Ellipsis) {
            self.lexer.advance()?;
            return Ok(TypeExpr::Variadic(Box::new(ty)));
        }
        Ok(ty)
    }

    /// A comma separated run of nameless arguments, stopping at the first
    /// token that is not a comma. Only the last one may be variadic.
    fn parse_nameless_args(&mut self) -> ScanResult<Vec<TypeExpr>> {
        let mut args = vec![];
        loop {
            let arg = self.parse_nameless_arg()?;
            let variadic = matches!(arg, TypeExpr::Variadic(_));
            args.push(arg);
            if !self.lexer.test_next_is(TokenKind::Comma) {
                return Ok(args);
            }
            if variadic {
                return Err(self.lexer.unexpected("')' after a variadic argument"));
            }
            self.lexer.advance()?;
        }
    }

    /// An enum variant line: `Name` or `Name(Type, ...)`.
    pub fn parse_variant(&mut self) -> ScanResult<(String, Vec<TypeExpr>)> {
        let name = self.lexer.expect_identifier()?.to_string();
        if !self.lexer.test_next_is(TokenKind::LParen) {
            return Ok((name, vec![]));
        }
        self.lexer.advance()?;
        let args = self.parse_nameless_args()?;
        self.lexer.expect(TokenKind::RParen)?;
        Ok((name, args))
    }

    fn parse_named_arg(&mut self) -> ScanResult<Arg> {
        let name = self.lexer.expect_identifier()?;
        if name == "self" && !self.lexer.test_next_is(TokenKind::Colon) {
            return Ok(Arg::SelfArg);
        }

        self.lexer.expect(TokenKind::Colon)?;
        let ty = self.parse_nameless_arg()?;
        let default = match (&ty, self.lexer.peek()) {
            (TypeExpr::Optional(_), TokenKind::Default) => Some(self.lexer.advance()?.text.to_string()),
            (_, TokenKind::Default) => return Err(self.lexer.unexpected("',' or ')' (only optional arguments take a default)")),
            _ => None,
        };
        Ok(Arg::Named { name: name.to_string(), ty, default })
    }

    /// `[A, B]`, the generic names of a signature or declaration.
    pub fn parse_generics(&mut self) -> ScanResult<Vec<String>> {
        self.lexer.expect(TokenKind::LBracket)?;
        self.parse_separated(|p| p.lexer.expect_identifier().map(str::to_string), TokenKind::RBracket)
    }

    /// `[A](name: Type, ...): Ret`, where every part is optional. The return
    /// may also be written inside the parentheses as `=> Ret`.
    pub fn parse_call_signature(&mut self) -> ScanResult<Signature> {
        let generics = if self.lexer.test_next_is(TokenKind::LBracket) {
            self.parse_generics()?
        } else {
            vec![]
        };

        let mut args = vec![];
        let mut ret = None;
        if self.lexer.test_next_is(TokenKind::LParen) {
            self.lexer.advance()?;
            if self.lexer.test_next_is(TokenKind::RParen) {
                return Err(self.lexer.unexpected("an argument (drop the empty '()')"));
            }

            loop {
                let arg = self.parse_named_arg()?;
                let variadic = matches!(arg, Arg::Named { ty: TypeExpr::Variadic(_), .. });
                args.push(arg);
                match self.lexer.peek() {
                    TokenKind::Comma if variadic => {
                        return Err(self.lexer.unexpected("')' after a variadic argument"));
                    }
                    TokenKind::Comma => {
                        self.lexer.advance()?;
                    }
                    TokenKind::Arrow => {
                        self.lexer.advance()?;
                        ret = Some(self.parse_type()?);
                        self.lexer.expect(TokenKind::RParen)?;
                        break;
                    }
                    TokenKind::RParen => {
                        self.lexer.advance()?;
                        break;
                    }
                    _ => return Err(self.lexer.unexpected("',' or ')'")),
                }
            }
        }

        if self.lexer.test_next_is(TokenKind::Colon) {
            if ret.is_some() {
                return Err(self.lexer.unexpected("end of input (return type given twice)"));
            }
            self.lexer.advance()?;
            ret = Some(self.parse_type()?);
        }

        Ok(Signature { generics, args, ret })
    }
}
