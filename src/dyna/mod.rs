pub mod ast;
pub mod error;
pub mod layout;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod print;
pub mod scanner;
pub mod table;

pub use error::{DynaError, DynaResult};
pub use lexer::{ScanError, ScanResult};
pub use scanner::scan;

/// Parse a whole string as a single type.
pub fn parse_type(s: &str) -> ScanResult<ast::TypeExpr> {
    let mut p = parser::Parser::new(s)?;
    let ty = p.parse_type()?;
    p.finish()?;
    Ok(ty)
}

/// Parse a whole string as a call signature, e.g. `[A](x: A, y: *Integer=0): A`.
pub fn parse_signature(s: &str) -> ScanResult<ast::Signature> {
    let mut p = parser::Parser::new(s)?;
    let sig = p.parse_call_signature()?;
    p.finish()?;
    Ok(sig)
}
