use std::fmt;

use super::ast::*;
use crate::write_separated;

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Class(name) => write!(f, "{name}"),
            TypeExpr::Generic(name, params) => {
                write!(f, "{name}[")?;
                write_separated(f, ",", params)?;
                write!(f, "]")
            }
            TypeExpr::Function(args, ret) => {
                write!(f, "Function(")?;
                write_separated(f, ",", args)?;
                if let Some(ret) = ret {
                    write!(f, "=>{ret}")?;
                }
                write!(f, ")")
            }
            TypeExpr::Optional(t) => write!(f, "*{t}"),
            TypeExpr::Variadic(t) => write!(f, "{t}..."),
        }
    }
}

struct CleanArg<'a>(&'a Arg);

impl fmt::Display for CleanArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Arg::SelfArg => write!(f, "self"),
            Arg::Named { ty, .. } => write!(f, "{ty}"),
        }
    }
}

/// The table form of a signature: argument names and defaults are dropped.
pub struct Clean<'a>(pub &'a Signature);

impl fmt::Display for Clean<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sig = self.0;
        if !sig.generics.is_empty() {
            write!(f, "[")?;
            write_separated(f, ",", &sig.generics)?;
            write!(f, "]")?;
        }
        if !sig.args.is_empty() {
            write!(f, "(")?;
            write_separated(f, ",", sig.args.iter().map(CleanArg))?;
            write!(f, ")")?;
        }
        if let Some(ret) = &sig.ret {
            write!(f, ":{ret}")?;
        }
        Ok(())
    }
}

struct PrettyArg<'a>(&'a Arg);

impl fmt::Display for PrettyArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Arg::SelfArg => write!(f, "self"),
            Arg::Named { name, ty, default: None } => write!(f, "{name}: {ty}"),
            Arg::Named { name, ty, default: Some(d) } => write!(f, "{name}: {ty}={d}"),
        }
    }
}

/// The human form of a signature, used for documentation.
pub struct Pretty<'a>(pub &'a Signature);

impl fmt::Display for Pretty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sig = self.0;
        if !sig.generics.is_empty() {
            write!(f, "[")?;
            write_separated(f, ", ", &sig.generics)?;
            write!(f, "]")?;
        }
        if !sig.args.is_empty() {
            write!(f, "(")?;
            write_separated(f, ", ", sig.args.iter().map(PrettyArg))?;
            write!(f, ")")?;
        }
        if let Some(ret) = &sig.ret {
            write!(f, ": {ret}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(s: &str) -> TypeExpr {
        TypeExpr::Class(s.to_string())
    }

    #[test]
    fn print_nested_type() {
        let t = TypeExpr::Generic("Hash".to_string(), vec![class("String"), TypeExpr::Generic("List".to_string(), vec![class("A")])]);
        assert_eq!(t.to_string(), "Hash[String,List[A]]");
    }

    #[test]
    fn print_function_type() {
        let t = TypeExpr::Function(vec![TypeExpr::Optional(Box::new(class("Integer"))), TypeExpr::Variadic(Box::new(class("String")))], Some(Box::new(class("Unit"))));
        assert_eq!(t.to_string(), "Function(*Integer,String...=>Unit)");
        assert_eq!(TypeExpr::Function(vec![], None).to_string(), "Function()");
    }

    #[test]
    fn clean_drops_names_and_defaults() {
        let sig = Signature {
            generics: vec!["A".to_string()],
            args: vec![
                Arg::SelfArg,
                Arg::Named { name: "start".to_string(), ty: TypeExpr::Optional(Box::new(class("Integer"))), default: Some("0".to_string()) },
            ],
            ret: Some(class("A")),
        };
        assert_eq!(Clean(&sig).to_string(), "[A](self,*Integer):A");
        assert_eq!(Pretty(&sig).to_string(), "[A](self, start: *Integer=0): A");
    }

    #[test]
    fn clean_empty_signature() {
        assert_eq!(Clean(&Signature::default()).to_string(), "");
    }
}
