#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeExpr {
    /// Integer
    Class(String),
    /// Hash[String, Integer]
    Generic(String, Vec<TypeExpr>),
    /// Function(Integer, String => Boolean)
    Function(Vec<TypeExpr>, Option<Box<TypeExpr>>),
    /// *Integer, only as an argument
    Optional(Box<TypeExpr>),
    /// Integer..., only as the last argument
    Variadic(Box<TypeExpr>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arg {
    /// the bare `self` receiver
    SelfArg,
    Named {
        name: String,
        ty: TypeExpr,
        default: Option<String>,
    },
}

/// A parsed call signature: `[A, B](name: Type, ...): Ret`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signature {
    pub generics: Vec<String>,
    pub args: Vec<Arg>,
    pub ret: Option<TypeExpr>,
}

impl Signature {
    pub fn is_empty(&self) -> bool {
        self.generics.is_empty() && self.args.is_empty() && self.ret.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    Private,
    Protected,
    Public,
}

impl Scope {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "private" => Some(Scope::Private),
            "protected" => Some(Scope::Protected),
            "public" => Some(Scope::Public),
            _ => None,
        }
    }
}

/// A define, method, or constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Callable {
    pub name: String,
    pub sig: Signature,
    pub doc: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Var {
    pub name: String,
    pub ty: TypeExpr,
    pub doc: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub scope: Scope,
    pub name: String,
    pub ty: TypeExpr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    pub name: String,
    /// clean payload, e.g. `(Integer,String)`, empty without one
    pub proto: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    Method(Callable),
    Constructor(Callable),
}

impl Entry {
    pub fn callable(&self) -> &Callable {
        match self {
            Entry::Method(c) | Entry::Constructor(c) => c,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Class {
    pub name: String,
    /// the opaque `[A, B]` marker after the name, clean, empty if absent
    pub type_params: String,
    pub parent: Option<String>,
    pub doc: String,
    pub entries: Vec<Entry>,
    /// only ever filled for natives
    pub properties: Vec<Property>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Enum {
    pub name: String,
    pub proto: String,
    pub doc: String,
    pub variants: Vec<Variant>,
    pub entries: Vec<Entry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bootstrap {
    pub name: String,
    pub sig: Signature,
    pub doc: String,
    pub entries: Vec<Entry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Container {
    Class(Class),
    Native(Class),
    Enum(Enum),
    Bootstrap(Bootstrap),
}

impl Container {
    pub fn name(&self) -> &str {
        match self {
            Container::Class(c) | Container::Native(c) => &c.name,
            Container::Enum(e) => &e.name,
            Container::Bootstrap(b) => &b.name,
        }
    }

    pub fn doc(&self) -> &str {
        match self {
            Container::Class(c) | Container::Native(c) => &c.doc,
            Container::Enum(e) => &e.doc,
            Container::Bootstrap(b) => &b.doc,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        match self {
            Container::Class(c) | Container::Native(c) => &c.entries,
            Container::Enum(e) => &e.entries,
            Container::Bootstrap(b) => &b.entries,
        }
    }

    pub fn entries_mut(&mut self) -> &mut Vec<Entry> {
        match self {
            Container::Class(c) | Container::Native(c) => &mut c.entries,
            Container::Enum(e) => &mut e.entries,
            Container::Bootstrap(b) => &mut b.entries,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Container::Class(_) => "class",
            Container::Native(_) => "native",
            Container::Enum(_) => "enum",
            Container::Bootstrap(_) => "bootstrap",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Toplevel {
    Define(Callable),
    Var(Var),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub doc: String,
    pub is_embedded: bool,
    pub toplevel: Vec<Toplevel>,
    pub decls: Vec<Container>,
}

impl Package {
    /// The builtin package's container ids are fixed by the interpreter.
    pub fn is_builtin(&self) -> bool {
        self.name == "builtin"
    }

    /// Whether anything in this package needs a loader arm. Native properties
    /// only count when they are dispatched.
    pub fn need_loader(&self, dispatch_properties: bool) -> bool {
        !self.toplevel.is_empty()
            || self.decls.iter().any(|d| match d {
                Container::Native(n) if dispatch_properties => !n.entries.is_empty() || !n.properties.is_empty(),
                _ => !d.entries().is_empty(),
            })
    }

    pub fn has_natives(&self) -> bool {
        self.decls.iter().any(|d| matches!(d, Container::Native(_)))
    }
}
