use std::collections::HashMap;

use log::debug;
use once_cell::sync::Lazy;

use super::ast::*;
use super::error::{DynaError, DynaResult};
use super::lexer::{ScanError, TokenKind};
use super::parser::Parser;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockKind {
    Package,
    Embedded,
    Class,
    Native,
    Enum,
    Bootstrap,
    Constructor,
    Method,
    Define,
    Var,
}

static BLOCK_KINDS: Lazy<HashMap<&'static str, BlockKind>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("package", BlockKind::Package);
    m.insert("embedded", BlockKind::Embedded);
    m.insert("class", BlockKind::Class);
    m.insert("native", BlockKind::Native);
    m.insert("enum", BlockKind::Enum);
    m.insert("bootstrap", BlockKind::Bootstrap);
    m.insert("constructor", BlockKind::Constructor);
    m.insert("method", BlockKind::Method);
    m.insert("define", BlockKind::Define);
    m.insert("var", BlockKind::Var);
    m
});

/// The raw body of one `/** ... */` comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block<'a> {
    /// line number of the first body line
    pub line: usize,
    pub lines: Vec<&'a str>,
}

/// Collect every `/** ... */` and `/*+ ... +*/` region. The markers must sit
/// on lines of their own.
pub fn blocks(source: &str) -> DynaResult<Vec<Block<'_>>> {
    let mut blocks = vec![];
    let mut lines = source.lines().enumerate();
    while let Some((i, line)) = lines.next() {
        let close = match line.trim_end() {
            "/**" => "*/",
            "/*+" => "+*/",
            _ => continue,
        };

        let mut body = vec![];
        loop {
            let Some((_, line)) = lines.next() else {
                return Err(DynaError::Unterminated { line: i + 1 });
            };
            if line.trim_end() == close {
                break;
            }
            body.push(line);
        }
        blocks.push(Block { line: i + 2, lines: body });
    }
    Ok(blocks)
}

/// Names pulled in by `#include` lines, quoted or angled.
pub fn includes(source: &str) -> Vec<&str> {
    source
        .lines()
        .filter_map(|line| {
            let rest = line.trim_start().strip_prefix("#include")?.trim();
            let (name, _) = rest
                .strip_prefix('"')
                .and_then(|r| r.split_once('"'))
                .or_else(|| rest.strip_prefix('<').and_then(|r| r.split_once('>')))?;
            Some(name)
        })
        .collect()
}

/// Scanning state carried from one block to the next. The open container is
/// always the last one in `package.decls`.
#[derive(Debug, Default)]
struct Cursor {
    package: Option<Package>,
}

impl Cursor {
    fn package(&mut self, line: usize, keyword: &str) -> DynaResult<&mut Package> {
        self.package.as_mut().ok_or_else(|| DynaError::MissingContext {
            line,
            keyword: keyword.to_string(),
            needs: "a 'package' block".to_string(),
        })
    }

    /// Containers may open before any package block. They then belong to the
    /// implicit `builtin` package.
    fn open(&mut self, container: Container) {
        self.package
            .get_or_insert_with(|| Package { name: "builtin".to_string(), ..Package::default() })
            .decls
            .push(container);
    }

    fn container(&mut self, line: usize, keyword: &str) -> DynaResult<&mut Container> {
        self.package(line, keyword)?.decls.last_mut().ok_or_else(|| DynaError::MissingContext {
            line,
            keyword: keyword.to_string(),
            needs: "a class, enum, native, or bootstrap block".to_string(),
        })
    }
}

struct Header<'a, 'b> {
    line: usize,
    keyword: &'static str,
    args: &'b str,
    rest: &'b [&'a str],
}

impl Header<'_, '_> {
    fn scan_err(&self) -> impl Fn(ScanError) -> DynaError {
        let line = self.line;
        move |source| DynaError::Scan { line, source }
    }

    fn malformed(&self, reason: &str) -> DynaError {
        DynaError::MalformedHeader {
            line: self.line,
            keyword: self.keyword.to_string(),
            reason: reason.to_string(),
        }
    }

    fn doc(&self) -> String {
        doc(self.rest)
    }

    /// Close off the `<keyword> <name>` part of a header. Anything left over
    /// means the header has the wrong shape.
    fn end_of_name(&self, p: &mut Parser) -> DynaResult<()> {
        p.finish().map_err(|e| match e {
            ScanError::Unexpected { found, .. } => self.malformed(&format!("unexpected '{found}' after the name")),
            e => DynaError::Scan { line: self.line, source: e },
        })
    }
}

fn doc(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (s, ""),
    }
}

/// Join lines into the header until its brackets balance, so long argument
/// lists can wrap. Brackets inside a quoted default do not count. Returns the
/// header and the lines after it.
fn split_header<'a, 'b>(lines: &'b [&'a str]) -> (String, &'b [&'a str]) {
    let mut header = String::new();
    let mut depth = 0i32;
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            header.push(' ');
        }
        header.push_str(line.trim());
        let mut in_string = false;
        for c in line.chars() {
            match c {
                '"' => in_string = !in_string,
                _ if in_string => {}
                '(' | '[' => depth += 1,
                ')' | ']' => depth -= 1,
                _ => {}
            }
        }
        if depth <= 0 {
            return (header, &lines[i + 1..]);
        }
    }
    (header, &[])
}

fn generics_marker(generics: &[String]) -> String {
    if generics.is_empty() {
        return String::new();
    }
    format!("[{}]", generics.join(","))
}

/// Parse the annotation comments of one source file into its declaration tree.
pub fn scan(source: &str) -> DynaResult<Package> {
    let mut cursor = Cursor::default();
    for block in blocks(source)? {
        scan_block(&mut cursor, &block)?;
    }

    cursor.package.ok_or_else(|| DynaError::MissingContext {
        line: source.lines().count(),
        keyword: "end of file".to_string(),
        needs: "a 'package' block".to_string(),
    })
}

fn scan_block(cursor: &mut Cursor, block: &Block) -> DynaResult<()> {
    let (header, rest) = split_header(&block.lines);
    let (word, args) = split_word(&header);
    let Some((&keyword, &kind)) = BLOCK_KINDS.get_key_value(word) else {
        debug!("line {}: skipping comment starting with '{word}'", block.line);
        return Ok(());
    };
    debug!("line {}: {keyword} block", block.line);

    let h = Header { line: block.line, keyword, args, rest };
    match kind {
        BlockKind::Package => scan_package(cursor, &h, false),
        BlockKind::Embedded => scan_package(cursor, &h, true),
        BlockKind::Class => scan_class(cursor, &h, false),
        BlockKind::Native => scan_class(cursor, &h, true),
        BlockKind::Enum => scan_enum(cursor, &h),
        BlockKind::Bootstrap => scan_bootstrap(cursor, &h),
        BlockKind::Constructor => scan_constructor(cursor, &h),
        BlockKind::Method => scan_callable(cursor, &h, false),
        BlockKind::Define => scan_callable(cursor, &h, true),
        BlockKind::Var => scan_var(cursor, &h),
    }
}

fn parse_name(h: &Header, s: &str) -> DynaResult<String> {
    let mut p = Parser::new(s).map_err(h.scan_err())?;
    let name = p.lexer().expect_identifier().map_err(h.scan_err())?.to_string();
    h.end_of_name(&mut p)?;
    Ok(name)
}

fn scan_package(cursor: &mut Cursor, h: &Header, is_embedded: bool) -> DynaResult<()> {
    if h.args.is_empty() {
        return Err(h.malformed("expected a package name"));
    }
    let name = parse_name(h, h.args)?;
    if let Some(existing) = &cursor.package {
        return Err(h.malformed(&format!("'{name}' follows package '{}'", existing.name)));
    }
    cursor.package = Some(Package {
        name,
        doc: h.doc(),
        is_embedded,
        ..Package::default()
    });
    Ok(())
}

fn scan_property(h: &Header, line: &str) -> DynaResult<Property> {
    let (first, after) = split_word(line);
    let (scope, after) = match Scope::from_keyword(first) {
        Some(scope) => (scope, after),
        None => (Scope::Public, line.trim_start()),
    };
    let (var, after) = split_word(after);
    let Some(body) = after.strip_prefix('@').filter(|_| var == "var") else {
        return Err(h.malformed("properties are written '[scope] var @name: Type'"));
    };

    let mut p = Parser::new(body).map_err(h.scan_err())?;
    let name = p.lexer().expect_identifier().map_err(h.scan_err())?.to_string();
    p.lexer().expect(TokenKind::Colon).map_err(h.scan_err())?;
    let ty = p.parse_type().map_err(h.scan_err())?;
    p.finish().map_err(h.scan_err())?;
    Ok(Property { scope, name, ty })
}

fn is_property_line(line: &str) -> bool {
    let (first, _) = split_word(line);
    first == "var" || Scope::from_keyword(first).is_some()
}

fn scan_class(cursor: &mut Cursor, h: &Header, native: bool) -> DynaResult<()> {
    if h.args.is_empty() {
        return Err(h.malformed("expected a class name"));
    }
    let (decl, parent) = match h.args.split_once('<') {
        Some((decl, parent)) => (decl, Some(parse_name(h, parent)?)),
        None => (h.args, None),
    };

    let mut p = Parser::new(decl).map_err(h.scan_err())?;
    let name = p.lexer().expect_identifier().map_err(h.scan_err())?.to_string();
    let type_params = if p.lexer().test_next_is(TokenKind::LBracket) {
        generics_marker(&p.parse_generics().map_err(h.scan_err())?)
    } else {
        String::new()
    };
    h.end_of_name(&mut p)?;

    let (properties, doc_lines) = if native {
        let count = h.rest.iter().take_while(|l| !is_blank(l) && is_property_line(l)).count();
        let properties = h.rest[..count].iter().map(|l| scan_property(h, l)).collect::<DynaResult<Vec<_>>>()?;
        (properties, &h.rest[count..])
    } else {
        (vec![], h.rest)
    };

    let class = Class {
        name,
        type_params,
        parent,
        doc: doc(doc_lines),
        entries: vec![],
        properties,
    };
    let container = if native { Container::Native(class) } else { Container::Class(class) };
    cursor.open(container);
    Ok(())
}

fn scan_enum(cursor: &mut Cursor, h: &Header) -> DynaResult<()> {
    if h.args.is_empty() {
        return Err(h.malformed("expected an enum name"));
    }
    let mut p = Parser::new(h.args).map_err(h.scan_err())?;
    let name = p.lexer().expect_identifier().map_err(h.scan_err())?.to_string();
    let proto = if p.lexer().test_next_is(TokenKind::LBracket) {
        generics_marker(&p.parse_generics().map_err(h.scan_err())?)
    } else {
        String::new()
    };
    h.end_of_name(&mut p)?;

    let count = h.rest.iter().take_while(|l| !is_blank(l)).count();
    let mut variants = vec![];
    for line in &h.rest[..count] {
        let line = line.trim().trim_end_matches(',');
        let mut p = Parser::new(line).map_err(h.scan_err())?;
        let (name, args) = p.parse_variant().map_err(h.scan_err())?;
        p.finish().map_err(h.scan_err())?;

        let proto = if args.is_empty() {
            String::new()
        } else {
            let args: Vec<String> = args.iter().map(TypeExpr::to_string).collect();
            format!("({})", args.join(","))
        };
        variants.push(Variant { name, proto });
    }

    let e = Enum {
        name,
        proto,
        doc: doc(&h.rest[count..]),
        variants,
        entries: vec![],
    };
    cursor.open(Container::Enum(e));
    Ok(())
}

fn scan_bootstrap(cursor: &mut Cursor, h: &Header) -> DynaResult<()> {
    if h.args.is_empty() {
        return Err(h.malformed("expected a class name"));
    }
    let mut p = Parser::new(h.args).map_err(h.scan_err())?;
    let name = p.lexer().expect_identifier().map_err(h.scan_err())?.to_string();
    let sig = p.parse_call_signature().map_err(h.scan_err())?;
    p.finish().map_err(h.scan_err())?;

    let b = Bootstrap { name, sig, doc: h.doc(), entries: vec![] };
    cursor.open(Container::Bootstrap(b));
    Ok(())
}

fn scan_constructor(cursor: &mut Cursor, h: &Header) -> DynaResult<()> {
    if h.args.is_empty() {
        return Err(h.malformed("expected the name of the class being built"));
    }
    let mut p = Parser::new(h.args).map_err(h.scan_err())?;
    let name = p.lexer().expect_identifier().map_err(h.scan_err())?.to_string();
    let sig = p.parse_call_signature().map_err(h.scan_err())?;
    p.finish().map_err(h.scan_err())?;

    let container = cursor.container(h.line, h.keyword)?;
    if matches!(container, Container::Enum(_)) || container.name() != name {
        return Err(DynaError::MissingContext {
            line: h.line,
            keyword: h.keyword.to_string(),
            needs: format!("a class named '{name}'"),
        });
    }
    container.entries_mut().push(Entry::Constructor(Callable { name, sig, doc: h.doc() }));
    Ok(())
}

/// `method [Class.]name sig` and `define [Class.]name sig`. A define without a
/// class qualifier is a toplevel function, everything else is a method of the
/// open container.
fn scan_callable(cursor: &mut Cursor, h: &Header, is_define: bool) -> DynaResult<()> {
    if h.args.is_empty() {
        return Err(h.malformed("expected a function name"));
    }
    let mut p = Parser::new(h.args).map_err(h.scan_err())?;
    let first = p.lexer().expect_identifier().map_err(h.scan_err())?.to_string();
    let (qualifier, name) = if p.lexer().test_next_is(TokenKind::Dot) {
        p.lexer().advance().map_err(h.scan_err())?;
        let name = p.lexer().expect_identifier().map_err(h.scan_err())?.to_string();
        (Some(first), name)
    } else {
        (None, first)
    };
    let sig = p.parse_call_signature().map_err(h.scan_err())?;
    p.finish().map_err(h.scan_err())?;

    let callable = Callable { name, sig, doc: h.doc() };
    if is_define && qualifier.is_none() {
        cursor.package(h.line, h.keyword)?.toplevel.push(Toplevel::Define(callable));
        return Ok(());
    }

    let container = cursor.container(h.line, h.keyword)?;
    if let Some(q) = qualifier.filter(|q| q != container.name()) {
        return Err(DynaError::MissingContext {
            line: h.line,
            keyword: h.keyword.to_string(),
            needs: format!("a class named '{q}'"),
        });
    }
    container.entries_mut().push(Entry::Method(callable));
    Ok(())
}

fn scan_var(cursor: &mut Cursor, h: &Header) -> DynaResult<()> {
    if h.args.is_empty() {
        return Err(h.malformed("expected 'name: Type'"));
    }
    let mut p = Parser::new(h.args).map_err(h.scan_err())?;
    let name = p.lexer().expect_identifier().map_err(h.scan_err())?.to_string();
    p.lexer().expect(TokenKind::Colon).map_err(h.scan_err())?;
    let ty = p.parse_type().map_err(h.scan_err())?;
    p.finish().map_err(h.scan_err())?;

    let var = Var { name, ty, doc: h.doc() };
    cursor.package(h.line, h.keyword)?.toplevel.push(Toplevel::Var(var));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dyna::print::Clean;

    fn class(s: &str) -> TypeExpr {
        TypeExpr::Class(s.to_string())
    }

    #[test]
    fn scan_class_with_doc() -> DynaResult<()> {
        let pkg = scan("/**\npackage box\n*/\n/**\nclass Box\nA simple box.\n*/\n")?;
        let Container::Class(c) = &pkg.decls[0] else { panic!("expected a class") };
        assert_eq!(c.name, "Box");
        assert_eq!(c.doc, "A simple box.");
        assert!(c.entries.is_empty());
        Ok(())
    }

    #[test]
    fn unrelated_text_is_ignored() -> DynaResult<()> {
        let src = "#include <stdio.h>\n/* plain */\n/**\npackage p\n*/\nint main() { return 0; }\n/**\nflower box\n*/\n";
        let pkg = scan(src)?;
        assert_eq!(pkg.name, "p");
        assert!(pkg.decls.is_empty() && pkg.toplevel.is_empty());
        Ok(())
    }

    #[test]
    fn native_with_properties_and_parent() -> DynaResult<()> {
        let src = "/**\npackage p\n*/\n/**\nnative Tainted[A] < Base\n    private var @value: A\n    var @count: Integer\n\nWraps data.\n*/\n";
        let pkg = scan(src)?;
        let Container::Native(n) = &pkg.decls[0] else { panic!("expected a native") };
        assert_eq!(n.type_params, "[A]");
        assert_eq!(n.parent.as_deref(), Some("Base"));
        assert_eq!(n.properties, vec![
            Property { scope: Scope::Private, name: "value".to_string(), ty: class("A") },
            Property { scope: Scope::Public, name: "count".to_string(), ty: class("Integer") },
        ]);
        assert_eq!(n.doc, "Wraps data.");
        Ok(())
    }

    #[test]
    fn enum_variants_stop_at_blank_line() -> DynaResult<()> {
        let src = "/**\npackage p\n*/\n/**\nenum Option[A]\n    Some(A),\n    None\n\nAn optional value.\n*/\n";
        let pkg = scan(src)?;
        let Container::Enum(e) = &pkg.decls[0] else { panic!("expected an enum") };
        assert_eq!(e.proto, "[A]");
        assert_eq!(e.variants, vec![
            Variant { name: "Some".to_string(), proto: "(A)".to_string() },
            Variant { name: "None".to_string(), proto: String::new() },
        ]);
        assert_eq!(e.doc, "An optional value.");
        Ok(())
    }

    #[test]
    fn methods_attach_to_open_container() -> DynaResult<()> {
        let src = "/**\npackage p\n*/\n/**\nnative Tainted[A]\n*/\n/**\nconstructor Tainted[A](self: A): Tainted[A]\n*/\n/**\nmethod Tainted.sanitize[A, B](self: Tainted[A], fn: Function(A => B)): B\n*/\n/**\ndefine Tainted.peek: A\n*/\n";
        let pkg = scan(src)?;
        let entries = pkg.decls[0].entries();
        assert_eq!(entries.len(), 3);
        assert!(matches!(&entries[0], Entry::Constructor(c) if c.name == "Tainted"));
        assert!(matches!(&entries[1], Entry::Method(c) if c.name == "sanitize"));
        assert!(matches!(&entries[2], Entry::Method(c) if c.name == "peek"));
        assert!(pkg.toplevel.is_empty());
        Ok(())
    }

    #[test]
    fn multi_line_header() -> DynaResult<()> {
        let src = "/**\npackage p\n*/\n/**\ndefine wide(a: Integer,\n           b: String): Boolean\n\nWide.\n*/\n";
        let pkg = scan(src)?;
        let Toplevel::Define(d) = &pkg.toplevel[0] else { panic!("expected a define") };
        assert_eq!(Clean(&d.sig).to_string(), "(Integer,String):Boolean");
        assert_eq!(d.doc, "Wide.");
        Ok(())
    }

    #[test]
    fn method_needs_container() {
        let err = scan("/**\npackage p\n*/\n/**\nmethod Box.open\n*/\n").unwrap_err();
        assert!(matches!(err, DynaError::MissingContext { line: 5, .. }));
    }

    #[test]
    fn method_qualifier_must_match() {
        let err = scan("/**\npackage p\n*/\n/**\nclass Box\n*/\n/**\nmethod Bag.open\n*/\n").unwrap_err();
        assert!(matches!(err, DynaError::MissingContext { .. }));
    }

    #[test]
    fn var_needs_package() {
        let err = scan("/**\nvar x: Integer\n*/\n").unwrap_err();
        assert!(matches!(err, DynaError::MissingContext { line: 2, .. }));
    }

    #[test]
    fn containers_open_builtin() -> DynaResult<()> {
        let pkg = scan("/**\nclass Box\nA simple box.\n*/\n")?;
        assert!(pkg.is_builtin());
        assert_eq!(pkg.decls[0].doc(), "A simple box.");
        assert!(scan("/**\nclass Box\n*/\n/**\npackage late\n*/\n").is_err());
        Ok(())
    }

    #[test]
    fn file_needs_package() {
        assert!(matches!(scan("int x;\n"), Err(DynaError::MissingContext { .. })));
    }

    #[test]
    fn class_without_name() {
        let err = scan("/**\npackage p\n*/\n/**\nclass\n*/\n").unwrap_err();
        assert!(matches!(err, DynaError::MalformedHeader { .. }));
    }

    #[test]
    fn bracket_inside_string_default() -> DynaResult<()> {
        let pkg = scan("/**\npackage p\n*/\n/**\ndefine f(a: *String=\"(\")\nDoc.\n*/\n")?;
        let Toplevel::Define(d) = &pkg.toplevel[0] else { panic!("expected a define") };
        assert_eq!(Clean(&d.sig).to_string(), "(*String)");
        assert_eq!(d.doc, "Doc.");
        assert!(matches!(&d.sig.args[0], Arg::Named { default: Some(v), .. } if v == "\"(\""));
        Ok(())
    }

    #[test]
    fn extra_words_after_a_name() {
        for src in [
            "/**\npackage p\n*/\n/**\nclass Box Bag\n*/\n",
            "/**\npackage p\n*/\n/**\nenum Color Red\n*/\n",
            "/**\npackage p q\n*/\n",
        ] {
            let err = scan(src).unwrap_err();
            assert!(matches!(err, DynaError::MalformedHeader { ref reason, .. } if reason.contains("after the name")), "{src:?} gave {err:?}");
        }
        assert!(matches!(scan("/**\npackage p\n*/\n/**\nclass Box ;\n*/\n"), Err(DynaError::Scan { .. })));
    }

    #[test]
    fn second_package_rejected() {
        let err = scan("/**\npackage p\n*/\n/**\npackage q\n*/\n").unwrap_err();
        assert!(matches!(err, DynaError::MalformedHeader { .. }));
    }

    #[test]
    fn unterminated_block() {
        assert_eq!(scan("/**\npackage p\n").unwrap_err(), DynaError::Unterminated { line: 1 });
    }

    #[test]
    fn plus_blocks() -> DynaResult<()> {
        let pkg = scan("/*+\nembedded server\n+*/\n")?;
        assert!(pkg.is_embedded);
        Ok(())
    }

    #[test]
    fn find_includes() {
        let src = "#include \"dyna_server.h\"\n  #include <stdio.h>\nint x;\n";
        assert_eq!(includes(src), vec!["dyna_server.h", "stdio.h"]);
    }
}
