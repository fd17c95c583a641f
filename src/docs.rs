//! HTML documentation for a scanned package.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dyna::ast::*;
use crate::dyna::print::Pretty;

static TYPE_MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(\S+)`").unwrap());
static VAR_MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(\S+)'").unwrap());

pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Escape doc text and apply its light markup: `` `X` `` is a type, `'y'` is a
/// name, and a blank line becomes a break.
pub fn doc_as_html(doc: &str) -> String {
    let doc = escape(doc);
    let doc = TYPE_MARK.replace_all(&doc, r#"<span class="type">$1</span>"#);
    let doc = VAR_MARK.replace_all(&doc, r#"<span class="varname">$1</span>"#);
    doc.replace("\n\n", "\n<br />\n")
}

fn write_callable<W: fmt::Write>(w: &mut W, name: &str, c: &Callable) -> fmt::Result {
    let sig = escape(&Pretty(&c.sig).to_string());
    writeln!(w, r#"<span class="funcname">{name}</span><span><strong>{sig}</strong></span>"#)?;
    writeln!(w, r#"<div class="explain">{}</div>"#, doc_as_html(&c.doc))
}

fn write_var<W: fmt::Write>(w: &mut W, name: &str, ty: &TypeExpr, doc: &str) -> fmt::Result {
    let ty = escape(&ty.to_string());
    writeln!(w, r#"<span class="varname">{name}</span><span>:</span><span class="type">{ty}</span>"#)?;
    writeln!(w, r#"<div class="explain">{}</div>"#, doc_as_html(doc))
}

fn write_container<W: fmt::Write>(w: &mut W, c: &Container) -> fmt::Result {
    writeln!(w, "<h3>{}</h3>", c.name())?;
    if let Container::Bootstrap(b) = c {
        let sig = escape(&Pretty(&b.sig).to_string());
        writeln!(w, r#"<span class="funcname">{}</span><span><strong>{sig}</strong></span>"#, b.name)?;
    }
    writeln!(w, "<p>{}</p>", doc_as_html(c.doc()))?;

    match c {
        Container::Enum(e) => {
            for v in &e.variants {
                writeln!(w, r#"<span class="funcname">{}</span><span>{}</span>"#, v.name, escape(&v.proto))?;
            }
        }
        Container::Native(n) => {
            for p in &n.properties {
                write_var(w, &format!("@{}", p.name), &p.ty, "")?;
            }
        }
        Container::Class(_) | Container::Bootstrap(_) => {}
    }

    for entry in c.entries() {
        match entry {
            Entry::Method(m) => write_callable(w, &format!("{}.{}", c.name(), m.name), m)?,
            Entry::Constructor(m) => write_callable(w, &format!("{}.new", m.name), m)?,
        }
    }
    Ok(())
}

pub fn write_docs<W: fmt::Write>(w: &mut W, package: &Package) -> fmt::Result {
    writeln!(w, "<h1>{}</h1>", package.name)?;
    writeln!(w, "<p>{}</p>", doc_as_html(&package.doc))?;

    for t in &package.toplevel {
        writeln!(w)?;
        match t {
            Toplevel::Define(d) => write_callable(w, &d.name, d)?,
            Toplevel::Var(v) => write_var(w, &v.name, &v.ty, &v.doc)?,
        }
    }

    for c in &package.decls {
        writeln!(w)?;
        write_container(w, c)?;
    }
    Ok(())
}

/// A package's HTML documentation.
pub struct Docs<'a>(pub &'a Package);

impl fmt::Display for Docs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_docs(f, self.0)
    }
}
