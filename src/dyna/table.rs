use std::collections::BTreeMap;
use std::fmt;

use super::ast::*;
use super::error::{DynaError, DynaResult};
use super::layout::{child_count, Layout, Slot};
use super::print::Clean;

/// How child and header counts are written into a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CountEncoding {
    /// a C octal escape: `\0`, `\04`, `\0123`
    #[default]
    Octal,
    /// the count as decimal digits
    Decimal,
}

impl CountEncoding {
    pub fn encode(self, name: &str, count: usize) -> DynaResult<String> {
        if count > 255 {
            return Err(DynaError::CountOverflow { name: name.to_string(), count });
        }
        Ok(match self {
            CountEncoding::Octal if count == 0 => "\\0".to_string(),
            // Three octal digits at most, or the escape swallows the name.
            CountEncoding::Octal if count < 64 => format!("\\0{count:o}"),
            CountEncoding::Octal => format!("\\{count:o}"),
            CountEncoding::Decimal => count.to_string(),
        })
    }
}

fn scope_tag(scope: Scope) -> char {
    match scope {
        Scope::Private => '1',
        Scope::Protected => '2',
        Scope::Public => '3',
    }
}

fn container_tag(c: &Container) -> char {
    match c {
        Container::Class(_) => 'C',
        Container::Native(_) => 'N',
        Container::Enum(_) => 'E',
        Container::Bootstrap(_) => 'B',
    }
}

fn container_suffix(c: &Container) -> String {
    match c {
        Container::Class(class) | Container::Native(class) => class.type_params.clone(),
        Container::Enum(e) => e.proto.clone(),
        Container::Bootstrap(b) => Clean(&b.sig).to_string(),
    }
}

fn leaf(tag: char, name: &str, proto: impl fmt::Display) -> String {
    format!("{tag}\\0{name}\\0{proto}")
}

/// The text between the quotes of one table record.
pub fn record(slot: Slot, encoding: CountEncoding) -> DynaResult<String> {
    let record = match slot {
        Slot::Define(d) => leaf('F', &d.name, Clean(&d.sig)),
        Slot::Var(v) => leaf('R', &v.name, &v.ty),
        Slot::Container(c) => {
            let count = encoding.encode(c.name(), child_count(c))?;
            let mut record = format!("{}{count}{}", container_tag(c), c.name());
            let suffix = container_suffix(c);
            if !suffix.is_empty() {
                record.push_str("\\0");
                record.push_str(&suffix);
            }
            record
        }
        Slot::Variant { variant, .. } => leaf('V', &variant.name, &variant.proto),
        Slot::Entry { entry: Entry::Method(m), .. } => leaf('m', &m.name, Clean(&m.sig)),
        Slot::Entry { entry: Entry::Constructor(m), .. } => leaf('m', "<new>", Clean(&m.sig)),
        Slot::Property { property, .. } => leaf(scope_tag(property.scope), &property.name, &property.ty),
    };
    Ok(record)
}

/// Slot 0: how many containers the package names, then the names. The builtin
/// package's container ids are fixed, so it names none.
pub fn header(layout: &Layout, encoding: CountEncoding) -> DynaResult<String> {
    let package = layout.package;
    if package.is_builtin() {
        return encoding.encode(&package.name, 0);
    }

    let mut header = encoding.encode(&package.name, package.decls.len())?;
    for c in &package.decls {
        header.push_str(c.name());
        header.push_str("\\0");
    }
    Ok(header)
}

/// Every record of the table, header first and the `Z` sentinel last.
pub fn records(layout: &Layout, encoding: CountEncoding) -> DynaResult<Vec<String>> {
    let mut records = vec![header(layout, encoding)?];
    for (_, slot) in layout.slots() {
        records.push(record(slot, encoding)?);
    }
    records.push("Z".to_string());
    Ok(records)
}

/// The records as the body of a C string array, one per line.
pub fn write_records<W: fmt::Write>(w: &mut W, records: &[String]) -> fmt::Result {
    for (i, r) in records.iter().enumerate() {
        let sep = if i == 0 { "" } else { "," };
        writeln!(w, "    {sep}\"{r}\"")?;
    }
    Ok(())
}

pub fn write_table<W: fmt::Write>(w: &mut W, prefix: &str, records: &[String]) -> fmt::Result {
    writeln!(w, "const char *{prefix}_dynaload_table[] = {{")?;
    write_records(w, records)?;
    writeln!(w, "}};")
}

/// Whether the package gets `NAME_OFFSET` constants: only the builtin package
/// and packages with natives do.
pub fn wants_offsets(package: &Package) -> bool {
    package.is_builtin() || package.has_natives()
}

/// `#define NAME_OFFSET id` for each container.
pub fn write_offsets<W: fmt::Write>(w: &mut W, layout: &Layout) -> fmt::Result {
    for (id, c) in layout.containers() {
        writeln!(w, "#define {}_OFFSET {id}", c.name().to_uppercase())?;
    }
    Ok(())
}

/// Builtin container ids are fixed, so only other packages get id macros.
pub fn wants_id_macros(package: &Package) -> bool {
    !package.is_builtin() && !package.decls.is_empty()
}

/// `#define DYNA_ID_Name(ids) ids[n]`, where `n` is the container's place in
/// the header.
pub fn write_id_macros<W: fmt::Write>(w: &mut W, package: &Package) -> fmt::Result {
    for (i, c) in package.decls.iter().enumerate() {
        writeln!(w, "#define DYNA_ID_{}(ids) ids[{i}]", c.name())?;
    }
    Ok(())
}

/// Records per tag, read back from a rendered table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Census {
    pub counts: BTreeMap<char, usize>,
}

impl Census {
    /// Count the records of rendered table text. The first literal is the
    /// header and is skipped, and counting stops at the `Z` sentinel.
    pub fn of(text: &str) -> Census {
        let mut census = Census::default();
        let literals = text.lines().filter_map(|line| {
            let start = line.find('"')?;
            let end = line.rfind('"')?;
            (end > start).then(|| &line[start + 1..end])
        });
        for literal in literals.skip(1) {
            if literal == "Z" {
                break;
            }
            if let Some(tag) = literal.chars().next() {
                *census.counts.entry(tag).or_default() += 1;
            }
        }
        census
    }

    /// The counts a package's table should have.
    pub fn expected(package: &Package) -> Census {
        let mut census = Census::default();
        let mut bump = |tag: char, n: usize| {
            if n > 0 {
                *census.counts.entry(tag).or_default() += n;
            }
        };
        for t in &package.toplevel {
            match t {
                Toplevel::Define(_) => bump('F', 1),
                Toplevel::Var(_) => bump('R', 1),
            }
        }
        for c in &package.decls {
            bump(container_tag(c), 1);
            bump('m', c.entries().len());
            match c {
                Container::Enum(e) => bump('V', e.variants.len()),
                Container::Native(n) => {
                    for p in &n.properties {
                        bump(scope_tag(p.scope), 1);
                    }
                }
                Container::Class(_) | Container::Bootstrap(_) => {}
            }
        }
        census
    }
}
