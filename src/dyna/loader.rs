use std::fmt;

use log::debug;

use super::ast::*;
use super::layout::{Layout, Slot};

/// The native reference a dispatchable slot resolves to, or `None` for slots
/// that only reserve a position.
pub fn target(slot: Slot, prefix: &str, dispatch_properties: bool) -> Option<String> {
    if !slot.is_dispatchable(dispatch_properties) {
        return None;
    }
    let target = match slot {
        Slot::Define(d) => format!("{prefix}_{}", d.name),
        Slot::Var(v) => format!("load_var_{}(o, c)", v.name),
        Slot::Entry { owner, entry: Entry::Method(m) } => format!("{prefix}_{}_{}", owner.name(), m.name),
        Slot::Entry { owner, entry: Entry::Constructor(_) } => format!("{prefix}_{}_new", owner.name()),
        Slot::Property { owner, property } => format!("{prefix}_{}_prop_{}", owner.name(), property.name),
        Slot::Container(_) | Slot::Variant { .. } => return None,
    };
    Some(target)
}

/// `(id, reference)` for every dispatchable slot, in id order.
pub fn arms(layout: &Layout, prefix: &str, dispatch_properties: bool) -> Vec<(usize, String)> {
    let arms: Vec<_> = layout
        .slots()
        .filter_map(|(id, slot)| target(slot, prefix, dispatch_properties).map(|t| (id, t)))
        .collect();
    debug!("loader for '{}' has {} arms", layout.package.name, arms.len());
    arms
}

/// The loader function: one `case` per arm, then a `NULL` default.
pub fn write_loader<W: fmt::Write>(w: &mut W, prefix: &str, arms: &[(usize, String)]) -> fmt::Result {
    writeln!(w, "void *{prefix}_loader(lily_options *o, uint16_t *c, int id)")?;
    writeln!(w, "{{")?;
    writeln!(w, "    switch (id) {{")?;
    for (id, target) in arms {
        writeln!(w, "        case {id}: return {target};")?;
    }
    writeln!(w, "        default: return NULL;")?;
    writeln!(w, "    }}")?;
    writeln!(w, "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dyna::scan;

    const SRC: &str = "\
/**
package sys
*/
/**
var argv: List[String]
*/
/**
native Box
    protected var @size: Integer
*/
/**
constructor Box(size: Integer): Box
*/
/**
method Box.open(self: Box): Boolean
*/
";

    #[test]
    fn arms_follow_slots() {
        let pkg = scan(SRC).unwrap();
        let layout = Layout::of(&pkg);
        assert_eq!(arms(&layout, "sys", false), vec![
            (1, "load_var_argv(o, c)".to_string()),
            (3, "sys_Box_new".to_string()),
            (4, "sys_Box_open".to_string()),
        ]);
        let with_props = arms(&layout, "sys", true);
        assert_eq!(with_props.last(), Some(&(5, "sys_Box_prop_size".to_string())));
    }

    fn loader(src: &str, prefix: &str) -> String {
        let pkg = scan(src).unwrap();
        let mut out = String::new();
        write_loader(&mut out, prefix, &arms(&Layout::of(&pkg), prefix, false)).unwrap();
        out
    }

    #[test]
    fn loader_body() {
        let out = loader("/**\npackage m\n*/\n/**\ndefine f\n*/\n", "lily_m");
        assert_eq!(
            out,
            "void *lily_m_loader(lily_options *o, uint16_t *c, int id)\n{\n    switch (id) {\n        case 1: return lily_m_f;\n        default: return NULL;\n    }\n}\n"
        );
    }

    #[test]
    fn empty_loader_has_default_only() {
        let out = loader("/**\npackage m\n*/\n", "m");
        assert!(!out.contains("case"));
        assert!(out.contains("default: return NULL;"));
    }
}
