use super::ast::*;

/// One position in the generated table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot<'a> {
    Define(&'a Callable),
    Var(&'a Var),
    Container(&'a Container),
    Variant { owner: &'a Container, variant: &'a Variant },
    Entry { owner: &'a Container, entry: &'a Entry },
    Property { owner: &'a Container, property: &'a Property },
}

impl Slot<'_> {
    /// Whether the loader needs an arm for this slot. Containers and variants
    /// only reserve their position.
    pub fn is_dispatchable(&self, dispatch_properties: bool) -> bool {
        match self {
            Slot::Define(_) | Slot::Var(_) | Slot::Entry { .. } => true,
            Slot::Property { .. } => dispatch_properties,
            Slot::Container(_) | Slot::Variant { .. } => false,
        }
    }
}

/// How many records a consumer skips to get past a container. Variants are
/// not counted since they are looked up in their own scope.
pub fn child_count(c: &Container) -> usize {
    match c {
        Container::Class(class) => class.entries.len(),
        Container::Native(class) => class.entries.len() + class.properties.len(),
        Container::Enum(e) => e.entries.len(),
        Container::Bootstrap(b) => b.entries.len(),
    }
}

/// The positional numbering of a package. Slot 0 is the table header, so the
/// first declaration is id 1. Both the table and the loader are rendered from
/// the same `Layout`, which keeps their ids in step.
#[derive(Debug)]
pub struct Layout<'a> {
    pub package: &'a Package,
    slots: Vec<Slot<'a>>,
}

impl<'a> Layout<'a> {
    pub fn of(package: &'a Package) -> Self {
        let mut slots = vec![];
        for t in &package.toplevel {
            slots.push(match t {
                Toplevel::Define(d) => Slot::Define(d),
                Toplevel::Var(v) => Slot::Var(v),
            });
        }

        for owner in &package.decls {
            slots.push(Slot::Container(owner));
            if let Container::Enum(e) = owner {
                slots.extend(e.variants.iter().map(|variant| Slot::Variant { owner, variant }));
            }
            slots.extend(owner.entries().iter().map(|entry| Slot::Entry { owner, entry }));
            if let Container::Native(n) = owner {
                slots.extend(n.properties.iter().map(|property| Slot::Property { owner, property }));
            }
        }

        Layout { package, slots }
    }

    /// Every slot with its id, in table order.
    pub fn slots(&self) -> impl Iterator<Item = (usize, Slot<'a>)> + '_ {
        self.slots.iter().enumerate().map(|(i, s)| (i + 1, *s))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The ids of every container, in declaration order.
    pub fn containers(&self) -> impl Iterator<Item = (usize, &'a Container)> + '_ {
        self.slots().filter_map(|(id, slot)| match slot {
            Slot::Container(c) => Some((id, c)),
            _ => None,
        })
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.containers().find(|(_, c)| c.name() == name).map(|(id, _)| id)
    }
}
