use dynaload::dyna::ast::*;
use dynaload::dyna::layout::Layout;
use dynaload::dyna::table::{self, Census, CountEncoding};
use dynaload::dyna::{loader, parse_signature, parse_type, scan};
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{0,5}"
}

fn lower() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,6}"
}

fn ty() -> impl Strategy<Value = TypeExpr> {
    name().prop_map(TypeExpr::Class).prop_recursive(4, 32, 4, |inner| {
        let arg = prop_oneof![
            inner.clone(),
            inner.clone().prop_map(|t| TypeExpr::Optional(Box::new(t))),
        ];
        prop_oneof![
            (name(), prop::collection::vec(inner.clone(), 1..4)).prop_map(|(n, ps)| TypeExpr::Generic(n, ps)),
            (
                prop::collection::vec(arg, 0..3),
                prop::option::of(inner.clone()),
                prop::option::of(inner.clone()),
            )
                .prop_map(|(mut args, rest, ret)| {
                    args.extend(rest.map(|t| TypeExpr::Variadic(Box::new(t))));
                    TypeExpr::Function(args, ret.map(Box::new))
                }),
        ]
    })
}

fn callable() -> impl Strategy<Value = Callable> {
    (lower(), prop::collection::vec((lower(), ty()), 0..3), prop::option::of(ty())).prop_map(|(name, args, ret)| Callable {
        name,
        sig: Signature {
            generics: vec![],
            args: args.into_iter().map(|(name, ty)| Arg::Named { name, ty, default: None }).collect(),
            ret,
        },
        doc: String::new(),
    })
}

fn entries() -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::vec(prop_oneof![callable().prop_map(Entry::Method), callable().prop_map(Entry::Constructor)], 0..4)
}

fn property() -> impl Strategy<Value = Property> {
    (prop_oneof![Just(Scope::Private), Just(Scope::Protected), Just(Scope::Public)], lower(), ty())
        .prop_map(|(scope, name, ty)| Property { scope, name, ty })
}

fn container() -> impl Strategy<Value = Container> {
    prop_oneof![
        (name(), entries()).prop_map(|(name, entries)| Container::Class(Class { name, entries, ..Class::default() })),
        (name(), entries(), prop::collection::vec(property(), 0..3))
            .prop_map(|(name, entries, properties)| Container::Native(Class { name, entries, properties, ..Class::default() })),
        (name(), entries(), prop::collection::vec(name(), 0..4)).prop_map(|(name, entries, variants)| Container::Enum(Enum {
            name,
            entries,
            variants: variants.into_iter().map(|name| Variant { name, proto: String::new() }).collect(),
            ..Enum::default()
        })),
    ]
}

fn package() -> impl Strategy<Value = Package> {
    let toplevel = prop_oneof![
        callable().prop_map(Toplevel::Define),
        (lower(), ty()).prop_map(|(name, ty)| Toplevel::Var(Var { name, ty, doc: String::new() })),
    ];
    (lower(), prop::collection::vec(toplevel, 0..4), prop::collection::vec(container(), 0..4))
        .prop_map(|(name, toplevel, decls)| Package { name, toplevel, decls, ..Package::default() })
}

proptest! {
    #[test]
    fn doesnt_crash(s in "\\PC*") {
        let _ = parse_signature(&s);
        let _ = parse_type(&s);
        let _ = scan(&format!("/**\npackage p\n*/\n/**\ndefine f{s}\n*/\n"));
    }

    #[test]
    fn clean_form_reparses(t in ty()) {
        let clean = t.to_string();
        prop_assert_eq!(parse_type(&clean), Ok(t));
    }

    #[test]
    fn loader_ids_follow_table(pkg in package(), dispatch_properties in any::<bool>()) {
        let layout = Layout::of(&pkg);
        let ids: Vec<usize> = layout.slots().map(|(id, _)| id).collect();
        prop_assert_eq!(ids, (1..=layout.len()).collect::<Vec<_>>());

        let records = table::records(&layout, CountEncoding::Octal).unwrap();
        prop_assert_eq!(records.len(), layout.len() + 2);

        let arms = loader::arms(&layout, &pkg.name, dispatch_properties);
        prop_assert!(arms.windows(2).all(|w| w[0].0 < w[1].0));
        for (id, _) in &arms {
            let tag = records[*id].chars().next().unwrap();
            prop_assert!(matches!(tag, 'F' | 'R' | 'm') || (dispatch_properties && matches!(tag, '1' | '2' | '3')));
        }
        let dispatchable = layout.slots().filter(|(_, s)| s.is_dispatchable(dispatch_properties)).count();
        prop_assert_eq!(arms.len(), dispatchable);
    }

    #[test]
    fn census_round_trip(pkg in package()) {
        let records = table::records(&Layout::of(&pkg), CountEncoding::Octal).unwrap();
        let mut text = String::new();
        table::write_table(&mut text, &pkg.name, &records).unwrap();
        prop_assert_eq!(Census::of(&text), Census::expected(&pkg));
    }
}
