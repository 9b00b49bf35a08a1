//! Entity graph and validation integration tests

use impress_entities::{
    props, validate, validate_all, CollectionKind, EntityGraph, EntityId, IssueKind,
    IssueTracker, Properties, PropertyKind, SchemaConfig, SchemaOverrides, SchemaRegistry, Value,
};
use proptest::prelude::*;
use rstest::rstest;
use std::sync::Arc;

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::default())
}

/// Create a target entity for a reference property.
fn target_for(graph: &mut EntityGraph, targets: &[String]) -> EntityId {
    let reg = graph.shared_registry();
    let type_name = reg
        .type_names()
        .filter(|t| *t != reg.article_record_type())
        .find(|t| reg.concrete_type(t).is_ok() && reg.accepts(targets, t))
        .expect("some concrete type satisfies every reference target")
        .to_string();
    graph.create_entity(&type_name, Properties::new()).unwrap()
}

/// Values for exactly the required properties of `type_name`.
fn required_values(graph: &mut EntityGraph, type_name: &str) -> Properties {
    let reg = graph.shared_registry();
    let resolved = reg.entity_type(type_name).unwrap();
    let mut values = Properties::new();
    for prop in resolved.properties.iter().filter(|p| resolved.required.contains(&p.name)) {
        let value = match &prop.kind {
            PropertyKind::Text => Value::text("value"),
            PropertyKind::Integer => Value::Integer(1),
            PropertyKind::Boolean => Value::Boolean(true),
            PropertyKind::References { targets } => Value::refs([target_for(graph, targets)]),
        };
        values.insert(prop.name.clone(), value);
    }
    values
}

// === Required properties ===

#[rstest]
#[case("journal-article")]
#[case("book")]
#[case("chapter")]
#[case("conference-paper")]
#[case("data-publication")]
#[case("magazine-article")]
#[case("newspaper-article")]
#[case("patent")]
#[case("report")]
#[case("software")]
#[case("thesis")]
#[case("webpage")]
#[case("person")]
#[case("group")]
#[case("organisation")]
#[case("ref-contrib")]
#[case("award")]
#[case("keyword")]
#[case("subject")]
#[case("custom-metadata-field")]
fn test_required_only_validates_clean(#[case] type_name: &str) {
    let mut graph = EntityGraph::new(registry()).unwrap();
    let values = required_values(&mut graph, type_name);
    let id = graph.create_entity(type_name, values.clone()).unwrap();
    assert!(validate(&graph, id).unwrap().is_empty());

    for omitted in values.keys() {
        let mut partial = values.clone();
        partial.remove(omitted);
        let id = graph.create_entity(type_name, partial).unwrap();
        let issues = validate(&graph, id).unwrap();
        assert_eq!(issues.len(), 1, "{} without {}", type_name, omitted);
        assert_eq!(issues[0].kind, IssueKind::MissingRequiredProperty);
        assert_eq!(&issues[0].property, omitted);
    }
}

#[test]
fn test_every_concrete_type_is_covered() {
    let reg = registry();
    let concrete: Vec<&str> = reg
        .type_names()
        .filter(|t| reg.concrete_type(t).is_ok() && *t != reg.article_record_type())
        .collect();
    assert_eq!(concrete.len(), 20);
}

#[test]
fn test_required_override_changes_validation() {
    let overrides = SchemaOverrides::from_toml("[required]\nsubject = [\"name\"]\n").unwrap();
    let mut config = SchemaConfig::default();
    config.apply_overrides(&overrides).unwrap();
    let mut graph = EntityGraph::new(Arc::new(SchemaRegistry::new(config).unwrap())).unwrap();

    let subject = graph.create_entity("subject", Properties::new()).unwrap();
    let issues = validate(&graph, subject).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].property, "name");
}

// === Scenarios ===

#[test]
fn test_journal_article_without_authors() {
    let mut graph = EntityGraph::new(registry()).unwrap();
    let article = graph
        .create_in_collection(
            CollectionKind::References,
            "journal-article",
            props([("title", "X"), ("containerTitle", "Y")]),
        )
        .unwrap();
    let issues = validate(&graph, article).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].property, "authors");

    let person = graph
        .create_entity("person", props([("surname", "Hopper"), ("givenNames", "Grace")]))
        .unwrap();
    graph
        .update_entity(article, props([("authors", vec![person])]))
        .unwrap();
    assert!(validate(&graph, article).unwrap().is_empty());
    assert!(validate_all(&graph).is_empty());
}

#[test]
fn test_delete_sole_author() {
    let mut graph = EntityGraph::new(registry()).unwrap();
    let person = graph
        .create_in_collection(
            CollectionKind::Authors,
            "person",
            props([("surname", "Hopper"), ("givenNames", "Grace")]),
        )
        .unwrap();
    let article = graph
        .create_entity(
            "journal-article",
            props([
                ("title", Value::text("X")),
                ("containerTitle", Value::text("Y")),
                ("authors", Value::refs([person])),
            ]),
        )
        .unwrap();

    let repaired = graph.delete_entity(person).unwrap();
    assert!(repaired.contains(&article));
    assert!(repaired.contains(&graph.article_id()));
    assert!(graph.collection(CollectionKind::Authors).is_empty());

    let issues = validate(&graph, article).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].property, "authors");
}

#[test]
fn test_group_members_and_affiliations() {
    let mut graph = EntityGraph::new(registry()).unwrap();
    let org = graph
        .create_in_collection(CollectionKind::Organisations, "organisation", props([("name", "MIT")]))
        .unwrap();
    let person = graph
        .create_entity(
            "person",
            props([
                ("surname", Value::text("Liskov")),
                ("givenNames", Value::text("Barbara")),
                ("affiliations", Value::refs([org])),
            ]),
        )
        .unwrap();
    let group = graph
        .create_in_collection(
            CollectionKind::Groups,
            "group",
            props([("name", Value::text("CLU team")), ("members", Value::refs([person]))]),
        )
        .unwrap();
    assert_eq!(graph.referrers(person), vec![(group, "members".to_string())]);
    assert_eq!(
        graph.referrers(org),
        vec![
            (graph.article_id(), "organisations".to_string()),
            (person, "affiliations".to_string()),
        ]
    );
}

// === Properties ===

#[derive(Debug, Clone)]
enum Op {
    Keyword(String),
    Person(String),
    Article,
    Rename(usize, String),
    Clear(usize),
    Delete(usize),
    Link(usize, usize),
    Move(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z ]{0,8}".prop_map(Op::Keyword),
        "[a-z]{0,8}".prop_map(Op::Person),
        Just(Op::Article),
        (any::<usize>(), "[a-z ]{0,8}").prop_map(|(i, s)| Op::Rename(i, s)),
        any::<usize>().prop_map(Op::Clear),
        any::<usize>().prop_map(Op::Delete),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Link(a, b)),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Move(a, b)),
    ]
}

fn name_property(type_name: &str) -> &'static str {
    match type_name {
        "person" => "surname",
        "journal-article" => "title",
        _ => "name",
    }
}

/// Apply one operation. Failures are part of the game: they must leave the
/// graph consistent.
fn apply(graph: &mut EntityGraph, op: Op) {
    let ids: Vec<EntityId> = graph.ids()[1..].to_vec();
    let pick = |i: usize| ids.get(i % ids.len().max(1)).copied();
    match op {
        Op::Keyword(name) => {
            let _ = graph.create_in_collection(CollectionKind::Keywords, "keyword", props([("name", name)]));
        }
        Op::Person(surname) => {
            let _ = graph.create_in_collection(CollectionKind::Authors, "person", props([("surname", surname)]));
        }
        Op::Article => {
            let _ = graph.create_in_collection(
                CollectionKind::References,
                "journal-article",
                props([("containerTitle", "Journal")]),
            );
        }
        Op::Rename(i, text) => {
            if let Some(id) = pick(i) {
                let property = name_property(graph.get_entity(id).unwrap().type_name());
                let _ = graph.update_entity(id, props([(property, text)]));
            }
        }
        Op::Clear(i) => {
            if let Some(id) = pick(i) {
                let property = name_property(graph.get_entity(id).unwrap().type_name());
                let _ = graph.update_entity(id, props([(property, Value::Null)]));
            }
        }
        Op::Delete(i) => {
            if let Some(id) = pick(i) {
                let _ = graph.delete_entity(id);
            }
        }
        Op::Link(a, b) => {
            if let (Some(entry), Some(author)) = (pick(a), pick(b)) {
                let _ = graph.update_entity(entry, props([("authors", vec![author])]));
            }
        }
        Op::Move(a, to) => {
            if let Some(id) = pick(a) {
                let _ = graph.move_in_collection(CollectionKind::Authors, id, to % 4);
            }
        }
    }
}

proptest! {
    #[test]
    fn test_tracker_matches_validate_all(ops in prop::collection::vec(op(), 0..30)) {
        let mut graph = EntityGraph::new(registry()).unwrap();
        let mut tracker = IssueTracker::attach(&mut graph);
        for op in ops {
            apply(&mut graph, op);
            tracker.sync(&graph);
            prop_assert_eq!(tracker.issues(), &validate_all(&graph));
        }
    }

    #[test]
    fn test_validate_all_is_idempotent(ops in prop::collection::vec(op(), 0..20)) {
        let mut graph = EntityGraph::new(registry()).unwrap();
        for op in ops {
            apply(&mut graph, op);
        }
        prop_assert_eq!(validate_all(&graph), validate_all(&graph));
    }

    #[test]
    fn test_document_round_trip(ops in prop::collection::vec(op(), 0..20)) {
        let mut graph = EntityGraph::new(registry()).unwrap();
        for op in ops {
            apply(&mut graph, op);
        }
        let doc = graph.to_document();
        let loaded = EntityGraph::from_document(registry(), doc.clone()).unwrap();
        prop_assert_eq!(loaded.to_document(), doc);
        prop_assert_eq!(validate_all(&loaded), validate_all(&graph));
    }

    #[test]
    fn test_no_dangling_references(ops in prop::collection::vec(op(), 0..30)) {
        let mut graph = EntityGraph::new(registry()).unwrap();
        for op in ops {
            apply(&mut graph, op);
        }
        for entity in graph.entities() {
            for value in entity.properties.values() {
                if let Some(ids) = value.as_refs() {
                    for id in ids {
                        prop_assert!(graph.contains(*id));
                    }
                }
            }
        }
    }
}
