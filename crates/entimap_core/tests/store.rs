//! Integration tests for the store façade and repositories.

use entimap_core::{EntityStore, MapperConfig};
use entimap_storage::Query;
use entimap_testkit::prelude::*;
use entimap_value::{Ancestor, DocumentKey, Namespace};

#[test]
fn persisted_person_reads_back() {
    init_tracing();
    with_harness(|harness| {
        let saved = harness
            .entities
            .persist(&harness.namespace, &sample_person(), &[], false)?;
        assert_ne!(saved.id, 0);

        let loaded: Option<Person> = harness.entities.get(&harness.namespace, saved.id, &[])?;
        assert_eq!(loaded, Some(saved));
        Ok(())
    })
    .unwrap();
}

#[test]
fn missing_entity_is_none() {
    with_harness(|harness| {
        let loaded: Option<Person> = harness.entities.get(&harness.namespace, 404i64, &[])?;
        assert!(loaded.is_none());
        let deleted: Option<Person> = harness.entities.delete(&harness.namespace, 404i64, &[])?;
        assert!(deleted.is_none());
        Ok(())
    })
    .unwrap();
}

#[test]
fn delete_returns_removed_entity() {
    with_harness(|harness| {
        let saved = harness
            .entities
            .persist(&harness.namespace, &sample_person(), &[], false)?;
        let deleted: Option<Person> = harness.entities.delete(&harness.namespace, saved.id, &[])?;
        assert_eq!(deleted, Some(saved));
        assert!(harness.store.is_empty());
        Ok(())
    })
    .unwrap();
}

#[test]
fn external_children_load_with_parent() {
    with_harness(|harness| {
        let ns = &harness.namespace;
        let acme = Company {
            id: 5,
            name: "Acme".into(),
            employees: Vec::new(),
        };
        harness.entities.persist(ns, &acme, &[], false)?;
        for name in ["Wile", "Road"] {
            let employee = Employee {
                company: 5,
                name: name.into(),
                ..Employee::default()
            };
            harness.entities.persist(ns, &employee, &[], false)?;
        }
        let stranger = Employee {
            company: 6,
            name: "Bugs".into(),
            ..Employee::default()
        };
        harness.entities.persist(ns, &stranger, &[], false)?;

        let loaded: Company = harness.entities.get(ns, 5i64, &[])?.unwrap();
        let mut names: Vec<&str> = loaded.employees.iter().map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Road", "Wile"]);
        assert!(loaded.employees.iter().all(|e| e.company == 5 && e.id != 0));

        let stored = harness
            .store
            .get(&DocumentKey::new(ns, "Company").with_id(5i64))
            .unwrap();
        assert!(!stored.contains("employees"));
        Ok(())
    })
    .unwrap();
}

#[test]
fn default_project_scopes_reads_and_writes() {
    let harness = Harness::with_config(MapperConfig::default().default_project("atlas"));
    let ns = Namespace::new("test");

    let saved = harness.entities.persist(&ns, &sample_person(), &[], false).unwrap();
    let stored = harness.store.documents();
    assert_eq!(stored.len(), 1);
    let key = stored[0].key.as_ref().unwrap();
    assert_eq!(key.project.as_deref(), Some("atlas"));

    let loaded: Option<Person> = harness.entities.get(&ns, saved.id, &[]).unwrap();
    assert_eq!(loaded, Some(saved));
}

#[test]
fn eval_reads_query_results() {
    with_harness(|harness| {
        let ns = &harness.namespace;
        for name in ["Ada", "Grace", "Barbara"] {
            let person = Person {
                name: name.into(),
                ..Person::default()
            };
            harness.entities.persist(ns, &person, &[], false)?;
        }

        let people: Vec<Person> = harness.entities.eval(&Query::kind(ns, "Person"))?;
        assert_eq!(people.len(), 3);

        let limited: Vec<Person> = harness.entities.eval(&Query::kind(ns, "Person").limit(2))?;
        assert_eq!(limited.len(), 2);
        Ok(())
    })
    .unwrap();
}

#[test]
fn repository_scopes_by_ancestors() {
    with_harness(|harness| {
        let ns = &harness.namespace;
        let employees = harness.entities.repository::<Employee>();
        let region = [Ancestor::name("Region", "emea")];

        let saved = employees.save_with_ancestors(
            ns,
            &Employee {
                company: 1,
                name: "Ada".into(),
                ..Employee::default()
            },
            &region,
        )?;
        employees.save(
            ns,
            &Employee {
                company: 2,
                name: "Grace".into(),
                ..Employee::default()
            },
        )?;

        let stored = harness.store.documents();
        let prefixed = stored
            .iter()
            .filter_map(|document| document.key.as_ref())
            .find(|key| key.id == Some(saved.id.into()))
            .unwrap();
        assert_eq!(
            prefixed.ancestors,
            vec![Ancestor::name("Region", "emea"), Ancestor::id("Company", 1)]
        );

        let path = [Ancestor::name("Region", "emea"), Ancestor::id("Company", 1)];
        assert_eq!(employees.list_with_ancestors(ns, &path)?, vec![saved.clone()]);
        assert_eq!(employees.list(ns)?.len(), 2);
        assert_eq!(employees.get_with_ancestors(ns, saved.id, &path)?, Some(saved.clone()));
        assert_eq!(employees.get(ns, saved.id)?, None);

        assert_eq!(employees.delete_with_ancestors(ns, saved.id, &path)?, Some(saved));
        assert_eq!(employees.list(ns)?.len(), 1);
        Ok(())
    })
    .unwrap();
}

#[test]
fn store_is_cheap_to_share() {
    let harness = Harness::new();
    let other: EntityStore = harness.entities.clone();
    other
        .persist(&harness.namespace, &sample_person(), &[], false)
        .unwrap();
    let people: Vec<Person> = harness.entities.list(&harness.namespace, &[]).unwrap();
    assert_eq!(people.len(), 1);
}
