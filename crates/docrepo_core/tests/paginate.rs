use docrepo_core::{
    Document, DocumentStore, PaginationParams, RawPagination, RepoError, Repository,
};
use std::collections::HashSet;

const FIRST_NAMES: [&str; 5] = ["Ann", "Bob", "Casey", "Dana", "Eli"];

fn store_with_persons(total: usize) -> DocumentStore {
    let store = DocumentStore::open_in_memory().unwrap();
    let session = store.open_session().unwrap();
    for index in 0..total {
        let mut person = Document::new("Persons")
            .unwrap()
            .with("firstname", FIRST_NAMES[index % FIRST_NAMES.len()])
            .with("lastname", format!("Family{index}"))
            .with("rank", index as u64);
        session
            .store(&mut person, Some(format!("persons/{index}").as_str()))
            .unwrap();
    }
    session.save_changes().unwrap();
    store
}

fn page(take: u64, page: u64) -> PaginationParams {
    PaginationParams::new(take, page).unwrap()
}

#[test]
fn twenty_five_documents_page_as_ten_ten_five_zero() {
    let store = store_with_persons(25);
    let session = store.open_session().unwrap();
    let builder = Repository::<Document>::new("Persons", &session).builder();

    let sizes = (1..=4)
        .map(|number| {
            let result = builder.paginate(&page(10, number)).unwrap();
            assert_eq!(result.total, 25);
            result.data.len()
        })
        .collect::<Vec<_>>();
    assert_eq!(sizes, vec![10, 10, 5, 0]);
}

#[test]
fn iterating_all_pages_yields_every_document_exactly_once() {
    let store = store_with_persons(23);
    let session = store.open_session().unwrap();
    let builder = Repository::<Document>::new("Persons", &session).builder();

    let mut seen = HashSet::new();
    let mut order = Vec::new();
    let mut number = 1;
    loop {
        let result = builder.paginate(&page(4, number)).unwrap();
        assert!(result.data.len() <= 4);
        if result.data.is_empty() {
            break;
        }
        for document in result.data {
            let id = document.id.unwrap();
            assert!(seen.insert(id.clone()), "duplicate {id}");
            order.push(document.fields["rank"].as_u64().unwrap());
        }
        number += 1;
    }
    assert_eq!(seen.len(), 23);
    assert_eq!(order, (0..23).collect::<Vec<_>>());
}

#[test]
fn paginate_uses_exactly_two_round_trips() {
    let store = store_with_persons(5);
    let session = store.open_session().unwrap();
    let builder = Repository::<Document>::new("Persons", &session)
        .builder()
        .search_fields(["firstname", "lastname"]);

    let params = page(2, 1).with_search(Some("ann".to_string()));
    builder.paginate(&params).unwrap();
    assert_eq!(session.request_count(), 2);
}

#[test]
fn search_is_ored_across_fields_and_applies_to_count() {
    let store = store_with_persons(10);
    let session = store.open_session().unwrap();
    let builder = Repository::<Document>::new("Persons", &session)
        .builder()
        .search_fields(["firstname", "lastname"]);

    // "ann" hits persons 0 and 5 by first name, "family7" hits person 7.
    let params = PaginationParams::from_raw(RawPagination {
        limit: Some("2".to_string()),
        page: Some("1".to_string()),
        search: Some("ann family7".to_string()),
    })
    .unwrap();
    let result = builder.paginate(&params).unwrap();
    assert_eq!(result.total, 3);
    let ids = result
        .data
        .iter()
        .map(|document| document.id.clone().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["persons/0", "persons/5"]);

    let prefix = builder
        .paginate(&page(20, 1).with_search(Some("cas*".to_string())))
        .unwrap();
    assert_eq!(prefix.total, 2);
}

#[test]
fn search_without_search_fields_does_not_filter() {
    let store = store_with_persons(6);
    let session = store.open_session().unwrap();
    let builder = Repository::<Document>::new("Persons", &session).builder();

    let result = builder
        .paginate(&page(20, 1).with_search(Some("ann".to_string())))
        .unwrap();
    assert_eq!(result.total, 6);
}

#[test]
fn equality_predicates_filter_both_total_and_data() {
    let store = store_with_persons(12);
    let session = store.open_session().unwrap();
    let builder = Repository::<Document>::new("Persons", &session)
        .builder()
        .where_equals("firstname", "bob");

    let result = builder.paginate(&page(1, 2)).unwrap();
    assert_eq!(result.total, 3);
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].id.as_deref(), Some("persons/6"));
}

#[test]
fn paginated_results_are_not_tracked() {
    let store = store_with_persons(3);
    let session = store.open_session().unwrap();
    Repository::<Document>::new("Persons", &session)
        .builder()
        .paginate(&page(10, 1))
        .unwrap();
    assert!(!session.is_tracked("persons/0"));

    Repository::<Document>::new("Persons", &session)
        .builder()
        .get_all()
        .unwrap();
    assert!(session.is_tracked("persons/0"));
}

#[test]
fn execution_errors_surface_as_query_failure() {
    let store = store_with_persons(2);
    let conn = store.connect().unwrap();
    conn.execute(
        "INSERT INTO documents (id, collection, body, updated_at) VALUES ('persons/bad', 'Persons', 'not json', 0);",
        [],
    )
    .unwrap();

    let session = store.open_session().unwrap();
    let err = Repository::<Document>::new("Persons", &session)
        .builder()
        .where_equals("firstname", "ann")
        .paginate(&page(10, 1))
        .unwrap_err();
    assert!(matches!(err, RepoError::QueryFailure(_)));

    let session = store.open_session().unwrap();
    let err = Repository::<Document>::new("Persons", &session)
        .builder()
        .paginate(&page(10, 1))
        .unwrap_err();
    assert!(matches!(err, RepoError::QueryFailure(_)));
}

#[test]
fn delete_between_count_and_data_query_leaves_them_disagreeing() {
    let store = store_with_persons(3);
    let reader = store.open_session().unwrap();
    let count_query = reader.query("Persons").no_tracking();
    let data_query = reader.query("Persons").no_tracking().skip(0).take(10);

    let total = count_query.count().unwrap();

    let writer = store.open_session().unwrap();
    let victim = Repository::<Document>::new("Persons", &writer)
        .builder()
        .get_by_id("persons/1")
        .unwrap()
        .unwrap();
    writer.delete(&victim).unwrap();
    writer.save_changes().unwrap();

    let data = data_query.all().unwrap();
    assert_eq!(total, 3);
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|document| document.id != "persons/1"));
}

#[test]
fn each_paginate_call_reads_the_current_state() {
    let store = store_with_persons(3);
    let reader = store.open_session().unwrap();
    let builder = Repository::<Document>::new("Persons", &reader).builder();
    assert_eq!(builder.paginate(&page(10, 1)).unwrap().total, 3);

    let writer = store.open_session().unwrap();
    let victim = Repository::<Document>::new("Persons", &writer)
        .builder()
        .get_by_id("persons/1")
        .unwrap()
        .unwrap();
    writer.delete(&victim).unwrap();
    writer.save_changes().unwrap();

    let after = builder.paginate(&page(10, 1)).unwrap();
    assert_eq!(after.total, 2);
    assert_eq!(after.data.len(), 2);
}
