use chrono::NaiveDate;
use docrepo_core::{
    CompanyInput, CompanyService, DocumentStore, Gender, PaginationParams, PersonFilter,
    PersonInput, PersonService, ServiceError,
};

fn input(firstname: &str, lastname: &str, latitude: f64, longitude: f64) -> PersonInput {
    PersonInput {
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        gender: Gender::Female,
        dob: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
        country: "Peru".to_string(),
        latitude,
        longitude,
        connections: Vec::new(),
    }
}

#[test]
fn person_crud_round_trip() {
    let store = DocumentStore::open_in_memory().unwrap();
    let persons = PersonService::new(&store);

    let created = persons.insert(input("Ann", "Smith", 0.0, 0.0)).unwrap();
    let id = created.id.clone().unwrap();
    assert!(id.starts_with("PERSONS-"));
    assert_eq!(persons.get_by_id(&id).unwrap(), created);

    let updated = persons.update(&id, input("Anna", "Smith", 1.0, 1.0)).unwrap();
    assert_eq!(updated.id.as_deref(), Some(id.as_str()));
    assert_eq!(persons.get_by_id(&id).unwrap().firstname, "Anna");

    let deleted = persons.delete(&id).unwrap();
    assert_eq!(deleted.firstname, "Anna");
    let err = persons.get_by_id(&id).unwrap_err();
    assert_eq!(err.to_string(), format!("Person with id: {id} is not registered"));
}

#[test]
fn missing_persons_are_not_found() {
    let store = DocumentStore::open_in_memory().unwrap();
    let persons = PersonService::new(&store);

    for result in [
        persons.update("persons/404", input("A", "B", 0.0, 0.0)),
        persons.delete("persons/404"),
        persons.add_connection("persons/404", "persons/405"),
    ] {
        match result {
            Err(ServiceError::NotFound { entity, id }) => {
                assert_eq!(entity, "Person");
                assert_eq!(id, "persons/404");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

#[test]
fn add_connection_appends_once_and_checks_both_persons() {
    let store = DocumentStore::open_in_memory().unwrap();
    let persons = PersonService::new(&store);
    let ann = persons.insert(input("Ann", "Smith", 0.0, 0.0)).unwrap();
    let bob = persons.insert(input("Bob", "Jones", 0.0, 0.0)).unwrap();
    let (ann_id, bob_id) = (ann.id.unwrap(), bob.id.unwrap());

    persons.add_connection(&ann_id, &bob_id).unwrap();
    let connected = persons.add_connection(&ann_id, &bob_id).unwrap();
    assert_eq!(connected.connections, vec![bob_id.clone()]);
    assert_eq!(persons.get_by_id(&ann_id).unwrap().connections, vec![bob_id]);

    assert!(matches!(
        persons.add_connection(&ann_id, "persons/missing"),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        persons.add_connection(&ann_id, &ann_id),
        Err(ServiceError::InvalidInput(_))
    ));
}

#[test]
fn person_pagination_searches_names_and_filters_by_radius() {
    let store = DocumentStore::open_in_memory().unwrap();
    let persons = PersonService::new(&store);
    persons.insert(input("Casey", "Lima", -12.0464, -77.0428)).unwrap();
    persons.insert(input("Jon", "Casey", -12.0500, -77.0400)).unwrap();
    persons.insert(input("Casey", "Paris", 48.8566, 2.3522)).unwrap();
    persons.insert(input("Mary", "Jones", -12.0464, -77.0428)).unwrap();

    let params = PaginationParams::new(10, 1)
        .unwrap()
        .with_search(Some("casey".to_string()));
    let everywhere = persons.paginate(&params, &PersonFilter::default()).unwrap();
    assert_eq!(everywhere.total, 3);

    let near_lima = PersonFilter {
        latitude: Some(-12.0464),
        longitude: Some(-77.0428),
        radius: Some(5.0),
    };
    let local = persons.paginate(&params, &near_lima).unwrap();
    assert_eq!(local.total, 2);
    assert!(local.data.iter().all(|person| person.latitude < 0.0));

    let partial = PersonFilter {
        radius: None,
        ..near_lima
    };
    assert_eq!(persons.paginate(&params, &partial).unwrap().total, 3);
}

#[test]
fn seeding_inserts_the_requested_number_of_persons() {
    let store = DocumentStore::open_in_memory().unwrap();
    let persons = PersonService::new(&store);

    let summary = persons.seed_persons(25).unwrap();
    assert_eq!(summary.inserted, 25);

    let page = persons
        .paginate(&PaginationParams::new(10, 3).unwrap(), &PersonFilter::default())
        .unwrap();
    assert_eq!(page.total, 25);
    assert_eq!(page.data.len(), 5);
    assert_eq!(page.data[0].id.as_deref(), Some("persons/21"));

    assert!(matches!(
        persons.seed_persons(0),
        Err(ServiceError::InvalidInput(_))
    ));
}

#[test]
fn company_lifecycle_checks_referenced_persons() {
    let store = DocumentStore::open_in_memory().unwrap();
    let persons = PersonService::new(&store);
    let companies = CompanyService::new(&store);
    let owner = persons.insert(input("Ann", "Smith", 0.0, 0.0)).unwrap().id.unwrap();
    let member = persons.insert(input("Bob", "Jones", 0.0, 0.0)).unwrap().id.unwrap();

    let missing_member = companies.insert(CompanyInput {
        name: "Acme".to_string(),
        address: "Main St 1".to_string(),
        owner_id: owner.clone(),
        person_ids: vec![member.clone(), "persons/missing".to_string()],
    });
    match missing_member {
        Err(ServiceError::NotFound { entity, id }) => {
            assert_eq!(entity, "Person");
            assert_eq!(id, "persons/missing");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let company = companies
        .insert(CompanyInput {
            name: "Acme".to_string(),
            address: "Main St 1".to_string(),
            owner_id: owner.clone(),
            person_ids: vec![member.clone()],
        })
        .unwrap();
    let company_id = company.id.clone().unwrap();
    assert!(company_id.starts_with("COMPANIES-"));

    let detail = companies.get_detail(&company_id).unwrap();
    assert_eq!(detail.id, company_id);
    assert_eq!(detail.owner.unwrap().firstname, "Ann");
    assert_eq!(detail.persons.len(), 1);
    assert_eq!(detail.persons[0].id.as_deref(), Some(member.as_str()));

    let renamed = companies
        .update(
            &company_id,
            CompanyInput {
                name: "Acme Labs".to_string(),
                address: "Main St 2".to_string(),
                owner_id: member.clone(),
                person_ids: Vec::new(),
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "Acme Labs");

    let page = companies
        .paginate(&PaginationParams::new(10, 1).unwrap())
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].owner_id, member);

    companies.delete(&company_id).unwrap();
    match companies.get_detail(&company_id) {
        Err(ServiceError::NotFound { entity, .. }) => assert_eq!(entity, "Company"),
        other => panic!("unexpected result: {other:?}"),
    }
}
