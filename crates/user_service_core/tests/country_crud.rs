use rusqlite::Connection;
use std::collections::HashSet;
use user_service_core::db::migrations::latest_version;
use user_service_core::db::open_db_in_memory;
use user_service_core::{
    ConstraintViolation, CountryRepository, CountryService, NewUser, RecordKey, RepoError,
    SqliteCountryRepository, SqliteUserRepository, UserService, ValidationError,
};

#[test]
fn create_assigns_ids_and_reads_back_by_id_and_title() {
    let conn = open_db_in_memory().unwrap();
    let service = CountryService::new(SqliteCountryRepository::try_new(&conn).unwrap());

    let peru = service.create_country("Peru").unwrap();
    let chile = service.create_country("Chile").unwrap();
    assert_eq!(peru.id, 1);
    assert_eq!(chile.id, 2);

    assert_eq!(service.get_country(peru.id).unwrap(), peru);
    assert_eq!(service.get_country_by_title("Chile").unwrap(), chile);
}

#[test]
fn duplicate_title_is_a_unique_violation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountryRepository::try_new(&conn).unwrap();

    repo.create_country("Peru").unwrap();
    let err = repo.create_country("Peru").unwrap_err();
    assert!(err.is_constraint_violation());
    assert_eq!(err.unique_violation(), Some(("country", "title")));
}

#[test]
fn blank_and_overlong_titles_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountryRepository::try_new(&conn).unwrap();

    let blank = repo.create_country("  ").unwrap_err();
    assert!(matches!(
        blank,
        RepoError::Constraint(ConstraintViolation::Invalid(ValidationError::Blank {
            field: "title"
        }))
    ));

    let overlong = repo.create_country(&"x".repeat(65)).unwrap_err();
    assert!(matches!(
        overlong,
        RepoError::Constraint(ConstraintViolation::Invalid(ValidationError::TooLong {
            field: "title",
            max: 64,
            actual: 65,
        }))
    ));
    assert!(repo.list_countries().unwrap().is_empty());
}

#[test]
fn missing_lookups_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = CountryService::new(SqliteCountryRepository::try_new(&conn).unwrap());

    let by_id = service.get_country(7).unwrap_err();
    assert!(matches!(by_id, RepoError::NotFound(RecordKey::CountryId(7))));

    let by_title = service.get_country_by_title("Atlantis").unwrap_err();
    assert!(matches!(
        by_title,
        RepoError::NotFound(RecordKey::CountryTitle(ref title)) if title == "Atlantis"
    ));
}

#[test]
fn rename_corrects_title_and_keeps_uniqueness() {
    let conn = open_db_in_memory().unwrap();
    let service = CountryService::new(SqliteCountryRepository::try_new(&conn).unwrap());

    let typo = service.create_country("Peur").unwrap();
    service.create_country("Chile").unwrap();

    let fixed = service.rename_country(typo.id, "Peru").unwrap();
    assert_eq!(fixed.id, typo.id);
    assert_eq!(service.get_country(typo.id).unwrap().title, "Peru");

    let clash = service.rename_country(typo.id, "Chile").unwrap_err();
    assert_eq!(clash.unique_violation(), Some(("country", "title")));

    let missing = service.rename_country(99, "Bolivia").unwrap_err();
    assert!(missing.is_not_found());
}

#[test]
fn failed_country_writes_release_their_transaction() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountryRepository::try_new(&conn).unwrap();
    repo.create_country("Peru").unwrap();

    assert!(repo.create_country("Peru").is_err());
    assert!(conn.is_autocommit());
    assert!(repo.rename_country(99, "Chile").is_err());
    assert!(conn.is_autocommit());

    let chile = repo.create_country("Chile").unwrap();
    assert_eq!(repo.rename_country(chile.id, "Chile ").unwrap().title, "Chile ");
}

#[test]
fn list_countries_is_ordered_by_title() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountryRepository::try_new(&conn).unwrap();

    repo.create_country("Peru").unwrap();
    repo.create_country("Argentina").unwrap();
    repo.create_country("Chile").unwrap();

    let titles: Vec<_> = repo
        .list_countries()
        .unwrap()
        .into_iter()
        .map(|country| country.title)
        .collect();
    assert_eq!(titles, ["Argentina", "Chile", "Peru"]);
}

#[test]
fn list_residents_returns_users_of_that_country_only() {
    let conn = open_db_in_memory().unwrap();
    let countries = CountryService::new(SqliteCountryRepository::try_new(&conn).unwrap());
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let peru = countries.create_country("Peru").unwrap();
    let chile = countries.create_country("Chile").unwrap();
    assert!(countries.list_residents(peru.id).unwrap().is_empty());

    let ana = users
        .create_user(&NewUser::new("ana", "a@x.com", "h", peru.id))
        .unwrap();
    let bruno = users
        .create_user(&NewUser::new("bruno", "b@x.com", "h", peru.id))
        .unwrap();
    users
        .create_user(&NewUser::new("carla", "c@x.com", "h", chile.id))
        .unwrap();

    let residents: HashSet<_> = countries
        .list_residents(peru.id)
        .unwrap()
        .into_iter()
        .map(|user| user.id)
        .collect();
    assert_eq!(residents, HashSet::from([ana.id, bruno.id]));
}

#[test]
fn list_residents_is_recomputed_on_each_call() {
    let conn = open_db_in_memory().unwrap();
    let countries = SqliteCountryRepository::try_new(&conn).unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let peru = countries.create_country("Peru").unwrap();
    let chile = countries.create_country("Chile").unwrap();
    let ana = users
        .create_user(&NewUser::new("ana", "a@x.com", "h", peru.id))
        .unwrap();
    assert_eq!(countries.list_residents(peru.id).unwrap().len(), 1);

    users
        .update_user(
            ana.id,
            &user_service_core::UserChanges {
                country_id: Some(chile.id),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(countries.list_residents(peru.id).unwrap().is_empty());
    assert_eq!(countries.list_residents(chile.id).unwrap()[0].id, ana.id);
}

#[test]
fn list_residents_of_unknown_country_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountryRepository::try_new(&conn).unwrap();

    let err = repo.list_residents(3).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(RecordKey::CountryId(3))));
}

#[test]
fn delete_is_restricted_while_residents_exist() {
    let conn = open_db_in_memory().unwrap();
    let countries = CountryService::new(SqliteCountryRepository::try_new(&conn).unwrap());
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let peru = countries.create_country("Peru").unwrap();
    let empty = countries.create_country("Chile").unwrap();
    users
        .create_user(&NewUser::new("ana", "a@x.com", "h", peru.id))
        .unwrap();

    let err = countries.delete_country(peru.id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Constraint(ConstraintViolation::Restricted {
            table: "country",
            referenced_by: "users.country_id",
            ..
        })
    ));
    assert!(countries.get_country(peru.id).is_ok());

    countries.delete_country(empty.id).unwrap();
    assert!(countries.get_country(empty.id).unwrap_err().is_not_found());

    let missing = countries.delete_country(empty.id).unwrap_err();
    assert!(missing.is_not_found());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteCountryRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_country_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteCountryRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("country"))
    ));
}
