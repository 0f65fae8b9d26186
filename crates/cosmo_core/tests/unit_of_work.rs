use cosmo_core::{
    AuditInfo, ConfigurationProvider, ConnectionSettings, Entity, Planet, PlanetRepository,
    RepoError, Repository, Star, UnitOfWork, UnitOfWorkState,
};

fn audit() -> AuditInfo {
    AuditInfo::new("user.console", 1_600_000_000_000)
}

fn file_settings(dir: &tempfile::TempDir) -> ConnectionSettings {
    ConnectionSettings {
        database: dir
            .path()
            .join("cosmodb.sqlite3")
            .to_str()
            .unwrap()
            .to_string(),
        ..ConnectionSettings::default()
    }
}

#[test]
fn committing_a_new_planet_assigns_identity() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    let pending = uow
        .planets()
        .add(Planet::new("Earth", true, 12742, audit()))
        .unwrap();

    assert_eq!(uow.commit().unwrap(), 1);
    let id = pending.get().unwrap();
    assert!(id > 0);

    let with_oxygen = uow.planets().get_planets_has_oxygen().unwrap();
    assert_eq!(with_oxygen.len(), 1);
    let earth = &with_oxygen[0];
    assert_eq!(earth.id(), Some(id));
    assert_eq!(uow.planets().get(id).unwrap().as_ref(), Some(earth));
    assert_eq!(earth.name.as_deref(), Some("Earth"));
    assert_eq!(earth.diameter, 12742);
}

#[test]
fn commit_with_nothing_staged_returns_zero() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    assert_eq!(uow.commit().unwrap(), 0);
}

#[test]
fn second_commit_without_new_changes_is_a_no_op() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    uow.planets()
        .add(Planet::new("Earth", true, 12742, audit()))
        .unwrap();
    assert_eq!(uow.commit().unwrap(), 1);

    assert_eq!(uow.commit().unwrap(), 0);
    assert_eq!(uow.planets().get_all().unwrap().len(), 1);
}

#[test]
fn changes_across_repositories_commit_together() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    uow.stars()
        .add(Star::new("Sol", 5500, 1989000, true, audit()))
        .unwrap();
    uow.planets()
        .add(Planet::new("Mars", false, 6779, audit()))
        .unwrap();

    assert_eq!(uow.commit().unwrap(), 2);

    let sol = uow
        .stars()
        .get_single_or_default(|s| s.name.as_deref() == Some("Sol"))
        .unwrap()
        .unwrap();
    assert_eq!(sol.temperature_in_grade_celsius, 5500);
    assert_eq!(sol.weight, 1989000);
    assert!(sol.generates_energy);
    assert_eq!(uow.stars().get(sol.id().unwrap()).unwrap().unwrap(), sol);

    let mars = uow
        .planets()
        .get_single_or_default(|p| p.name.as_deref() == Some("Mars"))
        .unwrap()
        .unwrap();
    assert!(!mars.has_oxygen);
    assert_eq!(uow.planets().get(mars.id().unwrap()).unwrap().unwrap(), mars);
}

#[test]
fn failed_commit_leaves_nothing_durable() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    uow.planets()
        .add(Planet::new("Earth", true, 12742, audit()))
        .unwrap();
    let mut ghost = Planet::new("Ghost", false, 1, audit());
    ghost.id = Some(9_999);
    uow.planets().update(ghost).unwrap();

    let err = uow.commit().unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "planet",
            id: 9_999
        }
    ));
    assert_eq!(uow.state(), UnitOfWorkState::Failed);
    assert_eq!(uow.pending_changes(), 0);

    assert!(uow.planets().get_all().unwrap().is_empty());
    assert!(uow.planets().get(9_999).unwrap().is_none());
}

#[test]
fn failed_commit_is_not_visible_from_a_fresh_unit_of_work() {
    let dir = tempfile::tempdir().unwrap();
    let settings = file_settings(&dir);

    {
        let uow = UnitOfWork::open(&settings).unwrap();
        uow.stars()
            .add(Star::new("Sol", 5500, 1989000, true, audit()))
            .unwrap();
        let mut ghost = Star::new("Ghost", 0, 0, false, audit());
        ghost.id = Some(77);
        uow.stars().remove(&ghost).unwrap();
        assert!(uow.commit().is_err());
    }

    let fresh = UnitOfWork::open(&settings).unwrap();
    assert!(fresh.stars().get_all().unwrap().is_empty());
}

#[test]
fn committed_changes_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let settings = file_settings(&dir);

    let uow = UnitOfWork::open(&settings).unwrap();
    uow.planets()
        .add(Planet::new("Earth", true, 12742, audit()))
        .unwrap();
    uow.commit().unwrap();
    uow.close().unwrap();

    let reopened = UnitOfWork::open(&settings).unwrap();
    let planets = reopened.planets().get_all().unwrap();
    assert_eq!(planets.len(), 1);
    assert_eq!(planets[0].audit, audit());
}

#[test]
fn repositories_are_cached_per_unit_of_work() {
    let uow = UnitOfWork::open_in_memory().unwrap();

    assert!(std::ptr::eq(uow.planets(), uow.planets()));
    assert!(std::ptr::eq(uow.stars(), uow.stars()));

    let other = UnitOfWork::open_in_memory().unwrap();
    assert!(!std::ptr::eq(uow.planets(), other.planets()));
}

#[test]
fn state_follows_lifecycle() {
    let uow = UnitOfWork::open_in_memory().unwrap();
    assert_eq!(uow.state(), UnitOfWorkState::Created);

    let planets = uow.planets();
    assert_eq!(uow.state(), UnitOfWorkState::Active);

    planets
        .add(Planet::new("Earth", true, 12742, audit()))
        .unwrap();
    assert_eq!(uow.state(), UnitOfWorkState::Active);

    uow.commit().unwrap();
    assert_eq!(uow.state(), UnitOfWorkState::Committed);

    planets
        .add(Planet::new("Mars", false, 6779, audit()))
        .unwrap();
    assert_eq!(uow.state(), UnitOfWorkState::Active);
}

#[test]
fn close_discards_uncommitted_changes() {
    let dir = tempfile::tempdir().unwrap();
    let settings = file_settings(&dir);

    let uow = UnitOfWork::open(&settings).unwrap();
    uow.planets()
        .add(Planet::new("Earth", true, 12742, audit()))
        .unwrap();
    uow.close().unwrap();

    let reopened = UnitOfWork::open(&settings).unwrap();
    assert!(reopened.planets().get_all().unwrap().is_empty());
}

#[test]
fn open_accepts_any_configuration_provider() {
    struct FixedProvider;

    impl ConfigurationProvider for FixedProvider {
        fn connection_string(&self) -> String {
            "Server=localhost;Port=3306;Database=:memory:;Uid=usrcosmo;Pwd=;".to_string()
        }
    }

    let uow = UnitOfWork::open(&FixedProvider).unwrap();
    assert_eq!(uow.commit().unwrap(), 0);
}

#[test]
fn open_reports_malformed_connection_string() {
    struct BrokenProvider;

    impl ConfigurationProvider for BrokenProvider {
        fn connection_string(&self) -> String {
            "Server=localhost;Port=3306".to_string()
        }
    }

    assert!(matches!(
        UnitOfWork::open(&BrokenProvider),
        Err(RepoError::Config(_))
    ));
}

#[test]
fn unreachable_store_is_reported_as_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ConnectionSettings {
        database: dir
            .path()
            .join("missing")
            .join("nested")
            .join("cosmo.sqlite3")
            .to_str()
            .unwrap()
            .to_string(),
        ..ConnectionSettings::default()
    };

    match UnitOfWork::open(&settings) {
        Err(err @ RepoError::StorageUnavailable(_)) => assert!(err.is_retryable()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected storage to be unavailable"),
    }
}

#[test]
fn open_accepts_password_with_separator() {
    let settings = ConnectionSettings {
        password: "p;w".to_string(),
        ..ConnectionSettings::in_memory()
    };

    let uow = UnitOfWork::open(&settings).unwrap();
    assert_eq!(uow.state(), UnitOfWorkState::Created);
}
