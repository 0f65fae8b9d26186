use cosmo_core::model::MAX_ACTOR_CHARS;
use cosmo_core::{AuditInfo, Auditable, Entity, Planet, Star, ValidationError};

fn audit() -> AuditInfo {
    AuditInfo::new("user.console", 1_600_000_000_000)
}

#[test]
fn new_entities_have_no_identity_and_no_update_stamp() {
    let planet = Planet::new("Earth", true, 12742, audit());
    assert_eq!(planet.id(), None);
    assert_eq!(planet.name.as_deref(), Some("Earth"));
    assert_eq!(planet.audit().updated_by, None);
    assert_eq!(planet.audit().updated_date, None);

    let star = Star::new("Sol", 5500, 1989000, true, audit());
    assert_eq!(star.id(), None);
    assert!(star.validate().is_ok());
}

#[test]
fn touch_records_mutation_actor_and_time() {
    let mut planet = Planet::new("Earth", true, 12742, audit());
    planet
        .audit_mut()
        .touch("user.editor", 1_600_000_000_500);

    assert_eq!(planet.audit.created_by.as_deref(), Some("user.console"));
    assert_eq!(planet.audit.updated_by.as_deref(), Some("user.editor"));
    assert_eq!(planet.audit.updated_date, Some(1_600_000_000_500));
    assert!(planet.validate().is_ok());
}

#[test]
fn negative_diameter_is_rejected() {
    let planet = Planet::new("Nowhere", false, -1, audit());
    assert_eq!(planet.validate(), Err(ValidationError::NegativeDiameter(-1)));
}

#[test]
fn audit_rules_are_enforced() {
    let blank = Planet::new("Earth", true, 12742, AuditInfo::new("  ", 1));
    assert_eq!(blank.validate(), Err(ValidationError::BlankCreatedBy));

    let long_actor = "x".repeat(MAX_ACTOR_CHARS + 1);
    let too_long = Star::new("Sol", 5500, 1, true, AuditInfo::new(long_actor, 1));
    assert_eq!(
        too_long.validate(),
        Err(ValidationError::ActorTooLong {
            field: "created_by",
            chars: MAX_ACTOR_CHARS + 1,
        })
    );

    let mut backwards = audit();
    backwards.touch("user.editor", backwards.created_date - 1);
    assert!(matches!(
        backwards.validate(),
        Err(ValidationError::UpdatedBeforeCreated { .. })
    ));

    let exact_limit = AuditInfo::new("y".repeat(MAX_ACTOR_CHARS), 1);
    assert!(exact_limit.validate().is_ok());
}

#[test]
fn missing_creator_is_valid_but_not_for_new_records() {
    let legacy = AuditInfo::default();
    assert!(legacy.validate().is_ok());
    assert_eq!(
        legacy.require_creator(),
        Err(ValidationError::MissingCreatedBy)
    );

    let mut touched = legacy;
    touched.touch("admin", 1);
    assert!(touched.validate().is_ok());
    assert_eq!(touched.created_by, None);
}

#[test]
fn planet_serializes_with_audit_trail() {
    let planet = Planet::new("Mars", false, 6779, audit());
    let json = serde_json::to_value(&planet).unwrap();

    assert_eq!(json["name"], "Mars");
    assert_eq!(json["has_oxygen"], false);
    assert_eq!(json["audit"]["created_by"], "user.console");
    assert!(json["id"].is_null());

    let back: Planet = serde_json::from_value(json).unwrap();
    assert_eq!(back, planet);
}
