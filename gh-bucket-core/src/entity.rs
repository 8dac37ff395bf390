//! Parsing of the `NAME:TYPE;NAME:TYPE` entity spec.

use crate::error::ConfigurationError;
use tracing::{debug, warn};

const ENTITY_SEPARATOR: char = ';';
const TYPE_SEPARATOR: char = ':';

/// What kind of GitHub account an entity is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Organization,
    /// A TYPE literal that is neither `USER` nor `ORGA`. Nothing is listed for it.
    Unrecognized(String),
}

impl From<&str> for EntityKind {
    fn from(s: &str) -> Self {
        match s {
            "USER" => EntityKind::User,
            "ORGA" => EntityKind::Organization,
            other => EntityKind::Unrecognized(other.to_owned()),
        }
    }
}

impl EntityKind {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, EntityKind::Unrecognized(_))
    }
}

/// A GitHub account whose public repositories are backed up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpec {
    pub name: String,
    pub kind: EntityKind,
}

/// Parses the entity spec string into an ordered list of entities.
///
/// Structure is strict: every entry must split into exactly two `:`-separated fields.
/// The TYPE value is lenient: unknown literals become [`EntityKind::Unrecognized`].
pub fn parse_entities(spec: &str) -> Result<Vec<EntitySpec>, ConfigurationError> {
    if spec.is_empty() {
        return Err(ConfigurationError::EmptyEntities);
    }

    let mut entities = Vec::new();
    for entry in spec.split(ENTITY_SEPARATOR) {
        let fields: Vec<&str> = entry.split(TYPE_SEPARATOR).collect();
        let [name, kind] = fields.as_slice() else {
            return Err(ConfigurationError::MalformedEntity {
                entry: entry.to_owned(),
            });
        };
        let kind = EntityKind::from(*kind);
        if let EntityKind::Unrecognized(literal) = &kind {
            warn!(entity = %name, kind = %literal, "Unrecognized entity type, it will be skipped");
        }
        debug!(entity = %name, ?kind, "Parsed entity");
        entities.push(EntitySpec {
            name: (*name).to_owned(),
            kind,
        });
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_users_and_organisations_in_order() {
        let entities = parse_entities("octocat:USER;acme:ORGA").unwrap();
        assert_eq!(
            entities,
            vec![
                EntitySpec {
                    name: "octocat".into(),
                    kind: EntityKind::User,
                },
                EntitySpec {
                    name: "acme".into(),
                    kind: EntityKind::Organization,
                },
            ]
        );
    }

    #[test]
    fn unknown_type_is_kept_as_unrecognized() {
        let entities = parse_entities("octocat:user;acme:TEAM").unwrap();
        assert_eq!(entities[0].kind, EntityKind::Unrecognized("user".into()));
        assert_eq!(entities[1].kind, EntityKind::Unrecognized("TEAM".into()));
        assert!(!entities[1].kind.is_recognized());
    }

    #[test]
    fn rejects_malformed_entries() {
        struct TestCase {
            name: &'static str,
            spec: &'static str,
        }
        let cases = vec![
            TestCase {
                name: "missing type",
                spec: "octocat",
            },
            TestCase {
                name: "too many fields",
                spec: "octocat:USER:extra",
            },
            TestCase {
                name: "second entry broken",
                spec: "octocat:USER;acme",
            },
            TestCase {
                name: "trailing separator",
                spec: "octocat:USER;",
            },
        ];

        for tc in cases {
            let result = parse_entities(tc.spec);
            assert!(
                matches!(result, Err(ConfigurationError::MalformedEntity { .. })),
                "{}: expected MalformedEntity, got {:?}",
                tc.name,
                result
            );
        }
    }

    #[test]
    fn rejects_empty_spec() {
        assert!(matches!(
            parse_entities(""),
            Err(ConfigurationError::EmptyEntities)
        ));
    }
}
