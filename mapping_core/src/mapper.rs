//! Serializer resolution for one dialect
//!
//! The [`Mapper`] combines the serializer registry with owner-scoped overrides and the set
//! of entity types accepted as query inputs. It is configured once with `&mut self` methods
//! and then shared read-only (usually behind an `Arc`).

use std::collections::{HashMap, HashSet};

use type_mapping::{Dialect, SerializerRegistry, TypeMappingError, TypeSerializer, ValueType};

use crate::entity::{descriptors, Entity, EntityType, PropertyDescriptor};
use crate::errors::MappingError;

#[derive(Debug, Clone)]
pub struct Mapper {
    dialect: Dialect,
    registry: SerializerRegistry,
    overrides: HashMap<(EntityType, ValueType), TypeSerializer>,
    inputs: HashSet<EntityType>,
}

impl Mapper {
    /// Mapper over the built-in serializers
    pub fn new(dialect: Dialect) -> Self {
        Self::with_registry(dialect, SerializerRegistry::with_builtins())
    }

    pub fn with_registry(dialect: Dialect, registry: SerializerRegistry) -> Self {
        Self {
            dialect,
            registry,
            overrides: HashMap::new(),
            inputs: HashSet::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn registry(&self) -> &SerializerRegistry {
        &self.registry
    }

    pub fn register_serializer(&mut self, serializer: TypeSerializer) -> Result<(), MappingError> {
        self.registry.register(serializer)?;
        Ok(())
    }

    /// Serializer used only for properties of `E` with the serializer's value type
    pub fn register_override<E: Entity>(
        &mut self,
        serializer: TypeSerializer,
    ) -> Result<(), MappingError> {
        let key = (E::entity_type(), serializer.value_type());
        if self.overrides.contains_key(&key) {
            return Err(TypeMappingError::DuplicateSerializer {
                value_type: key.1.name(),
                dialect: serializer.dialect(),
            }
            .into());
        }
        debug_log!("Registering override {} for {}", serializer, key.0);
        self.overrides.insert(key, serializer);
        Ok(())
    }

    /// Accept `E` as a query input; every property serializer must resolve
    pub fn register_input<E: Entity>(&mut self) -> Result<(), MappingError> {
        let entity = E::entity_type();
        for property in descriptors::<E>() {
            self.resolve_property(&property, &[])?;
        }
        debug_log!("Registered query input {}", entity);
        self.inputs.insert(entity);
        Ok(())
    }

    pub fn is_registered(&self, entity: EntityType) -> bool {
        self.inputs.contains(&entity)
    }

    /// Serializer for a value of `property_type` owned by `owner`
    pub fn get_serializer(
        &self,
        owner: EntityType,
        property_type: ValueType,
    ) -> Result<&TypeSerializer, MappingError> {
        self.lookup(owner, property_type, &[])
            .map_err(|source| MappingError::Serializer {
                owner: owner.name(),
                value_type: property_type.name(),
                source,
            })
    }

    /// Resolve the serializer of a declared property; `scope` holds schema-scoped
    /// serializers, consulted after owner overrides and before the registry
    pub fn resolve_property(
        &self,
        property: &PropertyDescriptor,
        scope: &[TypeSerializer],
    ) -> Result<TypeSerializer, MappingError> {
        self.lookup(property.owner(), property.value_type(), scope)
            .cloned()
            .map_err(|_| MappingError::SerializerNotFound {
                entity: property.owner().name(),
                property: property.name().to_string(),
                value_type: property.value_type().name(),
            })
    }

    fn lookup<'a>(
        &'a self,
        owner: EntityType,
        value_type: ValueType,
        scope: &'a [TypeSerializer],
    ) -> Result<&'a TypeSerializer, TypeMappingError> {
        if let Some(serializer) = self.overrides.get(&(owner, value_type)) {
            return Ok(serializer);
        }
        if let Some(serializer) = scope
            .iter()
            .find(|s| s.value_type() == value_type && s.dialect() == self.dialect)
        {
            return Ok(serializer);
        }
        self.registry.resolve(value_type, self.dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::*;
    use type_mapping::{DbValue, Value, WireType};

    fn upper_text(dialect: Dialect) -> TypeSerializer {
        TypeSerializer::new::<String>(
            dialect,
            "CLOB",
            WireType::Varchar,
            |v| match v {
                Value::Text(s) => Ok(DbValue::Text(s.to_uppercase())),
                other => Err(TypeMappingError::Encode {
                    expected: "String",
                    found: format!("{:?}", other),
                }),
            },
            |v| match v {
                DbValue::Text(s) => Ok(Value::Text(s.clone())),
                other => Err(TypeMappingError::Decode {
                    expected: "TEXT",
                    found: format!("{:?}", other),
                }),
            },
        )
    }

    #[test]
    fn test_resolves_builtin_for_dialect() {
        let mapper = Mapper::new(Dialect::Postgres);
        let serializer = mapper
            .get_serializer(Artist::entity_type(), ValueType::of::<String>())
            .unwrap();
        assert_eq!(serializer.db_type(), "VARCHAR");
        assert_eq!(serializer.dialect(), Dialect::Postgres);
    }

    #[test]
    fn test_unknown_type_is_reported_not_guessed() {
        let mapper = Mapper::new(Dialect::Sqlite);
        let err = mapper
            .get_serializer(Invoice::entity_type(), ValueType::of::<Money>())
            .unwrap_err();
        assert!(matches!(
            err,
            MappingError::Serializer {
                owner: "Invoice",
                source: TypeMappingError::UnknownType { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_custom_serializer_makes_type_resolvable() {
        let mut mapper = Mapper::new(Dialect::Sqlite);
        mapper.register_serializer(money_text(Dialect::Sqlite)).unwrap();
        assert!(mapper
            .get_serializer(Invoice::entity_type(), ValueType::of::<Money>())
            .is_ok());
        assert!(mapper
            .register_serializer(money_text(Dialect::Sqlite))
            .is_err());
    }

    #[test]
    fn test_override_applies_to_its_owner_only() {
        let mut mapper = Mapper::new(Dialect::Sqlite);
        mapper.register_override::<Album>(upper_text(Dialect::Sqlite)).unwrap();

        let album = mapper
            .get_serializer(Album::entity_type(), ValueType::of::<String>())
            .unwrap();
        let artist = mapper
            .get_serializer(Artist::entity_type(), ValueType::of::<String>())
            .unwrap();
        assert_eq!(album.db_type(), "CLOB");
        assert_eq!(artist.db_type(), "TEXT");
    }

    #[test]
    fn test_duplicate_override_rejected() {
        let mut mapper = Mapper::new(Dialect::Sqlite);
        mapper.register_override::<Album>(upper_text(Dialect::Sqlite)).unwrap();
        assert!(mapper.register_override::<Album>(upper_text(Dialect::Sqlite)).is_err());
    }

    #[test]
    fn test_scope_sits_between_override_and_registry() {
        let mapper = Mapper::new(Dialect::Sqlite);
        let scope = [upper_text(Dialect::Sqlite)];
        let name = descriptors::<Artist>().remove(1);
        assert_eq!(mapper.resolve_property(&name, &scope).unwrap().db_type(), "CLOB");
        assert_eq!(mapper.resolve_property(&name, &[]).unwrap().db_type(), "TEXT");

        // scoped serializers of another dialect are ignored
        let foreign_scope = [upper_text(Dialect::Postgres)];
        assert_eq!(
            mapper.resolve_property(&name, &foreign_scope).unwrap().db_type(),
            "TEXT"
        );
    }

    #[test]
    fn test_register_input_checks_every_property() {
        let mut mapper = Mapper::new(Dialect::Sqlite);
        mapper.register_input::<Artist>().unwrap();
        assert!(mapper.is_registered(Artist::entity_type()));

        let err = mapper.register_input::<Invoice>().unwrap_err();
        assert!(matches!(err, MappingError::SerializerNotFound { entity: "Invoice", .. }));
        assert!(!mapper.is_registered(Invoice::entity_type()));
    }
}
