//! Stored procedure metadata
//!
//! A procedure is declared like any other [`Entity`]: its properties, in order, are the
//! call arguments. Every argument keeps a weak back-reference to its procedure.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock, Weak};

use type_mapping::{TypeSerializer, Value, ValueType, WireType};

use crate::entity::{descriptors, Accessor, Entity, EntityType, PropertyDescriptor};
use crate::errors::MappingError;
use crate::mapper::Mapper;
use crate::query::{Query, QueryValue, PLACEHOLDER};
use crate::table::not_unique;
use crate::validation::validate_identifier;

#[derive(Debug)]
pub struct ProcedureArg {
    name: String,
    value_type: ValueType,
    serializer: TypeSerializer,
    accessor: Accessor,
    procedure: OnceLock<Weak<Procedure>>,
}

impl ProcedureArg {
    pub fn new(property: PropertyDescriptor, serializer: TypeSerializer) -> Self {
        Self {
            name: property.name().to_string(),
            value_type: property.value_type(),
            serializer,
            accessor: property.accessor().clone(),
            procedure: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn db_type(&self) -> &str {
        self.serializer.db_type()
    }

    pub fn wire_type(&self) -> WireType {
        self.serializer.wire_type()
    }

    pub fn serializer(&self) -> &TypeSerializer {
        &self.serializer
    }

    /// Procedure this argument belongs to
    pub fn procedure(&self) -> Result<Arc<Procedure>, MappingError> {
        self.procedure
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| {
                MappingError::Internal(format!("argument {} is not attached to a procedure", self.name))
            })
    }

    /// `procedure.argument`
    pub fn path(&self) -> Result<String, MappingError> {
        Ok(format!("{}.{}", self.procedure()?.name(), self.name))
    }

    pub fn value(&self, instance: &dyn Any) -> Result<Value, MappingError> {
        self.accessor.read(instance, &self.name)
    }

    pub fn query_value(&self, instance: &dyn Any) -> Result<QueryValue, MappingError> {
        Ok(QueryValue::new(
            self.name.clone(),
            self.value(instance)?,
            &self.serializer,
        ))
    }
}

impl fmt::Display for ProcedureArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.db_type())
    }
}

#[derive(Debug)]
pub struct Procedure {
    procedure_type: EntityType,
    schema: Option<String>,
    path: String,
    args: Vec<ProcedureArg>,
}

impl Procedure {
    /// Assemble a procedure and attach every argument to it
    pub fn new(
        schema: Option<&str>,
        procedure_type: EntityType,
        args: Vec<ProcedureArg>,
    ) -> Result<Arc<Self>, MappingError> {
        validate_identifier(procedure_type.name())?;
        if let Some(schema) = schema {
            validate_identifier(schema)?;
        }
        for arg in &args {
            validate_identifier(&arg.name)?;
            if arg.procedure.get().is_some() {
                return Err(MappingError::Internal(format!(
                    "argument {} already belongs to another procedure",
                    arg.name
                )));
            }
        }
        let duplicates = not_unique(args.iter().map(|a| a.name.as_str()));
        if !duplicates.is_empty() {
            return Err(MappingError::NotUniqueName {
                scope: procedure_type.name().to_string(),
                names: duplicates,
            });
        }

        let path = match schema {
            Some(schema) => format!("{}.{}", schema, procedure_type.name()),
            None => procedure_type.name().to_string(),
        };
        debug_log!("Mapped procedure {} with {} arguments", path, args.len());

        Ok(Arc::new_cyclic(|procedure: &Weak<Procedure>| {
            for arg in &args {
                let _ = arg.procedure.set(procedure.clone());
            }
            Self {
                procedure_type,
                schema: schema.map(str::to_string),
                path,
                args,
            }
        }))
    }

    /// Procedure declared by `P`, arguments in property order
    pub fn from_type<P: Entity>(
        mapper: &Mapper,
        schema: Option<&str>,
    ) -> Result<Arc<Self>, MappingError> {
        let args = descriptors::<P>()
            .into_iter()
            .map(|property| {
                let serializer = mapper.resolve_property(&property, &[])?;
                Ok(ProcedureArg::new(property, serializer))
            })
            .collect::<Result<Vec<_>, MappingError>>()?;
        Self::new(schema, P::entity_type(), args)
    }

    pub fn name(&self) -> &'static str {
        self.procedure_type.name()
    }

    pub fn procedure_type(&self) -> EntityType {
        self.procedure_type
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn args(&self) -> &[ProcedureArg] {
        &self.args
    }

    pub fn arg(&self, name: &str) -> Option<&ProcedureArg> {
        self.args.iter().find(|a| a.name == name)
    }

    /// One placeholder per argument, joined by `separator`
    pub fn sql_arguments(&self, separator: &str) -> String {
        vec![PLACEHOLDER; self.args.len()].join(separator)
    }

    pub fn query_values(&self, instance: &dyn Any) -> Result<Vec<QueryValue>, MappingError> {
        self.args.iter().map(|a| a.query_value(instance)).collect()
    }

    /// `CALL path(?, ...)` with the argument values of `instance`
    pub fn call_query(&self, instance: &dyn Any) -> Result<Query, MappingError> {
        let sql = format!("CALL {}({})", self.path, self.sql_arguments(", "));
        Ok(Query::new(sql, self.query_values(instance)?))
    }
}

impl PartialEq for Procedure {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Procedure {}

impl Hash for Procedure {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.path)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}
