//! Per-type schema mappings.
//!
//! Every composite type gets an ordered table assigning each persisted field a
//! one-byte identifier starting at [`FIRST_FIELD_ID`]. The writer builds the table
//! from the type's field descriptors the first time the type is seen and emits it
//! inline as a `String -> u8` map container. The reader decodes that same map and
//! inverts it to resolve identifiers back to local fields by name.
//!
//! Both registries are append-only for the life of a stream: an identifier, once
//! assigned or decoded, never changes.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{GraphcodeError, Result};
use crate::format::{FIELD_END, FIRST_FIELD_ID, MAX_FIELDS};
use crate::visitor::GraphObject;

/// The write-side table of one composite type: field names in identifier order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMapping {
    type_name: &'static str,
    entries: Vec<(String, u8)>,
}

impl SchemaMapping {
    /// Builds the mapping from a type's field descriptors.
    pub fn for_type<T: GraphObject>() -> Result<Self> {
        Self::from_fields(T::TYPE_NAME, T::FIELDS)
    }

    /// Builds a mapping assigning identifiers `1..=n` in descriptor order.
    pub fn from_fields(type_name: &'static str, fields: &[&str]) -> Result<Self> {
        if fields.len() > MAX_FIELDS {
            return Err(GraphcodeError::Schema(format!(
                "{type_name} has {} persisted fields; at most {MAX_FIELDS} fit a one-byte identifier",
                fields.len()
            )));
        }
        let entries = fields
            .iter()
            .zip(FIRST_FIELD_ID..=u8::MAX)
            .map(|(name, id)| ((*name).to_owned(), id))
            .collect();
        Ok(Self { type_name, entries })
    }

    /// Name of the composite type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The `(field name, identifier)` table in identifier order.
    pub fn entries(&self) -> &[(String, u8)] {
        &self.entries
    }

    /// Identifier assigned to the field at `index` in descriptor order.
    pub fn id_of(&self, index: usize) -> Option<u8> {
        self.entries.get(index).map(|(_, id)| *id)
    }

    /// Number of persisted fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for a type without persisted fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write-side cache of mappings, keyed by concrete type.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    mappings: HashMap<TypeId, Arc<SchemaMapping>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mapping for `T`, and whether this call created it.
    ///
    /// A `true` flag means the table has not been emitted on this stream yet.
    pub fn get_or_create<T: GraphObject>(&mut self) -> Result<(Arc<SchemaMapping>, bool)> {
        let key = TypeId::of::<T>();
        if let Some(mapping) = self.mappings.get(&key) {
            return Ok((Arc::clone(mapping), false));
        }
        let mapping = Arc::new(SchemaMapping::for_type::<T>()?);
        tracing::debug!(
            type_name = mapping.type_name(),
            fields = mapping.len(),
            "created schema mapping"
        );
        self.mappings.insert(key, Arc::clone(&mapping));
        Ok((mapping, true))
    }

    /// Number of types seen so far.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns `true` before any composite was encoded.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// The read-side view of a decoded table: wire identifier to local field index.
#[derive(Debug, Clone)]
pub struct WireSchema {
    type_name: &'static str,
    /// Indexed by wire identifier. `None` for identifiers absent from the table
    /// or naming a field the local type does not have.
    by_id: Vec<Option<usize>>,
}

impl WireSchema {
    /// Inverts a decoded `(name, id)` table against `T`'s field descriptors.
    pub fn from_table<T: GraphObject>(table: Vec<(String, u8)>) -> Result<Self> {
        Self::resolve(T::TYPE_NAME, T::FIELDS, table)
    }

    /// Inverts a decoded table against an explicit field list.
    pub fn resolve(
        type_name: &'static str,
        fields: &[&str],
        table: Vec<(String, u8)>,
    ) -> Result<Self> {
        let mut by_id: Vec<Option<usize>> = vec![None; MAX_FIELDS + 1];
        let mut seen = vec![false; MAX_FIELDS + 1];
        let mut matched = vec![false; fields.len()];

        for (name, id) in table {
            if id == FIELD_END {
                return Err(GraphcodeError::Schema(format!(
                    "{type_name}: field '{name}' uses the reserved identifier {FIELD_END}"
                )));
            }
            let slot = usize::from(id);
            if seen[slot] {
                return Err(GraphcodeError::Schema(format!(
                    "{type_name}: identifier {id} assigned twice"
                )));
            }
            seen[slot] = true;

            match fields.iter().position(|f| *f == name) {
                Some(index) => {
                    by_id[slot] = Some(index);
                    matched[index] = true;
                }
                None => tracing::debug!(
                    type_name,
                    field = %name,
                    id,
                    "wire field has no local counterpart"
                ),
            }
        }

        let missing: Vec<&str> = fields
            .iter()
            .zip(&matched)
            .filter(|(_, hit)| !**hit)
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            tracing::debug!(type_name, ?missing, "local fields absent from wire schema");
        }

        Ok(Self { type_name, by_id })
    }

    /// Name of the composite type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Resolves a wire identifier to a local field index.
    pub fn local_index(&self, id: u8) -> Result<usize> {
        self.by_id
            .get(usize::from(id))
            .copied()
            .flatten()
            .ok_or(GraphcodeError::UnknownField {
                type_name: self.type_name,
                field_id: id,
            })
    }
}

/// Read-side cache of decoded schemas, keyed by concrete type.
#[derive(Debug, Default)]
pub struct WireSchemaRegistry {
    schemas: HashMap<TypeId, Arc<WireSchema>>,
}

impl WireSchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The decoded schema for `T`, if its table was already read from this stream.
    pub fn lookup<T: GraphObject>(&self) -> Option<Arc<WireSchema>> {
        self.schemas.get(&TypeId::of::<T>()).cloned()
    }

    /// Caches the decoded schema for `T`.
    pub fn register<T: GraphObject>(&mut self, schema: WireSchema) -> Arc<WireSchema> {
        tracing::debug!(type_name = schema.type_name(), "decoded schema mapping");
        let schema = Arc::new(schema);
        self.schemas.insert(TypeId::of::<T>(), Arc::clone(&schema));
        schema
    }

    /// Number of types decoded so far.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` before any schema table was decoded.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
