//! Cross-context object migration
//!
//! An argument built in one loading context cannot be passed to a
//! constructor expecting the same-named type from another context: the two
//! are different types. Migration serializes the argument and rebuilds it
//! as the type the receiving context defines.
//!
//! ```text
//! Instance (ctx A) ──codec.encode──▶ Envelope { type_name, payload }
//!                                         │
//!             ContextInput::read_object ──┘ resolve type_name in ctx B,
//!                                           then the default chain,
//!                                           decode payload with its codec
//! ```
//!
//! Migration is best effort: [`migrate`] never fails, it hands back the
//! original instance when any step does not work out.

use fabrica_core::{BoxError, Instance, LoadingContext, TypeNotFound};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::resolver::TypeResolver;

/// Why a migration step did not complete
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The type did not opt into migration
    #[error("type {0} is not serializable")]
    NotSerializable(String),

    /// The codec could not encode the value
    #[error("failed to encode {type_name}: {source}")]
    Encode {
        /// Type being encoded
        type_name: String,
        /// Codec failure
        #[source]
        source: BoxError,
    },

    /// The byte stream or payload could not be decoded
    #[error("failed to decode: {0}")]
    Decode(#[source] BoxError),

    /// The receiving side does not define the type
    #[error(transparent)]
    TypeNotFound(#[from] TypeNotFound),
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    type_name: String,
    payload: Vec<u8>,
}

/// Serialize an instance into a self-describing byte stream
///
/// # Errors
///
/// Fails if the instance's type has no codec or the codec rejects it.
pub fn write_object(object: &Instance) -> Result<Vec<u8>, MigrationError> {
    let payload = object
        .encode()
        .ok_or_else(|| MigrationError::NotSerializable(object.type_name().to_string()))?
        .map_err(|source| MigrationError::Encode {
            type_name: object.type_name().to_string(),
            source,
        })?;
    let envelope = Envelope {
        type_name: object.type_name().to_string(),
        payload,
    };
    bincode::serialize(&envelope).map_err(|e| MigrationError::Encode {
        type_name: object.type_name().to_string(),
        source: e.into(),
    })
}

/// Reads a byte stream back into an instance of a given context
///
/// The stream's type name is resolved in the target context first and,
/// if a fallback resolver is attached, through its default chain next.
pub struct ContextInput<'a> {
    bytes: &'a [u8],
    context: &'a Arc<dyn LoadingContext>,
    fallback: Option<&'a TypeResolver>,
}

impl<'a> ContextInput<'a> {
    /// Reader resolving types through `context` only
    pub fn new(bytes: &'a [u8], context: &'a Arc<dyn LoadingContext>) -> Self {
        Self {
            bytes,
            context,
            fallback: None,
        }
    }

    /// Fall back to a resolver's default chain when `context` misses
    pub fn with_fallback(mut self, resolver: &'a TypeResolver) -> Self {
        self.fallback = Some(resolver);
        self
    }

    /// Rebuild the serialized instance
    ///
    /// # Errors
    ///
    /// Fails if the stream is malformed, no context defines the type, the
    /// resolved type has no codec, or the payload does not decode.
    pub fn read_object(&self) -> Result<Instance, MigrationError> {
        let envelope: Envelope =
            bincode::deserialize(self.bytes).map_err(|e| MigrationError::Decode(e.into()))?;

        let ty = match self.context.load(&envelope.type_name) {
            Ok(ty) => ty,
            Err(not_found) => match self.fallback {
                Some(resolver) => resolver
                    .resolve_default(&envelope.type_name)
                    .map_err(|_| not_found)?,
                None => return Err(not_found.into()),
            },
        };

        let codec = ty
            .def()
            .codec()
            .ok_or_else(|| MigrationError::NotSerializable(ty.name().to_string()))?;
        let value = codec
            .decode(&envelope.payload)
            .map_err(MigrationError::Decode)?;
        Ok(Instance::new(ty, value))
    }
}

/// Move an instance into `target`, or return it unchanged
pub fn migrate(
    object: Instance,
    target: &Arc<dyn LoadingContext>,
    fallback: &TypeResolver,
) -> Instance {
    let bytes = match write_object(&object) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(target: "fabrica::migrate", type_name = object.type_name(), context = target.name(), error = %e, "Migration skipped");
            return object;
        }
    };

    match ContextInput::new(&bytes, target)
        .with_fallback(fallback)
        .read_object()
    {
        Ok(migrated) => {
            debug!(target: "fabrica::migrate", type_name = migrated.type_name(), context = target.name(), "Migrated argument");
            migrated
        }
        Err(e) => {
            debug!(target: "fabrica::migrate", type_name = object.type_name(), context = target.name(), error = %e, "Migration failed, keeping original");
            object
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabrica_core::{builtins, TypeDef, TypeLibrary};

    #[test]
    fn test_round_trip_in_same_context() {
        let object = Instance::from("I am testing");
        let bytes = write_object(&object).unwrap();

        let process = builtins::process();
        let copy = ContextInput::new(&bytes, &process).read_object().unwrap();

        assert_eq!(copy.ty(), object.ty());
        assert_eq!(
            copy.downcast_ref::<String>(),
            object.downcast_ref::<String>()
        );
    }

    #[test]
    fn test_read_into_other_context() {
        let plugins: Arc<dyn LoadingContext> = TypeLibrary::builder("plugins")
            .define(TypeDef::builder("app::Label").serializable::<String>().build())
            .build();
        let home: Arc<dyn LoadingContext> = TypeLibrary::builder("home")
            .define(TypeDef::builder("app::Label").serializable::<String>().build())
            .build();

        let label = Instance::of(home.load("app::Label").unwrap(), "hi".to_string());
        let bytes = write_object(&label).unwrap();
        let moved = ContextInput::new(&bytes, &plugins).read_object().unwrap();

        assert_eq!(moved.context_id(), plugins.id());
        assert_eq!(moved.downcast_ref::<String>().unwrap(), "hi");
    }

    #[test]
    fn test_unknown_type_without_fallback() {
        let empty: Arc<dyn LoadingContext> = TypeLibrary::builder("empty").build();
        let bytes = write_object(&Instance::from(3i32)).unwrap();

        let err = ContextInput::new(&bytes, &empty).read_object().unwrap_err();
        assert!(matches!(err, MigrationError::TypeNotFound(_)));
    }

    #[test]
    fn test_fallback_resolves_through_default_chain() {
        let empty: Arc<dyn LoadingContext> = TypeLibrary::builder("empty").build();
        let resolver = TypeResolver::new(builtins::process());
        let bytes = write_object(&Instance::from(3i32)).unwrap();

        let copy = ContextInput::new(&bytes, &empty)
            .with_fallback(&resolver)
            .read_object()
            .unwrap();
        assert_eq!(copy.downcast_ref::<i32>(), Some(&3));
    }

    #[test]
    fn test_garbage_stream_is_decode_error() {
        let process = builtins::process();
        let err = ContextInput::new(&[0xFF; 4], &process)
            .read_object()
            .unwrap_err();
        assert!(matches!(err, MigrationError::Decode(_)));
    }

    #[test]
    fn test_migrate_returns_original_when_not_serializable() {
        let lib: Arc<dyn LoadingContext> = TypeLibrary::builder("lib")
            .define(TypeDef::builder("app::Handle").build())
            .build();
        let resolver = TypeResolver::new(builtins::process());
        let handle = Instance::of(lib.load("app::Handle").unwrap(), 99u64);

        let target = builtins::process();
        let back = migrate(handle, &target, &resolver);
        assert_eq!(back.context_id(), lib.id());
        assert_eq!(back.downcast_ref::<u64>(), Some(&99));
    }
}
