//! Constructor signature matching
//!
//! Turns the caller's signature (a list of type names) into resolved
//! parameter types for a target type. Primitive names come from the
//! primitive table; every other name resolves in the target type's own
//! context, or through the default chain when that context is gone.
//!
//! Arguments whose runtime context differs from their parameter type's
//! context are migrated in place, so the caller's slice may hold new
//! instances afterwards.

use fabrica_core::{FactoryError, Instance, ParamType, PrimitiveType, Result, Type};

use crate::migrate::migrate;
use crate::resolver::TypeResolver;

/// Resolve `names` against `target`, migrating arguments where needed
///
/// `None` means "no signature": the zero-argument constructor applies.
///
/// # Errors
///
/// - `SignatureMismatch` if `names` and `args` differ in length
/// - `TypeNotFound` if a non-primitive name does not resolve
pub fn match_signature(
    resolver: &TypeResolver,
    target: &Type,
    args: &mut [Option<Instance>],
    names: Option<&[&str]>,
) -> Result<Option<Vec<ParamType>>> {
    let names = match names {
        Some(names) => names,
        None => return Ok(None),
    };
    if names.len() != args.len() {
        return Err(FactoryError::SignatureMismatch {
            type_name: target.name().to_string(),
            expected: names.len(),
            actual: args.len(),
        });
    }

    let target_context = target.context();
    let mut params = Vec::with_capacity(names.len());
    for (name, slot) in names.iter().zip(args.iter_mut()) {
        if let Some(primitive) = PrimitiveType::from_name(name) {
            params.push(ParamType::Primitive(primitive));
            continue;
        }

        let ty = match &target_context {
            Some(context) => context.load(name)?,
            None => resolver.resolve_default(name)?,
        };

        if let Some(param_context) = ty.context() {
            if let Some(arg) = slot.take() {
                *slot = Some(if arg.context_id() != ty.context_id() {
                    migrate(arg, &param_context, resolver)
                } else {
                    arg
                });
            }
        }
        params.push(ParamType::Object(ty));
    }
    Ok(Some(params))
}
