//! Type definitions
//!
//! Rust has no runtime type discovery, so every constructible type is
//! described by a [`TypeDef`]: its fully-qualified name, the constructors
//! it offers (each keyed by an exact list of parameter type names), and an
//! optional [`Codec`] that lets instances move between loading contexts.
//!
//! ```ignore
//! let point = TypeDef::builder("geo::Point")
//!     .constructor(&[], |_| Ok(Point::default()))
//!     .constructor(&["i64", "i64"], |args| {
//!         Ok(Point { x: *args.get::<i64>(0)?, y: *args.get::<i64>(1)? })
//!     })
//!     .serializable::<Point>()
//!     .build();
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::instance::Instance;
use crate::traits::{Factory, LoadingContext};

/// Type-erased value produced by a constructor body
pub type AnyValue = Box<dyn Any + Send + Sync>;

/// Constructor body
pub type ConstructorFn = Arc<dyn Fn(&Args<'_>) -> Result<AnyValue, BoxError> + Send + Sync>;

/// Definition of a constructible type
pub struct TypeDef {
    name: String,
    constructors: Vec<Constructor>,
    codec: Option<Codec>,
}

impl TypeDef {
    /// Start describing a type
    pub fn builder(name: impl Into<String>) -> TypeDefBuilder {
        TypeDefBuilder {
            name: name.into(),
            constructors: Vec::new(),
            codec: None,
        }
    }

    /// Fully-qualified type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All declared constructors, in declaration order
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Constructor declared with exactly these parameter type names
    pub fn constructor(&self, params: &[&str]) -> Option<&Constructor> {
        self.constructors.iter().find(|c| c.matches(params))
    }

    /// Migration codec, present if the type opted in
    pub fn codec(&self) -> Option<&Codec> {
        self.codec.as_ref()
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("constructors", &self.constructors)
            .field("serializable", &self.codec.is_some())
            .finish()
    }
}

/// Builder for [`TypeDef`]
pub struct TypeDefBuilder {
    name: String,
    constructors: Vec<Constructor>,
    codec: Option<Codec>,
}

impl TypeDefBuilder {
    /// Declare a constructor taking parameters of the named types
    ///
    /// If two constructors share a parameter list, the first declared wins.
    pub fn constructor<T, F>(mut self, params: &[&str], body: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Args<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.constructors.push(Constructor {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: Arc::new(move |args: &Args<'_>| body(args).map(|v| Box::new(v) as AnyValue)),
        });
        self
    }

    /// Declare the type as a factory strategy built by `make`
    ///
    /// Strategy types are instantiated without arguments.
    pub fn factory<F, M>(self, make: M) -> Self
    where
        F: Factory + 'static,
        M: Fn() -> F + Send + Sync + 'static,
    {
        self.constructor(&[], move |_| Ok(Box::new(make()) as Box<dyn Factory>))
    }

    /// Declare the type as a loading-context provider built by `make`
    pub fn loading_context<M>(self, make: M) -> Self
    where
        M: Fn() -> Arc<dyn LoadingContext> + Send + Sync + 'static,
    {
        self.constructor(&[], move |_| Ok(make()))
    }

    /// Allow instances to migrate between contexts through serde
    pub fn serializable<T>(mut self) -> Self
    where
        T: Serialize + DeserializeOwned + Any + Send + Sync,
    {
        self.codec = Some(Codec {
            encode: encode_as::<T>,
            decode: decode_as::<T>,
        });
        self
    }

    /// Finish the definition
    pub fn build(self) -> TypeDef {
        TypeDef {
            name: self.name,
            constructors: self.constructors,
            codec: self.codec,
        }
    }
}

/// A declared constructor
#[derive(Clone)]
pub struct Constructor {
    params: Vec<String>,
    body: ConstructorFn,
}

impl Constructor {
    /// Declared parameter type names
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    fn matches(&self, params: &[&str]) -> bool {
        self.params.iter().map(String::as_str).eq(params.iter().copied())
    }

    /// Run the body on already-validated arguments
    pub fn invoke(&self, args: &[Option<Instance>]) -> Result<AnyValue, BoxError> {
        (self.body)(&Args::new(args))
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.params.join(", "))
    }
}

/// Arguments handed to a constructor body
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [Option<Instance>],
}

impl<'a> Args<'a> {
    /// Wrap an argument slice
    pub fn new(values: &'a [Option<Instance>]) -> Self {
        Self { values }
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no arguments
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw argument at `index`; `None` for a null argument
    pub fn instance(&self, index: usize) -> Option<&'a Instance> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Non-null argument at `index` as a `T`
    pub fn get<T: Any>(&self, index: usize) -> Result<&'a T, BoxError> {
        self.opt::<T>(index)?
            .ok_or_else(|| format!("argument {} is null", index).into())
    }

    /// Possibly-null argument at `index` as a `T`
    pub fn opt<T: Any>(&self, index: usize) -> Result<Option<&'a T>, BoxError> {
        let slot = self
            .values
            .get(index)
            .ok_or_else(|| format!("argument {} is missing", index))?;
        match slot {
            None => Ok(None),
            Some(instance) => instance.downcast_ref::<T>().map(Some).ok_or_else(|| {
                format!(
                    "argument {} is a {}, not a {}",
                    index,
                    instance.type_name(),
                    std::any::type_name::<T>()
                )
                .into()
            }),
        }
    }
}

/// Serialization hooks used to move an instance between contexts
#[derive(Clone, Copy)]
pub struct Codec {
    encode: fn(&dyn Any) -> Result<Vec<u8>, BoxError>,
    decode: fn(&[u8]) -> Result<AnyValue, BoxError>,
}

impl Codec {
    /// Serialize a value of the codec's type
    pub fn encode(&self, value: &dyn Any) -> Result<Vec<u8>, BoxError> {
        (self.encode)(value)
    }

    /// Rebuild a value of the codec's type
    pub fn decode(&self, bytes: &[u8]) -> Result<AnyValue, BoxError> {
        (self.decode)(bytes)
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Codec")
    }
}

fn encode_as<T: Serialize + Any>(value: &dyn Any) -> Result<Vec<u8>, BoxError> {
    let value = value
        .downcast_ref::<T>()
        .ok_or("value does not match the codec's type")?;
    Ok(bincode::serialize(value)?)
}

fn decode_as<T: DeserializeOwned + Any + Send + Sync>(bytes: &[u8]) -> Result<AnyValue, BoxError> {
    Ok(Box::new(bincode::deserialize::<T>(bytes)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    #[test]
    fn test_constructor_lookup_is_exact() {
        let def = TypeDef::builder("app::Pair")
            .constructor(&[], |_| Ok((0i32, 0i32)))
            .constructor(&["i32", "i32"], |args| {
                Ok((*args.get::<i32>(0)?, *args.get::<i32>(1)?))
            })
            .build();

        assert_eq!(def.constructor(&[]).map(Constructor::arity), Some(0));
        assert_eq!(def.constructor(&["i32", "i32"]).map(Constructor::arity), Some(2));
        assert!(def.constructor(&["i32"]).is_none());
        assert!(def.constructor(&["i64", "i64"]).is_none());
    }

    #[test]
    fn test_invoke_reads_typed_arguments() {
        let def = TypeDef::builder("app::Pair")
            .constructor(&["i32", "i32"], |args| {
                Ok((*args.get::<i32>(0)?, *args.get::<i32>(1)?))
            })
            .build();
        let ctor = def.constructor(&["i32", "i32"]).unwrap();

        let args = vec![Some(Instance::from(3i32)), Some(Instance::from(4i32))];
        let value = ctor.invoke(&args).unwrap();
        assert_eq!(value.downcast_ref::<(i32, i32)>(), Some(&(3, 4)));
    }

    #[test]
    fn test_args_report_null_and_wrong_type() {
        let values = vec![None, Some(Instance::from("text"))];
        let args = Args::new(&values);

        assert!(args.opt::<String>(0).unwrap().is_none());
        assert!(args.get::<String>(0).is_err());
        assert_eq!(args.get::<String>(1).unwrap(), "text");

        let err = args.get::<i32>(1).unwrap_err().to_string();
        assert!(err.contains(builtins::STRING), "got: {}", err);
        assert!(args.get::<String>(2).is_err());
    }

    #[test]
    fn test_codec_round_trip() {
        let def = TypeDef::builder("app::Name").serializable::<String>().build();
        let codec = def.codec().unwrap();

        let bytes = codec.encode(&"hello".to_string()).unwrap();
        let back = codec.decode(&bytes).unwrap();
        assert_eq!(back.downcast_ref::<String>().map(String::as_str), Some("hello"));
    }

    #[test]
    fn test_codec_rejects_foreign_value() {
        let def = TypeDef::builder("app::Name").serializable::<String>().build();
        assert!(def.codec().unwrap().encode(&42u8).is_err());
    }

    #[test]
    fn test_type_without_codec() {
        let def = TypeDef::builder("app::Opaque").build();
        assert!(def.codec().is_none());
        assert!(format!("{:?}", def).contains("serializable: false"));
    }
}
