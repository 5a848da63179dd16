//! Registro cerrado de tipos declarados.
//!
//! Cada parámetro o retorno de una función se describe con un `TypeTag`. El
//! clasificador y el compilador de pipelines sólo ven estas etiquetas; nunca
//! inspeccionan tipos Rust en runtime. Los tipos Rust se asocian a su
//! etiqueta mediante `DescribeType`.
//!
//! Los modelos estructurados exponen la capacidad `ModelSchema`
//! (parse/dump sobre JSON) construida a partir del trait `Model`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ValidationError;

/// Archivo recibido en una petición multipart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, content: Vec<u8>) -> Self {
        Self { filename: filename.into(),
               content_type,
               content }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Tipo de datos con esquema: se construye validando un mapping JSON y se
/// serializa de vuelta a uno.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + 'static {
    /// Nombre del modelo (aparece en errores de validación).
    const NAME: &'static str;

    /// Validación semántica ligera, posterior a la deserialización.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Construye el modelo desde un mapping no tipado.
    fn from_mapping(value: Value) -> Result<Self, ValidationError> {
        let model: Self = serde_json::from_value(value).map_err(|e| ValidationError::new(Self::NAME, e.to_string()))?;
        model.validate().map_err(|m| ValidationError::new(Self::NAME, m))?;
        Ok(model)
    }

    /// Convierte el modelo a un mapping plano.
    fn to_mapping(&self) -> Result<Value, ValidationError> {
        serde_json::to_value(self).map_err(|e| ValidationError::new(Self::NAME, e.to_string()))
    }
}

/// Capacidad parse/dump de un modelo, con el tipo concreto borrado.
#[derive(Clone, Copy)]
pub struct ModelSchema {
    name: &'static str,
    normalize: fn(Value) -> Result<Value, ValidationError>,
}

fn normalize_via<M: Model>(value: Value) -> Result<Value, ValidationError> {
    M::from_mapping(value)?.to_mapping()
}

impl ModelSchema {
    pub fn of<M: Model>() -> Self {
        Self { name: M::NAME,
               normalize: normalize_via::<M> }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Valida un valor de entrada contra el modelo y devuelve su forma
    /// canónica (campos por defecto aplicados, extras descartados).
    pub fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        (self.normalize)(value)
    }

    /// Re-construye un resultado como modelo y lo vuelca a mapping plano.
    pub fn dump(&self, value: Value) -> Result<Value, ValidationError> {
        (self.normalize)(value)
    }
}

impl fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchema").field("name", &self.name).finish()
    }
}

// Dos esquemas son iguales si describen el mismo modelo.
impl PartialEq for ModelSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Etiqueta de tipo declarada.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeTag {
    Int,
    Float,
    Bool,
    Text,
    Upload,
    UploadList,
    Model(ModelSchema),
    List(Box<TypeTag>),
    Map,
    /// Construcción genérica (Option<T>, tuplas, ...). Nunca es modelo.
    Generic(String),
    /// Sin anotación.
    Any,
}

impl TypeTag {
    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeTag::Int | TypeTag::Float | TypeTag::Bool | TypeTag::Text)
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, TypeTag::Upload | TypeTag::UploadList)
    }

    /// Capability check: ¿expone este tipo parse/dump de modelo?
    /// Total sobre todas las etiquetas.
    pub fn is_model(&self) -> bool {
        self.model_schema().is_some()
    }

    pub fn model_schema(&self) -> Option<&ModelSchema> {
        match self {
            TypeTag::Model(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn of<T: DescribeType + ?Sized>() -> Self {
        T::type_tag()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Int => f.write_str("int"),
            TypeTag::Float => f.write_str("float"),
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::Text => f.write_str("str"),
            TypeTag::Upload => f.write_str("UploadFile"),
            TypeTag::UploadList => f.write_str("list[UploadFile]"),
            TypeTag::Model(schema) => f.write_str(schema.name()),
            TypeTag::List(inner) => write!(f, "list[{inner}]"),
            TypeTag::Map => f.write_str("dict"),
            TypeTag::Generic(repr) => f.write_str(repr),
            TypeTag::Any => f.write_str("Any"),
        }
    }
}

/// Asocia un tipo Rust a su etiqueta declarada.
pub trait DescribeType {
    fn type_tag() -> TypeTag;
}

macro_rules! describe_as {
    ($tag:expr => $($ty:ty),+ $(,)?) => {
        $(impl DescribeType for $ty {
            fn type_tag() -> TypeTag { $tag }
        })+
    };
}

describe_as!(TypeTag::Int => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
describe_as!(TypeTag::Float => f32, f64);
describe_as!(TypeTag::Bool => bool);
describe_as!(TypeTag::Text => String, str);
describe_as!(TypeTag::Upload => UploadFile);
describe_as!(TypeTag::Any => Value);
describe_as!(TypeTag::Map => serde_json::Map<String, Value>);

impl<V> DescribeType for HashMap<String, V> {
    fn type_tag() -> TypeTag {
        TypeTag::Map
    }
}

impl<V> DescribeType for BTreeMap<String, V> {
    fn type_tag() -> TypeTag {
        TypeTag::Map
    }
}

impl<T: DescribeType> DescribeType for Vec<T> {
    fn type_tag() -> TypeTag {
        match T::type_tag() {
            TypeTag::Upload => TypeTag::UploadList,
            inner => TypeTag::List(Box::new(inner)),
        }
    }
}

impl<T: DescribeType> DescribeType for Option<T> {
    fn type_tag() -> TypeTag {
        TypeTag::Generic(format!("Optional[{}]", T::type_tag()))
    }
}

/// Implementa `Model` y `DescribeType` para un struct serde existente.
///
///   impl_model!(Invoice);
#[macro_export]
macro_rules! impl_model {
    ($name:ident) => {
        impl $crate::schema::Model for $name {
            const NAME: &'static str = stringify!($name);
        }
        impl $crate::schema::DescribeType for $name {
            fn type_tag() -> $crate::schema::TypeTag {
                $crate::schema::TypeTag::Model($crate::schema::ModelSchema::of::<$name>())
            }
        }
    };
}

/// Declara un modelo estructurado con derives, `Model` y `DescribeType`.
///
/// Formas soportadas:
/// - typed_model!(Name { a: i64, b: String });
/// - typed_model!(Name { a: i64 } validate(m) { if m.a < 0 { Err(..) } else { Ok(()) } });
#[macro_export]
macro_rules! typed_model {
    ($name:ident { $($fname:ident : $fty:ty),+ $(,)? } validate($self_ident:ident) $body:block) => {
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        pub struct $name { $(pub $fname: $fty,)+ }
        impl $crate::schema::Model for $name {
            const NAME: &'static str = stringify!($name);
            fn validate(&self) -> Result<(), String> {
                let $self_ident = self;
                $body
            }
        }
        impl $crate::schema::DescribeType for $name {
            fn type_tag() -> $crate::schema::TypeTag {
                $crate::schema::TypeTag::Model($crate::schema::ModelSchema::of::<$name>())
            }
        }
    };
    ($name:ident { $($fname:ident : $fty:ty),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        pub struct $name { $(pub $fname: $fty,)+ }
        $crate::impl_model!($name);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    typed_model!(Point { x: i64, y: i64 });
    typed_model!(Positive { n: i64 } validate(m) {
        if m.n > 0 { Ok(()) } else { Err(format!("n must be positive, got {}", m.n)) }
    });

    #[test]
    fn scalar_tags() {
        assert_eq!(TypeTag::of::<i32>(), TypeTag::Int);
        assert_eq!(TypeTag::of::<f64>(), TypeTag::Float);
        assert_eq!(TypeTag::of::<bool>(), TypeTag::Bool);
        assert_eq!(TypeTag::of::<String>(), TypeTag::Text);
        assert!(TypeTag::of::<u64>().is_scalar());
    }

    #[test]
    fn upload_sequences_get_their_own_tag() {
        assert_eq!(TypeTag::of::<Vec<UploadFile>>(), TypeTag::UploadList);
        assert_eq!(TypeTag::of::<Vec<i64>>(), TypeTag::List(Box::new(TypeTag::Int)));
        assert!(!TypeTag::of::<Vec<i64>>().is_upload());
    }

    #[test]
    fn model_check_is_total() {
        assert!(TypeTag::of::<Point>().is_model());
        assert!(!TypeTag::of::<Option<Point>>().is_model());
        assert!(!TypeTag::Generic("Union[int, str]".into()).is_model());
        assert!(!TypeTag::Any.is_model());
        assert!(!TypeTag::Map.is_model());
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(TypeTag::of::<Option<Point>>().to_string(), "Optional[Point]");
        assert_eq!(TypeTag::of::<Vec<String>>().to_string(), "list[str]");
    }

    #[test]
    fn schema_parse_validates_and_normalizes() {
        let schema = ModelSchema::of::<Point>();
        let out = schema.parse(json!({"x": 1, "y": 2, "extra": true})).unwrap();
        assert_eq!(out, json!({"x": 1, "y": 2}));

        let err = schema.parse(json!({"x": "no"})).unwrap_err();
        assert_eq!(err.target, "Point");
    }

    #[test]
    fn custom_validation_runs_after_deserialize() {
        let schema = ModelSchema::of::<Positive>();
        assert!(schema.parse(json!({"n": 3})).is_ok());
        let err = schema.parse(json!({"n": -1})).unwrap_err();
        assert_eq!(err.message, "n must be positive, got -1");
    }

    #[test]
    fn to_mapping_matches_dump() {
        let p = Point { x: 3, y: 4 };
        let schema = ModelSchema::of::<Point>();
        assert_eq!(schema.dump(p.to_mapping().unwrap()).unwrap(), p.to_mapping().unwrap());
    }
}
