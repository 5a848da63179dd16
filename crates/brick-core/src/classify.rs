//! Clasificador de parámetros.
//!
//! Asigna a cada parámetro de una firma una estrategia de binding (query,
//! body, file o model) y deriva el conjunto de métodos HTTP aceptados. Es
//! una función total: cualquier firma legal se clasifica sin error; lo que
//! no se reconoce cae en `Body`.

use std::fmt;

use crate::schema::TypeTag;
use crate::signature::Signature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Query,
    Body,
    File,
    Model,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BindingKind::Query => "query",
            BindingKind::Body => "body",
            BindingKind::File => "file",
            BindingKind::Model => "model",
        };
        f.write_str(s)
    }
}

/// Descriptor inmutable de un parámetro ya clasificado.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub name: String,
    pub ty: TypeTag,
    pub binding: BindingKind,
}

/// Métodos aceptados por un endpoint.
///
/// Heurística: basta un parámetro file/model/body para restringir a
/// `WriteOnly`. Es una sobre-aproximación (un GET con body es legal en HTTP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodSet {
    /// GET + POST
    ReadWrite,
    /// Sólo POST
    WriteOnly,
}

impl MethodSet {
    pub fn methods(&self) -> &'static [&'static str] {
        match self {
            MethodSet::ReadWrite => &["GET", "POST"],
            MethodSet::WriteOnly => &["POST"],
        }
    }

    pub fn allows_read(&self) -> bool {
        matches!(self, MethodSet::ReadWrite)
    }
}

pub fn binding_for(ty: &TypeTag) -> BindingKind {
    if ty.is_upload() {
        BindingKind::File
    } else if ty.is_scalar() {
        BindingKind::Query
    } else if ty.is_model() {
        BindingKind::Model
    } else {
        BindingKind::Body
    }
}

pub fn classify(signature: &Signature) -> Vec<ParamDescriptor> {
    signature.params()
             .iter()
             .map(|p| ParamDescriptor { name: p.name.clone(),
                                        ty: p.ty.clone(),
                                        binding: binding_for(&p.ty) })
             .collect()
}

pub fn method_set(params: &[ParamDescriptor]) -> MethodSet {
    if params.iter().all(|p| p.binding == BindingKind::Query) {
        MethodSet::ReadWrite
    } else {
        MethodSet::WriteOnly
    }
}
