//! Firma explícita de una función: parámetros nombrados + retorno.

use crate::schema::{DescribeType, TypeTag};

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeTag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
    returns: TypeTag,
}

impl Signature {
    /// Firma sin parámetros con el retorno dado.
    pub fn new(returns: TypeTag) -> Self {
        Self { params: Vec::new(),
               returns }
    }

    pub fn returning<T: DescribeType + ?Sized>() -> Self {
        Self::new(T::type_tag())
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeTag) -> Self {
        self.params.push(Param { name: name.into(), ty });
        self
    }

    pub fn typed_param<T: DescribeType + ?Sized>(self, name: impl Into<String>) -> Self {
        self.param(name, T::type_tag())
    }

    /// Parámetro sin anotación de tipo.
    pub fn untyped_param(self, name: impl Into<String>) -> Self {
        self.param(name, TypeTag::Any)
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn first_param(&self) -> Option<&Param> {
        self.params.first()
    }

    pub fn returns(&self) -> &TypeTag {
        &self.returns
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::new(TypeTag::Any)
    }
}
