//! Construcción del router a partir de funciones nombradas.
//!
//! Cada función se registra en `/<nombre>` con los métodos que derive su
//! clasificación:
//!
//! ```ignore
//! let app = ApiBuilder::init()
//!     .add_endpoint_to_router(vec![add, upload, quote])?
//!     .update_app(Router::new());
//! ```

use std::sync::Arc;

use axum::Router;
use indexmap::IndexMap;
use log::info;

use brick_core::NamedFunction;

use crate::endpoint::Endpoint;
use crate::errors::RouteError;

#[derive(Debug, Default)]
pub struct ApiBuilder {
    router: Router,
    endpoints: IndexMap<String, Arc<Endpoint>>,
}

impl ApiBuilder {
    pub fn init() -> Self {
        Self::default()
    }

    /// Registra un endpoint por función. Falla si el nombre no es un
    /// segmento de ruta válido o ya está registrado.
    pub fn add_endpoint_to_router(mut self, functions: Vec<NamedFunction>) -> Result<Self, RouteError> {
        for function in functions {
            let name = function.name().to_string();
            if !is_route_segment(&name) {
                return Err(RouteError::InvalidName(name));
            }
            if self.endpoints.contains_key(&name) {
                return Err(RouteError::Duplicate(name));
            }
            let endpoint = Arc::new(Endpoint::new(function));
            info!("registered {} {:?}", endpoint.path(), endpoint.methods().methods());
            self.router = self.router.route(&endpoint.path(), Arc::clone(&endpoint).into_method_router());
            self.endpoints.insert(name, endpoint);
        }
        Ok(self)
    }

    /// Endpoints en orden de registro.
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values().map(|e| e.as_ref())
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name).map(|e| e.as_ref())
    }

    pub fn get_router(&self) -> Router {
        self.router.clone()
    }

    /// Monta las rutas registradas sobre una aplicación existente.
    ///
    /// # Panics
    ///
    /// Si `app` ya tiene un handler para la misma ruta y método (lo hace
    /// `Router::merge`). Las funciones propias se registran con
    /// `add_endpoint_to_router`, que sí detecta duplicados.
    pub fn update_app(&self, app: Router) -> Router {
        app.merge(self.router.clone())
    }
}

fn is_route_segment(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
