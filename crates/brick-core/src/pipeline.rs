//! Compilador de pipelines.
//!
//! Un `Pipeline` encadena steps de un valor (`NamedFunction`) en una sola
//! función nombrada. Si no se declaran, los esquemas de entrada y salida se
//! infieren del primer parámetro del primer step y del retorno del último,
//! en el momento en que se fija la lista de steps.
//!
//! Uso:
//!   let f = Pipeline::init("quote")
//!       .functions(vec![parse, price, render])
//!       .to_function()?;          // síncrono
//!   let g = pipeline.to_afunction()?; // asíncrono, nombre "quote_async"
//!
//! La función compilada declara un único parámetro (`input_data`) con el
//! esquema de entrada, de modo que puede registrarse como endpoint.

use std::sync::Arc;

use log::{debug, trace};
use serde_json::Value;

use crate::classify::{binding_for, BindingKind};
use crate::errors::{CallError, ConfigError};
use crate::function::{Args, NamedFunction};
use crate::schema::{DescribeType, TypeTag};
use crate::signature::Signature;

/// Nombre del parámetro de entrada de una pipeline compilada.
pub const INPUT_PARAM: &str = "input_data";
/// Sufijo del nombre de la variante asíncrona.
pub const ASYNC_SUFFIX: &str = "_async";

#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    input: Option<TypeTag>,
    output: Option<TypeTag>,
    steps: Vec<NamedFunction>,
}

/// Descriptor resuelto e inmutable, compartido por las invocaciones.
#[derive(Debug)]
struct PipelinePlan {
    name: String,
    steps: Vec<NamedFunction>,
    output: TypeTag,
    /// La entrada se enlaza como body: el endpoint entrega sus campos sueltos.
    unpacked: bool,
}

impl Pipeline {
    pub fn init(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               input: None,
               output: None,
               steps: Vec::new() }
    }

    pub fn input(mut self, schema: TypeTag) -> Self {
        self.input = Some(schema);
        self
    }

    pub fn input_type<T: DescribeType + ?Sized>(self) -> Self {
        self.input(T::type_tag())
    }

    pub fn output(mut self, schema: TypeTag) -> Self {
        self.output = Some(schema);
        self
    }

    pub fn output_type<T: DescribeType + ?Sized>(self) -> Self {
        self.output(T::type_tag())
    }

    /// Fija los steps e infiere los esquemas que falten.
    pub fn functions(mut self, steps: Vec<NamedFunction>) -> Self {
        if self.input.is_none() {
            self.input = steps.first()
                              .and_then(|s| s.signature().first_param())
                              .map(|p| p.ty.clone());
        }
        if self.output.is_none() {
            self.output = steps.last().map(|s| s.signature().returns().clone());
        }
        self.steps = steps;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_schema(&self) -> Option<&TypeTag> {
        self.input.as_ref()
    }

    pub fn output_schema(&self) -> Option<&TypeTag> {
        self.output.as_ref()
    }

    pub fn steps(&self) -> &[NamedFunction] {
        &self.steps
    }

    fn resolve(&self) -> Result<(TypeTag, TypeTag), ConfigError> {
        let input = match (&self.input, self.steps.first()) {
            (Some(tag), _) => tag.clone(),
            (None, Some(first)) => return Err(ConfigError::MissingFirstParameter(first.name().to_string())),
            (None, None) => return Err(ConfigError::EmptyPipeline(self.name.clone())),
        };
        let output = self.output
                         .clone()
                         .ok_or_else(|| ConfigError::EmptyPipeline(self.name.clone()))?;
        Ok((input, output))
    }

    fn plan(&self, name: String) -> Result<(Signature, Arc<PipelinePlan>), ConfigError> {
        let (input, output) = self.resolve()?;
        let unpacked = matches!(binding_for(&input), BindingKind::Body);
        let signature = Signature::new(output.clone()).param(INPUT_PARAM, input);
        let plan = PipelinePlan { name,
                                  steps: self.steps.clone(),
                                  output,
                                  unpacked };
        Ok((signature, Arc::new(plan)))
    }

    /// Compila la variante síncrona. Rechaza steps asíncronos.
    pub fn to_function(&self) -> Result<NamedFunction, ConfigError> {
        if let Some(step) = self.steps.iter().find(|s| s.is_async()) {
            return Err(ConfigError::AsyncStepInSyncPipeline { pipeline: self.name.clone(),
                                                              step: step.name().to_string() });
        }
        let (signature, plan) = self.plan(self.name.clone())?;
        debug!("compiled pipeline '{}' ({} steps, {} -> {})",
               plan.name,
               plan.steps.len(),
               signature.first_param().map(|p| p.ty.to_string()).unwrap_or_default(),
               plan.output);
        Ok(NamedFunction::from_sync(self.name.clone(), signature, move |args| {
            let data = plan.input_value(args);
            plan.run(data)
        }))
    }

    /// Compila la variante asíncrona: steps async se esperan, los síncronos
    /// se ejecutan en el pool de bloqueo; siempre en orden estricto.
    pub fn to_afunction(&self) -> Result<NamedFunction, ConfigError> {
        let name = format!("{}{}", self.name, ASYNC_SUFFIX);
        let (signature, plan) = self.plan(name.clone())?;
        debug!("compiled async pipeline '{}' ({} steps)", plan.name, plan.steps.len());
        Ok(NamedFunction::from_async(name, signature, move |args| {
            let plan = Arc::clone(&plan);
            async move {
                let data = plan.input_value(args);
                plan.run_async(data).await
            }
        }))
    }
}

impl PipelinePlan {
    /// Una entrada tipada llega por nombre. Con entrada body los argumentos
    /// son los campos desempaquetados, salvo que `input_data` sea la única
    /// clave: ese caso se lee como el valor pasado por nombre.
    fn input_value(&self, mut args: Args) -> Value {
        let by_name = !self.unpacked || args.len() == 1;
        match args.get(INPUT_PARAM) {
            Some(_) if by_name => args.remove(INPUT_PARAM).unwrap_or_default(),
            _ => Value::Object(args),
        }
    }

    fn run(&self, mut data: Value) -> Result<Value, CallError> {
        for step in &self.steps {
            trace!("pipeline '{}': step '{}'", self.name, step.name());
            data = step.call(step.single_arg(data))?;
        }
        self.coerce_output(data)
    }

    async fn run_async(&self, mut data: Value) -> Result<Value, CallError> {
        for step in &self.steps {
            trace!("pipeline '{}': step '{}'", self.name, step.name());
            data = step.call_offloaded(step.single_arg(data)).await?;
        }
        self.coerce_output(data)
    }

    /// Un resultado con forma de modelo se re-valida contra el esquema de
    /// salida; cualquier otro valor se devuelve tal cual.
    fn coerce_output(&self, data: Value) -> Result<Value, CallError> {
        match self.output.model_schema() {
            Some(schema) if data.is_object() => Ok(schema.dump(data)?),
            _ => Ok(data),
        }
    }
}
