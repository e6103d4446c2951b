//! Contracts between the value model and an external evaluator

use crate::adapter::ModelAdapter;
use crate::collection::Collection;
use crate::value::{Item, Value};
use octofhir_fhirpath_diagnostics::{FhirPathError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Evaluation environment handed to functions
pub trait EvalContext {
    /// Model adapter for foreign nodes, if one is configured
    fn adapter(&self) -> Option<&Arc<dyn ModelAdapter>>;

    /// Create an empty collection bound to the context's adapter
    fn new_collection(&self) -> Collection;
}

/// Default evaluation context
#[derive(Clone, Default)]
pub struct Context {
    adapter: Option<Arc<dyn ModelAdapter>>,
}

impl Context {
    /// Create a context without model adapter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context converting foreign nodes through `adapter`
    pub fn with_adapter(adapter: Arc<dyn ModelAdapter>) -> Self {
        Self { adapter: Some(adapter) }
    }
}

impl EvalContext for Context {
    fn adapter(&self) -> Option<&Arc<dyn ModelAdapter>> {
        self.adapter.as_ref()
    }

    /// # Panics
    ///
    /// Panics when the context was built without a model adapter.
    fn new_collection(&self) -> Collection {
        match &self.adapter {
            Some(adapter) => Collection::with_adapter(adapter.clone()),
            None => panic!("cannot create a collection: context has no model adapter"),
        }
    }
}

/// Iteration state for `$index` and `$total`
#[derive(Debug, Clone, Default)]
pub struct Loop {
    index: usize,
    total: Option<Value>,
}

impl Loop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an initial accumulator
    pub fn with_total(total: Value) -> Self {
        Self {
            index: 0,
            total: Some(total),
        }
    }

    /// Zero-based position of the current iteration
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn increment_index(&mut self) {
        self.index += 1;
    }

    /// Accumulated value, `None` until set
    pub fn total(&self) -> Option<&Value> {
        self.total.as_ref()
    }

    pub fn set_total(&mut self, total: Option<Value>) {
        self.total = total;
    }
}

/// Function implemented by a function library
///
/// The evaluator checks the argument count against `min_params` and
/// `max_params` before calling [`Function::execute`].
pub trait Function: Send + Sync {
    fn name(&self) -> &str;

    /// Argument slot that receives the evaluated input instead of a value
    fn executor_arg(&self) -> Option<usize> {
        None
    }

    fn min_params(&self) -> usize;

    fn max_params(&self) -> usize;

    /// Run the function on `node` with already evaluated arguments
    fn execute(
        &self,
        ctx: &dyn EvalContext,
        node: Option<&Item>,
        args: &[Option<Value>],
        looping: &mut Loop,
    ) -> Result<Option<Value>>;
}

/// Functions keyed by name
#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing one with the same name
    pub fn register(&mut self, function: Arc<dyn Function>) {
        log::trace!("registering function '{}'", function.name());
        self.functions.insert(function.name().to_string(), function);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Look up a function and check the argument count
    pub fn resolve(&self, name: &str, arg_count: usize) -> Result<&Arc<dyn Function>> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| FhirPathError::unknown_function(name))?;
        let (min, max) = (function.min_params(), function.max_params());
        if !(min..=max).contains(&arg_count) {
            return Err(FhirPathError::invalid_argument_count(name, arg_count, min, max));
        }
        Ok(function)
    }

    /// Resolve and run a function
    pub fn invoke(
        &self,
        name: &str,
        ctx: &dyn EvalContext,
        node: Option<&Item>,
        args: &[Option<Value>],
        looping: &mut Loop,
    ) -> Result<Option<Value>> {
        self.resolve(name, args.len())?.execute(ctx, node, args, looping)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::ArithmeticOp;
    use octofhir_fhirpath_diagnostics::{ErrorKind, FP0104, FP0106};
    use pretty_assertions::assert_eq;

    /// `accumulate(step)`: adds `step` (default 1) to `$total`
    struct Accumulate;

    impl Function for Accumulate {
        fn name(&self) -> &str {
            "accumulate"
        }

        fn min_params(&self) -> usize {
            0
        }

        fn max_params(&self) -> usize {
            1
        }

        fn execute(
            &self,
            _ctx: &dyn EvalContext,
            _node: Option<&Item>,
            args: &[Option<Value>],
            looping: &mut Loop,
        ) -> Result<Option<Value>> {
            let step = args.first().cloned().flatten().unwrap_or(Value::integer(1));
            let total = match looping.total() {
                Some(total) => total.calc(&step, ArithmeticOp::Addition)?,
                None => Some(step),
            };
            looping.set_total(total.clone());
            looping.increment_index();
            Ok(total)
        }
    }

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry.register(Arc::new(Accumulate));
        registry
    }

    #[test]
    fn test_invoke_tracks_loop_state() {
        let registry = registry();
        let ctx = Context::new();
        let mut looping = Loop::with_total(Value::integer(10));
        for _ in 0..3 {
            registry
                .invoke("accumulate", &ctx, None, &[Some(Value::integer(2))], &mut looping)
                .unwrap();
        }
        assert_eq!(looping.index(), 3);
        assert_eq!(looping.total(), Some(&Value::integer(16)));
    }

    #[test]
    fn test_arity_is_validated() {
        let registry = registry();
        let error = registry.resolve("accumulate", 2).err().unwrap();
        assert_eq!(error.code(), FP0104);
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        assert_eq!(registry.resolve("missing", 0).err().unwrap().code(), FP0106);
        assert!(registry.resolve("accumulate", 0).is_ok());
    }

    #[test]
    #[should_panic(expected = "no model adapter")]
    fn test_collection_without_adapter_panics() {
        Context::new().new_collection();
    }
}
