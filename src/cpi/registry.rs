// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed action registry.
//!
//! Handlers are registered with their parameter names and a typed argument
//! tuple. Positional JSON arguments are decoded into that tuple before the
//! handler runs, so a handler never sees a value of the wrong shape.
//!
//! ```
//! use std::sync::Arc;
//! use photon_cpi_rs::ActionRegistry;
//!
//! struct Ctx;
//!
//! let mut registry = ActionRegistry::<Ctx>::new();
//! registry.register("create_vm", &["agent_id"], |_ctx: Arc<Ctx>, (agent_id,): (String,)| async move {
//!     Ok::<_, std::io::Error>(format!("vm-for-{agent_id}"))
//! });
//! assert_eq!(registry.expected_arity("create_vm"), Some(1));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::ActionError;

/// Positional arguments decodable from JSON values.
///
/// Implemented for tuples of up to six [`DeserializeOwned`] types. Missing
/// arguments decode from `null`; extra arguments are ignored.
pub trait FromArgs: Sized {
    const ARITY: usize;

    /// Decode `args`, naming the offending parameter on failure.
    fn from_args(params: &[&'static str], args: &[Value]) -> Result<Self, ActionError>;
}

fn decode_arg<T: DeserializeOwned>(
    params: &[&'static str],
    args: &[Value],
    index: usize,
) -> Result<T, ActionError> {
    let value = args.get(index).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|_| ActionError::UnexpectedType {
        param: params.get(index).copied().unwrap_or("argument").to_string(),
    })
}

macro_rules! impl_from_args {
    ($arity:expr; $($index:tt $ty:ident),*) => {
        impl<$($ty: DeserializeOwned),*> FromArgs for ($($ty,)*) {
            const ARITY: usize = $arity;

            #[allow(unused_variables)]
            fn from_args(params: &[&'static str], args: &[Value]) -> Result<Self, ActionError> {
                Ok(($(decode_arg::<$ty>(params, args, $index)?,)*))
            }
        }
    };
}

impl_from_args!(0;);
impl_from_args!(1; 0 T0);
impl_from_args!(2; 0 T0, 1 T1);
impl_from_args!(3; 0 T0, 1 T1, 2 T2);
impl_from_args!(4; 0 T0, 1 T1, 2 T2, 3 T3);
impl_from_args!(5; 0 T0, 1 T1, 2 T2, 3 T3, 4 T4);
impl_from_args!(6; 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5);

type ActionFuture = BoxFuture<'static, Result<Value, ActionError>>;
type Invoke<C> = Box<dyn Fn(Arc<C>, &[Value]) -> Result<ActionFuture, ActionError> + Send + Sync>;

/// A registered handler with its parameter names.
pub struct Action<C> {
    name: String,
    params: Vec<&'static str>,
    invoke: Invoke<C>,
}

impl<C> Action<C> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[&'static str] {
        &self.params
    }

    /// Decode `args` and start the handler. Decoding failures are returned
    /// before the handler is called.
    pub(crate) fn invoke(&self, ctx: Arc<C>, args: &[Value]) -> Result<ActionFuture, ActionError> {
        (self.invoke)(ctx, args)
    }
}

impl<C> fmt::Debug for Action<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Map from action name to handler. Built once, then only read.
pub struct ActionRegistry<C> {
    actions: HashMap<String, Action<C>>,
}

impl<C> Default for ActionRegistry<C> {
    fn default() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }
}

impl<C> fmt::Debug for ActionRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.actions.keys().collect();
        names.sort();
        f.debug_struct("ActionRegistry")
            .field("actions", &names)
            .finish()
    }
}

impl<C: Send + Sync + 'static> ActionRegistry<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`.
    ///
    /// The handler's error is rendered with `Display` into the envelope
    /// message; its value is serialized as the envelope result.
    ///
    /// # Panics
    ///
    /// Panics if `params` does not name every element of the argument tuple
    /// or if `name` is already registered.
    pub fn register<A, R, E, F, Fut>(
        &mut self,
        name: &str,
        params: &[&'static str],
        handler: F,
    ) -> &mut Self
    where
        A: FromArgs + Send + 'static,
        R: Serialize + Send + 'static,
        E: fmt::Display + Send + 'static,
        F: Fn(Arc<C>, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        assert_eq!(
            params.len(),
            A::ARITY,
            "action {name}: {} parameter names for {} arguments",
            params.len(),
            A::ARITY
        );
        assert!(
            !self.actions.contains_key(name),
            "action {name} registered twice"
        );

        let decode_params = params.to_vec();
        let invoke = move |ctx: Arc<C>, args: &[Value]| -> Result<ActionFuture, ActionError> {
            let decoded = A::from_args(&decode_params, args)?;
            let running = handler(ctx, decoded);
            Ok(async move {
                match running.await {
                    Ok(value) => Ok(serde_json::to_value(value)?),
                    Err(err) => Err(ActionError::Handler(err.to_string())),
                }
            }
            .boxed())
        };

        self.actions.insert(
            name.to_string(),
            Action {
                name: name.to_string(),
                params: params.to_vec(),
                invoke: Box::new(invoke),
            },
        );
        self
    }
}

impl<C> ActionRegistry<C> {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Action<C>> {
        self.actions.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Number of declared parameters of `name`.
    #[must_use]
    pub fn expected_arity(&self, name: &str) -> Option<usize> {
        self.actions.get(name).map(|a| a.params.len())
    }

    /// Registered action names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
