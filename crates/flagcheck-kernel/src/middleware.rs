//! Execution middleware.
//!
//! A command body is a [`Handler`]. Middlewares wrap handlers and may decide
//! not to call them; [`FlagValidation`] is the one that refuses to run a
//! command whose flags fail at Error severity. A [`Chain`] is itself a
//! handler, so chains nest.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::Instrument;

use crate::context::Invocation;
use crate::validator::Validator;

/// A unit of work: the body of a command.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, inv: &mut Invocation) -> anyhow::Result<()>;
}

/// Wraps the rest of a chain.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Run around `next`. Calling `next` is optional.
    async fn execute(&self, inv: &mut Invocation, next: &dyn Handler) -> anyhow::Result<()>;
}

/// Gates execution on a validation pass.
///
/// Holds no per-call state; one instance can guard any number of calls.
#[derive(Debug, Clone)]
pub struct FlagValidation {
    validator: Arc<Validator>,
}

impl FlagValidation {
    pub fn new(validator: Arc<Validator>) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }
}

#[async_trait]
impl Middleware for FlagValidation {
    async fn execute(&self, inv: &mut Invocation, next: &dyn Handler) -> anyhow::Result<()> {
        let Invocation { flags, context } = inv;
        if let Some(report) = self.validator.validate(context, flags) {
            let (fatal, warnings) = report.into_parts();
            if let Some(err) = fatal {
                tracing::debug!(
                    command = context.command_name(),
                    warnings = warnings.len(),
                    "validation failed; not running command"
                );
                return Err(err.into());
            }
            tracing::debug!(
                command = context.command_name(),
                warnings = warnings.len(),
                "validation passed with warnings"
            );
        }
        next.call(inv).await
    }
}

/// Wraps the rest of the chain in a `tracing` span and logs the outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct Traced;

#[async_trait]
impl Middleware for Traced {
    async fn execute(&self, inv: &mut Invocation, next: &dyn Handler) -> anyhow::Result<()> {
        let command = inv.context.command_name().to_string();
        let span = tracing::info_span!("command", %command);
        let started = Instant::now();

        let result = next.call(inv).instrument(span.clone()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        span.in_scope(|| match &result {
            Ok(()) => tracing::info!(elapsed_ms, "command finished"),
            Err(e) => tracing::info!(elapsed_ms, error = %e, "command failed"),
        });
        result
    }
}

/// Middlewares around a handler. The first middleware added is outermost.
#[derive(Clone)]
pub struct Chain {
    middlewares: Vec<Arc<dyn Middleware>>,
    handler: Arc<dyn Handler>,
}

impl Chain {
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    pub fn from_arc(handler: Arc<dyn Handler>) -> Self {
        Self {
            middlewares: Vec::new(),
            handler,
        }
    }

    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn with_arc(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

/// The not-yet-run remainder of a chain.
struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    handler: &'a dyn Handler,
}

#[async_trait]
impl<'a> Handler for Next<'a> {
    async fn call(&self, inv: &mut Invocation) -> anyhow::Result<()> {
        match self.middlewares.split_first() {
            Some((first, rest)) => {
                let next = Next {
                    middlewares: rest,
                    handler: self.handler,
                };
                first.execute(inv, &next).await
            }
            None => self.handler.call(inv).await,
        }
    }
}

#[async_trait]
impl Handler for Chain {
    async fn call(&self, inv: &mut Invocation) -> anyhow::Result<()> {
        Next {
            middlewares: &self.middlewares,
            handler: self.handler.as_ref(),
        }
        .call(inv)
        .await
    }
}
