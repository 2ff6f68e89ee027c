//! Derived values.
//!
//! An [`Output`] is an asynchronous value that settles at most once and is
//! shared by every consumer. Outputs are built from other outputs through
//! combinators ([`Output::all`], [`Output::apply`], [`Output::format`], ...), so
//! the dependency graph of a provisioning run is simply the graph of futures
//! those combinators capture. A derived value is never polled to completion
//! before every one of its inputs has settled, and a failed input fails every
//! value built on top of it.
//!
//! Each output also carries a secret taint. Combinators OR the taint of their
//! inputs, so anything computed from a secret stays secret without the caller
//! having to remember it.

use crate::secret::REDACTED;
use crate::{Error, Result};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type Settled<T> = std::result::Result<Resolved<T>, Arc<Error>>;

/// The settled value of an [`Output`] together with its secret taint.
pub struct Resolved<T> {
    value: Arc<T>,
    secret: bool,
}

impl<T> Clone for Resolved<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            secret: self.secret,
        }
    }
}

impl<T> Resolved<T> {
    /// Borrow the resolved value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Whether this value was derived from a secret.
    pub fn is_secret(&self) -> bool {
        self.secret
    }

    /// Take the resolved value.
    pub fn into_value(self) -> Arc<T> {
        self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolved<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secret {
            f.write_str(REDACTED)
        } else {
            self.value.fmt(f)
        }
    }
}

/// Output is a memoized, asynchronously derived value.
///
/// Cloning an output is cheap and every clone observes the same settlement.
pub struct Output<T> {
    inner: Shared<BoxFuture<'static, Settled<T>>>,
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.peek() {
            None => f.write_str("Output(<pending>)"),
            Some(Ok(r)) if r.secret => write!(f, "Output({REDACTED})"),
            Some(Ok(_)) => f.write_str("Output(<resolved>)"),
            Some(Err(err)) => write!(f, "Output(<failed: {err}>)"),
        }
    }
}

impl<T: Send + Sync + 'static> Output<T> {
    fn from_settled(fut: impl Future<Output = Settled<T>> + Send + 'static) -> Self {
        Self {
            inner: fut.boxed().shared(),
        }
    }

    fn ready(value: T, secret: bool) -> Self {
        Self::from_settled(future::ready(Ok(Resolved {
            value: Arc::new(value),
            secret,
        })))
    }

    /// Create an output that is already resolved.
    pub fn resolved(value: T) -> Self {
        Self::ready(value, false)
    }

    /// Create an already resolved output tagged as secret.
    pub fn secret(value: T) -> Self {
        Self::ready(value, true)
    }

    /// Create an output that fails with `err` whenever it is read.
    pub fn failed(err: Error) -> Self {
        Self::from_settled(future::ready(Err(Arc::new(err))))
    }

    /// Create an output from a future.
    ///
    /// The future is not polled until someone reads the output, and it is
    /// polled to completion at most once.
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self::from_settled(async move {
            let value = fut.await.map_err(Arc::new)?;
            Ok(Resolved {
                value: Arc::new(value),
                secret: false,
            })
        })
    }

    /// Tag this output as secret.
    pub fn into_secret(self) -> Self {
        let input = self.inner;
        Self::from_settled(async move {
            let mut r = input.await?;
            r.secret = true;
            Ok(r)
        })
    }

    /// Wait for the output and return its value.
    pub async fn resolve(&self) -> Result<Arc<T>> {
        self.resolve_with_secret().await.map(Resolved::into_value)
    }

    /// Wait for the output and return its value along with its secret taint.
    pub async fn resolve_with_secret(&self) -> Result<Resolved<T>> {
        self.inner.clone().await.map_err(Error::from_shared)
    }

    /// Whether the output has already settled successfully.
    pub fn is_resolved(&self) -> bool {
        matches!(self.inner.peek(), Some(Ok(_)))
    }

    /// Register a continuation that runs once this output resolves.
    pub fn apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(&T) -> U + Send + 'static,
    {
        let input = self.inner.clone();
        Output::from_settled(async move {
            let r = input.await?;
            Ok(Resolved {
                value: Arc::new(f(&r.value)),
                secret: r.secret,
            })
        })
    }

    /// Like [`Output::apply`] for continuations that can fail.
    pub fn try_apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(&T) -> Result<U> + Send + 'static,
    {
        let input = self.inner.clone();
        Output::from_settled(async move {
            let r = input.await?;
            let value = f(&r.value).map_err(Arc::new)?;
            Ok(Resolved {
                value: Arc::new(value),
                secret: r.secret,
            })
        })
    }

    /// Register an asynchronous continuation, such as a data-plane call.
    pub fn apply_async<U, F, Fut>(&self, f: F) -> Output<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(Arc<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U>> + Send + 'static,
    {
        let input = self.inner.clone();
        Output::from_settled(async move {
            let r = input.await?;
            let value = f(r.value).await.map_err(Arc::new)?;
            Ok(Resolved {
                value: Arc::new(value),
                secret: r.secret,
            })
        })
    }

    /// Register a continuation that produces another output and flatten it.
    ///
    /// The result is secret if either this output or the produced one is.
    pub fn apply_output<U, F>(&self, f: F) -> Output<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(&T) -> Output<U> + Send + 'static,
    {
        let input = self.inner.clone();
        Output::from_settled(async move {
            let r = input.await?;
            let mut inner = f(&r.value).inner.await?;
            inner.secret |= r.secret;
            Ok(inner)
        })
    }

    /// Compose a fixed, ordered list of outputs into one.
    ///
    /// The composed value resolves once every input has resolved and holds
    /// their values in input order. It fails as soon as any input fails.
    /// An empty list is rejected.
    pub fn all<I>(outputs: I) -> Result<Output<Vec<T>>>
    where
        I: IntoIterator<Item = Output<T>>,
        T: Clone,
    {
        let inputs: Vec<_> = outputs.into_iter().map(|o| o.inner).collect();
        if inputs.is_empty() {
            return Err(Error::composition_invalid(
                "cannot compose an empty list of values",
            ));
        }

        Ok(Output::from_settled(async move {
            let resolved = future::try_join_all(inputs).await?;
            let secret = resolved.iter().any(|r| r.secret);
            let values = resolved.into_iter().map(|r| (*r.value).clone()).collect();
            Ok(Resolved {
                value: Arc::new(values),
                secret,
            })
        }))
    }

    /// Compose two outputs of different types.
    pub fn zip<U>(&self, other: &Output<U>) -> Output<(T, U)>
    where
        T: Clone,
        U: Clone + Send + Sync + 'static,
    {
        let (left, right) = (self.inner.clone(), other.inner.clone());
        Output::from_settled(async move {
            let (l, r) = future::try_join(left, right).await?;
            Ok(Resolved {
                value: Arc::new(((*l.value).clone(), (*r.value).clone())),
                secret: l.secret || r.secret,
            })
        })
    }
}

impl Output<String> {
    /// Fill the `{}` placeholders of `template` with `parts`, in order.
    ///
    /// The number of placeholders must match the number of parts and there
    /// must be at least one part. The result is secret if any part is.
    pub fn format(template: &str, parts: &[Output<String>]) -> Result<Output<String>> {
        let pieces: Vec<String> = template.split("{}").map(str::to_string).collect();
        let expected = pieces.len() - 1;
        if expected != parts.len() {
            return Err(Error::composition_invalid(format!(
                "template expects {expected} values but {} were given",
                parts.len()
            )));
        }

        let values = Output::all(parts.iter().cloned())?;
        Ok(values.apply(move |values| {
            let mut s = String::new();
            for (idx, piece) in pieces.iter().enumerate() {
                s.push_str(piece);
                if let Some(v) = values.get(idx) {
                    s.push_str(v);
                }
            }
            s
        }))
    }
}

impl From<&str> for Output<String> {
    fn from(value: &str) -> Self {
        Output::resolved(value.to_string())
    }
}

impl From<String> for Output<String> {
    fn from(value: String) -> Self {
        Output::resolved(value)
    }
}
