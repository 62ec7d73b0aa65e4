//! One-time async initialization of shared clients

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::OnceCell;

use crate::domain::DomainError;

type Factory<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, DomainError>> + Send + Sync>;

/// Value built on first use by an async factory.
///
/// Concurrent callers wait for the same initialization. A failed initialization
/// leaves the cell empty so the next caller tries again.
pub struct LazyInit<T> {
    cell: OnceCell<T>,
    factory: Factory<T>,
}

impl<T> fmt::Debug for LazyInit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyInit")
            .field("initialized", &self.cell.initialized())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> LazyInit<T> {
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, DomainError>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Box::new(move || factory().boxed()),
        }
    }

    /// Already initialized with `value`
    pub fn ready(value: T) -> Self {
        Self {
            cell: OnceCell::new_with(Some(value)),
            factory: Box::new(|| {
                async { Err(DomainError::internal("lazy value was preset")) }.boxed()
            }),
        }
    }

    pub async fn get(&self) -> Result<T, DomainError> {
        self.cell
            .get_or_try_init(|| (self.factory)())
            .await
            .cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}
