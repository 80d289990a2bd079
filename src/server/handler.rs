use prost_reflect::DynamicMessage;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::Result;

pub(super) type HandlerFuture = Pin<Box<dyn Future<Output = Result<DynamicMessage>> + Send>>;

/// Type-erased async handler function
///
/// Takes the decoded request message and resolves to the response message.
/// Wrapped in Arc for cheap cloning when spawning tasks.
pub(super) type BoxedHandler = Arc<dyn Fn(DynamicMessage) -> HandlerFuture + Send + Sync>;

/// Wrap an async handler closure into a type-erased handler
///
/// This allows the server to store handlers for different methods in the
/// same HashMap.
pub(super) fn wrap_handler<F, Fut>(handler: F) -> BoxedHandler
where
    F: Fn(DynamicMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<DynamicMessage>> + Send + 'static,
{
    // ---
    Arc::new(move |request: DynamicMessage| Box::pin(handler(request)) as HandlerFuture)
}
