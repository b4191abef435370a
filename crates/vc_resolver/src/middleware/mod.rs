//! Interception of the write and read operations of a type.
//!
//! - [`MiddlewareFactory`]: contributes interceptors for a type.
//! - [`MiddlewareRequest`]: collects interceptors for one type, in registration order.
//! - [`WriteMiddleware`] / [`ReadMiddleware`]: one layer of the chain.
//! - [`WriteNext`] / [`ReadNext`]: the rest of the chain, handed to each layer.
//! - [`middleware_suppressed`]: the per-thread flag raised while the base layer
//!   delegates to the underlying serializer.
//!
//! ## Composition
//!
//! The base layer of each chain raises the suppression flag and delegates to
//! [`ContractSerializer`](crate::ContractSerializer) for the same type, which
//! then resolves the plain contract instead of the middleware one.
//!
//! - Writes: `W1(W2(base))` for interceptors registered as `[W1, W2]`.
//! - Reads: `R2(R1(base))` for interceptors registered as `[R1, R2]`.

// -----------------------------------------------------------------------------
// Modules

mod compose;
mod request;
mod suppress;

// -----------------------------------------------------------------------------
// Exports

pub use compose::{ReadNext, WriteNext};
pub use request::{MiddlewareFactory, MiddlewareRequest, ReadMiddleware, WriteMiddleware};
pub use suppress::middleware_suppressed;
