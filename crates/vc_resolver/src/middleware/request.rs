use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, type_name};

use crate::contract::Contract;
use crate::error::ContractError;
use crate::middleware::compose::{self, MiddlewareConverter, ReadNext, WriteNext};
use crate::serializer::ContractSerializer;
use crate::ty::TypeKey;

// -----------------------------------------------------------------------------
// Interceptors

/// A layer around the write operation of a type.
///
/// The middleware may transform the value, write something else, short-circuit,
/// or pass through to `next`, which runs the remaining layers and finally the
/// underlying serializer.
pub trait WriteMiddleware: Send + Sync + 'static {
    fn write(
        &self,
        writer: &mut dyn erased_serde::Serializer,
        value: &dyn Any,
        serializer: &ContractSerializer,
        next: &WriteNext<'_>,
    ) -> Result<(), ContractError>;
}

/// A layer around the read operation of a type.
///
/// See [`WriteMiddleware`].
pub trait ReadMiddleware: Send + Sync + 'static {
    fn read(
        &self,
        reader: &mut dyn erased_serde::Deserializer<'_>,
        serializer: &ContractSerializer,
        next: &ReadNext<'_>,
    ) -> Result<Box<dyn Any>, ContractError>;
}

struct WriteFn<F>(F);

impl<F> WriteMiddleware for WriteFn<F>
where
    F: Fn(
            &mut dyn erased_serde::Serializer,
            &dyn Any,
            &ContractSerializer,
            &WriteNext<'_>,
        ) -> Result<(), ContractError>
        + Send
        + Sync
        + 'static,
{
    #[inline]
    fn write(
        &self,
        writer: &mut dyn erased_serde::Serializer,
        value: &dyn Any,
        serializer: &ContractSerializer,
        next: &WriteNext<'_>,
    ) -> Result<(), ContractError> {
        (self.0)(writer, value, serializer, next)
    }
}

struct ReadFn<F>(F);

impl<F> ReadMiddleware for ReadFn<F>
where
    F: for<'de> Fn(
            &mut dyn erased_serde::Deserializer<'de>,
            &ContractSerializer,
            &ReadNext<'_>,
        ) -> Result<Box<dyn Any>, ContractError>
        + Send
        + Sync
        + 'static,
{
    #[inline]
    fn read(
        &self,
        reader: &mut dyn erased_serde::Deserializer<'_>,
        serializer: &ContractSerializer,
        next: &ReadNext<'_>,
    ) -> Result<Box<dyn Any>, ContractError> {
        (self.0)(reader, serializer, next)
    }
}

// -----------------------------------------------------------------------------
// MiddlewareFactory

/// Contributes interceptors for the types it cares about.
///
/// Every registered factory is asked once per type, in registration order,
/// the first time the middleware contract of that type is resolved.
///
/// # Examples
///
/// ```
/// use vc_resolver::{MiddlewareFactory, MiddlewareRequest};
///
/// struct SkipNone;
///
/// impl MiddlewareFactory for SkipNone {
///     fn handle(&self, request: &mut MiddlewareRequest<'_>) {
///         if request.ty().is::<Option<u32>>() {
///             request.yield_write_fn(|writer, value, serializer, next| {
///                 // Observe, transform or short-circuit here.
///                 next(writer, value, serializer)
///             });
///         }
///     }
/// }
/// ```
pub trait MiddlewareFactory: Send + Sync + 'static {
    fn handle(&self, request: &mut MiddlewareRequest<'_>);

    /// Name used in diagnostics.
    #[inline]
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

// -----------------------------------------------------------------------------
// MiddlewareRequest

/// Collects the interceptors contributed for one type.
///
/// Interceptors keep their registration order.
pub struct MiddlewareRequest<'a> {
    ty: TypeKey,
    contract: &'a Contract,
    writes: Vec<Arc<dyn WriteMiddleware>>,
    reads: Vec<Arc<dyn ReadMiddleware>>,
}

impl<'a> MiddlewareRequest<'a> {
    pub(crate) fn new(ty: TypeKey, contract: &'a Contract) -> Self {
        Self {
            ty,
            contract,
            writes: Vec::new(),
            reads: Vec::new(),
        }
    }

    /// The type interceptors are collected for.
    #[inline]
    pub fn ty(&self) -> TypeKey {
        self.ty
    }

    /// The plain contract of the type.
    #[inline]
    pub fn contract(&self) -> &'a Contract {
        self.contract
    }

    /// Appends a write interceptor.
    pub fn yield_write(&mut self, middleware: impl WriteMiddleware) {
        self.writes.push(Arc::new(middleware));
    }

    /// Appends a read interceptor.
    pub fn yield_read(&mut self, middleware: impl ReadMiddleware) {
        self.reads.push(Arc::new(middleware));
    }

    /// Appends a write interceptor given as a closure.
    pub fn yield_write_fn<F>(&mut self, middleware: F)
    where
        F: Fn(
                &mut dyn erased_serde::Serializer,
                &dyn Any,
                &ContractSerializer,
                &WriteNext<'_>,
            ) -> Result<(), ContractError>
            + Send
            + Sync
            + 'static,
    {
        self.yield_write(WriteFn(middleware));
    }

    /// Appends a read interceptor given as a closure.
    pub fn yield_read_fn<F>(&mut self, middleware: F)
    where
        F: for<'de> Fn(
                &mut dyn erased_serde::Deserializer<'de>,
                &ContractSerializer,
                &ReadNext<'_>,
            ) -> Result<Box<dyn Any>, ContractError>
            + Send
            + Sync
            + 'static,
    {
        self.yield_read(ReadFn(middleware));
    }

    /// Number of collected write interceptors.
    #[inline]
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Number of collected read interceptors.
    #[inline]
    pub fn read_count(&self) -> usize {
        self.reads.len()
    }

    /// Composes the collected interceptors, `None` if there are none.
    pub(crate) fn build_converter(self) -> Option<MiddlewareConverter> {
        if self.writes.is_empty() && self.reads.is_empty() {
            return None;
        }
        Some(MiddlewareConverter::new(
            compose::build_write(self.ty, &self.writes),
            compose::build_read(self.ty, &self.reads),
        ))
    }
}
