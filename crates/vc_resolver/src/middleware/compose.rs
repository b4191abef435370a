use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use crate::contract::Converter;
use crate::error::ContractError;
use crate::middleware::request::{ReadMiddleware, WriteMiddleware};
use crate::middleware::suppress::SuppressGuard;
use crate::serializer::ContractSerializer;
use crate::ty::TypeKey;

// -----------------------------------------------------------------------------
// Chains

/// The remaining write layers, as seen by a [`WriteMiddleware`].
pub type WriteNext<'a> = dyn Fn(&mut dyn erased_serde::Serializer, &dyn Any, &ContractSerializer) -> Result<(), ContractError>
    + Send
    + Sync
    + 'a;

/// The remaining read layers, as seen by a [`ReadMiddleware`].
pub type ReadNext<'a> = dyn for<'de> Fn(
        &mut dyn erased_serde::Deserializer<'de>,
        &ContractSerializer,
    ) -> Result<Box<dyn Any>, ContractError>
    + Send
    + Sync
    + 'a;

type WriteChain = Arc<WriteNext<'static>>;
type ReadChain = Arc<ReadNext<'static>>;

#[inline]
fn write_chain<F>(f: F) -> WriteChain
where
    F: Fn(&mut dyn erased_serde::Serializer, &dyn Any, &ContractSerializer) -> Result<(), ContractError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

#[inline]
fn read_chain<F>(f: F) -> ReadChain
where
    F: for<'de> Fn(&mut dyn erased_serde::Deserializer<'de>, &ContractSerializer) -> Result<Box<dyn Any>, ContractError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Composes the write chain of `ty`.
///
/// The base layer delegates to the underlying serializer with middleware
/// suppressed. Interceptors wrap it in reverse order, so the first
/// registered one is outermost.
pub(crate) fn build_write(ty: TypeKey, middlewares: &[Arc<dyn WriteMiddleware>]) -> WriteChain {
    let mut write = write_chain(move |writer, value, serializer| {
        let _guard = SuppressGuard::raise();
        serializer.serialize(writer, value, ty)
    });
    for middleware in middlewares.iter().rev() {
        let middleware = middleware.clone();
        let next = write;
        write = write_chain(move |writer, value, serializer| {
            middleware.write(writer, value, serializer, &*next)
        });
    }
    write
}

/// Composes the read chain of `ty`.
///
/// Interceptors wrap the base layer in registration order, so the last
/// registered one is outermost.
pub(crate) fn build_read(ty: TypeKey, middlewares: &[Arc<dyn ReadMiddleware>]) -> ReadChain {
    let mut read = read_chain(move |reader, serializer| {
        let _guard = SuppressGuard::raise();
        serializer.deserialize(reader, ty)
    });
    for middleware in middlewares {
        let middleware = middleware.clone();
        let next = read;
        read = read_chain(move |reader, serializer| middleware.read(reader, serializer, &*next));
    }
    read
}

// -----------------------------------------------------------------------------
// MiddlewareConverter

/// Converter dispatching to the composed middleware chains of a type.
pub(crate) struct MiddlewareConverter {
    write: WriteChain,
    read: ReadChain,
}

impl MiddlewareConverter {
    #[inline]
    pub(crate) fn new(write: WriteChain, read: ReadChain) -> Self {
        Self { write, read }
    }
}

impl Converter for MiddlewareConverter {
    #[inline]
    fn write(
        &self,
        writer: &mut dyn erased_serde::Serializer,
        value: &dyn Any,
        serializer: &ContractSerializer,
    ) -> Result<(), ContractError> {
        (self.write)(writer, value, serializer)
    }

    #[inline]
    fn read(
        &self,
        reader: &mut dyn erased_serde::Deserializer<'_>,
        serializer: &ContractSerializer,
    ) -> Result<Box<dyn Any>, ContractError> {
        (self.read)(reader, serializer)
    }
}
