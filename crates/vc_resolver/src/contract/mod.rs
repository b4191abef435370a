//! Contracts and the capabilities that produce them.
//!
//! - [`Contract`]: describes how values of one type are written and read.
//! - [`Converter`]: custom conversion logic attached to a contract.
//! - [`ContractCreator`]: produces the contract of one fixed type.
//! - [`ContractFactory`]: may produce the contract of any type it recognizes.
//! - [`ContractPatch`]: mutates a freshly created contract before it is cached.
//! - [`ContractRequest`]: one resolution attempt, handed to factories.

// -----------------------------------------------------------------------------
// Modules

mod capability;
mod conversion;
mod request;

// -----------------------------------------------------------------------------
// Exports

pub use capability::{ContractCreator, ContractFactory, ContractPatch};
pub use request::ContractRequest;

pub(crate) use request::PendingRequest;

// -----------------------------------------------------------------------------
// Contract

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, type_name};
use core::fmt;

use serde_core::Serialize;
use serde_core::de::DeserializeOwned;

use crate::error::ContractError;
use crate::serializer::ContractSerializer;
use crate::ty::TypeKey;

use conversion::{ReadFn, WriteFn};

/// Custom conversion logic attached to a [`Contract`].
///
/// Converters receive the [`ContractSerializer`] so they can write or read
/// nested values through the resolver.
///
/// A converter may support only one direction, the contract then falls
/// back to earlier converters or to its default conversion for the other one.
pub trait Converter: Send + Sync + 'static {
    /// Writes `value` into `writer`.
    fn write(
        &self,
        writer: &mut dyn erased_serde::Serializer,
        value: &dyn Any,
        serializer: &ContractSerializer,
    ) -> Result<(), ContractError>;

    /// Reads a value from `reader`.
    fn read(
        &self,
        reader: &mut dyn erased_serde::Deserializer<'_>,
        serializer: &ContractSerializer,
    ) -> Result<Box<dyn Any>, ContractError>;

    #[inline]
    fn can_write(&self) -> bool {
        true
    }

    #[inline]
    fn can_read(&self) -> bool {
        true
    }

    /// Name used in diagnostics.
    #[inline]
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// A reusable description of how values of one type are converted to and
/// from a structured wire form.
///
/// A contract is mutable while it is being created and patched. Once it is
/// published by the resolver it is shared behind an [`Arc`] and only derived
/// through [`with_converter`](Contract::with_converter).
///
/// Conversion dispatch, for each direction:
///
/// 1. The last attached [`Converter`] supporting the direction.
/// 2. The default conversion captured from the type's serde implementation.
/// 3. [`ContractError::NotWritable`] / [`ContractError::NotReadable`].
///
/// # Examples
///
/// ```
/// use vc_resolver::{Contract, TypeKey};
///
/// let mut contract = Contract::serde::<u32>();
/// contract.annotate("checked");
///
/// assert_eq!(contract.ty(), TypeKey::of::<u32>());
/// assert!(contract.can_write() && contract.can_read());
/// assert_eq!(contract.annotations(), ["checked"]);
/// ```
#[derive(Clone)]
pub struct Contract {
    ty: TypeKey,
    write: Option<WriteFn>,
    read: Option<ReadFn>,
    converters: Vec<Arc<dyn Converter>>,
    annotations: Vec<Cow<'static, str>>,
}

impl Contract {
    /// Creates a contract for `ty` without any conversion.
    ///
    /// `ty` should be a plain key, indirections are unwrapped.
    pub fn for_type(ty: TypeKey) -> Self {
        Self {
            ty: ty.element().unwrap_or(ty),
            write: None,
            read: None,
            converters: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Creates a contract for `T` without any conversion.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::for_type(TypeKey::of::<T>())
    }

    /// Creates a contract for `T` that writes and reads through its serde implementation.
    pub fn serde<T: Serialize + DeserializeOwned + 'static>() -> Self {
        Self {
            write: Some(conversion::write_serde::<T>),
            read: Some(conversion::read_serde::<T>),
            ..Self::of::<T>()
        }
    }

    /// Creates a contract for `T` that only writes through its serde implementation.
    pub fn write_only<T: Serialize + 'static>() -> Self {
        Self {
            write: Some(conversion::write_serde::<T>),
            ..Self::of::<T>()
        }
    }

    /// Creates a contract for `T` that only reads through its serde implementation.
    pub fn read_only<T: DeserializeOwned + 'static>() -> Self {
        Self {
            read: Some(conversion::read_serde::<T>),
            ..Self::of::<T>()
        }
    }

    /// The type this contract is bound to.
    #[inline]
    pub fn ty(&self) -> TypeKey {
        self.ty
    }

    /// Attached converters, in attachment order.
    #[inline]
    pub fn converters(&self) -> &[Arc<dyn Converter>] {
        &self.converters
    }

    /// Attaches a converter in place.
    ///
    /// Only meant for contracts that are not published yet, e.g. inside a [`ContractPatch`].
    pub fn add_converter(&mut self, converter: impl Converter) -> &mut Self {
        self.converters.push(Arc::new(converter));
        self
    }

    /// Returns a copy of this contract with one more converter attached.
    ///
    /// `self` is left untouched, the copy shares its converters.
    pub fn with_converter(&self, converter: Arc<dyn Converter>) -> Self {
        let mut copy = self.clone();
        copy.converters.push(converter);
        copy
    }

    /// Metadata attached by patches, in attachment order.
    #[inline]
    pub fn annotations(&self) -> &[Cow<'static, str>] {
        &self.annotations
    }

    /// Appends an annotation.
    pub fn annotate(&mut self, annotation: impl Into<Cow<'static, str>>) -> &mut Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Returns `true` if `annotation` has been attached.
    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.iter().any(|a| a == annotation)
    }

    /// Returns `true` if values can be written through this contract.
    pub fn can_write(&self) -> bool {
        self.write.is_some() || self.converters.iter().any(|c| c.can_write())
    }

    /// Returns `true` if values can be read through this contract.
    pub fn can_read(&self) -> bool {
        self.read.is_some() || self.converters.iter().any(|c| c.can_read())
    }

    /// Writes `value` with the active write conversion.
    pub fn write(
        &self,
        writer: &mut dyn erased_serde::Serializer,
        value: &dyn Any,
        serializer: &ContractSerializer,
    ) -> Result<(), ContractError> {
        if let Some(converter) = self.converters.iter().rev().find(|c| c.can_write()) {
            return converter.write(writer, value, serializer);
        }
        match self.write {
            Some(write) => write(value, writer),
            None => Err(ContractError::NotWritable(self.ty)),
        }
    }

    /// Reads a value with the active read conversion.
    pub fn read(
        &self,
        reader: &mut dyn erased_serde::Deserializer<'_>,
        serializer: &ContractSerializer,
    ) -> Result<Box<dyn Any>, ContractError> {
        if let Some(converter) = self.converters.iter().rev().find(|c| c.can_read()) {
            return converter.read(reader, serializer);
        }
        match self.read {
            Some(read) => read(reader),
            None => Err(ContractError::NotReadable(self.ty)),
        }
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let converters: Vec<&'static str> = self.converters.iter().map(|c| c.name()).collect();
        f.debug_struct("Contract")
            .field("ty", &self.ty)
            .field("serde_write", &self.write.is_some())
            .field("serde_read", &self.read.is_some())
            .field("converters", &converters)
            .field("annotations", &self.annotations)
            .finish()
    }
}

/// Downcasts a type-erased value, failing with [`ContractError::ValueMismatch`].
///
/// Helper for [`Converter`] implementations.
pub fn downcast_value<T: Any>(value: &dyn Any) -> Result<&T, ContractError> {
    value
        .downcast_ref::<T>()
        .ok_or(ContractError::ValueMismatch {
            expected: type_name::<T>(),
        })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::sync::Arc;
    use core::any::Any;

    use super::{Contract, Converter};
    use crate::error::ContractError;
    use crate::serializer::ContractSerializer;
    use crate::TypeKey;

    struct ReadOnlyConverter;

    impl Converter for ReadOnlyConverter {
        fn write(
            &self,
            _: &mut dyn erased_serde::Serializer,
            _: &dyn Any,
            _: &ContractSerializer,
        ) -> Result<(), ContractError> {
            unreachable!()
        }

        fn read(
            &self,
            _: &mut dyn erased_serde::Deserializer<'_>,
            _: &ContractSerializer,
        ) -> Result<Box<dyn Any>, ContractError> {
            Ok(Box::new(7_u8))
        }

        fn can_write(&self) -> bool {
            false
        }
    }

    #[test]
    fn bare_contract_cannot_convert() {
        let contract = Contract::of::<u8>();
        assert!(!contract.can_write());
        assert!(!contract.can_read());
        assert_eq!(contract.ty(), TypeKey::of::<u8>());
    }

    #[test]
    fn indirection_is_unwrapped() {
        let contract = Contract::for_type(TypeKey::by_ref::<u8>());
        assert_eq!(contract.ty(), TypeKey::of::<u8>());
    }

    #[test]
    fn copy_and_extend_leaves_original() {
        let original = Contract::write_only::<u8>();
        let extended = original.with_converter(Arc::new(ReadOnlyConverter));

        assert!(original.converters().is_empty());
        assert!(!original.can_read());
        assert_eq!(extended.converters().len(), 1);
        assert!(extended.can_read());
        assert!(extended.can_write());
    }

    #[test]
    fn annotations_keep_order() {
        let mut contract = Contract::of::<u8>();
        contract.annotate("first").annotate("second");
        assert_eq!(contract.annotations(), ["first", "second"]);
        assert!(contract.has_annotation("second"));
        assert!(!contract.has_annotation("third"));
    }
}
