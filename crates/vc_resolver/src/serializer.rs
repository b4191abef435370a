use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::{Any, type_name};

use serde_core::{Deserializer, Serializer};

use crate::error::ContractError;
use crate::resolver::ContractResolver;
use crate::ty::TypeKey;

// -----------------------------------------------------------------------------
// ContractSerializer

/// Writes and reads type-erased values through the contracts of a [`ContractResolver`].
///
/// Every call resolves the contract of the requested type with
/// [`ContractResolver::resolve`], so values pass through the middleware of
/// their type unless the call happens inside a base delegation.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_resolver::{Contract, ContractCreator, ContractError, ContractResolver, ContractSerializer};
///
/// struct U32Creator;
///
/// impl ContractCreator for U32Creator {
///     fn create_contract(&self) -> Result<Contract, ContractError> {
///         Ok(Contract::serde::<u32>())
///     }
/// }
///
/// let resolver = ContractResolver::builder()
///     .add_creator::<u32>(U32Creator)
///     .build();
/// let serializer = ContractSerializer::new(Arc::new(resolver));
///
/// let mut output = Vec::new();
/// serializer.serialize_into(&mut serde_json::Serializer::new(&mut output), &17_u32).unwrap();
/// assert_eq!(output, b"17");
///
/// let mut input = serde_json::Deserializer::from_str("42");
/// assert_eq!(serializer.deserialize_from::<_, u32>(&mut input).unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct ContractSerializer {
    resolver: Arc<ContractResolver>,
}

impl ContractSerializer {
    #[inline]
    pub fn new(resolver: Arc<ContractResolver>) -> Self {
        Self { resolver }
    }

    /// The resolver contracts come from.
    #[inline]
    pub fn resolver(&self) -> &Arc<ContractResolver> {
        &self.resolver
    }

    /// Writes `value` as a value of type `ty`.
    pub fn serialize(
        &self,
        writer: &mut dyn erased_serde::Serializer,
        value: &dyn Any,
        ty: TypeKey,
    ) -> Result<(), ContractError> {
        let contract = self.resolver.resolve(ty)?;
        contract.write(writer, value, self)
    }

    /// Reads a value of type `ty`.
    pub fn deserialize(
        &self,
        reader: &mut dyn erased_serde::Deserializer<'_>,
        ty: TypeKey,
    ) -> Result<Box<dyn Any>, ContractError> {
        let contract = self.resolver.resolve(ty)?;
        contract.read(reader, self)
    }

    /// Writes a value of type `T`.
    #[inline]
    pub fn serialize_value<T: Any>(
        &self,
        writer: &mut dyn erased_serde::Serializer,
        value: &T,
    ) -> Result<(), ContractError> {
        self.serialize(writer, value, TypeKey::of::<T>())
    }

    /// Reads a value of type `T`.
    pub fn deserialize_value<T: Any>(
        &self,
        reader: &mut dyn erased_serde::Deserializer<'_>,
    ) -> Result<T, ContractError> {
        let value = self.deserialize(reader, TypeKey::of::<T>())?;
        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(ContractError::ValueMismatch {
                expected: type_name::<T>(),
            }),
        }
    }

    /// Writes a value of type `T` into any serde [`Serializer`].
    pub fn serialize_into<S: Serializer, T: Any>(
        &self,
        serializer: S,
        value: &T,
    ) -> Result<(), ContractError> {
        let mut erased = <dyn erased_serde::Serializer>::erase(serializer);
        self.serialize_value(&mut erased, value)
    }

    /// Reads a value of type `T` from any serde [`Deserializer`].
    pub fn deserialize_from<'de, D: Deserializer<'de>, T: Any>(
        &self,
        deserializer: D,
    ) -> Result<T, ContractError> {
        let mut erased = <dyn erased_serde::Deserializer>::erase(deserializer);
        self.deserialize_value(&mut erased)
    }
}
