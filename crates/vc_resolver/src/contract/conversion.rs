use alloc::boxed::Box;
use core::any::Any;

use serde_core::Serialize;
use serde_core::de::DeserializeOwned;

use crate::contract::downcast_value;
use crate::error::ContractError;

/// Erased serde write of a concrete type.
pub(super) type WriteFn =
    fn(value: &dyn Any, writer: &mut dyn erased_serde::Serializer) -> Result<(), ContractError>;

/// Erased serde read of a concrete type.
pub(super) type ReadFn =
    for<'de> fn(reader: &mut dyn erased_serde::Deserializer<'de>) -> Result<Box<dyn Any>, ContractError>;

pub(super) fn write_serde<T: Serialize + 'static>(
    value: &dyn Any,
    writer: &mut dyn erased_serde::Serializer,
) -> Result<(), ContractError> {
    let value: &dyn erased_serde::Serialize = downcast_value::<T>(value)?;
    value.erased_serialize(writer)?;
    Ok(())
}

pub(super) fn read_serde<T: DeserializeOwned + 'static>(
    reader: &mut dyn erased_serde::Deserializer<'_>,
) -> Result<Box<dyn Any>, ContractError> {
    let value: T = erased_serde::deserialize(reader)?;
    Ok(Box::new(value))
}
