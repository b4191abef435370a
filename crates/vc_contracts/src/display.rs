use alloc::boxed::Box;
use alloc::string::String;
use core::any::{Any, type_name};
use core::fmt::Display;
use core::marker::PhantomData;
use core::net::{IpAddr, SocketAddr};
use core::str::FromStr;

use serde_core::{Serialize, Serializer};
use vc_resolver::{Contract, ContractCreator, ContractError, ContractSerializer, Converter, downcast_value};

// -----------------------------------------------------------------------------
// DisplayConverter

/// Serializes the wrapped value as its [`Display`] string.
struct Collected<'a, T>(&'a T);

impl<T: Display> Serialize for Collected<'_, T> {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self.0)
    }
}

/// Writes a value as its [`Display`] string and reads it back with [`FromStr`].
pub struct DisplayConverter<T>(PhantomData<fn() -> T>);

impl<T> Default for DisplayConverter<T> {
    #[inline]
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T> Converter for DisplayConverter<T>
where
    T: Display + FromStr + 'static,
    T::Err: Display,
{
    fn write(
        &self,
        writer: &mut dyn erased_serde::Serializer,
        value: &dyn Any,
        _: &ContractSerializer,
    ) -> Result<(), ContractError> {
        let value = downcast_value::<T>(value)?;
        erased_serde::Serialize::erased_serialize(&Collected(value), writer)?;
        Ok(())
    }

    fn read(
        &self,
        reader: &mut dyn erased_serde::Deserializer<'_>,
        _: &ContractSerializer,
    ) -> Result<Box<dyn Any>, ContractError> {
        let text: String = erased_serde::deserialize(reader)?;
        match text.parse::<T>() {
            Ok(value) => Ok(Box::new(value)),
            Err(err) => Err(ContractError::custom(format_args!(
                "invalid `{}` {text:?}: {err}",
                type_name::<T>()
            ))),
        }
    }
}

// -----------------------------------------------------------------------------
// DisplayContractCreator

/// Creates the contract of `T` around a [`DisplayConverter`].
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use std::sync::Arc;
/// use vc_contracts::DisplayContractCreator;
/// use vc_resolver::{ContractResolver, ContractSerializer};
///
/// let resolver = ContractResolver::builder()
///     .add_default_creator::<Ipv4Addr, DisplayContractCreator<Ipv4Addr>>()
///     .build();
/// let serializer = ContractSerializer::new(Arc::new(resolver));
///
/// let mut output = Vec::new();
/// serializer
///     .serialize_into(&mut serde_json::Serializer::new(&mut output), &Ipv4Addr::LOCALHOST)
///     .unwrap();
/// assert_eq!(output, br#""127.0.0.1""#);
/// ```
pub struct DisplayContractCreator<T>(PhantomData<fn() -> T>);

impl<T> Default for DisplayContractCreator<T> {
    #[inline]
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T> ContractCreator for DisplayContractCreator<T>
where
    T: Display + FromStr + 'static,
    T::Err: Display,
{
    fn create_contract(&self) -> Result<Contract, ContractError> {
        let mut contract = Contract::of::<T>();
        contract.add_converter(DisplayConverter::<T>::default());
        Ok(contract)
    }
}

/// Contract of [`IpAddr`] as its textual form.
pub type IpAddrContractCreator = DisplayContractCreator<IpAddr>;

/// Contract of [`SocketAddr`] as its `host:port` form.
pub type SocketAddrContractCreator = DisplayContractCreator<SocketAddr>;

// -----------------------------------------------------------------------------
// Tests
