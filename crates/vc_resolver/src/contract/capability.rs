use core::any::type_name;

use crate::contract::{Contract, ContractRequest};
use crate::error::ContractError;

/// Produces the contract of exactly one type.
///
/// Creators are registered for a type with
/// [`ContractResolverBuilder::add_creator`](crate::ContractResolverBuilder::add_creator),
/// or declared on the type itself through an [`AttributeLookup`](crate::AttributeLookup).
///
/// The returned contract must be bound to the type the creator was registered for,
/// otherwise resolution fails with [`ContractError::TypeMismatch`].
pub trait ContractCreator: Send + Sync + 'static {
    fn create_contract(&self) -> Result<Contract, ContractError>;

    /// Name used in diagnostics.
    #[inline]
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// May produce the contract of any type it recognizes.
///
/// A factory inspects [`ContractRequest::ty`] and either returns a contract
/// through [`ContractRequest::return_contract`] exactly once, or leaves the
/// request untouched so the next factory is asked.
///
/// # Examples
///
/// ```
/// use vc_resolver::{Contract, ContractError, ContractFactory, ContractRequest};
///
/// struct NumberFactory;
///
/// impl ContractFactory for NumberFactory {
///     fn handle(&self, request: &mut ContractRequest) -> Result<(), ContractError> {
///         if request.ty().is::<i32>() {
///             request.return_contract(Contract::serde::<i32>())?;
///         } else if request.ty().is::<i64>() {
///             request.return_contract(Contract::serde::<i64>())?;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait ContractFactory: Send + Sync + 'static {
    fn handle(&self, request: &mut ContractRequest) -> Result<(), ContractError>;

    /// Name used in diagnostics.
    #[inline]
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Mutates a freshly created contract before it is cached.
///
/// Patches run over every created contract in registration order,
/// each one seeing the result of the previous ones.
pub trait ContractPatch: Send + Sync + 'static {
    fn patch(&self, contract: &mut Contract);
}
