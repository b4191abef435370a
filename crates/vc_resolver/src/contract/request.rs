use alloc::sync::Arc;

use crate::attribute::AttributeLookup;
use crate::contract::{Contract, ContractCreator, ContractFactory};
use crate::error::{Capability, ContractError};
use crate::resolver::CreatorMap;
use crate::ty::TypeKey;

// -----------------------------------------------------------------------------
// ContractRequest

/// A single resolution attempt for one type, handed to [`ContractFactory::handle`].
///
/// The request accepts at most one contract. A second
/// [`return_contract`](ContractRequest::return_contract) is a programming error:
/// it returns [`ContractError::DuplicateReturn`], and the resolution fails
/// with that error even if the factory ignores it.
pub struct ContractRequest {
    ty: TypeKey,
    returned: Option<Contract>,
    duplicated: bool,
}

impl ContractRequest {
    #[inline]
    fn new(ty: TypeKey) -> Self {
        Self {
            ty,
            returned: None,
            duplicated: false,
        }
    }

    /// The type a contract is requested for.
    #[inline]
    pub fn ty(&self) -> TypeKey {
        self.ty
    }

    /// Returns `true` if a contract has already been returned.
    #[inline]
    pub fn is_fulfilled(&self) -> bool {
        self.returned.is_some()
    }

    /// Returns the contract for the requested type.
    pub fn return_contract(&mut self, contract: Contract) -> Result<(), ContractError> {
        if self.returned.is_none() {
            self.returned = Some(contract);
            Ok(())
        } else {
            self.duplicated = true;
            Err(ContractError::DuplicateReturn {
                factory: "<unknown>",
                ty: self.ty,
            })
        }
    }
}

// -----------------------------------------------------------------------------
// PendingRequest

/// Drives a [`ContractRequest`] through the capability precedence.
///
/// Every step returns `Ok(None)` when nothing matched, so steps chain in order.
pub(crate) struct PendingRequest {
    request: ContractRequest,
}

impl PendingRequest {
    #[inline]
    pub(crate) fn new(ty: TypeKey) -> Self {
        Self {
            request: ContractRequest::new(ty),
        }
    }

    fn verify(
        &self,
        contract: Contract,
        capability: Capability,
        name: &'static str,
    ) -> Result<Contract, ContractError> {
        if contract.ty() == self.request.ty {
            Ok(contract)
        } else {
            Err(ContractError::TypeMismatch {
                capability,
                name,
                expected: self.request.ty,
                actual: contract.ty(),
            })
        }
    }

    fn create(&self, creator: &dyn ContractCreator) -> Result<Contract, ContractError> {
        let contract = creator.create_contract()?;
        self.verify(contract, Capability::Creator, creator.name())
    }

    /// Invokes the creator declared on the type.
    pub(crate) fn create_declared(
        &self,
        lookup: &dyn AttributeLookup,
    ) -> Result<Option<Contract>, ContractError> {
        match lookup.creator(self.request.ty) {
            Some(creator) => self.create(creator).map(Some),
            None => Ok(None),
        }
    }

    /// Asks the factories declared on the type.
    pub(crate) fn request_declared(
        &mut self,
        lookup: &dyn AttributeLookup,
    ) -> Result<Option<Contract>, ContractError> {
        self.request(lookup.factories(self.request.ty))
    }

    /// Invokes the creator registered for the type.
    pub(crate) fn create_registered(
        &self,
        creators: &CreatorMap,
    ) -> Result<Option<Contract>, ContractError> {
        match creators.get(&self.request.ty) {
            Some(creator) => self.create(&**creator).map(Some),
            None => Ok(None),
        }
    }

    /// Asks `factories` in order, the first returned contract wins.
    pub(crate) fn request(
        &mut self,
        factories: &[Arc<dyn ContractFactory>],
    ) -> Result<Option<Contract>, ContractError> {
        self.request.returned = None;
        for factory in factories {
            let handled = factory.handle(&mut self.request);

            if self.request.duplicated {
                return Err(ContractError::DuplicateReturn {
                    factory: factory.name(),
                    ty: self.request.ty,
                });
            }
            handled?;

            if let Some(contract) = self.request.returned.take() {
                log::trace!("contract factory `{}` handled `{}`", factory.name(), self.request.ty);
                return self.verify(contract, Capability::Factory, factory.name()).map(Some);
            }
        }
        Ok(None)
    }

    pub(crate) fn no_contract(&self) -> ContractError {
        ContractError::NoContract(self.request.ty)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use super::PendingRequest;
    use crate::contract::{Contract, ContractFactory, ContractRequest};
    use crate::error::{Capability, ContractError};
    use crate::TypeKey;

    struct Returns(fn() -> Contract);

    impl ContractFactory for Returns {
        fn handle(&self, request: &mut ContractRequest) -> Result<(), ContractError> {
            request.return_contract((self.0)())
        }
    }

    struct Declines;

    impl ContractFactory for Declines {
        fn handle(&self, _: &mut ContractRequest) -> Result<(), ContractError> {
            Ok(())
        }
    }

    struct ReturnsTwice;

    impl ContractFactory for ReturnsTwice {
        fn handle(&self, request: &mut ContractRequest) -> Result<(), ContractError> {
            request.return_contract(Contract::of::<u8>())?;
            // The error of the second return is swallowed on purpose.
            let _ = request.return_contract(Contract::of::<u8>());
            Ok(())
        }
    }

    #[test]
    fn first_returning_factory_wins() {
        let factories: Vec<Arc<dyn ContractFactory>> = vec![
            Arc::new(Declines),
            Arc::new(Returns(|| {
                let mut c = Contract::of::<u8>();
                c.annotate("second");
                c
            })),
            Arc::new(Returns(|| {
                let mut c = Contract::of::<u8>();
                c.annotate("third");
                c
            })),
        ];

        let mut pending = PendingRequest::new(TypeKey::of::<u8>());
        let contract = pending.request(&factories).unwrap().unwrap();
        assert_eq!(contract.annotations(), ["second"]);
    }

    #[test]
    fn all_declining_yields_none() {
        let factories: Vec<Arc<dyn ContractFactory>> = vec![Arc::new(Declines)];
        let mut pending = PendingRequest::new(TypeKey::of::<u8>());
        assert!(pending.request(&factories).unwrap().is_none());
        assert!(matches!(pending.no_contract(), ContractError::NoContract(ty) if ty.is::<u8>()));
    }

    #[test]
    fn mismatched_type_is_rejected() {
        let factories: Vec<Arc<dyn ContractFactory>> =
            vec![Arc::new(Returns(Contract::of::<u16>))];
        let mut pending = PendingRequest::new(TypeKey::of::<u8>());
        let err = pending.request(&factories).unwrap_err();
        match err {
            ContractError::TypeMismatch {
                capability,
                name,
                expected,
                actual,
            } => {
                assert_eq!(capability, Capability::Factory);
                assert!(name.ends_with("Returns"));
                assert!(expected.is::<u8>());
                assert!(actual.is::<u16>());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn swallowed_duplicate_return_still_fails() {
        let factories: Vec<Arc<dyn ContractFactory>> = vec![Arc::new(ReturnsTwice)];
        let mut pending = PendingRequest::new(TypeKey::of::<u8>());
        let err = pending.request(&factories).unwrap_err();
        assert!(
            matches!(err, ContractError::DuplicateReturn { factory, .. } if factory.ends_with("ReturnsTwice"))
        );
    }
}
