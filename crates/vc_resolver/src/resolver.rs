use alloc::sync::Arc;
use alloc::vec::Vec;

use foldhash::fast::FixedState;
use hashbrown::HashMap;

use crate::attribute::{AttributeLookup, AttributeTable};
use crate::contract::{Contract, ContractCreator, ContractFactory, ContractPatch, PendingRequest};
use crate::error::ContractError;
use crate::middleware::{MiddlewareFactory, MiddlewareRequest, middleware_suppressed};
use crate::storage::{ContractStorage, FIXED_HASH_STATE};
use crate::ty::TypeKey;

pub(crate) type CreatorMap = HashMap<TypeKey, Arc<dyn ContractCreator>, FixedState>;

// -----------------------------------------------------------------------------
// ContractRegistry

/// The immutable set of capabilities a [`ContractResolver`] resolves with.
///
/// Created by [`ContractResolverBuilder::finish`] and shared read-only,
/// several resolvers may use the same registry.
pub struct ContractRegistry {
    creators: CreatorMap,
    factories: Vec<Arc<dyn ContractFactory>>,
    patches: Vec<Arc<dyn ContractPatch>>,
    middleware: Vec<Arc<dyn MiddlewareFactory>>,
    attributes: Arc<dyn AttributeLookup>,
}

impl ContractRegistry {
    /// Returns `true` if a creator is registered for `ty`.
    #[inline]
    pub fn has_creator(&self, ty: TypeKey) -> bool {
        self.creators.contains_key(&ty)
    }

    /// Number of registered factories.
    #[inline]
    pub fn factory_count(&self) -> usize {
        self.factories.len()
    }

    /// Number of registered patches.
    #[inline]
    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    /// Number of registered middleware factories.
    #[inline]
    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }
}

// -----------------------------------------------------------------------------
// ContractResolverBuilder

/// Registration surface of a [`ContractResolver`].
///
/// Capabilities keep their registration order, which decides factory
/// precedence, patch order and interceptor order.
///
/// # Examples
///
/// ```
/// use vc_resolver::{Contract, ContractError, ContractPatch, ContractResolver, ContractRequest, ContractFactory};
///
/// #[derive(Default)]
/// struct BoolFactory;
///
/// impl ContractFactory for BoolFactory {
///     fn handle(&self, request: &mut ContractRequest) -> Result<(), ContractError> {
///         if request.ty().is::<bool>() {
///             request.return_contract(Contract::serde::<bool>())?;
///         }
///         Ok(())
///     }
/// }
///
/// struct Audited;
///
/// impl ContractPatch for Audited {
///     fn patch(&self, contract: &mut Contract) {
///         contract.annotate("audited");
///     }
/// }
///
/// let resolver = ContractResolver::builder()
///     .add_default_factory::<BoolFactory>()
///     .add_patch(Audited)
///     .build();
///
/// let contract = resolver.resolve_of::<bool>().unwrap();
/// assert!(contract.has_annotation("audited"));
/// assert!(resolver.resolve_of::<u8>().is_err());
/// ```
pub struct ContractResolverBuilder {
    creators: CreatorMap,
    factories: Vec<Arc<dyn ContractFactory>>,
    patches: Vec<Arc<dyn ContractPatch>>,
    middleware: Vec<Arc<dyn MiddlewareFactory>>,
    attributes: Option<Arc<dyn AttributeLookup>>,
}

impl Default for ContractResolverBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ContractResolverBuilder {
    /// Creates a builder without any registration.
    pub fn new() -> Self {
        Self {
            creators: HashMap::with_hasher(FIXED_HASH_STATE),
            factories: Vec::new(),
            patches: Vec::new(),
            middleware: Vec::new(),
            attributes: None,
        }
    }

    /// Registers the creator of `ty`, replacing an earlier one.
    ///
    /// Indirections resolve to their element, so an indirection registers
    /// the creator of its element.
    pub fn add_creator_for(mut self, ty: TypeKey, creator: impl ContractCreator) -> Self {
        let ty = ty.element().unwrap_or(ty);
        let creator: Arc<dyn ContractCreator> = Arc::new(creator);
        if let Some(old) = self.creators.insert(ty, creator) {
            log::warn!("contract creator `{}` registered for `{ty}` was replaced", old.name());
        }
        self
    }

    /// Registers the creator of `T`, replacing an earlier one.
    #[inline]
    pub fn add_creator<T: ?Sized + 'static>(self, creator: impl ContractCreator) -> Self {
        self.add_creator_for(TypeKey::of::<T>(), creator)
    }

    /// Registers the default value of `C` as the creator of `T`.
    #[inline]
    pub fn add_default_creator<T: ?Sized + 'static, C: ContractCreator + Default>(self) -> Self {
        self.add_creator::<T>(C::default())
    }

    /// Appends a factory.
    pub fn add_factory(mut self, factory: impl ContractFactory) -> Self {
        self.factories.push(Arc::new(factory));
        self
    }

    /// Appends the default value of `F` as a factory.
    #[inline]
    pub fn add_default_factory<F: ContractFactory + Default>(self) -> Self {
        self.add_factory(F::default())
    }

    /// Appends a patch.
    pub fn add_patch(mut self, patch: impl ContractPatch) -> Self {
        self.patches.push(Arc::new(patch));
        self
    }

    /// Appends the default value of `P` as a patch.
    #[inline]
    pub fn add_default_patch<P: ContractPatch + Default>(self) -> Self {
        self.add_patch(P::default())
    }

    /// Appends a middleware factory.
    pub fn add_middleware_factory(mut self, factory: impl MiddlewareFactory) -> Self {
        self.middleware.push(Arc::new(factory));
        self
    }

    /// Appends the default value of `M` as a middleware factory.
    #[inline]
    pub fn add_default_middleware_factory<M: MiddlewareFactory + Default>(self) -> Self {
        self.add_middleware_factory(M::default())
    }

    /// Sets the lookup of capabilities declared on types.
    ///
    /// Defaults to [`AttributeTable::declared`].
    pub fn with_attributes(mut self, attributes: impl AttributeLookup) -> Self {
        self.attributes = Some(Arc::new(attributes));
        self
    }

    /// Freezes the registrations.
    pub fn finish(self) -> ContractRegistry {
        ContractRegistry {
            creators: self.creators,
            factories: self.factories,
            patches: self.patches,
            middleware: self.middleware,
            attributes: self
                .attributes
                .unwrap_or_else(|| Arc::new(AttributeTable::declared())),
        }
    }

    /// Freezes the registrations into a new resolver.
    #[inline]
    pub fn build(self) -> ContractResolver {
        ContractResolver::new(Arc::new(self.finish()))
    }
}

// -----------------------------------------------------------------------------
// ContractResolver

/// Resolves the contract of a type, optionally augmented with middleware.
///
/// Two views of every type are cached separately:
///
/// - The plain contract, created from the first matching capability:
///   1. the creator declared on the type,
///   2. the factories declared on the type, in declaration order,
///   3. the creator registered for the type,
///   4. the registered factories, in registration order,
///
///   then patched by every registered patch, in registration order.
/// - The middleware contract: the plain contract extended with one converter
///   running the interceptors contributed by the middleware factories, or the
///   plain contract itself if nothing was contributed.
///
/// [`resolve`](ContractResolver::resolve) returns the middleware view, except
/// inside a base write or read where it returns the plain one.
pub struct ContractResolver {
    registry: Arc<ContractRegistry>,
    contracts: ContractStorage,
    middleware_contracts: ContractStorage,
}

impl ContractResolver {
    /// Returns a new [`ContractResolverBuilder`].
    #[inline]
    pub fn builder() -> ContractResolverBuilder {
        ContractResolverBuilder::new()
    }

    /// Creates a resolver with empty caches.
    pub fn new(registry: Arc<ContractRegistry>) -> Self {
        Self {
            registry,
            contracts: ContractStorage::new(),
            middleware_contracts: ContractStorage::new(),
        }
    }

    /// The registrations this resolver uses.
    #[inline]
    pub fn registry(&self) -> &Arc<ContractRegistry> {
        &self.registry
    }

    /// Resolves the contract of `ty` for the current context.
    ///
    /// Returns [`resolve_plain`](Self::resolve_plain) while middleware is suppressed
    /// on this thread, [`resolve_middleware`](Self::resolve_middleware) otherwise.
    pub fn resolve(&self, ty: TypeKey) -> Result<Arc<Contract>, ContractError> {
        if middleware_suppressed() {
            self.resolve_plain(ty)
        } else {
            self.resolve_middleware(ty)
        }
    }

    /// Resolves the contract of `T` for the current context.
    #[inline]
    pub fn resolve_of<T: ?Sized + 'static>(&self) -> Result<Arc<Contract>, ContractError> {
        self.resolve(TypeKey::of::<T>())
    }

    /// Resolves the plain contract of `ty`, without middleware.
    pub fn resolve_plain(&self, ty: TypeKey) -> Result<Arc<Contract>, ContractError> {
        self.contracts.get_or_create(ty, |ty| self.create_contract(ty))
    }

    /// Resolves the contract of `ty` augmented with its middleware.
    pub fn resolve_middleware(&self, ty: TypeKey) -> Result<Arc<Contract>, ContractError> {
        self.middleware_contracts
            .get_or_create(ty, |ty| self.create_middleware_contract(ty))
    }

    fn create_contract(&self, ty: TypeKey) -> Result<Arc<Contract>, ContractError> {
        if let Some(element) = ty.element() {
            return self.resolve_plain(element);
        }

        let registry = &*self.registry;
        let mut request = PendingRequest::new(ty);

        let mut contract = if let Some(c) = request.create_declared(&*registry.attributes)? {
            c
        } else if let Some(c) = request.request_declared(&*registry.attributes)? {
            c
        } else if let Some(c) = request.create_registered(&registry.creators)? {
            c
        } else if let Some(c) = request.request(&registry.factories)? {
            c
        } else {
            return Err(request.no_contract());
        };

        for patch in &registry.patches {
            patch.patch(&mut contract);
        }

        log::debug!("created contract of `{ty}`");
        Ok(Arc::new(contract))
    }

    fn create_middleware_contract(&self, ty: TypeKey) -> Result<Arc<Contract>, ContractError> {
        if let Some(element) = ty.element() {
            return self.resolve_middleware(element);
        }

        let contract = self.resolve_plain(ty)?;

        let mut request = MiddlewareRequest::new(ty, &contract);
        for factory in &self.registry.middleware {
            factory.handle(&mut request);
        }

        match request.build_converter() {
            Some(converter) => {
                log::debug!("attached middleware to the contract of `{ty}`");
                Ok(Arc::new(contract.with_converter(Arc::new(converter))))
            }
            None => Ok(contract),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
