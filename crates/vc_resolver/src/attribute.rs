//! Capabilities declared directly on a type.
//!
//! Resolution asks an [`AttributeLookup`] for the creator and the factories
//! associated with a type before it considers globally registered ones.
//! How the association is established is up to the lookup.
//!
//! [`AttributeTable`] is the provided lookup. It can be filled by hand, or,
//! with the `auto_register` feature, from declarations submitted anywhere in
//! the program:
//!
//! ```
//! use vc_resolver::{Contract, ContractCreator, ContractError, declare_contract_creator};
//!
//! pub struct Celsius(pub f64);
//!
//! struct CelsiusCreator;
//!
//! impl ContractCreator for CelsiusCreator {
//!     fn create_contract(&self) -> Result<Contract, ContractError> {
//!         Ok(Contract::of::<Celsius>())
//!     }
//! }
//!
//! declare_contract_creator!(Celsius => CelsiusCreator);
//! ```
//!
//! We use the [`inventory`] crate to collect declarations. Platforms it does
//! not support simply see no declarations.
//!
//! [`inventory`]: https://docs.rs/inventory

use alloc::sync::Arc;
use alloc::vec::Vec;

use foldhash::fast::FixedState;
use hashbrown::HashMap;

use crate::contract::{ContractCreator, ContractFactory};
use crate::storage::FIXED_HASH_STATE;
use crate::ty::TypeKey;

// -----------------------------------------------------------------------------
// AttributeLookup

/// Finds the capabilities declared directly on a type.
pub trait AttributeLookup: Send + Sync + 'static {
    /// The creator declared on `ty`, if any.
    fn creator(&self, ty: TypeKey) -> Option<&dyn ContractCreator>;

    /// The factories declared on `ty`, in declaration order.
    fn factories(&self, ty: TypeKey) -> &[Arc<dyn ContractFactory>];
}

// -----------------------------------------------------------------------------
// AttributeTable

#[derive(Default)]
struct Declared {
    creator: Option<Arc<dyn ContractCreator>>,
    factories: Vec<(u32, Arc<dyn ContractFactory>)>,
    ordered: Vec<Arc<dyn ContractFactory>>,
}

/// A static table of declared capabilities.
///
/// # Examples
///
/// ```
/// use vc_resolver::{AttributeLookup, AttributeTable, Contract, ContractCreator, ContractError, TypeKey};
///
/// struct Point;
/// struct PointCreator;
///
/// impl ContractCreator for PointCreator {
///     fn create_contract(&self) -> Result<Contract, ContractError> {
///         Ok(Contract::of::<Point>())
///     }
/// }
///
/// let mut table = AttributeTable::new();
/// table.declare_creator::<Point>(PointCreator);
///
/// assert!(table.creator(TypeKey::of::<Point>()).is_some());
/// assert!(table.factories(TypeKey::of::<Point>()).is_empty());
/// ```
pub struct AttributeTable {
    table: HashMap<TypeKey, Declared, FixedState>,
}

impl Default for AttributeTable {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            table: HashMap::with_hasher(FIXED_HASH_STATE),
        }
    }

    /// Creates a table from every [`ContractDeclaration`] in the program.
    ///
    /// Without the `auto_register` feature the table is empty.
    pub fn declared() -> Self {
        #[cfg(feature = "auto_register")]
        {
            let mut table = Self::new();
            for declaration in inventory::iter::<ContractDeclaration> {
                table.insert_declaration(declaration);
            }
            table
        }
        #[cfg(not(feature = "auto_register"))]
        {
            Self::new()
        }
    }

    #[cfg(feature = "auto_register")]
    fn insert_declaration(&mut self, declaration: &ContractDeclaration) {
        let ty = (declaration.ty)();
        match declaration.attribute {
            DeclaredAttribute::Creator(create) => self.set_creator(ty, create()),
            DeclaredAttribute::Factory { order, create } => self.push_factory(ty, order, create()),
        }
    }

    fn set_creator(&mut self, ty: TypeKey, creator: Arc<dyn ContractCreator>) {
        let declared = self.table.entry(ty).or_default();
        if let Some(old) = declared.creator.replace(creator) {
            log::warn!("contract creator `{}` declared on `{ty}` was replaced", old.name());
        }
    }

    fn push_factory(&mut self, ty: TypeKey, order: u32, factory: Arc<dyn ContractFactory>) {
        let declared = self.table.entry(ty).or_default();
        declared.factories.push((order, factory));
        // Stable sort, equal orders keep insertion order.
        declared.factories.sort_by_key(|(order, _)| *order);
        declared.ordered = declared.factories.iter().map(|(_, f)| f.clone()).collect();
    }

    /// Declares `creator` on `T`, replacing an earlier declaration.
    pub fn declare_creator<T: ?Sized + 'static>(&mut self, creator: impl ContractCreator) -> &mut Self {
        self.set_creator(TypeKey::of::<T>(), Arc::new(creator));
        self
    }

    /// Declares `factory` on `T` after the factories already declared on it.
    pub fn declare_factory<T: ?Sized + 'static>(&mut self, factory: impl ContractFactory) -> &mut Self {
        let order = self
            .table
            .get(&TypeKey::of::<T>())
            .and_then(|declared| declared.factories.last())
            .map_or(0, |(order, _)| *order);
        self.push_factory(TypeKey::of::<T>(), order, Arc::new(factory));
        self
    }

    /// Returns `true` if nothing is declared.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl AttributeLookup for AttributeTable {
    fn creator(&self, ty: TypeKey) -> Option<&dyn ContractCreator> {
        self.table.get(&ty)?.creator.as_deref()
    }

    fn factories(&self, ty: TypeKey) -> &[Arc<dyn ContractFactory>] {
        match self.table.get(&ty) {
            Some(declared) => &declared.ordered,
            None => &[],
        }
    }
}

// -----------------------------------------------------------------------------
// ContractDeclaration

/// A capability declared on a type.
#[derive(Clone, Copy)]
pub enum DeclaredAttribute {
    Creator(fn() -> Arc<dyn ContractCreator>),
    /// Factories declared on one type run by ascending `order`.
    Factory {
        order: u32,
        create: fn() -> Arc<dyn ContractFactory>,
    },
}

/// A statically submitted declaration, see [`declare_contract_creator!`]
/// and [`declare_contract_factory!`].
///
/// [`declare_contract_creator!`]: crate::declare_contract_creator
/// [`declare_contract_factory!`]: crate::declare_contract_factory
#[cfg_attr(not(feature = "auto_register"), allow(dead_code))]
pub struct ContractDeclaration {
    ty: fn() -> TypeKey,
    attribute: DeclaredAttribute,
}

impl ContractDeclaration {
    #[inline]
    pub const fn new(ty: fn() -> TypeKey, attribute: DeclaredAttribute) -> Self {
        Self { ty, attribute }
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(ContractDeclaration);

#[cfg(feature = "auto_register")]
#[doc(hidden)]
#[macro_export]
macro_rules! __submit_declaration {
    ($($declaration:tt)*) => {
        $crate::__macro_exports::inventory::submit! { $($declaration)* }
    };
}

#[cfg(not(feature = "auto_register"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __submit_declaration {
    ($($declaration:tt)*) => {};
}

/// Declares a [`ContractCreator`] on a type.
///
/// The declaration is collected by [`AttributeTable::declared`].
/// Without the `auto_register` feature this expands to nothing.
///
/// ```ignore
/// declare_contract_creator!(MyType => MyTypeCreator);
/// ```
#[macro_export]
macro_rules! declare_contract_creator {
    ($ty:ty => $creator:expr) => {
        $crate::__submit_declaration! {
            $crate::attribute::ContractDeclaration::new(
                $crate::TypeKey::of::<$ty>,
                $crate::attribute::DeclaredAttribute::Creator({
                    fn create() -> $crate::__macro_exports::Arc<dyn $crate::ContractCreator> {
                        $crate::__macro_exports::Arc::new($creator)
                    }
                    create
                }),
            )
        }
    };
}

/// Declares a [`ContractFactory`] on a type.
///
/// Factories declared on the same type run by ascending `order`, `0` by default.
/// Without the `auto_register` feature this expands to nothing.
///
/// ```ignore
/// declare_contract_factory!(MyType => FirstFactory);
/// declare_contract_factory!(MyType => SecondFactory, order = 1);
/// ```
#[macro_export]
macro_rules! declare_contract_factory {
    ($ty:ty => $factory:expr, order = $order:expr) => {
        $crate::__submit_declaration! {
            $crate::attribute::ContractDeclaration::new(
                $crate::TypeKey::of::<$ty>,
                $crate::attribute::DeclaredAttribute::Factory {
                    order: $order,
                    create: {
                        fn create() -> $crate::__macro_exports::Arc<dyn $crate::ContractFactory> {
                            $crate::__macro_exports::Arc::new($factory)
                        }
                        create
                    },
                },
            )
        }
    };
    ($ty:ty => $factory:expr) => {
        $crate::declare_contract_factory!($ty => $factory, order = 0);
    };
}

// -----------------------------------------------------------------------------
// Tests
