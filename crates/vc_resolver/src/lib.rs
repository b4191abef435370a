#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod resolver;
mod serializer;
mod storage;
mod ty;

pub mod attribute;
pub mod contract;
pub mod middleware;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use attribute::{AttributeLookup, AttributeTable};
pub use contract::{
    Contract, ContractCreator, ContractFactory, ContractPatch, ContractRequest, Converter,
    downcast_value,
};
pub use error::{Capability, ContractError};
pub use middleware::{
    MiddlewareFactory, MiddlewareRequest, ReadMiddleware, ReadNext, WriteMiddleware, WriteNext,
    middleware_suppressed,
};
pub use resolver::{ContractRegistry, ContractResolver, ContractResolverBuilder};
pub use serializer::ContractSerializer;
pub use storage::{ContractStorage, FIXED_HASH_STATE};
pub use ty::TypeKey;

#[doc(hidden)]
pub mod __macro_exports {
    pub use alloc::sync::Arc;

    #[cfg(feature = "auto_register")]
    pub use inventory;
}
