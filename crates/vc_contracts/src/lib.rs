#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod display;
mod primitive;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use display::{
    DisplayContractCreator, DisplayConverter, IpAddrContractCreator, SocketAddrContractCreator,
};
pub use primitive::PrimitiveContractFactory;

// -----------------------------------------------------------------------------
// StandardContracts

use core::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use vc_resolver::ContractResolverBuilder;

/// Registers the standard contracts on a [`ContractResolverBuilder`].
///
/// # Examples
///
/// ```
/// use std::net::IpAddr;
/// use vc_contracts::StandardContracts;
/// use vc_resolver::ContractResolver;
///
/// let resolver = ContractResolver::builder().add_standard_contracts().build();
///
/// assert!(resolver.resolve_of::<u16>().is_ok());
/// assert!(resolver.resolve_of::<IpAddr>().is_ok());
/// ```
pub trait StandardContracts {
    /// Adds [`PrimitiveContractFactory`] and the creators of the address types
    /// of [`core::net`].
    fn add_standard_contracts(self) -> Self;
}

impl StandardContracts for ContractResolverBuilder {
    fn add_standard_contracts(self) -> Self {
        self.add_default_factory::<PrimitiveContractFactory>()
            .add_default_creator::<IpAddr, IpAddrContractCreator>()
            .add_default_creator::<Ipv4Addr, DisplayContractCreator<Ipv4Addr>>()
            .add_default_creator::<Ipv6Addr, DisplayContractCreator<Ipv6Addr>>()
            .add_default_creator::<SocketAddr, SocketAddrContractCreator>()
            .add_default_creator::<SocketAddrV4, DisplayContractCreator<SocketAddrV4>>()
            .add_default_creator::<SocketAddrV6, DisplayContractCreator<SocketAddrV6>>()
    }
}

// -----------------------------------------------------------------------------
// Tests
