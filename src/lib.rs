#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use vc_contracts as contracts;
pub use vc_resolver as resolver;
