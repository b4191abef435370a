use alloc::string::String;

use foldhash::fast::FixedState;
use hashbrown::HashMap;
use vc_resolver::{Contract, ContractError, ContractFactory, ContractRequest, FIXED_HASH_STATE, TypeKey};

// -----------------------------------------------------------------------------
// PrimitiveContractFactory

/// Serde contracts of the primitive types and [`String`].
///
/// Covers `()`, `bool`, `char`, every integer type, `f32`, `f64` and `String`.
/// Other types are declined.
///
/// # Examples
///
/// ```
/// use vc_contracts::PrimitiveContractFactory;
/// use vc_resolver::ContractResolver;
///
/// let resolver = ContractResolver::builder()
///     .add_default_factory::<PrimitiveContractFactory>()
///     .build();
///
/// assert!(resolver.resolve_of::<i64>().unwrap().can_write());
/// assert!(resolver.resolve_of::<Vec<i64>>().is_err());
/// ```
pub struct PrimitiveContractFactory {
    contracts: HashMap<TypeKey, fn() -> Contract, FixedState>,
}

impl Default for PrimitiveContractFactory {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! primitive_contracts {
    ($map:ident: $($ty:ty),* $(,)?) => {
        $( $map.insert(TypeKey::of::<$ty>(), Contract::serde::<$ty> as fn() -> Contract); )*
    };
}

impl PrimitiveContractFactory {
    pub fn new() -> Self {
        let mut contracts = HashMap::with_hasher(FIXED_HASH_STATE);
        primitive_contracts!(contracts:
            (), bool, char,
            i8, i16, i32, i64, i128, isize,
            u8, u16, u32, u64, u128, usize,
            f32, f64,
            String,
        );
        Self { contracts }
    }

    /// Returns `true` if the contract of `ty` is provided.
    #[inline]
    pub fn supports(&self, ty: TypeKey) -> bool {
        self.contracts.contains_key(&ty)
    }
}

impl ContractFactory for PrimitiveContractFactory {
    fn handle(&self, request: &mut ContractRequest) -> Result<(), ContractError> {
        if let Some(create) = self.contracts.get(&request.ty()) {
            request.return_contract(create())?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::hash::BuildHasher;

    use vc_resolver::{ContractError, ContractResolver, ContractSerializer, FIXED_HASH_STATE, TypeKey};

    use super::PrimitiveContractFactory;

    fn serializer() -> ContractSerializer {
        let resolver = ContractResolver::builder()
            .add_default_factory::<PrimitiveContractFactory>()
            .build();
        ContractSerializer::new(Arc::new(resolver))
    }

    fn json<T: 'static>(serializer: &ContractSerializer, value: &T) -> String {
        let mut output = Vec::new();
        serializer
            .serialize_into(&mut serde_json::Serializer::new(&mut output), value)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn covers_primitives_only() {
        let factory = PrimitiveContractFactory::new();
        assert!(factory.supports(TypeKey::of::<()>()));
        assert!(factory.supports(TypeKey::of::<u128>()));
        assert!(factory.supports(TypeKey::of::<String>()));
        assert!(!factory.supports(TypeKey::of::<&'static str>()));
        assert!(!factory.supports(TypeKey::of::<Option<u8>>()));
    }

    #[test]
    fn table_uses_resolver_hash_state() {
        let factory = PrimitiveContractFactory::new();
        let key = TypeKey::of::<u8>();
        assert_eq!(
            factory.contracts.hasher().hash_one(key),
            FIXED_HASH_STATE.hash_one(key)
        );
    }

    #[test]
    fn json_round_trip() {
        let serializer = serializer();

        assert_eq!(json(&serializer, &-12_i32), "-12");
        assert_eq!(json(&serializer, &true), "true");
        assert_eq!(json(&serializer, &'x'), "\"x\"");
        assert_eq!(json(&serializer, &String::from("abc")), "\"abc\"");

        let mut input = serde_json::Deserializer::from_str("1.5");
        assert_eq!(serializer.deserialize_from::<_, f64>(&mut input).unwrap(), 1.5);
        let mut input = serde_json::Deserializer::from_str("255");
        assert_eq!(serializer.deserialize_from::<_, u8>(&mut input).unwrap(), 255);
    }

    #[test]
    fn ron_round_trip() {
        let serializer = serializer();

        let mut output = String::new();
        let mut ron_ser = ron::Serializer::new(&mut output, None).unwrap();
        serializer.serialize_into(&mut ron_ser, &42_u64).unwrap();
        assert_eq!(output, "42");

        let mut input = ron::Deserializer::from_str("'z'").unwrap();
        assert_eq!(serializer.deserialize_from::<_, char>(&mut input).unwrap(), 'z');
    }

    #[test]
    fn out_of_range_read_fails() {
        let serializer = serializer();
        let mut input = serde_json::Deserializer::from_str("300");
        let err = serializer.deserialize_from::<_, u8>(&mut input).unwrap_err();
        assert!(matches!(err, ContractError::Serde(_)));
    }

    #[test]
    fn unsupported_type_has_no_contract() {
        let serializer = serializer();
        let mut output = Vec::new();
        let err = serializer
            .serialize_into(&mut serde_json::Serializer::new(&mut output), &[1_u8, 2])
            .unwrap_err();
        assert!(matches!(err, ContractError::NoContract(_)));
    }
}
