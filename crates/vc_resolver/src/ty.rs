use core::any::{TypeId, type_name};
use core::fmt;
use core::hash::{Hash, Hasher};

// -----------------------------------------------------------------------------
// TypeKey

/// Identifies the data shape a [`Contract`] is resolved for.
///
/// A key is either a plain type, or an indirection ("reference to `T`")
/// whose [`element`](TypeKey::element) is the real target. Indirections model
/// by-reference or output-parameter shapes and are transparent to resolution:
/// the contract of `by_ref::<T>()` is the contract of `T`.
///
/// Equality and hashing only consider the [`TypeId`] and the indirection flag,
/// the type name is carried for diagnostics.
///
/// # Examples
///
/// ```
/// use vc_resolver::TypeKey;
///
/// let plain = TypeKey::of::<String>();
/// let by_ref = TypeKey::by_ref::<String>();
///
/// assert_ne!(plain, by_ref);
/// assert_eq!(by_ref.element(), Some(plain));
/// assert_eq!(plain.element(), None);
/// assert!(plain.is::<String>());
/// ```
///
/// [`Contract`]: crate::Contract
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    by_ref: bool,
}

impl TypeKey {
    /// Returns the key of the plain type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            by_ref: false,
        }
    }

    /// Returns the key of an indirection over `T`.
    #[inline]
    pub fn by_ref<T: ?Sized + 'static>() -> Self {
        Self::of::<T>().reference()
    }

    /// Returns an indirection over the plain type of `self`.
    ///
    /// Indirections do not nest, a reference to a reference is the same key.
    #[inline]
    pub const fn reference(self) -> Self {
        Self {
            by_ref: true,
            ..self
        }
    }

    /// Returns the element type if `self` is an indirection.
    #[inline]
    pub const fn element(self) -> Option<Self> {
        if self.by_ref {
            Some(Self {
                by_ref: false,
                ..self
            })
        } else {
            None
        }
    }

    /// Returns `true` if `self` is an indirection.
    #[inline]
    pub const fn is_by_ref(self) -> bool {
        self.by_ref
    }

    /// Returns `true` if `self` is the plain key of `T`.
    #[inline]
    pub fn is<T: ?Sized + 'static>(self) -> bool {
        !self.by_ref && self.id == TypeId::of::<T>()
    }

    /// The [`TypeId`] of the plain type.
    #[inline]
    pub const fn id(self) -> TypeId {
        self.id
    }

    /// The [`type_name`] of the plain type.
    #[inline]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

// -----------------------------------------------------------------------------
// Traits

impl PartialEq for TypeKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.by_ref == other.by_ref
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.by_ref.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.by_ref {
            write!(f, "ref {}", self.name)
        } else {
            f.write_str(self.name)
        }
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({self})")
    }
}

// -----------------------------------------------------------------------------
// Tests
