macro_rules! bitmask {
    (#[repr($inner:ident)] bitmask $ty:ident { $($(#[$meta:meta])* $key:ident = $value:literal,)* }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr(transparent)]
        pub struct $ty {
            value: $inner,
        }

        #[automatically_derived]
        impl $ty {
            $($(#[$meta])* pub const $key: Self = Self { value: $value };)*

            #[inline]
            pub const fn from_raw(value: $inner) -> Self {
                Self { value }
            }

            /// `true` when all bits of `other` are set, always `true` for empty masks
            #[inline]
            pub const fn contains(self, other: Self) -> bool {
                self.value & other.value == other.value
            }
        }

        #[automatically_derived]
        impl ::std::ops::BitOr for $ty {
            type Output = Self;

            #[inline]
            fn bitor(self, rhs: Self) -> Self::Output {
                Self {
                    value: self.value | rhs.value,
                }
            }
        }

        #[automatically_derived]
        impl ::std::ops::BitOrAssign for $ty {
            #[inline]
            fn bitor_assign(&mut self, rhs: Self) {
                self.value |= rhs.value
            }
        }

        #[automatically_derived]
        impl ::std::convert::From<$ty> for $inner {
            #[inline]
            fn from(val: $ty) -> Self {
                val.value
            }
        }
    };
}
pub(crate) use bitmask;
