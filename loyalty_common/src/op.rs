/// Implements arithmetic for single-field tuple structs by delegating to the inner value.
///
/// * `binary`, `inplace` and `unary` implement the standard operator traits. These panic on overflow in debug builds,
///   like the integer ops they wrap.
/// * `checked` adds an inherent `checked_*` method that returns `None` on overflow instead.
#[macro_export]
macro_rules! op {
    (binary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$impl_fn(rhs.0))
            }
        }
    };

    (inplace $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            fn $impl_fn(&mut self, rhs: Self) {
                self.0.$impl_fn(rhs.0)
            }
        }
    };

    (unary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self) -> Self::Output {
                Self(self.0.$impl_fn())
            }
        }
    };

    (checked $for_struct:ident, $impl_fn:ident) => {
        impl $for_struct {
            pub fn $impl_fn(self, rhs: Self) -> Option<Self> {
                self.0.$impl_fn(rhs.0).map(Self)
            }
        }
    };
}
