//! Operator boilerplate for single-field newtypes.

#[macro_export]
macro_rules! op {
    (binary $type:ty, $trt:ident, $fn:ident) => {
        impl std::ops::$trt for $type {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self::Output {
                Self(std::ops::$trt::$fn(self.0, rhs.0))
            }
        }
    };
    (inplace $type:ty, $trt:ident, $fn:ident) => {
        impl std::ops::$trt for $type {
            fn $fn(&mut self, rhs: Self) {
                std::ops::$trt::$fn(&mut self.0, rhs.0);
            }
        }
    };
    (unary $type:ty, $trt:ident, $fn:ident) => {
        impl std::ops::$trt for $type {
            type Output = Self;

            fn $fn(self) -> Self::Output {
                Self(std::ops::$trt::$fn(self.0))
            }
        }
    };
}
