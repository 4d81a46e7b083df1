
pub use context::{TestContext, TestContextSetup, NOW};

/// Generates a string that is unique to the containing function.
#[macro_export]
macro_rules! fn_name {
    () => {
        $crate::__type_name_of(|| {})
    };
}

pub fn __type_name_of<T>(_: T) -> &'static str {
    std::any::type_name::<T>()
}
