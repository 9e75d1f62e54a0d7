/// Compatibility layer for rayon/sequential execution.
///
/// With the `threading` feature this re-exports rayon's parallel iterators.
/// Without it, a sequential stand-in provides the `into_par_iter()` entry
/// point so the rest of the chain resolves to plain `Iterator` methods.
#[cfg(feature = "threading")]
pub use rayon::prelude::*;

#[cfg(not(feature = "threading"))]
mod sequential {
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "threading"))]
pub use sequential::*;
