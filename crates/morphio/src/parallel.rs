//! Decoding many files at once using rayon.
//!
//! Every file gets its own store and builder, so workers share nothing but
//! the options.

use std::path::Path;

use rayon::prelude::*;

use crate::error::Result;
use crate::options::LoadOptions;
use crate::properties::Properties;

/// Loads every path in parallel. Results come back in input order and one
/// failing file does not affect the others.
pub fn load_many<P>(paths: &[P], options: &LoadOptions) -> Vec<Result<Properties>>
where
    P: AsRef<Path> + Sync,
{
    paths
        .par_iter()
        .map(|path| crate::load_with_options(path, options))
        .collect()
}
