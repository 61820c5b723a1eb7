mod resolve;

pub use resolve::{resolve, Bindings, Decl, ResolveError};
