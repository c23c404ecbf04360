mod keyed;
mod list;

pub use keyed::*;
pub use list::*;
