//! The default injector used by code that does not carry its own.
//!
//! Instances are shared through [`Rc`](std::rc::Rc), so the default injector
//! lives per thread. Startup code registers application-wide singletons with
//! [`add_global_context`] before the first call to [`inject`].

use crate::{Binder, Configure, InjectResult, Injector, Node, Svc};
use std::cell::RefCell;

thread_local! {
    static GLOBAL: RefCell<Injector> = RefCell::new(Injector::new());
}

/// Gets a handle to the default injector.
///
/// ```
/// use scoped_injector::{global, reset_global};
///
/// reset_global();
/// global().root().bind(3u8).unwrap();
/// assert_eq!(3, *global().root().resolve::<u8>().unwrap());
/// ```
#[must_use]
pub fn global() -> Injector {
    GLOBAL.with(|injector| injector.borrow().clone())
}

/// Discards every binding in the default root scope. Computed metadata is
/// kept. Handles obtained earlier keep the old root.
pub fn reset_global() {
    GLOBAL.with(|injector| {
        let metadata = injector.borrow().metadata().clone();
        let mut builder = Injector::builder();
        builder.set_metadata(metadata);
        *injector.borrow_mut() = builder.build();
    });
    tracing::debug!("default root scope reset");
}

/// Runs a configuration step against the default root scope.
pub fn add_global_context<C>(context: &C) -> InjectResult<()>
where
    C: ?Sized + Configure,
{
    let injector = global();
    context.configure(&mut Binder::new(injector.root()))
}

/// Injects `node` against the default root scope.
pub fn inject<N: Node>(node: &Svc<N>) -> InjectResult<()> {
    global().inject(node)
}
