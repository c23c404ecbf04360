use crate::{
    Binder, Container, InjectResult, InjectionPass, InjectionPoints,
    ServiceInfo, Svc,
};
use std::{any::Any, cell::RefCell};

/// A shared, mutable object in an injected graph.
pub type Obj<T> = Svc<RefCell<T>>;

/// A type-erased pointer to anything the engine can visit.
pub type DynNode = Svc<dyn Node>;

/// Wraps a value so it can take part in an injected graph.
///
/// ```
/// use scoped_injector::{obj, Inject};
///
/// struct Leaf(u32);
/// impl Inject for Leaf {}
///
/// let leaf = obj(Leaf(3));
/// assert_eq!(3, leaf.borrow().0);
/// ```
pub fn obj<T: Inject>(value: T) -> Obj<T> {
    Svc::new(RefCell::new(value))
}

/// Something the engine can visit. Objects implementing [`Inject`] are
/// visited through [`Obj<T>`]. Collections provide their own traversal.
pub trait Node: Any {
    /// The concrete type being visited.
    fn service_info(&self) -> ServiceInfo;

    /// Runs this node's part of the pass against `scope`. The pass has
    /// already recorded the node as visited.
    fn accept(
        &self,
        pass: &mut InjectionPass<'_>,
        scope: &Container,
    ) -> InjectResult<()>;
}

impl<T: Inject> Node for RefCell<T> {
    fn service_info(&self) -> ServiceInfo {
        ServiceInfo::of::<T>()
    }

    fn accept(
        &self,
        pass: &mut InjectionPass<'_>,
        scope: &Container,
    ) -> InjectResult<()> {
        pass.inject_object(self, scope)
    }
}

/// Declares how the engine treats a type. Every method has a default, so an
/// empty `impl Inject for Foo {}` makes `Foo` a plain leaf.
///
/// The capability methods follow a simple pattern: a type that wants to
/// configure a scope or observe the end of its injection returns `Some(self)`.
///
/// ```
/// use scoped_injector::{
///     obj, Binder, Configure, Inject, InjectResult, InjectionPoints,
///     Injector, Obj, Svc,
/// };
///
/// struct Settings(&'static str);
///
/// #[derive(Default)]
/// struct Widget {
///     settings: Option<Svc<Settings>>,
/// }
///
/// impl Inject for Widget {
///     fn declare(points: &mut InjectionPoints<Self>) {
///         points.inject("settings", |widget: &mut Widget, settings| {
///             widget.settings = Some(settings);
///         });
///     }
/// }
///
/// struct Window {
///     widget: Obj<Widget>,
/// }
///
/// impl Inject for Window {
///     fn declare(points: &mut InjectionPoints<Self>) {
///         points.resolve("widget", |window| Some(window.widget.clone()));
///     }
///
///     fn as_context(&self) -> Option<&dyn Configure> {
///         Some(self)
///     }
/// }
///
/// impl Configure for Window {
///     fn configure(&self, binder: &mut Binder<'_>) -> InjectResult<()> {
///         binder.bind(Settings("dark"))?;
///         Ok(())
///     }
/// }
///
/// let window = obj(Window { widget: obj(Widget::default()) });
/// Injector::new().inject(&window).unwrap();
///
/// let window = window.borrow();
/// let widget = window.widget.borrow();
/// assert_eq!("dark", widget.settings.as_ref().unwrap().0);
/// ```
pub trait Inject: Any + Sized {
    /// Declares this type's injectable and resolvable points.
    fn declare(_points: &mut InjectionPoints<Self>) {}

    /// Returns a configuration step if this object introduces its own
    /// scope.
    fn as_context(&self) -> Option<&dyn Configure> {
        None
    }

    /// Returns a hook to run once this object and everything below it has
    /// been injected.
    fn as_post_inject(&mut self) -> Option<&mut dyn PostInject> {
        None
    }
}

/// Contributes bindings to a new scope visible to an object's descendants.
pub trait Configure {
    /// Adds bindings through `binder`.
    fn configure(&self, binder: &mut Binder<'_>) -> InjectResult<()>;
}

/// Runs after an object's whole subtree has been injected.
pub trait PostInject {
    /// Called once per pass that reaches the object.
    fn post_inject(&mut self);
}
