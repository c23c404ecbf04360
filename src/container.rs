use crate::{DynSvc, InjectError, InjectResult, ServiceInfo, Svc};
use std::{
    any::Any,
    cell::RefCell,
    collections::HashMap,
    fmt::{Debug, Display, Formatter},
};

/// Identifies a value within a scope: the type it was bound as, plus an
/// optional name to tell apart several values of the same type.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct BindingKey {
    service_info: ServiceInfo,
    name: Option<String>,
}

impl BindingKey {
    /// Creates an unnamed key for the given type.
    #[must_use]
    pub fn of<T: ?Sized + Any>() -> Self {
        BindingKey {
            service_info: ServiceInfo::of::<T>(),
            name: None,
        }
    }

    /// Creates a named key for the given type.
    #[must_use]
    pub fn named<T: ?Sized + Any>(name: impl Into<String>) -> Self {
        BindingKey {
            service_info: ServiceInfo::of::<T>(),
            name: Some(name.into()),
        }
    }

    /// Gets the type this key refers to.
    #[must_use]
    pub fn service_info(&self) -> ServiceInfo {
        self.service_info
    }

    /// Gets the name of this key, if it has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Display for BindingKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => {
                write!(f, "{} (named {:?})", self.service_info.name(), name)
            }
            None => write!(f, "{}", self.service_info.name()),
        }
    }
}

struct Scope {
    bindings: RefCell<HashMap<BindingKey, DynSvc>>,
    parent: Option<Container>,
    depth: usize,
}

/// A single level of bindings. Resolution looks at this level first, then
/// falls back to the parent chain. Bindings can be added but never removed or
/// replaced.
///
/// Cloning a container does not copy its bindings. Both handles refer to the
/// same scope.
///
/// ```
/// use scoped_injector::{Container, Svc};
///
/// let root = Container::new();
/// root.bind(8i32).unwrap();
///
/// let child = root.create_child();
/// child.bind_named("greeting", String::from("hi")).unwrap();
///
/// assert_eq!(8, *child.resolve::<i32>().unwrap());
/// assert_eq!("hi", *child.resolve_named::<String>("greeting").unwrap());
/// assert!(root.resolve_named::<String>("greeting").is_err());
/// ```
#[derive(Clone)]
pub struct Container {
    scope: Svc<Scope>,
}

impl Container {
    /// Creates a new root scope.
    #[must_use]
    pub fn new() -> Self {
        Container {
            scope: Svc::new(Scope {
                bindings: RefCell::default(),
                parent: None,
                depth: 0,
            }),
        }
    }

    /// Creates a new scope whose parent is this scope.
    #[must_use]
    pub fn create_child(&self) -> Self {
        let depth = self.scope.depth + 1;
        tracing::trace!(depth, "creating child scope");

        Container {
            scope: Svc::new(Scope {
                bindings: RefCell::default(),
                parent: Some(self.clone()),
                depth,
            }),
        }
    }

    /// Gets the parent of this scope, if this is not a root scope.
    #[must_use]
    pub fn parent(&self) -> Option<&Container> {
        self.scope.parent.as_ref()
    }

    /// Number of ancestors above this scope.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scope.depth
    }

    /// Number of bindings held directly by this scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scope.bindings.borrow().len()
    }

    /// Whether this scope holds no bindings of its own.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scope.bindings.borrow().is_empty()
    }

    /// Whether this scope itself holds the key. Parents are not consulted.
    #[must_use]
    pub fn contains_key(&self, key: &BindingKey) -> bool {
        self.scope.bindings.borrow().contains_key(key)
    }

    /// Whether both handles refer to the same scope.
    #[must_use]
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Svc::ptr_eq(&self.scope, &other.scope)
    }

    /// Binds an instance under its own type and returns the shared pointer
    /// every consumer will receive.
    pub fn bind<T: Any>(&self, instance: T) -> InjectResult<Svc<T>> {
        let instance = Svc::new(instance);
        self.bind_svc(instance.clone())?;
        Ok(instance)
    }

    /// Binds an instance under its own type and a name.
    pub fn bind_named<T: Any>(
        &self,
        name: impl Into<String>,
        instance: T,
    ) -> InjectResult<Svc<T>> {
        let instance = Svc::new(instance);
        self.bind_svc_named(name, instance.clone())?;
        Ok(instance)
    }

    /// Binds an existing pointer. This is how trait objects are bound:
    ///
    /// ```
    /// use scoped_injector::{Container, Svc};
    ///
    /// trait Speed {
    ///     fn value(&self) -> i32;
    /// }
    ///
    /// struct Fast;
    /// impl Speed for Fast {
    ///     fn value(&self) -> i32 {
    ///         8
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// container.bind_svc::<dyn Speed>(Svc::new(Fast)).unwrap();
    ///
    /// assert_eq!(8, container.resolve::<dyn Speed>().unwrap().value());
    /// ```
    pub fn bind_svc<I: ?Sized + Any>(&self, instance: Svc<I>) -> InjectResult<()> {
        self.bind_key(BindingKey::of::<I>(), Svc::new(instance))
    }

    /// Binds an existing pointer under a name.
    pub fn bind_svc_named<I: ?Sized + Any>(
        &self,
        name: impl Into<String>,
        instance: Svc<I>,
    ) -> InjectResult<()> {
        self.bind_key(BindingKey::named::<I>(name), Svc::new(instance))
    }

    // The value must be a `Svc<I>` where `I` is the key's type.
    fn bind_key(&self, key: BindingKey, value: DynSvc) -> InjectResult<()> {
        let mut bindings = self.scope.bindings.borrow_mut();
        if bindings.contains_key(&key) {
            return Err(InjectError::DuplicateBinding { key });
        }

        tracing::debug!(%key, depth = self.scope.depth, "binding");
        bindings.insert(key, value);
        Ok(())
    }

    /// Finds the value bound for a key, walking up through parent scopes.
    pub fn resolve_key(&self, key: &BindingKey) -> InjectResult<DynSvc> {
        let mut current = Some(self);
        while let Some(container) = current {
            if let Some(value) = container.scope.bindings.borrow().get(key) {
                return Ok(value.clone());
            }

            current = container.parent();
        }

        Err(InjectError::UnresolvedBinding { key: key.clone() })
    }

    /// Resolves the unnamed value bound for a type.
    pub fn resolve<I: ?Sized + Any>(&self) -> InjectResult<Svc<I>> {
        self.resolve_typed(&BindingKey::of::<I>())
    }

    /// Resolves the value bound for a type under a name.
    pub fn resolve_named<I: ?Sized + Any>(
        &self,
        name: &str,
    ) -> InjectResult<Svc<I>> {
        self.resolve_typed(&BindingKey::named::<I>(name))
    }

    /// Resolves the unnamed value bound for a type, returning `None` if it
    /// is not bound anywhere in the chain.
    pub fn try_resolve<I: ?Sized + Any>(&self) -> InjectResult<Option<Svc<I>>> {
        match self.resolve() {
            Ok(value) => Ok(Some(value)),
            Err(InjectError::UnresolvedBinding { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    pub(crate) fn resolve_typed<I: ?Sized + Any>(
        &self,
        key: &BindingKey,
    ) -> InjectResult<Svc<I>> {
        let value = self.resolve_key(key)?;
        value.downcast_ref::<Svc<I>>().cloned().ok_or_else(|| {
            InjectError::InternalError(format!(
                "the value bound for {key} is not a {}",
                std::any::type_name::<Svc<I>>()
            ))
        })
    }
}

impl Default for Container {
    fn default() -> Self {
        Container::new()
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let bindings = self.scope.bindings.borrow();
        f.debug_struct("Container")
            .field("depth", &self.scope.depth)
            .field(
                "bindings",
                &bindings.keys().map(ToString::to_string).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// The view of a freshly created scope handed to a configuration step.
/// Anything bound here is visible to the configuring object's descendants,
/// but not to the object itself.
pub struct Binder<'a> {
    container: &'a Container,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Binder { container }
    }

    /// Binds an instance under its own type.
    pub fn bind<T: Any>(&mut self, instance: T) -> InjectResult<Svc<T>> {
        self.container.bind(instance)
    }

    /// Binds an instance under its own type and a name.
    pub fn bind_named<T: Any>(
        &mut self,
        name: impl Into<String>,
        instance: T,
    ) -> InjectResult<Svc<T>> {
        self.container.bind_named(name, instance)
    }

    /// Binds an existing pointer, usually a trait object.
    pub fn bind_svc<I: ?Sized + Any>(
        &mut self,
        instance: Svc<I>,
    ) -> InjectResult<()> {
        self.container.bind_svc(instance)
    }

    /// Binds an existing pointer under a name.
    pub fn bind_svc_named<I: ?Sized + Any>(
        &mut self,
        name: impl Into<String>,
        instance: Svc<I>,
    ) -> InjectResult<()> {
        self.container.bind_svc_named(name, instance)
    }

    /// The scope being configured.
    #[must_use]
    pub fn scope(&self) -> &Container {
        self.container
    }
}

#[cfg(test)]
mod tests {
    use crate::{BindingKey, Container, InjectError, Svc};

    #[test]
    fn child_shadows_parent() {
        let root = Container::new();
        root.bind(1i32).unwrap();

        let child = root.create_child();
        child.bind(2i32).unwrap();

        assert_eq!(1, *root.resolve::<i32>().unwrap());
        assert_eq!(2, *child.resolve::<i32>().unwrap());
        assert_eq!(1, child.depth());
    }

    #[test]
    fn duplicate_in_same_scope_is_rejected() {
        let root = Container::new();
        root.bind(1i32).unwrap();

        match root.bind(2i32) {
            Err(InjectError::DuplicateBinding { key })
                if key == BindingKey::of::<i32>() => {}
            Err(error) => Err(error).unwrap(),
            Ok(_) => panic!("rebinding a key should fail"),
        }

        // The first binding is untouched
        assert_eq!(1, *root.resolve::<i32>().unwrap());
    }

    #[test]
    fn names_are_part_of_the_key() {
        let root = Container::new();
        root.bind(1i32).unwrap();
        root.bind_named("other", 2i32).unwrap();

        assert_eq!(1, *root.resolve::<i32>().unwrap());
        assert_eq!(2, *root.resolve_named::<i32>("other").unwrap());
        assert_eq!(2, root.len());
    }

    #[test]
    fn resolution_returns_the_same_instance() {
        let root = Container::new();
        let bound = root.bind(String::from("shared")).unwrap();
        let child = root.create_child().create_child();

        let resolved = child.resolve::<String>().unwrap();
        assert!(Svc::ptr_eq(&bound, &resolved));
    }

    #[test]
    fn missing_key_names_the_key() {
        let root = Container::new();
        let child = root.create_child();

        match child.resolve_named::<u64>("missing") {
            Err(InjectError::UnresolvedBinding { key })
                if key == BindingKey::named::<u64>("missing") => {}
            Err(error) => Err(error).unwrap(),
            Ok(_) => panic!("nothing was bound"),
        }

        assert_eq!(None, child.try_resolve::<u64>().unwrap());
    }
}
