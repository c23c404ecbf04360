use crate::{
    BindingKey, Container, DynNode, Inject, InjectError, InjectResult, Node,
    ServiceInfo, Svc,
};
use std::{
    any::Any,
    cell::RefCell,
    collections::{HashMap, HashSet},
    fmt::{Debug, Formatter},
};

type Apply<T> = Box<dyn Fn(&mut T, &Container) -> InjectResult<()>>;
type Getter<T> = Box<dyn Fn(&T) -> Option<DynNode>>;

/// A point on an object that receives a value from the active scope.
pub struct InjectablePoint<T> {
    label: &'static str,
    key: Option<BindingKey>,
    apply: Apply<T>,
}

impl<T> InjectablePoint<T> {
    /// The label the point was declared with, usually the field name.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The key this point requests. Points that receive the scope itself
    /// have no key.
    #[must_use]
    pub fn key(&self) -> Option<&BindingKey> {
        self.key.as_ref()
    }

    /// Resolves this point's value from `scope` and stores it on `target`.
    pub fn apply(&self, target: &mut T, scope: &Container) -> InjectResult<()> {
        (self.apply)(target, scope)
    }
}

impl<T> Debug for InjectablePoint<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectablePoint")
            .field("label", &self.label)
            .field("key", &self.key)
            .finish()
    }
}

/// A point on an object that yields a child object to inject recursively.
pub struct ResolvablePoint<T> {
    label: &'static str,
    get: Getter<T>,
}

impl<T> ResolvablePoint<T> {
    /// The label the point was declared with, usually the field name.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Gets the child held by `target`, if any.
    #[must_use]
    pub fn get(&self, target: &T) -> Option<DynNode> {
        (self.get)(target)
    }
}

impl<T> Debug for ResolvablePoint<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvablePoint")
            .field("label", &self.label)
            .finish()
    }
}

/// Declares the injection points of a type. Handed to [`Inject::declare`].
///
/// ```
/// use scoped_injector::{Inject, InjectionPoints, Obj, Svc};
///
/// struct Engine;
///
/// #[derive(Default)]
/// struct Car {
///     engine: Option<Svc<Engine>>,
///     model: Option<Svc<String>>,
///     trailer: Option<Obj<Car>>,
/// }
///
/// impl Inject for Car {
///     fn declare(points: &mut InjectionPoints<Self>) {
///         points
///             .inject("engine", |car, engine| car.engine = Some(engine))
///             .inject_named("model", "model", |car: &mut Car, model| {
///                 car.model = Some(model);
///             })
///             .resolve("trailer", |car| car.trailer.clone());
///     }
/// }
/// ```
pub struct InjectionPoints<T> {
    injectables: Vec<InjectablePoint<T>>,
    resolvables: Vec<ResolvablePoint<T>>,
    labels: HashSet<&'static str>,
    problems: Vec<String>,
}

impl<T: 'static> InjectionPoints<T> {
    fn new() -> Self {
        InjectionPoints {
            injectables: Vec::new(),
            resolvables: Vec::new(),
            labels: HashSet::new(),
            problems: Vec::new(),
        }
    }

    fn claim(&mut self, label: &'static str) {
        if !self.labels.insert(label) {
            self.problems
                .push(format!("'{label}' is declared more than once"));
        }
    }

    fn add_binding<I, F>(&mut self, label: &'static str, key: BindingKey, set: F)
    where
        I: ?Sized + Any,
        F: Fn(&mut T, Svc<I>) + 'static,
    {
        self.claim(label);
        if key.name() == Some("") {
            self.problems
                .push(format!("'{label}' requests an empty binding name"));
        }

        let request = key.clone();
        self.injectables.push(InjectablePoint {
            label,
            key: Some(key),
            apply: Box::new(move |target: &mut T, scope: &Container| {
                set(target, scope.resolve_typed(&request)?);
                Ok(())
            }),
        });
    }

    /// Declares a point that receives the unnamed value bound for `I`.
    pub fn inject<I, F>(&mut self, label: &'static str, set: F) -> &mut Self
    where
        I: ?Sized + Any,
        F: Fn(&mut T, Svc<I>) + 'static,
    {
        self.add_binding(label, BindingKey::of::<I>(), set);
        self
    }

    /// Declares a point that receives the value bound for `I` under `name`.
    pub fn inject_named<I, F>(
        &mut self,
        label: &'static str,
        name: impl Into<String>,
        set: F,
    ) -> &mut Self
    where
        I: ?Sized + Any,
        F: Fn(&mut T, Svc<I>) + 'static,
    {
        self.add_binding(label, BindingKey::named::<I>(name), set);
        self
    }

    /// Declares a point that receives the unnamed value bound for `I`, or
    /// `None` if nothing in the scope chain binds it.
    pub fn try_inject<I, F>(&mut self, label: &'static str, set: F) -> &mut Self
    where
        I: ?Sized + Any,
        F: Fn(&mut T, Option<Svc<I>>) + 'static,
    {
        self.claim(label);
        self.injectables.push(InjectablePoint {
            label,
            key: Some(BindingKey::of::<I>()),
            apply: Box::new(move |target: &mut T, scope: &Container| {
                set(target, scope.try_resolve()?);
                Ok(())
            }),
        });
        self
    }

    /// Declares a point that receives the active scope itself.
    pub fn inject_scope<F>(&mut self, label: &'static str, set: F) -> &mut Self
    where
        F: Fn(&mut T, Container) + 'static,
    {
        self.claim(label);
        self.injectables.push(InjectablePoint {
            label,
            key: None,
            apply: Box::new(move |target: &mut T, scope: &Container| {
                set(target, scope.clone());
                Ok(())
            }),
        });
        self
    }

    /// Declares a point holding a child object. The child is injected after
    /// this object's own points and configuration.
    pub fn resolve<N, F>(&mut self, label: &'static str, get: F) -> &mut Self
    where
        N: Node,
        F: Fn(&T) -> Option<Svc<N>> + 'static,
    {
        self.claim(label);
        self.resolvables.push(ResolvablePoint {
            label,
            get: Box::new(move |target: &T| {
                get(target).map(|node| node as DynNode)
            }),
        });
        self
    }
}

/// The injection points of a single type, in declaration order.
pub struct TypeMetadata<T> {
    injectables: Vec<InjectablePoint<T>>,
    resolvables: Vec<ResolvablePoint<T>>,
}

impl<T: Inject> TypeMetadata<T> {
    /// Collects the points declared by `T`.
    pub fn describe() -> InjectResult<Self> {
        let mut points = InjectionPoints::new();
        T::declare(&mut points);

        if !points.problems.is_empty() {
            return Err(InjectError::InvalidMetadata {
                service_info: ServiceInfo::of::<T>(),
                reason: points.problems.join("; "),
            });
        }

        Ok(TypeMetadata {
            injectables: points.injectables,
            resolvables: points.resolvables,
        })
    }
}

impl<T> TypeMetadata<T> {
    /// Points that receive values, in declaration order.
    #[must_use]
    pub fn injectables(&self) -> &[InjectablePoint<T>] {
        &self.injectables
    }

    /// Points that hold children, in declaration order.
    #[must_use]
    pub fn resolvables(&self) -> &[ResolvablePoint<T>] {
        &self.resolvables
    }

    /// Whether the type declares any points at all.
    #[must_use]
    pub fn has_any_points(&self) -> bool {
        !self.injectables.is_empty() || !self.resolvables.is_empty()
    }

    /// Collects the non-empty children of `target`.
    #[must_use]
    pub fn children_of(&self, target: &T) -> Vec<DynNode> {
        self.resolvables
            .iter()
            .filter_map(|point| point.get(target))
            .collect()
    }
}

impl<T> Debug for TypeMetadata<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("injectables", &self.injectables)
            .field("resolvables", &self.resolvables)
            .finish()
    }
}

/// Memoizes [`TypeMetadata`] per concrete type. Metadata is computed the
/// first time a type is requested. A declaration that fails to validate is
/// not cached, so it is reported again on every use.
#[derive(Default)]
pub struct TypeMetadataCache {
    entries: RefCell<HashMap<ServiceInfo, Svc<dyn Any>>>,
}

impl TypeMetadataCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the metadata for `T`, computing it if needed.
    pub fn get<T: Inject>(&self) -> InjectResult<Svc<TypeMetadata<T>>> {
        let service_info = ServiceInfo::of::<T>();
        let cached = self.entries.borrow().get(&service_info).cloned();
        if let Some(entry) = cached {
            return entry.downcast().map_err(|_| {
                InjectError::InternalError(format!(
                    "cached metadata for {} has the wrong type",
                    service_info.name()
                ))
            });
        }

        let metadata = Svc::new(TypeMetadata::<T>::describe()?);
        tracing::trace!(
            service = service_info.name(),
            injectables = metadata.injectables().len(),
            resolvables = metadata.resolvables().len(),
            "computed metadata"
        );

        self.entries
            .borrow_mut()
            .insert(service_info, metadata.clone());
        Ok(metadata)
    }

    /// Whether metadata for `T` has already been computed.
    #[must_use]
    pub fn contains<T: Inject>(&self) -> bool {
        self.entries
            .borrow()
            .contains_key(&ServiceInfo::of::<T>())
    }

    /// Number of types with cached metadata.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no metadata has been computed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Debug for TypeMetadataCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.borrow().keys().map(ServiceInfo::name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        BindingKey, Inject, InjectError, InjectionPoints, Obj, ServiceInfo,
        Svc, TypeMetadataCache,
    };
    use std::cell::Cell;

    thread_local! {
        static DECLARED: Cell<usize> = Cell::new(0);
    }

    #[derive(Default)]
    struct Counted {
        value: Option<Svc<i32>>,
        child: Option<Obj<Counted>>,
    }

    impl Inject for Counted {
        fn declare(points: &mut InjectionPoints<Self>) {
            DECLARED.with(|declared| declared.set(declared.get() + 1));
            points
                .inject("value", |this: &mut Counted, value| {
                    this.value = Some(value);
                })
                .resolve("child", |this| this.child.clone());
        }
    }

    #[test]
    fn metadata_is_computed_once() {
        let before = DECLARED.with(Cell::get);
        let cache = TypeMetadataCache::new();
        let first = cache.get::<Counted>().unwrap();
        let second = cache.get::<Counted>().unwrap();

        assert!(Svc::ptr_eq(&first, &second));
        assert_eq!(before + 1, DECLARED.with(Cell::get));
        assert!(cache.contains::<Counted>());
        assert_eq!(1, cache.len());
    }

    #[test]
    fn points_keep_declaration_order() {
        let cache = TypeMetadataCache::new();
        let metadata = cache.get::<Counted>().unwrap();

        assert!(metadata.has_any_points());
        assert_eq!("value", metadata.injectables()[0].label());
        assert_eq!(
            Some(&BindingKey::of::<i32>()),
            metadata.injectables()[0].key()
        );
        assert_eq!("child", metadata.resolvables()[0].label());
    }

    #[test]
    fn types_without_points_have_empty_metadata() {
        struct Plain;
        impl Inject for Plain {}

        let metadata = TypeMetadataCache::new().get::<Plain>().unwrap();
        assert!(!metadata.has_any_points());
    }

    #[test]
    fn invalid_declarations_are_reported_on_every_use() {
        struct Broken;
        impl Inject for Broken {
            fn declare(points: &mut InjectionPoints<Self>) {
                points
                    .inject("twice", |_: &mut Broken, _: Svc<u8>| {})
                    .inject("twice", |_: &mut Broken, _: Svc<u16>| {})
                    .inject_named("nameless", "", |_: &mut Broken, _: Svc<u8>| {
                    });
            }
        }

        let cache = TypeMetadataCache::new();
        for _ in 0..2 {
            match cache.get::<Broken>() {
                Err(InjectError::InvalidMetadata {
                    service_info,
                    reason,
                }) if service_info == ServiceInfo::of::<Broken>() => {
                    assert!(reason.contains("'twice' is declared more"));
                    assert!(reason.contains("'nameless' requests an empty"));
                }
                Err(error) => Err(error).unwrap(),
                Ok(_) => panic!("broken declaration was accepted"),
            }
        }

        assert!(!cache.contains::<Broken>());
    }
}
