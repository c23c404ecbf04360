use crate::{
    Container, DynNode, InjectResult, InjectionPass, Injector, Node,
    ServiceInfo, Svc,
};
use std::{
    cell::RefCell,
    fmt::{Debug, Formatter},
};

#[derive(Clone)]
struct Bound {
    injector: Injector,
    scope: Container,
}

/// An ordered collection that injects its own elements.
///
/// Until the collection is reached by an injection pass, [`push`] only
/// stores the element. When a pass reaches it, every element already present
/// is injected in insertion order, and the scope of that pass is kept. From
/// then on, each pushed element is injected against the kept scope before
/// [`push`] returns.
///
/// [`push`]: InjectCollection::push
///
/// ```
/// use scoped_injector::{
///     obj, Inject, InjectCollection, InjectionPoints, Injector, Obj, Svc,
/// };
///
/// #[derive(Default)]
/// struct Tab {
///     title: Option<Svc<String>>,
/// }
///
/// impl Inject for Tab {
///     fn declare(points: &mut InjectionPoints<Self>) {
///         points.inject("title", |tab: &mut Tab, title| tab.title = Some(title));
///     }
/// }
///
/// let injector = Injector::new();
/// injector.root().bind(String::from("untitled")).unwrap();
///
/// let tabs = Svc::new(InjectCollection::<_>::new());
/// tabs.push(obj(Tab::default())).unwrap();
/// injector.inject(&tabs).unwrap();
///
/// // Injected immediately, since the collection is already bound
/// let late: Obj<Tab> = obj(Tab::default());
/// tabs.push(late.clone()).unwrap();
/// assert_eq!("untitled", late.borrow().title.as_ref().unwrap().as_str());
/// assert_eq!(2, tabs.len());
/// ```
pub struct InjectCollection<N: Node> {
    items: RefCell<Vec<Svc<N>>>,
    bound: RefCell<Option<Bound>>,
}

impl<N: Node> InjectCollection<N> {
    /// Creates an empty, unbound collection.
    #[must_use]
    pub fn new() -> Self {
        InjectCollection {
            items: RefCell::default(),
            bound: RefCell::default(),
        }
    }

    /// Appends an element. If the collection is bound, the element is
    /// injected against the kept scope in a pass of its own.
    pub fn push(&self, item: Svc<N>) -> InjectResult<()> {
        self.items.borrow_mut().push(item.clone());

        let bound = self.bound.borrow().clone();
        if let Some(Bound { injector, scope }) = bound {
            tracing::trace!(
                service = ServiceInfo::of::<N>().name(),
                index = self.len() - 1,
                "injecting appended element"
            );
            injector.inject_with(&item, &scope)?;
        }

        Ok(())
    }

    /// Number of elements, injected or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Whether the collection has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Gets the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Svc<N>> {
        self.items.borrow().get(index).cloned()
    }

    /// Copies out the elements in insertion order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Svc<N>> {
        self.items.borrow().clone()
    }

    /// Whether a pass has reached this collection.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound.borrow().is_some()
    }

    /// The scope new elements are injected against, once bound.
    #[must_use]
    pub fn scope(&self) -> Option<Container> {
        self.bound.borrow().as_ref().map(|bound| bound.scope.clone())
    }

    pub(crate) fn bind(
        &self,
        pass: &mut InjectionPass<'_>,
        scope: &Container,
    ) -> InjectResult<()> {
        tracing::trace!(
            service = ServiceInfo::of::<N>().name(),
            elements = self.len(),
            "binding collection"
        );

        // Elements pushed while earlier ones are injected are still unbound
        // pushes, so they are picked up here as well.
        let mut index = 0;
        while let Some(item) = self.get(index) {
            let item: DynNode = item;
            pass.visit(&item, scope)?;
            index += 1;
        }

        *self.bound.borrow_mut() = Some(Bound {
            injector: pass.injector().clone(),
            scope: scope.clone(),
        });
        Ok(())
    }
}

impl<N: Node> Default for InjectCollection<N> {
    fn default() -> Self {
        InjectCollection::new()
    }
}

impl<N: Node> Node for InjectCollection<N> {
    fn service_info(&self) -> ServiceInfo {
        ServiceInfo::of::<Self>()
    }

    fn accept(
        &self,
        pass: &mut InjectionPass<'_>,
        scope: &Container,
    ) -> InjectResult<()> {
        self.bind(pass, scope)
    }
}

impl<N: Node> Debug for InjectCollection<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectCollection")
            .field("len", &self.len())
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        obj, Inject, InjectCollection, InjectError, InjectionPoints,
        Injector, Obj, PostInject, Svc,
    };
    use std::cell::RefCell;

    #[derive(Default)]
    struct Item {
        value: Option<Svc<u32>>,
    }

    impl Inject for Item {
        fn declare(points: &mut InjectionPoints<Self>) {
            points.inject("value", |item: &mut Item, value| {
                item.value = Some(value);
            });
        }
    }

    #[test]
    fn unbound_push_does_not_inject() {
        let items: InjectCollection<_> = InjectCollection::new();
        let item: Obj<Item> = obj(Item::default());
        items.push(item.clone()).unwrap();

        assert!(!items.is_bound());
        assert!(item.borrow().value.is_none());
    }

    #[test]
    fn bound_push_injects_before_returning() {
        let injector = Injector::new();
        let value = injector.root().bind(7u32).unwrap();

        let items = Svc::new(InjectCollection::new());
        injector.inject(&items).unwrap();
        assert!(items.is_bound());
        assert!(items.scope().unwrap().ptr_eq(injector.root()));

        let item = obj(Item::default());
        items.push(item.clone()).unwrap();

        let injected = item.borrow().value.clone().unwrap();
        assert!(Svc::ptr_eq(&value, &injected));
    }

    #[test]
    fn bound_push_reports_failures() {
        let injector = Injector::new();
        let items = Svc::new(InjectCollection::new());
        injector.inject(&items).unwrap();

        match items.push(obj(Item::default())) {
            Err(InjectError::UnresolvedInjection { point, .. })
                if point == "value" => {}
            Err(error) => Err(error).unwrap(),
            Ok(_) => panic!("nothing binds u32"),
        }

        // The element stays appended
        assert_eq!(1, items.len());
    }

    #[test]
    fn same_element_twice_is_a_revisit() {
        let injector = Injector::new();
        injector.root().bind(1u32).unwrap();

        let item = obj(Item::default());
        let items = Svc::new(InjectCollection::new());
        items.push(item.clone()).unwrap();
        items.push(item).unwrap();

        match injector.inject(&items) {
            Err(InjectError::CircularDependency { depth, .. }) => {
                assert_eq!(1, depth);
            }
            Err(error) => Err(error).unwrap(),
            Ok(_) => panic!("an element was visited twice in one pass"),
        }
    }

    #[test]
    fn pushes_during_binding_are_injected_in_the_same_step() {
        type Spawners = InjectCollection<RefCell<Spawner>>;

        struct Spawner {
            value: Option<Svc<u32>>,
            owner: Option<Svc<Spawners>>,
        }

        impl Inject for Spawner {
            fn declare(points: &mut InjectionPoints<Self>) {
                points.inject("value", |spawner: &mut Spawner, value| {
                    spawner.value = Some(value);
                });
            }

            fn as_post_inject(&mut self) -> Option<&mut dyn PostInject> {
                Some(self)
            }
        }

        impl PostInject for Spawner {
            fn post_inject(&mut self) {
                // Taking the owner also breaks the reference cycle
                if let Some(owner) = self.owner.take() {
                    let spawned = obj(Spawner {
                        value: None,
                        owner: None,
                    });
                    owner.push(spawned).unwrap();
                }
            }
        }

        let injector = Injector::new();
        let value = injector.root().bind(3u32).unwrap();

        let spawners: Svc<Spawners> = Svc::new(InjectCollection::new());
        spawners
            .push(obj(Spawner {
                value: None,
                owner: Some(spawners.clone()),
            }))
            .unwrap();

        injector.inject(&spawners).unwrap();

        assert!(spawners.is_bound());
        assert_eq!(2, spawners.len());
        for spawner in spawners.to_vec() {
            let injected = spawner.borrow().value.clone().unwrap();
            assert!(Svc::ptr_eq(&value, &injected));
        }
    }

    #[test]
    fn later_pass_rebinds_to_its_scope() {
        let injector = Injector::new();
        let first = injector.root().create_child();
        first.bind(1u32).unwrap();
        let second = injector.root().create_child();
        second.bind(2u32).unwrap();

        let items = Svc::new(InjectCollection::new());
        let existing = obj(Item::default());
        items.push(existing.clone()).unwrap();

        injector.inject_with(&items, &first).unwrap();
        assert!(items.scope().unwrap().ptr_eq(&first));

        injector.inject_with(&items, &second).unwrap();
        assert!(items.scope().unwrap().ptr_eq(&second));
        assert_eq!(2, **existing.borrow().value.as_ref().unwrap());

        let late: Obj<Item> = obj(Item::default());
        items.push(late.clone()).unwrap();
        assert_eq!(2, **late.borrow().value.as_ref().unwrap());
    }
}
