use crate::{
    Container, DynNode, InjectResult, InjectionPass, InjectorBuilder, Node,
    Svc, TypeMetadataCache,
};

/// Runs injection passes over object graphs. An injector pairs a root scope
/// with the metadata cache used to look up each type's points.
///
/// Cloning the injector does not clone its root scope or its cache. Both
/// injectors share them, which is how self-injecting collections keep
/// injecting elements after the pass that bound them has returned.
///
/// ```
/// use scoped_injector::{obj, Inject, InjectionPoints, Injector, Svc};
///
/// struct Clock(u64);
///
/// #[derive(Default)]
/// struct Scheduler {
///     clock: Option<Svc<Clock>>,
/// }
///
/// impl Inject for Scheduler {
///     fn declare(points: &mut InjectionPoints<Self>) {
///         points.inject("clock", |this: &mut Scheduler, clock| {
///             this.clock = Some(clock);
///         });
///     }
/// }
///
/// let mut builder = Injector::builder();
/// let clock = builder.root().bind(Clock(42)).unwrap();
/// let injector = builder.build();
///
/// let scheduler = obj(Scheduler::default());
/// injector.inject(&scheduler).unwrap();
///
/// let injected = scheduler.borrow().clock.clone().unwrap();
/// assert!(Svc::ptr_eq(&clock, &injected));
/// ```
#[derive(Clone)]
pub struct Injector {
    root: Container,
    metadata: Svc<TypeMetadataCache>,
}

impl Injector {
    /// Creates an injector with an empty root scope and its own cache.
    #[must_use]
    pub fn new() -> Self {
        Injector::builder().build()
    }

    /// Creates a builder for an injector.
    #[must_use]
    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::default()
    }

    pub(crate) fn new_from_parts(
        root: Container,
        metadata: Svc<TypeMetadataCache>,
    ) -> Self {
        Injector { root, metadata }
    }

    /// The scope used by [`Injector::inject`].
    #[must_use]
    pub fn root(&self) -> &Container {
        &self.root
    }

    /// The metadata cache shared by every clone of this injector.
    #[must_use]
    pub fn metadata(&self) -> &Svc<TypeMetadataCache> {
        &self.metadata
    }

    /// Injects `node` and everything reachable from it against the root
    /// scope.
    pub fn inject<N: Node>(&self, node: &Svc<N>) -> InjectResult<()> {
        self.inject_with(node, &self.root)
    }

    /// Injects `node` and everything reachable from it against `scope`.
    pub fn inject_with<N: Node>(
        &self,
        node: &Svc<N>,
        scope: &Container,
    ) -> InjectResult<()> {
        let node: DynNode = node.clone();
        self.inject_dyn(&node, scope)
    }

    /// Injects a type-erased node against `scope`. On failure, objects that
    /// were already injected keep their values and the graph should be
    /// discarded.
    pub fn inject_dyn(
        &self,
        node: &DynNode,
        scope: &Container,
    ) -> InjectResult<()> {
        tracing::debug!(
            service = node.service_info().name(),
            scope_depth = scope.depth(),
            "starting injection pass"
        );

        let mut pass = InjectionPass::new(self);
        pass.visit(node, scope)?;

        tracing::debug!(visited = pass.visited(), "injection pass finished");
        Ok(())
    }
}

impl Default for Injector {
    fn default() -> Self {
        Injector::new()
    }
}
