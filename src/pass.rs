use crate::{
    Binder, Container, DynNode, Inject, InjectError, InjectResult, Injector,
    ServiceInfo, Svc,
};
use std::{cell::RefCell, collections::HashMap};

/// The state of one top-level injection. Every object reached during the
/// pass is recorded, and reaching it again is an error, even through a
/// path that is not a cycle.
pub struct InjectionPass<'a> {
    injector: &'a Injector,
    // Reached nodes are held until the pass ends so their addresses stay
    // unique, even for children a getter created on the fly.
    visiting: HashMap<usize, DynNode>,
    path: Vec<ServiceInfo>,
}

impl<'a> InjectionPass<'a> {
    pub(crate) fn new(injector: &'a Injector) -> Self {
        InjectionPass {
            injector,
            visiting: HashMap::new(),
            path: Vec::new(),
        }
    }

    /// The injector running this pass.
    #[must_use]
    pub fn injector(&self) -> &'a Injector {
        self.injector
    }

    /// How many nodes are currently being visited, from the root down.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Number of distinct nodes reached so far.
    #[must_use]
    pub fn visited(&self) -> usize {
        self.visiting.len()
    }

    /// Visits a node against `scope`, failing if the node was already reached
    /// during this pass.
    pub fn visit(
        &mut self,
        node: &DynNode,
        scope: &Container,
    ) -> InjectResult<()> {
        let service_info = node.service_info();
        let identity = Svc::as_ptr(node).cast::<()>() as usize;

        if self.visiting.contains_key(&identity) {
            let mut path = self.path.clone();
            path.push(service_info);
            return Err(InjectError::CircularDependency {
                service_info,
                identity,
                depth: self.path.len(),
                path,
            });
        }

        self.visiting.insert(identity, node.clone());
        self.path.push(service_info);
        tracing::trace!(
            service = service_info.name(),
            depth = self.path.len(),
            scope_depth = scope.depth(),
            "visiting"
        );

        node.accept(self, scope)?;
        self.path.pop();
        Ok(())
    }

    /// Injects a single object:
    ///
    /// 1. If the object configures a scope, a child of `scope` becomes the
    ///    active scope.
    /// 2. Injectable points are filled from the active scope.
    /// 3. The object's configuration step binds into the active scope.
    /// 4. Each child held by a resolvable point is visited.
    /// 5. The post-injection hook runs.
    ///
    /// Since points are filled before configuration, an object never sees
    /// its own bindings.
    pub fn inject_object<T: Inject>(
        &mut self,
        target: &RefCell<T>,
        scope: &Container,
    ) -> InjectResult<()> {
        let service_info = ServiceInfo::of::<T>();
        let metadata = self.injector.metadata().get::<T>()?;

        let configures = target.borrow().as_context().is_some();
        let active = if configures {
            scope.create_child()
        } else {
            scope.clone()
        };

        {
            let mut object = target.borrow_mut();
            for point in metadata.injectables() {
                point.apply(&mut object, &active).map_err(|error| {
                    if error.is_unresolved() {
                        InjectError::UnresolvedInjection {
                            service_info,
                            point: point.label(),
                            source: Box::new(error),
                        }
                    } else {
                        error
                    }
                })?;
            }
        }

        if configures {
            let object = target.borrow();
            if let Some(context) = object.as_context() {
                context.configure(&mut Binder::new(&active))?;
            }
        }

        let children = metadata.children_of(&target.borrow());
        for child in &children {
            self.visit(child, &active)?;
        }

        if let Some(hook) = target.borrow_mut().as_post_inject() {
            hook.post_inject();
        }

        Ok(())
    }
}
