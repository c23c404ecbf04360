use crate::{
    Binder, Configure, Container, InjectResult, Injector, Svc,
    TypeMetadataCache,
};

/// A builder for an [`Injector`].
#[derive(Default)]
pub struct InjectorBuilder {
    root: Option<Container>,
    metadata: Option<Svc<TypeMetadataCache>>,
}

impl InjectorBuilder {
    /// Uses an existing scope as the injector's root.
    pub fn set_root(&mut self, root: Container) {
        self.root = Some(root);
    }

    /// Shares a metadata cache with other injectors.
    pub fn set_metadata(&mut self, metadata: Svc<TypeMetadataCache>) {
        self.metadata = Some(metadata);
    }

    /// Borrows the root scope, creating it if needed.
    pub fn root(&mut self) -> &Container {
        self.root.get_or_insert_with(Container::new)
    }

    /// Runs a configuration step directly against the root scope. This is
    /// how application-wide singletons are registered.
    pub fn add_context<C>(&mut self, context: &C) -> InjectResult<()>
    where
        C: ?Sized + Configure,
    {
        context.configure(&mut Binder::new(self.root()))
    }

    /// Builds the injector.
    #[must_use]
    pub fn build(self) -> Injector {
        Injector::new_from_parts(
            self.root.unwrap_or_default(),
            self.metadata.unwrap_or_default(),
        )
    }
}
