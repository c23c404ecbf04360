use crate::BindingKey;
use derive_more::{Display, Error};
use downcast_rs::impl_downcast;
use std::any::{Any, TypeId};

/// A reference-counted pointer holding a shared instance. Every consumer of
/// a binding receives a clone of the same pointer.
pub type Svc<T> = std::rc::Rc<T>;

/// A service pointer holding an instance of `dyn Service`.
pub type DynSvc = Svc<dyn Service>;

/// Implemented automatically on types that can be stored in a container.
pub trait Service: downcast_rs::Downcast {}
impl<T: ?Sized + downcast_rs::Downcast> Service for T {}

impl_downcast!(Service);

/// A result from attempting to inject an object graph.
pub type InjectResult<T> = Result<T, InjectError>;

/// Type information about a bound value or an injected object.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct ServiceInfo {
    id: TypeId,
    name: &'static str,
}

impl ServiceInfo {
    /// Creates a [`ServiceInfo`] for the given type.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + Any>() -> Self {
        ServiceInfo {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Gets the [`TypeId`] for this type.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Gets the type name of this type.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// An error that has occurred during an injection pass. Every variant aborts
/// the pass it was raised in.
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum InjectError {
    /// An object was reached a second time during a single pass.
    #[display(
        fmt = "circular injection of {} at {:#x} (depth {}) [{}]",
        "service_info.name()",
        identity,
        depth,
        "fmt_path(path)"
    )]
    CircularDependency {
        /// The type of the object that was revisited.
        service_info: ServiceInfo,
        /// The address of the revisited object.
        identity: usize,
        /// How deep in the graph the object was reached again.
        depth: usize,
        /// The types visited from the root down to the revisited object.
        path: Vec<ServiceInfo>,
    },

    /// No scope in the chain holds a value for the key.
    #[display(fmt = "{} has no binding", key)]
    UnresolvedBinding {
        /// The key that was requested.
        key: BindingKey,
    },

    /// An injectable point could not be filled.
    #[display(
        fmt = "failed to inject {}::{}: {}",
        "service_info.name()",
        point,
        source
    )]
    UnresolvedInjection {
        /// The type of the object being injected.
        service_info: ServiceInfo,
        /// The label of the injectable point.
        point: &'static str,
        /// The resolution failure.
        source: Box<InjectError>,
    },

    /// A configuration step bound a key twice in its own scope.
    #[display(fmt = "{} is already bound in this scope", key)]
    DuplicateBinding {
        /// The key that was bound twice.
        key: BindingKey,
    },

    /// Two elements of a keyed collection produced the same key.
    #[display(fmt = "{} already holds an element keyed {}", "service_info.name()", key)]
    DuplicateKey {
        /// The keyed collection type.
        service_info: ServiceInfo,
        /// The colliding key, formatted with [`Debug`](std::fmt::Debug).
        key: String,
    },

    /// The declared injection points of a type are malformed.
    #[display(
        fmt = "invalid injection points on {}: {}",
        "service_info.name()",
        reason
    )]
    InvalidMetadata {
        /// The type whose declaration is invalid.
        service_info: ServiceInfo,
        /// What is wrong with the declaration.
        reason: String,
    },

    /// An unexpected error has occurred. This is usually caused by a bug in
    /// the library itself.
    #[display(fmt = "an unexpected error occurred (please report this): {}", _0)]
    InternalError(#[error(ignore)] String),
}

impl InjectError {
    /// Whether this is an [`InjectError::UnresolvedBinding`].
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self, InjectError::UnresolvedBinding { .. })
    }
}

fn fmt_path(path: &[ServiceInfo]) -> String {
    let mut joined = String::new();
    for item in path {
        if !joined.is_empty() {
            joined.push_str(" -> ");
        }
        joined.push_str(item.name());
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_injection_exposes_source() {
        use std::error::Error;

        let error = InjectError::UnresolvedInjection {
            service_info: ServiceInfo::of::<u8>(),
            point: "value",
            source: Box::new(InjectError::UnresolvedBinding {
                key: BindingKey::of::<String>(),
            }),
        };

        let source = error.source().map(ToString::to_string);
        assert_eq!(
            Some("alloc::string::String has no binding".to_owned()),
            source
        );
        assert!(error.to_string().starts_with("failed to inject u8::value"));
    }

    #[test]
    fn cycle_message_lists_path() {
        let error = InjectError::CircularDependency {
            service_info: ServiceInfo::of::<u8>(),
            identity: 0x10,
            depth: 2,
            path: vec![ServiceInfo::of::<u16>(), ServiceInfo::of::<u8>()],
        };

        assert_eq!(
            "circular injection of u8 at 0x10 (depth 2) [u16 -> u8]",
            error.to_string()
        );
    }
}
