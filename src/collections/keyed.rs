use crate::{
    Container, InjectCollection, InjectError, InjectResult, InjectionPass,
    Node, ServiceInfo, Svc,
};
use std::{
    cell::RefCell,
    collections::HashMap,
    fmt::{Debug, Formatter},
    hash::Hash,
};

/// An [`InjectCollection`] that also indexes its elements by a key derived
/// from each element. Keys must be unique within the collection.
///
/// ```
/// use scoped_injector::{obj, Inject, InjectKeyedCollection, Obj, Svc};
/// use std::cell::RefCell;
///
/// struct Player {
///     id: u32,
/// }
///
/// impl Inject for Player {}
///
/// let players = InjectKeyedCollection::new(|player: &RefCell<Player>| {
///     player.borrow().id
/// });
///
/// let first: Obj<Player> = obj(Player { id: 9999 });
/// players.push(first.clone()).unwrap();
///
/// assert!(Svc::ptr_eq(&first, &players.get(&9999).unwrap()));
/// assert!(players.push(obj(Player { id: 9999 })).is_err());
/// assert_eq!(1, players.len());
/// ```
pub struct InjectKeyedCollection<K, N: Node> {
    items: InjectCollection<N>,
    index: RefCell<HashMap<K, Svc<N>>>,
    key_of: Box<dyn Fn(&N) -> K>,
}

impl<K, N> InjectKeyedCollection<K, N>
where
    K: Eq + Hash + Debug + 'static,
    N: Node,
{
    /// Creates an empty, unbound collection that derives keys with
    /// `key_of`.
    pub fn new<F>(key_of: F) -> Self
    where
        F: Fn(&N) -> K + 'static,
    {
        InjectKeyedCollection {
            items: InjectCollection::new(),
            index: RefCell::default(),
            key_of: Box::new(key_of),
        }
    }

    /// Appends an element. Fails without appending if another element
    /// already has the same key. If the collection is bound, the element is
    /// injected before this returns.
    pub fn push(&self, item: Svc<N>) -> InjectResult<()> {
        let key = (self.key_of)(&*item);
        {
            let mut index = self.index.borrow_mut();
            if index.contains_key(&key) {
                return Err(InjectError::DuplicateKey {
                    service_info: ServiceInfo::of::<Self>(),
                    key: format!("{key:?}"),
                });
            }

            index.insert(key, item.clone());
        }

        self.items.push(item)
    }

    /// Gets the element with the given key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Svc<N>> {
        self.index.borrow().get(key).cloned()
    }

    /// Gets the element at `index` in insertion order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<Svc<N>> {
        self.items.get(index)
    }

    /// Whether an element has the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.borrow().contains_key(key)
    }

    /// Number of elements, injected or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a pass has reached this collection.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.items.is_bound()
    }

    /// Copies out the elements in insertion order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Svc<N>> {
        self.items.to_vec()
    }
}

impl<K, N> Node for InjectKeyedCollection<K, N>
where
    K: Eq + Hash + Debug + 'static,
    N: Node,
{
    fn service_info(&self) -> ServiceInfo {
        ServiceInfo::of::<Self>()
    }

    fn accept(
        &self,
        pass: &mut InjectionPass<'_>,
        scope: &Container,
    ) -> InjectResult<()> {
        self.items.bind(pass, scope)
    }
}

impl<K: Debug, N: Node> Debug for InjectKeyedCollection<K, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectKeyedCollection")
            .field("keys", &self.index.borrow().keys().collect::<Vec<_>>())
            .field("bound", &self.items.is_bound())
            .finish()
    }
}
