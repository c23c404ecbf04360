//! # Scoped field injection.
//!
//! `scoped_injector` fills fields on an existing object graph. Each object
//! declares which of its fields receive values from the active scope
//! (injectable points) and which of its fields hold children to walk into
//! (resolvable points). Any object can also open a new scope and bind values
//! into it. Those bindings are visible to everything below the object, but
//! not to the object itself.
//!
//! ## Scopes
//!
//! A [`Container`] maps a [`BindingKey`] (a type plus an optional name) to a
//! shared instance, and falls back to its parent when a key is missing.
//! Binding the same key twice in one scope is an error, but a child scope
//! may shadow a key bound by one of its ancestors.
//!
//! ## Declaring points
//!
//! There is no reflection. Types implement [`Inject`] and describe their
//! points through [`InjectionPoints`]. The resulting [`TypeMetadata`] is
//! computed once per type and cached in a [`TypeMetadataCache`].
//!
//! ## Passes
//!
//! [`Injector::inject`] starts a pass at a root object. Every object is
//! visited at most once per pass. Reaching an object a second time fails
//! with [`InjectError::CircularDependency`], even when the second path is
//! not an actual cycle.
//!
//! ## Collections
//!
//! [`InjectCollection`] and [`InjectKeyedCollection`] can be held by a
//! resolvable point. Once a pass reaches them, they keep the scope they were
//! reached with and inject every element appended afterwards.
//!
//! ## Example
//!
//! ```
//! use scoped_injector::{
//!     obj, Binder, Configure, Inject, InjectCollection, InjectResult,
//!     InjectionPoints, Injector, Obj, Svc,
//! };
//! use std::cell::RefCell;
//!
//! trait Theme {
//!     fn accent(&self) -> u32;
//! }
//!
//! struct Dark;
//! impl Theme for Dark {
//!     fn accent(&self) -> u32 {
//!         8
//!     }
//! }
//!
//! // Application-wide bindings
//! struct AppContext;
//! impl Configure for AppContext {
//!     fn configure(&self, binder: &mut Binder<'_>) -> InjectResult<()> {
//!         binder.bind_svc::<dyn Theme>(Svc::new(Dark))
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Button {
//!     theme: Option<Svc<dyn Theme>>,
//!     label: Option<Svc<String>>,
//! }
//!
//! impl Inject for Button {
//!     fn declare(points: &mut InjectionPoints<Self>) {
//!         points
//!             .inject::<dyn Theme, _>("theme", |button: &mut Button, theme| {
//!                 button.theme = Some(theme);
//!             })
//!             .inject("label", |button: &mut Button, label| {
//!                 button.label = Some(label);
//!             });
//!     }
//! }
//!
//! // A panel opens its own scope for the buttons it holds
//! struct Panel {
//!     title: Svc<String>,
//!     buttons: Svc<InjectCollection<RefCell<Button>>>,
//! }
//!
//! impl Inject for Panel {
//!     fn declare(points: &mut InjectionPoints<Self>) {
//!         points.resolve("buttons", |panel| Some(panel.buttons.clone()));
//!     }
//!
//!     fn as_context(&self) -> Option<&dyn Configure> {
//!         Some(self)
//!     }
//! }
//!
//! impl Configure for Panel {
//!     fn configure(&self, binder: &mut Binder<'_>) -> InjectResult<()> {
//!         binder.bind_svc(self.title.clone())
//!     }
//! }
//!
//! fn main() -> InjectResult<()> {
//!     let mut builder = Injector::builder();
//!     builder.add_context(&AppContext)?;
//!     let injector = builder.build();
//!
//!     let panel: Obj<Panel> = obj(Panel {
//!         title: Svc::new(String::from("Settings")),
//!         buttons: Svc::new(InjectCollection::new()),
//!     });
//!
//!     let early = obj(Button::default());
//!     panel.borrow().buttons.push(early.clone())?;
//!     injector.inject(&panel)?;
//!
//!     // Appended after the pass, injected on the spot
//!     let late = obj(Button::default());
//!     panel.borrow().buttons.push(late.clone())?;
//!
//!     let title = panel.borrow().title.clone();
//!     for button in [early, late] {
//!         let button = button.borrow();
//!         assert!(Svc::ptr_eq(&title, button.label.as_ref().unwrap()));
//!         assert_eq!(8, button.theme.as_ref().unwrap().accent());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::needless_pass_by_value
)]

mod builder;
mod collections;
mod container;
mod global;
mod injector;
mod metadata;
mod node;
mod pass;
mod services;

pub use builder::*;
pub use collections::*;
pub use container::*;
pub use global::*;
pub use injector::*;
pub use metadata::*;
pub use node::*;
pub use pass::*;
pub use services::*;
