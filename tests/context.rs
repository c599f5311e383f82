//! Context providers and consumers scoped by tree.
//!
//! Run with: cargo test --test context

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{Slot, fill, grab, mount};
use spark_dom::{
    ContextHandle, Engine, MemoryHost, Node, Provider, Result, Scope, State, Updater,
    component_with, fragment, nodes, tag,
};

// =============================================================================
// Providers
// =============================================================================

struct Theme {
    name: RefCell<String>,
    destroyed: Rc<Cell<bool>>,
}

impl Provider for Theme {
    fn destroy(&self) {
        self.destroyed.set(true);
    }
}

struct Locale(&'static str);

impl Provider for Locale {}

// =============================================================================
// Tree
// =============================================================================

#[derive(Clone, Default)]
struct Spy {
    show_provider: Slot<State<bool>>,
    show_label: Slot<State<bool>>,
    theme: Slot<ContextHandle<Theme>>,
    label: Slot<Updater>,
    label_renders: Rc<Cell<usize>>,
    destroyed: Rc<Cell<bool>>,
}

fn theme_provider(scope: &mut Scope<'_>, spy: &Spy) -> Result<Node> {
    let destroyed = Rc::clone(&spy.destroyed);
    let theme = scope.provide(|| Theme {
        name: RefCell::new("light".to_string()),
        destroyed,
    })?;
    fill(&spy.theme, &theme);
    Ok(tag("header", ()))
}

fn theme_label(scope: &mut Scope<'_>, spy: &Spy) -> Result<Node> {
    spy.label_renders.set(spy.label_renders.get() + 1);
    fill(&spy.label, &scope.updater());
    let theme = scope.consume::<Theme>()?;
    let name = theme.name.borrow().clone();
    Ok(tag("span", nodes![name]))
}

fn app(scope: &mut Scope<'_>, spy: &Spy) -> Result<Node> {
    let show_provider = scope.state(true)?;
    let show_label = scope.state(true)?;
    fill(&spy.show_provider, &show_provider);
    fill(&spy.show_label, &show_label);

    let provider = show_provider
        .get()
        .then(|| component_with(theme_provider, spy.clone()));
    let label = show_label
        .get()
        .then(|| component_with(theme_label, spy.clone()));
    Ok(fragment(nodes![provider, label]))
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_update_rerenders_consumers_only() {
    let spy = Spy::default();
    let mut app_root = mount(nodes![component_with(app, spy.clone())]);
    assert_eq!(app_root.markup(), "<header></header><span>light</span>");

    let theme = grab(&spy.theme);
    assert_eq!(theme.consumer_count(), 1);
    assert_eq!(theme.tree_id(), app_root.handle.tree_id());

    *theme.name.borrow_mut() = "dark".to_string();
    assert_eq!(theme.update(), 1);
    assert_eq!(app_root.flush(), 1);

    assert_eq!(app_root.markup(), "<header></header><span>dark</span>");
    assert_eq!(spy.label_renders.get(), 2);
    assert!(grab(&spy.theme).ptr_eq(&theme));
}

#[test]
fn test_removed_consumer_gets_no_updates() {
    let spy = Spy::default();
    let mut app_root = mount(nodes![component_with(app, spy.clone())]);
    let theme = grab(&spy.theme);

    grab(&spy.show_label).set(false);
    app_root.flush();
    assert_eq!(app_root.markup(), "<header></header>");

    assert_eq!(theme.consumer_count(), 0);
    assert_eq!(theme.update(), 0);
    assert_eq!(app_root.engine.pending_updates(), 0);
    assert_eq!(spy.label_renders.get(), 1);
}

#[test]
fn test_removed_provider_fails_later_lookups() {
    let spy = Spy::default();
    let mut app_root = mount(nodes![component_with(app, spy.clone())]);
    let tree = app_root.handle.tree_id();
    let theme = grab(&spy.theme);
    assert!(app_root.engine.runtime().contexts().is_provided::<Theme>(tree));

    grab(&spy.show_provider).set(false);
    app_root.flush();

    assert!(spy.destroyed.get());
    assert!(!app_root.engine.runtime().contexts().is_provided::<Theme>(tree));
    assert!(matches!(theme.link::<Theme>(), Err(err) if err.is_context()));

    // The label regenerated with its parent, failed to consume and kept
    // its last render.
    assert_eq!(app_root.markup(), "<span>light</span>");
    grab(&spy.label).trigger();
    app_root.flush();
    assert_eq!(app_root.markup(), "<span>light</span>");
    assert_eq!(spy.label_renders.get(), 3);
}

#[test]
fn test_consume_without_provider_renders_nothing() {
    let spy = Spy::default();
    let app_root = mount(nodes![
        tag("nav", ()),
        component_with(theme_label, spy.clone()),
    ]);
    assert_eq!(app_root.markup(), "<nav></nav>");
    assert_eq!(spy.label_renders.get(), 1);
}

#[test]
fn test_providers_are_scoped_per_tree() {
    let spy = Spy::default();
    let mut host = MemoryHost::new();
    let (left, right) = (host.create_container(), host.create_container());
    let mut engine = Engine::new(host);
    let provided = engine
        .render_nodes(left, nodes![component_with(theme_provider, spy.clone())])
        .unwrap();
    let consumed = engine
        .render_nodes(right, nodes![component_with(theme_label, spy.clone())])
        .unwrap();
    engine.run_microtasks();

    assert_ne!(provided.tree_id(), consumed.tree_id());
    assert_eq!(engine.host().to_markup(left), "<header></header>");
    assert_eq!(engine.host().to_markup(right), "");
    assert!(!engine.runtime().contexts().is_provided::<Theme>(consumed.tree_id()));
}

// =============================================================================
// Linking
// =============================================================================

#[derive(Clone, Default)]
struct Linked {
    theme: Slot<ContextHandle<Theme>>,
    locale: Slot<&'static str>,
    looked_up: Slot<ContextHandle<Theme>>,
}

fn linker(scope: &mut Scope<'_>, spy: &Linked) -> Result<Node> {
    scope.provide(|| Locale("en"))?;
    let theme = scope.provide(|| Theme {
        name: RefCell::new("light".to_string()),
        destroyed: Rc::new(Cell::new(false)),
    })?;
    let locale = theme.link::<Locale>()?;
    fill(&spy.locale, &locale.0);
    fill(&spy.theme, &theme);
    fill(&spy.looked_up, &scope.link::<Theme>()?);
    Ok(tag("main", ()))
}

#[test]
fn test_link_reaches_sibling_providers_without_subscribing() {
    let spy = Linked::default();
    let app_root = mount(nodes![component_with(linker, spy.clone())]);

    assert_eq!(grab(&spy.locale), "en");
    let theme = grab(&spy.theme);
    assert!(grab(&spy.looked_up).ptr_eq(&theme));
    assert_eq!(theme.consumer_count(), 0);
    assert_eq!(app_root.engine.runtime().contexts().provider_count(), 2);
}
