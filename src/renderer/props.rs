//! Prop sync - Write a tag's desired props onto its host element.
//!
//! Each `TagNode` remembers the props last written to its element
//! (`applied`). Syncing compares desired against applied and emits only the
//! difference, so re-rendering an unchanged tag touches nothing.
//!
//! Listeners are registered once per event through a trampoline that forwards
//! to the closure currently stored on the tag. A new closure for the same
//! event swaps the stored closure without a host call.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::Node;
use crate::engine::TagNode;
use crate::engine::node::ListenerBinding;
use crate::error::{EngineError, Result};
use crate::primitives::{PropValue, Props, Style};
use crate::types::{Event, HostNodeId, Listener};

use super::HostRenderer;

/// Keys written as live properties rather than attributes.
const PROPERTY_KEYS: [&str; 2] = ["className", "value"];

fn is_listener_key(key: &str) -> bool {
    key.len() > 2 && key.starts_with("on")
}

fn event_name(key: &str) -> String {
    key[2..].to_ascii_lowercase()
}

// =============================================================================
// Validation
// =============================================================================

/// Check reserved keys carry the right value kind.
pub(crate) fn validate(props: &Props) -> Result<()> {
    for (key, value) in props {
        let ok = match (key.as_str(), value) {
            ("ref", v) => matches!(v, PropValue::Ref(_)),
            ("style", v) => matches!(v, PropValue::Style(_)),
            (k, v) if is_listener_key(k) => matches!(v, PropValue::Listener(_)),
            (_, PropValue::Listener(_) | PropValue::Ref(_) | PropValue::Style(_)) => false,
            _ => true,
        };
        if !ok {
            let message = if is_listener_key(key) {
                format!("malformed event listener `{key}`: got a {} value", value.kind())
            } else {
                format!("prop `{key}` cannot hold a {} value", value.kind())
            };
            return Err(EngineError::structural(message));
        }
    }
    Ok(())
}

/// Validate every tag reachable without crossing a component boundary.
pub(crate) fn validate_tree(node: &Node) -> Result<()> {
    if let Node::Tag(tag) = node {
        validate(&tag.props)?;
    }
    if let Some(children) = node.children() {
        for child in children.iter().flatten() {
            validate_tree(child)?;
        }
    }
    Ok(())
}

// =============================================================================
// Sync
// =============================================================================

/// Bring the tag's element in line with its desired props.
pub(crate) fn sync_props(host: &mut dyn HostRenderer, tag: &mut TagNode) -> Result<()> {
    let Some(element) = tag.host else {
        return Ok(());
    };
    validate(&tag.props)?;

    let stale: Vec<String> = tag
        .applied
        .keys()
        .filter(|k| !tag.props.contains_key(k))
        .cloned()
        .collect();
    for key in stale {
        if let Some(old) = tag.applied.remove(&key) {
            remove_prop(host, element, tag, &key, &old);
        }
    }

    let desired = tag.props.clone();
    for (key, value) in &desired {
        let old = tag.applied.get(key).cloned();
        if let PropValue::Listener(listener) = value {
            bind_listener(host, element, tag, key, listener);
            continue;
        }
        if old.as_ref() == Some(value) {
            continue;
        }
        match (old, value) {
            (Some(PropValue::Style(before)), PropValue::Style(after)) => {
                diff_style(host, element, &before, after);
            }
            (Some(old), _) if std::mem::discriminant(&old) != std::mem::discriminant(value) => {
                remove_prop(host, element, tag, key, &old);
                set_prop(host, element, key, value);
            }
            _ => set_prop(host, element, key, value),
        }
    }

    tag.applied = desired;
    Ok(())
}

fn set_prop(host: &mut dyn HostRenderer, element: HostNodeId, key: &str, value: &PropValue) {
    match value {
        PropValue::Attr(v) if PROPERTY_KEYS.contains(&key) => host.set_property(element, key, v),
        PropValue::Attr(v) => host.set_attribute(element, key, v),
        PropValue::Flag(true) => host.set_attribute(element, key, ""),
        PropValue::Flag(false) => {
            if host.has_attribute(element, key) {
                host.remove_attribute(element, key);
            }
        }
        PropValue::Style(style) => diff_style(host, element, &Style::default(), style),
        PropValue::Ref(node_ref) => node_ref.set(Some(element)),
        PropValue::Listener(_) => {}
    }
}

fn remove_prop(
    host: &mut dyn HostRenderer,
    element: HostNodeId,
    tag: &mut TagNode,
    key: &str,
    old: &PropValue,
) {
    match old {
        PropValue::Style(style) => {
            for (property, _) in style.iter() {
                host.remove_style(element, property);
            }
        }
        PropValue::Listener(_) => {
            if let Some(binding) = tag.listeners.remove(key) {
                host.remove_event_listener(element, &event_name(key), &binding.host_listener);
            }
        }
        PropValue::Ref(node_ref) => node_ref.set(None),
        PropValue::Attr(_) if PROPERTY_KEYS.contains(&key) => host.set_property(element, key, ""),
        PropValue::Attr(_) | PropValue::Flag(_) => {
            if host.has_attribute(element, key) {
                host.remove_attribute(element, key);
            }
        }
    }
}

fn diff_style(host: &mut dyn HostRenderer, element: HostNodeId, before: &Style, after: &Style) {
    for (property, _) in before.iter() {
        if after.get(property).is_none() {
            host.remove_style(element, property);
        }
    }
    for (property, value) in after.iter() {
        if before.get(property) == Some(value.as_str()) {
            continue;
        }
        if value.is_empty() {
            host.remove_style(element, property);
        } else {
            host.set_style(element, property, value);
        }
    }
}

fn bind_listener(
    host: &mut dyn HostRenderer,
    element: HostNodeId,
    tag: &mut TagNode,
    key: &str,
    listener: &Listener,
) {
    if let Some(binding) = tag.listeners.get(key) {
        *binding.slot.borrow_mut() = Rc::clone(listener);
        return;
    }

    let slot = Rc::new(RefCell::new(Rc::clone(listener)));
    let target = Rc::clone(&slot);
    let host_listener: Listener = Rc::new(move |event: &Event| {
        let current = target.borrow().clone();
        current(event);
    });
    host.add_event_listener(element, &event_name(key), &host_listener);
    tag.listeners.insert(
        key.to_string(),
        ListenerBinding {
            slot,
            host_listener,
        },
    );
}

/// Detach listeners and clear the ref before the element is dropped.
pub(crate) fn release_props(host: &mut dyn HostRenderer, tag: &mut TagNode) {
    let Some(element) = tag.host else {
        return;
    };
    for (key, binding) in tag.listeners.drain() {
        host.remove_event_listener(element, &event_name(&key), &binding.host_listener);
    }
    if let Some(PropValue::Ref(node_ref)) = tag.applied.get("ref") {
        node_ref.set(None);
    }
    tag.applied = Props::default();
}
