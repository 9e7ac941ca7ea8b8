//! Routes keydown events to the action dispatcher.
//!
//! Listeners live on the document root and on any shadow root that needs key
//! handling. A shadow root sees the real event target; listeners further out see the
//! target retargeted to the outermost host they can observe.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use log::{debug, trace};

use crate::{
    dispatcher::ActionDispatcher,
    dom::{Document, NodeId, NodeKind},
    keys::KeyChord,
    registry::MediaRegistry,
    settings::Settings,
    traversal::{self, TreeWalk},
};

/// Class of the extension's own settings UI, which never has its keystrokes hijacked.
pub const SETTINGS_UI_CLASS: &str = "vsc-settings";

#[derive(Debug, Clone)]
pub struct KeyEvent {
    pub chord: KeyChord,

    /// The node the event was dispatched to, before any retargeting.
    pub origin: NodeId,

    /// The target as seen by the listener currently handling the event.
    pub target: NodeId,

    default_prevented: bool,
    propagation_stopped: bool,
}

impl KeyEvent {
    pub fn new(chord: KeyChord, target: NodeId) -> Self {
        Self {
            chord,
            origin: target,
            target,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[derive(Debug)]
pub struct InputRouter {
    settings: Rc<RefCell<Settings>>,
    dispatcher: ActionDispatcher,
    listening_roots: HashSet<NodeId>,
}

impl InputRouter {
    pub fn new(settings: Rc<RefCell<Settings>>, dispatcher: ActionDispatcher) -> Self {
        Self {
            settings,
            dispatcher,
            listening_roots: HashSet::new(),
        }
    }

    /// Attaches the keydown listener to a document or shadow root. Returns `false` for
    /// other nodes and for roots that already have a listener.
    pub fn listen_on(&mut self, doc: &Document, root: NodeId) -> bool {
        match doc.kind(root) {
            Some(NodeKind::Document | NodeKind::ShadowRoot { .. }) => {
                self.listening_roots.insert(root)
            }
            _ => false,
        }
    }

    /// Delivers `event` along its composed path the way a browser would, invoking
    /// [`Self::handle_keydown`] at every listening root until propagation stops.
    pub fn deliver_keydown(
        &self,
        doc: &mut Document,
        registry: &mut MediaRegistry,
        event: &mut KeyEvent,
    ) {
        let path: Vec<NodeId> = traversal::composed_ancestors(&*doc, event.origin).collect();
        let mut visible_target = event.origin;
        for node in path {
            if self.listening_roots.contains(&node) {
                event.target = visible_target;
                self.handle_keydown(doc, registry, event);
                if event.is_propagation_stopped() {
                    return;
                }
            }
            if let Some(host) = doc.shadow_host(node) {
                visible_target = host;
            }
        }
    }

    pub fn handle_keydown(
        &self,
        doc: &mut Document,
        registry: &mut MediaRegistry,
        event: &mut KeyEvent,
    ) {
        if is_editable_context(doc, event.origin) {
            trace!("Ignoring {} typed into an editable context", event.chord);
            return;
        }

        let binding = self
            .settings
            .borrow()
            .find_binding(event.chord)
            .map(|b| (b.action, b.value));
        let Some((action, value)) = binding else {
            trace!("No binding for {}", event.chord);
            return;
        };
        let Some(element) = resolve_target(doc, registry, event.target) else {
            trace!("No media element for {} from {}", event.chord, event.target);
            return;
        };

        event.prevent_default();
        event.stop_propagation();

        debug!("{} → {action:?} on {element}", event.chord);
        self.dispatcher
            .run_action(doc, registry, action, value, Some(element));
    }
}

fn is_editable_context(doc: &Document, node: NodeId) -> bool {
    doc.is_editable(node)
        || traversal::composed_ancestors(doc, node).any(|n| doc.has_class(n, SETTINGS_UI_CLASS))
}

/// The active element if there is one, otherwise the connected registered element
/// closest to `node`: the first composed ancestor of `node` that contains such an
/// element or its controller overlay wins.
fn resolve_target(doc: &Document, registry: &MediaRegistry, node: NodeId) -> Option<NodeId> {
    if let Some(active) = registry.active().filter(|&id| doc.is_connected(id)) {
        return Some(active);
    }
    traversal::composed_ancestors(doc, node).find_map(|ancestor| {
        registry
            .elements()
            .filter(|&id| doc.is_connected(id))
            .find(|&element| {
                let contains = |n| traversal::is_composed_inclusive_ancestor(doc, ancestor, n);
                contains(element) || registry.get(element).is_some_and(|r| contains(r.overlay))
            })
    })
}
