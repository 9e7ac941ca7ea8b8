use std::collections::HashMap;

use log::{debug, trace};

use crate::{
    dom::{Document, NodeId},
    settings::Settings,
    traversal::TreeWalk,
};

pub const CONTROLLER_CLASS: &str = "vsc-controller";
pub const SPEED_INDICATOR_CLASS: &str = "vsc-speed";
pub const HIDDEN_CLASS: &str = "vsc-hidden";
pub const MANUAL_CLASS: &str = "vsc-manual";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Auto,
    ManualHidden,
    ManualShown,
}

impl Visibility {
    pub fn toggled(self) -> Self {
        match self {
            Self::Auto | Self::ManualShown => Self::ManualHidden,
            Self::ManualHidden => Self::ManualShown,
        }
    }

    pub fn is_hidden(self) -> bool {
        self == Self::ManualHidden
    }

    pub fn is_manual(self) -> bool {
        self != Self::Auto
    }
}

/// Controller state attached to one registered media element.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerRecord {
    pub overlay: NodeId,
    pub speed_indicator: NodeId,
    pub mark: Option<f64>,
    pub visibility: Visibility,
    pub speed_before_reset: Option<f64>,
}

/// Side table from media element to its controller record.
///
/// Only ids are stored; a record never keeps its element in the document.
#[derive(Debug, Default)]
pub struct MediaRegistry {
    records: HashMap<NodeId, ControllerRecord>,
    order: Vec<NodeId>,
    active: Option<NodeId>,
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instruments `element` with a controller overlay and starts it at the last used
    /// speed. Returns `false` for non-media nodes and elements that are already registered.
    pub fn add_media_element(
        &mut self,
        doc: &mut Document,
        settings: &Settings,
        element: NodeId,
    ) -> bool {
        if self.records.contains_key(&element) {
            return false;
        }
        let speed = settings.clamp_speed(settings.last_speed);
        let Some(media) = doc.media_mut(element) else {
            trace!("Not registering {element}: not a media element");
            return false;
        };
        media.playback_rate = speed;

        let overlay = doc.create_element("div");
        let speed_indicator = doc.create_element("span");
        doc.set_class(overlay, CONTROLLER_CLASS, true);
        doc.set_class(speed_indicator, SPEED_INDICATOR_CLASS, true);
        doc.set_text(speed_indicator, format!("{speed:.2}"));
        if let Err(err) = doc.append_child(overlay, speed_indicator) {
            debug!("Failed to build controller for {element}: {err:?}");
            return false;
        }
        if let Some(parent) = doc.parent(element) {
            if let Err(err) = doc.insert_before(parent, overlay, element) {
                debug!("Failed to insert controller for {element}: {err:?}");
            }
        }

        debug!("Registered media element {element} at speed {speed:.2}");
        self.records.insert(
            element,
            ControllerRecord {
                overlay,
                speed_indicator,
                mark: None,
                visibility: Visibility::Auto,
                speed_before_reset: None,
            },
        );
        self.order.push(element);
        true
    }

    pub fn remove_media_element(&mut self, doc: &mut Document, element: NodeId) -> bool {
        let Some(record) = self.records.remove(&element) else {
            return false;
        };
        self.order.retain(|&id| id != element);
        if self.active == Some(element) {
            self.active = None;
        }
        doc.remove(record.overlay);
        debug!("Unregistered media element {element}");
        true
    }

    /// Unregisters every element that is no longer attached to the document.
    pub fn prune(&mut self, doc: &mut Document) -> usize {
        let detached: Vec<NodeId> = self
            .order
            .iter()
            .copied()
            .filter(|&id| !doc.is_connected(id))
            .collect();
        for &element in &detached {
            self.remove_media_element(doc, element);
        }
        detached.len()
    }

    pub fn contains(&self, element: NodeId) -> bool {
        self.records.contains_key(&element)
    }

    pub fn get(&self, element: NodeId) -> Option<&ControllerRecord> {
        self.records.get(&element)
    }

    pub fn get_mut(&mut self, element: NodeId) -> Option<&mut ControllerRecord> {
        self.records.get_mut(&element)
    }

    /// Registered elements in registration order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    /// Marks `element` as the one the user most recently interacted with.
    pub fn set_active(&mut self, element: NodeId) -> bool {
        if !self.contains(element) {
            return false;
        }
        self.active = Some(element);
        true
    }

    pub fn active(&self) -> Option<NodeId> {
        self.active.filter(|&id| self.contains(id))
    }
}
