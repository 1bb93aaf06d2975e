//! Headless display adapter.
//!
//! Implements [`UiToolkit`] with an in-memory widget table instead of a
//! panel driver. Every visible change is logged at `debug`, so the screen
//! flow can be followed on the serial console. Input events arrive on an
//! mpsc channel (fed by the serial console or a test) and are handed out
//! one per [`UiToolkit::run_pending`] call.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, TryRecvError};

use log::{debug, trace};

use crate::app::events::UiEvent;
use crate::app::ports::{Rgb, UiToolkit, WidgetHandle, WidgetKind};
use crate::error::UiError;

const ROOT: WidgetHandle = WidgetHandle(0);

#[derive(Debug, Clone)]
struct Widget {
    parent: WidgetHandle,
    kind: WidgetKind,
    hidden: bool,
    pos: (i32, i32),
    text: String,
    color: Option<Rgb>,
    value: i32,
    on: bool,
}

pub struct HeadlessDisplay {
    resolution: (i32, i32),
    widgets: HashMap<u32, Widget>,
    next_id: u32,
    /// Refuse further creations once this many widgets exist.
    capacity: usize,
    events: Option<Receiver<UiEvent>>,
}

impl HeadlessDisplay {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            resolution: (width, height),
            widgets: HashMap::new(),
            next_id: 1,
            capacity: usize::MAX,
            events: None,
        }
    }

    /// Feed input events from `rx`.
    pub fn with_events(mut self, rx: Receiver<UiEvent>) -> Self {
        self.events = Some(rx);
        self
    }

    /// Limit the widget table, mimicking a toolkit running out of memory.
    pub fn with_capacity(mut self, widgets: usize) -> Self {
        self.capacity = widgets;
        self
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn exists(&self, w: WidgetHandle) -> bool {
        self.widgets.contains_key(&w.0)
    }

    pub fn text(&self, w: WidgetHandle) -> Option<&str> {
        self.widgets.get(&w.0).map(|x| x.text.as_str())
    }

    pub fn is_hidden(&self, w: WidgetHandle) -> Option<bool> {
        self.widgets.get(&w.0).map(|x| x.hidden)
    }

    pub fn position(&self, w: WidgetHandle) -> Option<(i32, i32)> {
        self.widgets.get(&w.0).map(|x| x.pos)
    }

    pub fn indicator(&self, w: WidgetHandle) -> Option<bool> {
        self.widgets.get(&w.0).map(|x| x.on)
    }

    pub fn color(&self, w: WidgetHandle) -> Option<Rgb> {
        self.widgets.get(&w.0).and_then(|x| x.color)
    }

    pub fn slider_value(&self, w: WidgetHandle) -> Option<i32> {
        self.widgets.get(&w.0).map(|x| x.value)
    }

    fn children_of(&self, parent: WidgetHandle) -> Vec<u32> {
        self.widgets
            .iter()
            .filter(|(_, w)| w.parent == parent)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl UiToolkit for HeadlessDisplay {
    fn root(&self) -> WidgetHandle {
        ROOT
    }

    fn resolution(&self) -> (i32, i32) {
        self.resolution
    }

    fn create_widget(&mut self, parent: WidgetHandle, kind: WidgetKind) -> Result<WidgetHandle, UiError> {
        if self.widgets.len() >= self.capacity {
            return Err(UiError::WidgetCreateFailed);
        }
        if parent != ROOT && !self.widgets.contains_key(&parent.0) {
            return Err(UiError::ScreenMissing);
        }
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        let value = match kind {
            WidgetKind::Slider { min, .. } => min,
            _ => 0,
        };
        self.widgets.insert(
            id,
            Widget {
                parent,
                kind,
                hidden: false,
                pos: (0, 0),
                text: String::new(),
                color: None,
                value,
                on: false,
            },
        );
        trace!("Display: create #{} {:?} under #{}", id, kind, parent.0);
        Ok(WidgetHandle(id))
    }

    fn destroy_widget(&mut self, widget: WidgetHandle) {
        let mut stack = vec![widget.0];
        while let Some(id) = stack.pop() {
            stack.extend(self.children_of(WidgetHandle(id)));
            self.widgets.remove(&id);
        }
        trace!("Display: destroy #{}", widget.0);
    }

    fn set_hidden(&mut self, widget: WidgetHandle, hidden: bool) {
        if let Some(w) = self.widgets.get_mut(&widget.0) {
            w.hidden = hidden;
            if w.kind == WidgetKind::Screen {
                debug!("Display: screen #{} {}", widget.0, if hidden { "hidden" } else { "shown" });
            }
        }
    }

    fn set_position(&mut self, widget: WidgetHandle, x: i32, y: i32) {
        if let Some(w) = self.widgets.get_mut(&widget.0) {
            w.pos = (x, y);
        }
    }

    fn set_text(&mut self, widget: WidgetHandle, text: &str) {
        if let Some(w) = self.widgets.get_mut(&widget.0) {
            if w.text != text {
                debug!("Display: #{} \"{}\"", widget.0, text);
                w.text.clear();
                w.text.push_str(text);
            }
        }
    }

    fn set_color(&mut self, widget: WidgetHandle, color: Rgb) {
        if let Some(w) = self.widgets.get_mut(&widget.0) {
            w.color = Some(color);
        }
    }

    fn set_slider_value(&mut self, widget: WidgetHandle, value: i32) {
        if let Some(w) = self.widgets.get_mut(&widget.0) {
            w.value = match w.kind {
                WidgetKind::Slider { min, max } => value.clamp(min, max),
                _ => value,
            };
        }
    }

    fn set_indicator(&mut self, widget: WidgetHandle, on: bool) {
        if let Some(w) = self.widgets.get_mut(&widget.0) {
            if w.on != on {
                debug!("Display: lamp #{} {}", widget.0, if on { "on" } else { "off" });
            }
            w.on = on;
        }
    }

    fn animate_position(&mut self, widget: WidgetHandle, from: (i32, i32), to: (i32, i32), duration_ms: u32) {
        trace!(
            "Display: slide #{} ({},{}) -> ({},{}) in {} ms",
            widget.0, from.0, from.1, to.0, to.1, duration_ms
        );
        self.set_position(widget, to.0, to.1);
    }

    fn run_pending(&mut self, _now_ms: u32) -> Option<UiEvent> {
        let rx = self.events.as_ref()?;
        match rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                debug!("Display: input channel closed");
                self.events = None;
                None
            }
        }
    }
}
