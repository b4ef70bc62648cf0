//! The page a script runs in: document, clock, events, scrolling and observers.

use crate::config::PageConfig;
use crate::console::{Console, LogLevel};
use crate::events::{Event, EventKind, EventTarget, Listener, ListenerId, ListenerStore};
use crate::intersection::{
    IntersectionEntry, IntersectionObserverInit, Observer, ObserverCallback, ObserverId,
};
use crate::layout::{Layout, Rect};
use crate::scheduler::FrameScheduler;
use crate::timers::{FrameQueue, FrameRequestId, PendingTimer, TimerId, TimerQueue};
use anyhow::{Context as _, Result, anyhow, bail, ensure};
use core::time::Duration;
use dom::{Document, NodeKey, parse_html};
use log::{debug, error, info, trace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use url::Url;

/// A smooth scroll in flight.
#[derive(Copy, Clone, Debug)]
struct SmoothScroll {
    from: f64,
    to: f64,
    start_ms: u64,
    duration_ms: u64,
}

/// Ease-in-out cubic over `t` in `0.0..=1.0`.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

pub struct Page {
    document: Document,
    url: Url,
    config: PageConfig,
    now_ms: u64,
    timers: TimerQueue,
    frames: FrameQueue,
    scheduler: FrameScheduler,
    listeners: ListenerStore,
    observers: Vec<Observer>,
    next_observer: u64,
    observers_dirty: bool,
    observed_generation: u64,
    layout: RefCell<Option<(u64, Layout)>>,
    rect_overrides: HashMap<NodeKey, Rect>,
    scroll_y: f64,
    smooth: Option<SmoothScroll>,
    console: Console,
    submissions: Vec<NodeKey>,
    errors: Vec<String>,
    reporting_error: bool,
}

impl Page {
    pub fn new(document: Document, url: Url, config: PageConfig) -> Self {
        let scheduler = FrameScheduler::new(config.frame_budget());
        Self {
            document,
            url,
            config,
            now_ms: 0,
            timers: TimerQueue::default(),
            frames: FrameQueue::default(),
            scheduler,
            listeners: ListenerStore::default(),
            observers: Vec::new(),
            next_observer: 0,
            observers_dirty: false,
            observed_generation: 0,
            layout: RefCell::new(None),
            rect_overrides: HashMap::new(),
            scroll_y: 0.0,
            smooth: None,
            console: Console::default(),
            submissions: Vec::new(),
            errors: Vec::new(),
            reporting_error: false,
        }
    }

    /// Parse `html` and build a page served from `url`.
    ///
    /// # Errors
    /// Returns an error if the URL or markup cannot be parsed.
    pub fn from_html(html: &str, url: &str, config: PageConfig) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid page url {url:?}"))?;
        let document = parse_html(html)?;
        Ok(Self::new(document, url, config))
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub const fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub const fn url(&self) -> &Url {
        &self.url
    }

    pub const fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Current virtual time in milliseconds.
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub const fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    // ------------------------------------------------------------------
    // Timers and frames
    // ------------------------------------------------------------------

    /// Run `task` once `delay` has elapsed on the virtual clock.
    pub fn set_timeout(
        &mut self,
        delay: Duration,
        task: impl FnOnce(&mut Self) -> Result<()> + 'static,
    ) -> TimerId {
        let due_at = self.now_ms.saturating_add(delay.as_millis() as u64);
        self.timers.schedule(due_at, Box::new(task))
    }

    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.timers.pending()
    }

    /// Run `callback` in the next animation frame.
    pub fn request_animation_frame(
        &mut self,
        callback: impl FnOnce(&mut Self, f64) -> Result<()> + 'static,
    ) -> FrameRequestId {
        if !self.frames.is_empty() {
            self.scheduler.incr_coalesced();
        }
        self.frames.request(Box::new(callback))
    }

    pub fn cancel_animation_frame(&mut self, id: FrameRequestId) -> bool {
        self.frames.cancel(id)
    }

    pub fn pending_frame_callbacks(&self) -> usize {
        self.frames.len()
    }

    /// Move the clock forward, running every timer and frame that falls due.
    ///
    /// # Errors
    /// Returns an error when more than the configured step limit of tasks run
    /// without the clock moving.
    pub fn advance(&mut self, duration: Duration) -> Result<()> {
        let end = self.now_ms.saturating_add(duration.as_millis() as u64);
        self.run_until(end)?;
        self.now_ms = end;
        Ok(())
    }

    /// Run everything due right now without moving the clock.
    ///
    /// # Errors
    /// See [`Page::advance`].
    pub fn run_pending(&mut self) -> Result<()> {
        self.run_until(self.now_ms)
    }

    fn needs_frame(&self) -> bool {
        !self.frames.is_empty()
            || self.smooth.is_some()
            || (!self.observers.is_empty()
                && (self.observers_dirty
                    || self.observed_generation != self.document.generation()
                    || self.observers.iter().any(Observer::has_unreported)))
    }

    fn run_until(&mut self, end: u64) -> Result<()> {
        let mut instant = self.now_ms;
        let mut steps = 0usize;
        loop {
            let next_timer = self.timers.next_due().filter(|due| *due <= end);
            let next_frame = self
                .needs_frame()
                .then(|| self.scheduler.next_frame_at(self.now_ms))
                .filter(|at| *at <= end);
            let (at, is_frame) = match (next_timer, next_frame) {
                (None, None) => break,
                (Some(timer), Some(frame)) if frame < timer => (frame, true),
                (Some(timer), _) => (timer.max(self.now_ms), false),
                (None, Some(frame)) => (frame, true),
            };
            if at == instant {
                steps += 1;
                if steps > self.config.step_limit {
                    bail!(
                        "step limit of {} exceeded at {at}ms ({} timers, {} frame callbacks pending)",
                        self.config.step_limit,
                        self.timers.len(),
                        self.frames.len()
                    );
                }
            } else {
                instant = at;
                steps = 1;
            }
            self.now_ms = at;
            if is_frame {
                self.run_frame(at);
            } else if let Some((id, _, task)) = self.timers.pop_due(at) {
                trace!("timer {id:?} fired at {at}ms");
                if let Err(err) = task(self) {
                    self.report_uncaught(&err);
                }
            }
        }
        Ok(())
    }

    fn run_frame(&mut self, at: u64) {
        self.scheduler.begin_frame(at);
        trace!("frame {} at {at}ms", self.scheduler.frames());
        self.step_smooth_scroll(at);
        for (_, callback) in self.frames.take_all() {
            if let Err(err) = callback(self, at as f64) {
                self.report_uncaught(&err);
            }
        }
        self.update_intersections(at);
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_event_listener(
        &mut self,
        target: EventTarget,
        kind: EventKind,
        listener: impl Fn(&mut Self, &mut Event) -> Result<()> + 'static,
    ) -> ListenerId {
        let listener: Listener = Rc::new(listener);
        self.listeners.add(target, kind, listener)
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self, target: EventTarget, kind: EventKind) -> usize {
        self.listeners.count(target, kind)
    }

    /// Deliver `event` along its path and return it for default handling.
    pub fn dispatch(&mut self, mut event: Event) -> Event {
        let mut path = vec![event.target];
        if let EventTarget::Node(node) = event.target
            && event.kind.bubbles()
        {
            let mut current = self.document.parent(node);
            while let Some(ancestor) = current {
                path.push(EventTarget::Node(ancestor));
                current = self.document.parent(ancestor);
            }
            path.push(EventTarget::Window);
        }
        trace!("dispatching {} along {} targets", event.kind.name(), path.len());
        for current in path {
            event.current_target = current;
            for listener in self.listeners.listeners_for(current, event.kind) {
                if let Err(err) = listener(self, &mut event) {
                    self.report_uncaught(&err);
                }
            }
            if event.propagation_stopped() {
                break;
            }
        }
        event
    }

    /// Fire DOMContentLoaded and then load on the window.
    pub fn load_document(&mut self) {
        info!("document loaded: {}", self.url);
        self.dispatch(Event::new(EventKind::DomContentLoaded, EventTarget::Window));
        self.dispatch(Event::new(EventKind::Load, EventTarget::Window));
    }

    fn ensure_node(&self, node: NodeKey) -> Result<()> {
        ensure!(self.document.contains(node), "node {node:?} is not in the document");
        Ok(())
    }

    /// Click an element, running its default action unless a listener prevented it.
    ///
    /// # Errors
    /// Returns an error if the node does not exist.
    pub fn click(&mut self, node: NodeKey) -> Result<()> {
        self.ensure_node(node)?;
        let event = self.dispatch(Event::new(EventKind::Click, EventTarget::Node(node)));
        if event.default_prevented() || !self.document.contains(node) {
            return Ok(());
        }
        if let Some(anchor) = self.document.closest(node, "a[href]")? {
            if let Some(fragment) = self
                .document
                .attribute(anchor, "href")
                .and_then(|href| href.strip_prefix('#'))
                && let Some(target) = self.document.get_element_by_id(fragment)
            {
                let y = self.offset_top(target).unwrap_or(0.0);
                debug!("fragment jump to #{fragment} at {y}px");
                self.scroll_to(y);
            }
            return Ok(());
        }
        if let Some(button) = self.document.closest(node, "button, input")?
            && self.is_submit_button(button)
            && let Some(form) = self.document.closest(button, "form")?
        {
            self.submit(form)?;
        }
        Ok(())
    }

    fn is_submit_button(&self, node: NodeKey) -> bool {
        let kind = self
            .document
            .attribute(node, "type")
            .map(str::to_ascii_lowercase);
        match self.document.tag_name(node) {
            Some("button") => kind.is_none_or(|kind| kind == "submit"),
            Some("input") => kind.as_deref() == Some("submit"),
            _ => false,
        }
    }

    /// Submit a form. Unless a listener prevents it, the submission is recorded.
    ///
    /// # Errors
    /// Returns an error if the node is not a form.
    pub fn submit(&mut self, form: NodeKey) -> Result<()> {
        ensure!(
            self.document.tag_name(form) == Some("form"),
            "node {form:?} is not a form"
        );
        let event = self.dispatch(Event::new(EventKind::Submit, EventTarget::Node(form)));
        if !event.default_prevented() {
            info!("form {form:?} submitted");
            self.submissions.push(form);
        }
        Ok(())
    }

    /// Replace a control's value as if typed, then fire `input`.
    ///
    /// # Errors
    /// Returns an error if the node is not a form control.
    pub fn type_text(&mut self, node: NodeKey, text: &str) -> Result<()> {
        self.document.set_value(node, text)?;
        self.dispatch(Event::new(EventKind::Input, EventTarget::Node(node)));
        Ok(())
    }

    /// Move focus away from an element.
    ///
    /// # Errors
    /// Returns an error if the node does not exist.
    pub fn blur(&mut self, node: NodeKey) -> Result<()> {
        self.ensure_node(node)?;
        self.dispatch(Event::new(EventKind::Blur, EventTarget::Node(node)));
        Ok(())
    }

    /// Forms whose submission went through without being intercepted.
    pub fn submissions(&self) -> &[NodeKey] {
        &self.submissions
    }

    // ------------------------------------------------------------------
    // Errors and console
    // ------------------------------------------------------------------

    fn report_uncaught(&mut self, err: &anyhow::Error) {
        self.report_error(&format!("{err:#}"));
    }

    /// Fire the window `error` event. Errors raised while handling it are only logged.
    pub fn report_error(&mut self, message: &str) {
        self.errors.push(message.to_owned());
        if self.reporting_error {
            error!("error while reporting an error: {message}");
            return;
        }
        let listeners = self.listeners.listeners_for(EventTarget::Window, EventKind::Error);
        if listeners.is_empty() {
            error!("uncaught error: {message}");
            return;
        }
        self.reporting_error = true;
        let mut event = Event::new(EventKind::Error, EventTarget::Window);
        event.message = Some(message.to_owned());
        for listener in listeners {
            if let Err(err) = listener(self, &mut event) {
                error!("error listener failed: {err:#}");
            }
        }
        self.reporting_error = false;
    }

    /// Every uncaught error message, oldest first.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn write_console(&mut self, level: LogLevel, message: impl Into<String>) {
        self.console.write(level, message.into(), self.now_ms);
    }

    pub const fn console(&self) -> &Console {
        &self.console
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    fn with_layout<R>(&self, read: impl FnOnce(&Layout) -> R) -> R {
        let generation = self.document.generation();
        let mut cache = self.layout.borrow_mut();
        if cache.as_ref().is_some_and(|(built, _)| *built != generation) {
            *cache = None;
        }
        let (_, layout) = cache.get_or_insert_with(|| {
            (
                generation,
                Layout::compute(&self.document, self.config.viewport_width),
            )
        });
        read(layout)
    }

    /// Pin an element's box, replacing the computed one.
    pub fn set_rect(&mut self, node: NodeKey, rect: Rect) {
        self.rect_overrides.insert(node, rect);
        self.observers_dirty = true;
    }

    /// The element's box in document coordinates.
    pub fn rect(&self, node: NodeKey) -> Option<Rect> {
        if !self.document.contains(node) {
            return None;
        }
        if let Some(rect) = self.rect_overrides.get(&node) {
            return Some(*rect);
        }
        self.with_layout(|layout| layout.rect(node))
    }

    pub fn offset_top(&self, node: NodeKey) -> Option<f64> {
        self.rect(node).map(|rect| rect.y)
    }

    pub fn document_height(&self) -> f64 {
        let computed = self.with_layout(Layout::document_height);
        self.rect_overrides
            .iter()
            .filter(|(node, _)| self.document.contains(**node))
            .map(|(_, rect)| rect.bottom())
            .fold(computed, f64::max)
    }

    /// The visible part of the document.
    pub fn viewport(&self) -> Rect {
        Rect::new(
            0.0,
            self.scroll_y,
            self.config.viewport_width,
            self.config.viewport_height,
        )
    }

    /// Returns true if the element's box lies entirely inside the viewport.
    pub fn is_in_viewport(&self, node: NodeKey) -> bool {
        let viewport = self.viewport();
        self.rect(node).is_some_and(|rect| {
            rect.y >= viewport.y
                && rect.x >= viewport.x
                && rect.bottom() <= viewport.bottom()
                && rect.right() <= viewport.right()
        })
    }

    // ------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------

    pub const fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn max_scroll(&self) -> f64 {
        (self.document_height() - self.config.viewport_height).max(0.0)
    }

    pub const fn is_smooth_scrolling(&self) -> bool {
        self.smooth.is_some()
    }

    /// Jump to `y`, clamped to the scrollable range. Cancels any smooth scroll.
    pub fn scroll_to(&mut self, y: f64) {
        self.smooth = None;
        let target = y.clamp(0.0, self.max_scroll());
        self.set_scroll_offset(target);
    }

    /// Animate the scroll offset towards `y` over the configured duration.
    pub fn scroll_to_smooth(&mut self, y: f64) {
        let to = y.clamp(0.0, self.max_scroll());
        let duration = self.config.smooth_scroll();
        if duration.is_zero() {
            self.scroll_to(to);
            return;
        }
        debug!("smooth scroll from {} to {to} over {duration:?}", self.scroll_y);
        self.smooth = Some(SmoothScroll {
            from: self.scroll_y,
            to,
            start_ms: self.now_ms,
            duration_ms: duration.as_millis() as u64,
        });
    }

    fn step_smooth_scroll(&mut self, at: u64) {
        let Some(motion) = self.smooth else {
            return;
        };
        let elapsed = at.saturating_sub(motion.start_ms);
        if elapsed >= motion.duration_ms {
            self.smooth = None;
            self.set_scroll_offset(motion.to);
            return;
        }
        let progress = elapsed as f64 / motion.duration_ms as f64;
        let y = motion.from + (motion.to - motion.from) * ease_in_out_cubic(progress);
        self.set_scroll_offset(y);
    }

    fn set_scroll_offset(&mut self, y: f64) {
        if (self.scroll_y - y).abs() < f64::EPSILON {
            return;
        }
        self.scroll_y = y;
        self.observers_dirty = true;
        self.dispatch(Event::new(EventKind::Scroll, EventTarget::Window));
    }

    // ------------------------------------------------------------------
    // Intersection observers
    // ------------------------------------------------------------------

    pub const fn supports_intersection_observer(&self) -> bool {
        self.config.intersection_observer
    }

    /// # Errors
    /// Returns an error when intersection observation is unsupported or the
    /// options are invalid.
    pub fn create_intersection_observer(
        &mut self,
        init: IntersectionObserverInit,
        callback: impl Fn(&mut Self, &[IntersectionEntry], ObserverId) -> Result<()> + 'static,
    ) -> Result<ObserverId> {
        if !self.config.intersection_observer {
            bail!("intersection observation is not supported on this page");
        }
        init.validate()?;
        self.next_observer += 1;
        let id = ObserverId(self.next_observer);
        let callback: ObserverCallback = Rc::new(callback);
        self.observers.push(Observer {
            id,
            init,
            callback,
            targets: Vec::new(),
        });
        Ok(id)
    }

    /// # Errors
    /// Returns an error if the observer was disconnected or never existed.
    pub fn observe(&mut self, observer: ObserverId, target: NodeKey) -> Result<()> {
        let entry = self
            .observers
            .iter_mut()
            .find(|candidate| candidate.id == observer)
            .ok_or_else(|| anyhow!("unknown observer {observer:?}"))?;
        entry.observe(target);
        self.observers_dirty = true;
        Ok(())
    }

    pub fn unobserve(&mut self, observer: ObserverId, target: NodeKey) {
        if let Some(entry) = self
            .observers
            .iter_mut()
            .find(|candidate| candidate.id == observer)
        {
            entry.unobserve(target);
        }
    }

    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observers.retain(|candidate| candidate.id != observer);
    }

    /// Targets an observer is still watching, in observation order.
    pub fn observed_targets(&self, observer: ObserverId) -> Vec<NodeKey> {
        self.observers
            .iter()
            .find(|candidate| candidate.id == observer)
            .map(|entry| entry.targets.iter().map(|(node, _)| *node).collect())
            .unwrap_or_default()
    }

    fn update_intersections(&mut self, at: u64) {
        if self.observers.is_empty() {
            return;
        }
        let viewport = self.viewport();
        let mut observers = core::mem::take(&mut self.observers);
        let mut batches = Vec::new();
        for observer in &mut observers {
            let entries = observer.collect(|node| self.rect(node), viewport, at);
            if !entries.is_empty() {
                batches.push((observer.id, Rc::clone(&observer.callback), entries));
            }
        }
        self.observers = observers;
        self.observers_dirty = false;
        self.observed_generation = self.document.generation();
        for (id, callback, entries) in batches {
            trace!("observer {id:?} receives {} entries", entries.len());
            if let Err(err) = callback(self, &entries, id) {
                self.report_uncaught(&err);
            }
        }
    }
}
