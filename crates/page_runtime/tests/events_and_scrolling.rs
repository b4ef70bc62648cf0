use core::time::Duration;
use page_runtime::{
    EventKind, EventTarget, IntersectionObserverInit, LogLevel, Page, PageConfig, Rect,
    RootMargin,
};
use std::cell::RefCell;
use std::rc::Rc;

const PAGE: &str = r##"<html><body>
<nav id="nav"><a id="jump" href="#far">Far</a><a id="home" href="#">Top</a></nav>
<div id="spacer" data-height="1000"></div>
<section id="far" data-height="300"><p>far away</p></section>
<form id="form"><div><input id="name" name="name"></div><button id="send">Send</button>
<button id="plain" type="button">Plain</button></form>
<div id="tail" data-height="2000"></div>
</body></html>"##;

fn page() -> Page {
    let _ = env_logger::builder().is_test(true).try_init();
    Page::from_html(PAGE, "https://folio.test/index.html", PageConfig::default()).unwrap()
}

fn id(page: &Page, id: &str) -> dom::NodeKey {
    page.document().get_element_by_id(id).unwrap()
}

#[test]
fn bubbling_reaches_ancestors_then_window() {
    let mut page = page();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let jump = id(&page, "jump");
    let nav = id(&page, "nav");
    for (target, label) in [
        (EventTarget::Window, "window"),
        (EventTarget::Node(nav), "nav"),
        (EventTarget::Node(jump), "link"),
    ] {
        let seen = Rc::clone(&seen);
        page.add_event_listener(target, EventKind::Click, move |_, event| {
            seen.borrow_mut().push(label);
            event.prevent_default();
            Ok(())
        });
    }
    page.click(jump).unwrap();
    assert_eq!(*seen.borrow(), vec!["link", "nav", "window"]);
    assert_eq!(page.scroll_y(), 0.0, "prevented click must not jump");
}

#[test]
fn blur_does_not_bubble() {
    let mut page = page();
    let hits = Rc::new(RefCell::new(0));
    let form = id(&page, "form");
    let counter = Rc::clone(&hits);
    page.add_event_listener(EventTarget::Node(form), EventKind::Blur, move |_, _| {
        *counter.borrow_mut() += 1;
        Ok(())
    });
    let name = id(&page, "name");
    page.blur(name).unwrap();
    assert_eq!(*hits.borrow(), 0);
    page.blur(form).unwrap();
    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn fragment_click_jumps_to_the_target() {
    let mut page = page();
    let jump = id(&page, "jump");
    page.click(jump).unwrap();
    assert_eq!(page.scroll_y(), page.offset_top(id(&page, "far")).unwrap());

    let home = id(&page, "home");
    let before = page.scroll_y();
    page.click(home).unwrap();
    assert_eq!(page.scroll_y(), before, "bare # has no target");
}

#[test]
fn submit_buttons_submit_their_form() {
    let mut page = page();
    let plain = id(&page, "plain");
    page.click(plain).unwrap();
    assert!(page.submissions().is_empty());

    let send = id(&page, "send");
    page.click(send).unwrap();
    assert_eq!(page.submissions(), [id(&page, "form")]);

    let form = id(&page, "form");
    page.add_event_listener(EventTarget::Node(form), EventKind::Submit, |_, event| {
        event.prevent_default();
        Ok(())
    });
    page.submit(form).unwrap();
    assert_eq!(page.submissions().len(), 1);
}

#[test]
fn listener_errors_go_to_window_error_listeners() {
    let mut page = page();
    page.add_event_listener(EventTarget::Window, EventKind::Error, |page, event| {
        let message = event.message.clone().unwrap_or_default();
        page.write_console(LogLevel::Error, format!("caught {message}"));
        Ok(())
    });
    let name = id(&page, "name");
    page.add_event_listener(EventTarget::Node(name), EventKind::Input, |_, _| {
        anyhow::bail!("bad input")
    });
    page.type_text(name, "Ada").unwrap();
    assert_eq!(page.document().value(name), "Ada");
    assert_eq!(page.console().messages(LogLevel::Error), vec!["caught bad input"]);
}

#[test]
fn scroll_to_is_clamped_and_fires_scroll_once_per_change() {
    let mut page = page();
    let scrolls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&scrolls);
    page.add_event_listener(EventTarget::Window, EventKind::Scroll, move |_, _| {
        *counter.borrow_mut() += 1;
        Ok(())
    });
    let max = page.max_scroll();
    assert!(max > 0.0);
    page.scroll_to(1.0e9);
    assert_eq!(page.scroll_y(), max);
    page.scroll_to(max);
    page.scroll_to(-10.0);
    assert_eq!(page.scroll_y(), 0.0);
    assert_eq!(*scrolls.borrow(), 2);
}

#[test]
fn smooth_scroll_eases_and_lands_exactly() {
    let mut page = page();
    page.scroll_to_smooth(1000.0);
    assert!(page.is_smooth_scrolling());
    page.advance(Duration::from_millis(200)).unwrap();
    let midway = page.scroll_y();
    assert!(midway > 0.0 && midway < 1000.0, "midway at {midway}");
    page.advance(Duration::from_millis(300)).unwrap();
    assert!(!page.is_smooth_scrolling());
    assert_eq!(page.scroll_y(), 1000.0);
}

#[test]
fn a_new_scroll_cancels_smooth_scrolling() {
    let mut page = page();
    page.scroll_to_smooth(1000.0);
    page.advance(Duration::from_millis(50)).unwrap();
    page.scroll_to(10.0);
    page.advance(Duration::from_millis(500)).unwrap();
    assert_eq!(page.scroll_y(), 10.0);
}

#[test]
fn observers_report_once_then_only_on_change() {
    let mut page = page();
    let far = id(&page, "far");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let observer = page
        .create_intersection_observer(
            IntersectionObserverInit {
                threshold: 0.1,
                root_margin: RootMargin::bottom(-50.0),
            },
            move |_, entries, _| {
                sink.borrow_mut()
                    .extend(entries.iter().map(|entry| entry.is_intersecting));
                Ok(())
            },
        )
        .unwrap();
    page.observe(observer, far).unwrap();
    page.advance(Duration::from_millis(16)).unwrap();
    assert_eq!(*seen.borrow(), vec![false]);

    page.advance(Duration::from_millis(100)).unwrap();
    assert_eq!(seen.borrow().len(), 1, "no change, no entry");

    let top = page.offset_top(far).unwrap();
    page.scroll_to(top - 100.0);
    page.advance(Duration::from_millis(16)).unwrap();
    assert_eq!(*seen.borrow(), vec![false, true]);

    page.unobserve(observer, far);
    page.scroll_to(0.0);
    page.advance(Duration::from_millis(32)).unwrap();
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn rect_overrides_feed_geometry() {
    let mut page = page();
    let far = id(&page, "far");
    page.set_rect(far, Rect::new(0.0, 100.0, 1280.0, 50.0));
    assert_eq!(page.offset_top(far), Some(100.0));
    assert!(page.is_in_viewport(far));
}

#[test]
fn observers_are_unavailable_when_disabled() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut page = Page::from_html(
        PAGE,
        "https://folio.test/",
        PageConfig {
            intersection_observer: false,
            ..PageConfig::default()
        },
    )
    .unwrap();
    assert!(!page.supports_intersection_observer());
    assert!(
        page.create_intersection_observer(IntersectionObserverInit::default(), |_, _, _| Ok(()))
            .is_err()
    );
}

#[test]
fn stopped_events_skip_ancestors_until_the_listener_is_removed() {
    let mut page = page();
    let name = id(&page, "name");
    let form = id(&page, "form");
    let targets = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&targets);
    let stopper = page.add_event_listener(EventTarget::Node(name), EventKind::Input, move |_, event| {
        sink.borrow_mut().push(event.target_node());
        event.stop_propagation();
        Ok(())
    });
    let reached_form = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&reached_form);
    page.add_event_listener(EventTarget::Node(form), EventKind::Input, move |_, _| {
        *counter.borrow_mut() += 1;
        Ok(())
    });

    page.type_text(name, "A").unwrap();
    assert_eq!(*targets.borrow(), vec![Some(name)]);
    assert_eq!(*reached_form.borrow(), 0);

    assert_eq!(page.listener_count(EventTarget::Node(name), EventKind::Input), 1);
    assert!(page.remove_event_listener(stopper));
    assert!(!page.remove_event_listener(stopper));
    assert_eq!(page.listener_count(EventTarget::Node(name), EventKind::Input), 0);
    page.type_text(name, "Ab").unwrap();
    assert_eq!(*reached_form.borrow(), 1);
}

#[test]
fn observed_targets_track_unobserve_and_disconnect() {
    let mut page = page();
    let far = id(&page, "far");
    let spacer = id(&page, "spacer");
    let observer = page
        .create_intersection_observer(IntersectionObserverInit::default(), |_, _, _| Ok(()))
        .unwrap();
    page.observe(observer, far).unwrap();
    page.observe(observer, spacer).unwrap();
    assert_eq!(page.observed_targets(observer), vec![far, spacer]);

    page.unobserve(observer, far);
    assert_eq!(page.observed_targets(observer), vec![spacer]);

    page.disconnect(observer);
    assert!(page.observed_targets(observer).is_empty());
    assert!(page.observe(observer, far).is_err());
}

#[test]
fn cancelled_frame_callbacks_never_run() {
    let mut page = page();
    let ran = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&ran);
    let request = page.request_animation_frame(move |_, _| {
        *flag.borrow_mut() = true;
        Ok(())
    });
    assert!(page.cancel_animation_frame(request));
    assert!(!page.cancel_animation_frame(request));
    assert_eq!(page.pending_frame_callbacks(), 0);
    page.advance(Duration::from_millis(48)).unwrap();
    assert!(!*ran.borrow());
}

#[test]
fn zero_smooth_scroll_duration_jumps_at_once() {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = PageConfig {
        smooth_scroll_ms: 0,
        ..PageConfig::default()
    };
    assert!(config.smooth_scroll().is_zero());
    let mut page = Page::from_html(PAGE, "https://folio.test/", config).unwrap();
    page.scroll_to_smooth(600.0);
    assert!(!page.is_smooth_scrolling());
    assert_eq!(page.scroll_y(), 600.0);
}
