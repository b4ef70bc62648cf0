use core::time::Duration;
use page_runtime::{Page, PageConfig};
use std::cell::RefCell;
use std::rc::Rc;

fn blank_page(config: PageConfig) -> Page {
    let _ = env_logger::builder().is_test(true).try_init();
    Page::from_html("<html><body><p>x</p></body></html>", "https://folio.test/", config).unwrap()
}

#[test]
fn timers_run_by_due_time_then_registration_order() {
    let mut page = blank_page(PageConfig::default());
    let log = Rc::new(RefCell::new(Vec::new()));
    for (name, delay) in [("late", 30), ("first", 10), ("second", 10)] {
        let log = Rc::clone(&log);
        page.set_timeout(Duration::from_millis(delay), move |page| {
            log.borrow_mut().push((name, page.now_ms()));
            Ok(())
        });
    }
    page.advance(Duration::from_millis(20)).unwrap();
    assert_eq!(*log.borrow(), vec![("first", 10), ("second", 10)]);
    assert_eq!(page.now_ms(), 20);

    page.advance(Duration::from_millis(20)).unwrap();
    assert_eq!(log.borrow().last(), Some(&("late", 30)));
    assert!(page.pending_timers().is_empty());
}

#[test]
fn cleared_timers_never_fire() {
    let mut page = blank_page(PageConfig::default());
    let fired = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&fired);
    let id = page.set_timeout(Duration::from_millis(5), move |_| {
        *flag.borrow_mut() = true;
        Ok(())
    });
    assert!(page.clear_timeout(id));
    assert!(!page.clear_timeout(id));
    page.advance(Duration::from_millis(50)).unwrap();
    assert!(!*fired.borrow());
}

#[test]
fn zero_delay_task_chains_within_one_advance() {
    let mut page = blank_page(PageConfig::default());
    let count = Rc::new(RefCell::new(0));
    let first = Rc::clone(&count);
    page.set_timeout(Duration::ZERO, move |page| {
        *first.borrow_mut() += 1;
        let second = Rc::clone(&first);
        page.set_timeout(Duration::ZERO, move |_| {
            *second.borrow_mut() += 1;
            Ok(())
        });
        Ok(())
    });
    page.run_pending().unwrap();
    assert_eq!(*count.borrow(), 2);
}

fn spin(page: &mut Page) {
    page.set_timeout(Duration::ZERO, |page| {
        spin(page);
        Ok(())
    });
}

#[test]
fn runaway_rescheduling_hits_the_step_limit() {
    let mut page = blank_page(PageConfig {
        step_limit: 50,
        ..PageConfig::default()
    });
    spin(&mut page);
    let err = page.advance(Duration::from_millis(1)).unwrap_err();
    assert!(err.to_string().contains("step limit"), "{err}");
}

#[test]
fn frames_land_on_budget_multiples_and_chain_to_the_next_frame() {
    let mut page = blank_page(PageConfig::default());
    page.advance(Duration::from_millis(5)).unwrap();
    let stamps = Rc::new(RefCell::new(Vec::new()));
    let outer = Rc::clone(&stamps);
    page.request_animation_frame(move |page, at| {
        outer.borrow_mut().push(at);
        let inner = Rc::clone(&outer);
        page.request_animation_frame(move |_, at| {
            inner.borrow_mut().push(at);
            Ok(())
        });
        Ok(())
    });
    page.advance(Duration::from_millis(100)).unwrap();
    assert_eq!(*stamps.borrow(), vec![16.0, 32.0]);
}

#[test]
fn frame_requests_before_a_frame_are_coalesced() {
    let mut page = blank_page(PageConfig::default());
    let hits = Rc::new(RefCell::new(0));
    for _ in 0..3 {
        let hits = Rc::clone(&hits);
        page.request_animation_frame(move |_, _| {
            *hits.borrow_mut() += 1;
            Ok(())
        });
    }
    page.advance(Duration::from_millis(16)).unwrap();
    assert_eq!(*hits.borrow(), 3);
    assert_eq!(page.scheduler().frames(), 1);
    assert_eq!(page.scheduler().coalesced(), 2);
}

#[test]
fn timer_due_with_a_frame_runs_first() {
    let mut page = blank_page(PageConfig::default());
    let order = Rc::new(RefCell::new(Vec::new()));
    let from_frame = Rc::clone(&order);
    page.advance(Duration::from_millis(1)).unwrap();
    page.request_animation_frame(move |_, _| {
        from_frame.borrow_mut().push("frame");
        Ok(())
    });
    let from_timer = Rc::clone(&order);
    page.set_timeout(Duration::from_millis(15), move |_| {
        from_timer.borrow_mut().push("timer");
        Ok(())
    });
    page.advance(Duration::from_millis(20)).unwrap();
    assert_eq!(*order.borrow(), vec!["timer", "frame"]);
}

#[test]
fn failing_task_is_reported_and_the_clock_keeps_going() {
    let mut page = blank_page(PageConfig::default());
    page.set_timeout(Duration::from_millis(1), |_| anyhow::bail!("boom"));
    let ran = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&ran);
    page.set_timeout(Duration::from_millis(2), move |_| {
        *flag.borrow_mut() = true;
        Ok(())
    });
    page.advance(Duration::from_millis(5)).unwrap();
    assert_eq!(page.errors(), ["boom".to_owned()]);
    assert!(*ran.borrow());
}
