//! Tests for debounced subscriptions driven by the scheduler.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use formwork::prelude::*;

fn email_form() -> GroupControl {
    GroupSchema::new()
        .group(
            "emailGroup",
            GroupSchema::new().field(
                "email",
                FieldSchema::new("")
                    .required()
                    .pattern("[a-z0-9._%+-]+@[a-z0-9.-]+")
                    .unwrap(),
            ),
        )
        .build()
        .unwrap()
}

#[test]
fn test_rapid_changes_fire_once_with_last_value() {
    let (scheduler, clock) = Scheduler::manual();
    let form = email_form();
    let email = form.field("emailGroup.email").unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let s = Rc::clone(&seen);
    let _sub = email.debounce_value_changes(&scheduler, Duration::from_millis(1000), move |snap| {
        s.borrow_mut().push(snap.value.to_string());
    });

    email.set_value("j");
    clock.advance(Duration::from_millis(400));
    scheduler.run_due();
    email.set_value("ja");
    clock.advance(Duration::from_millis(400));
    scheduler.run_due();
    email.set_value("jack@example.com");
    assert!(seen.borrow().is_empty());

    clock.advance(Duration::from_millis(999));
    scheduler.run_due();
    assert!(seen.borrow().is_empty());

    clock.advance(Duration::from_millis(1));
    scheduler.run_due();
    assert_eq!(*seen.borrow(), vec!["jack@example.com"]);
}

#[test]
fn test_dropping_subscription_cancels_timer() {
    let (scheduler, clock) = Scheduler::manual();
    let form = email_form();
    let email = form.field("emailGroup.email").unwrap();
    let fired = Rc::new(RefCell::new(0));

    let f = Rc::clone(&fired);
    let sub = email.debounce_value_changes(&scheduler, Duration::from_secs(1), move |_| {
        *f.borrow_mut() += 1;
    });
    email.set_value("x");
    assert_eq!(scheduler.pending(), 1);

    drop(sub);
    assert_eq!(scheduler.pending(), 0);
    clock.advance(Duration::from_secs(2));
    assert_eq!(scheduler.run_due(), 0);
    assert_eq!(*fired.borrow(), 0);
}

#[test]
fn test_removing_control_cancels_timer() {
    let (scheduler, clock) = Scheduler::manual();
    let form = email_form();
    let email = form.field("emailGroup.email").unwrap();
    let fired = Rc::new(RefCell::new(0));

    let f = Rc::clone(&fired);
    let _sub = email.debounce_value_changes(&scheduler, Duration::from_secs(1), move |_| {
        *f.borrow_mut() += 1;
    });
    email.set_value("x");
    form.group("emailGroup").unwrap().remove_control("email");

    clock.advance(Duration::from_secs(1));
    scheduler.run_due();
    assert_eq!(*fired.borrow(), 0);
}

#[test]
fn test_callback_observes_state_at_expiry() {
    let (scheduler, clock) = Scheduler::manual();
    let form = email_form();
    let email = form.field("emailGroup.email").unwrap();
    let table = ValidationMessageTable::new()
        .with(ErrorKind::Required, "Please enter your email address")
        .with(ErrorKind::Pattern, "Please enter a valid email address");
    let message = State::new(String::new());

    let m = message.clone();
    let _sub = email.debounce_value_changes(&scheduler, Duration::from_secs(1), move |snap| {
        m.set(table.message_for_field(snap, MessageVisibility::WhenInteracted));
    });

    email.set_value("not-an-email");
    clock.advance(Duration::from_secs(1));
    scheduler.run_due();
    assert_eq!(message.get(), "Please enter a valid email address");

    email.set_value("");
    clock.advance(Duration::from_secs(1));
    scheduler.run_due();
    assert_eq!(message.get(), "Please enter your email address");

    email.set_value("jack@example.com");
    clock.advance(Duration::from_secs(1));
    scheduler.run_due();
    assert_eq!(message.get(), "");
}

#[tokio::test(start_paused = true)]
async fn test_runtime_clock_drives_timers() {
    let scheduler = Scheduler::new();
    let form = email_form();
    let email = form.field("emailGroup.email").unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let s = Rc::clone(&seen);
    let _sub = email.debounce_value_changes(&scheduler, Duration::from_secs(1), move |snap| {
        s.borrow_mut().push(snap.value.to_string());
    });

    email.set_value("a");
    tokio::time::sleep(Duration::from_millis(500)).await;
    email.set_value("ab");

    let fired = scheduler.run_until_idle().await;
    assert_eq!(fired, 1);
    assert_eq!(*seen.borrow(), vec!["ab"]);
}
