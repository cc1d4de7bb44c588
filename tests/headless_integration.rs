use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use quizr::app::{App, Screen};
use quizr::runtime::{QuizEvent, Runner, TestEventSource};
use quizr::session::{Session, WrongAnswer};
use quizr::sets::{BundledSource, Choice};
use quizr::store::MemoryStore;

// Headless integration using the internal runtime + App without a TTY.
// Key events and load completions flow through the same channel, exactly as
// in the production loop.

type TestApp = App<MemoryStore<Choice>, MemoryStore<WrongAnswer>>;

fn test_fixture() -> (TestApp, Runner<TestEventSource>, mpsc::Sender<QuizEvent>) {
    let (tx, rx) = mpsc::channel();
    let session = Session::new(MemoryStore::new(), MemoryStore::new());
    let app = App::new(session, Arc::new(BundledSource), tx.clone());
    let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(5));
    (app, runner, tx)
}

fn send_key(tx: &mpsc::Sender<QuizEvent>, code: KeyCode) {
    tx.send(QuizEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
        .unwrap();
}

/// Steps the loop until the predicate holds or the step budget runs out.
fn drive_until(
    app: &mut TestApp,
    runner: &Runner<TestEventSource>,
    mut done: impl FnMut(&TestApp) -> bool,
) {
    for _ in 0..200u32 {
        match runner.step() {
            QuizEvent::Key(key) => {
                app.handle_key(key);
            }
            QuizEvent::SetLoaded { token, outcome, .. } => app.on_set_loaded(token, outcome),
            QuizEvent::Resize | QuizEvent::Tick => {}
        }
        if done(app) {
            return;
        }
    }
    panic!("condition not reached within step budget");
}

#[test]
fn headless_answer_and_review_flow() {
    let (mut app, runner, tx) = test_fixture();

    app.request_set("SampleTest");
    drive_until(&mut app, &runner, |a| {
        a.session.active_set_name() == Some("SampleTest")
    });

    // Answer question 1 wrong (correct is A), check, then open the review
    // screen and delete the entry.
    send_key(&tx, KeyCode::Char('c'));
    send_key(&tx, KeyCode::Enter);
    drive_until(&mut app, &runner, |a| {
        a.session.result().is_some_and(|r| !r.correct)
    });
    assert_eq!(app.session.wrong_answers_for_current_set().len(), 1);

    send_key(&tx, KeyCode::Char('w'));
    drive_until(&mut app, &runner, |a| a.screen == Screen::Review);

    send_key(&tx, KeyCode::Char('d'));
    drive_until(&mut app, &runner, |a| {
        a.session.wrong_answers_for_current_set().is_empty()
    });

    send_key(&tx, KeyCode::Char('b'));
    drive_until(&mut app, &runner, |a| a.screen == Screen::Quiz);
}

#[test]
fn headless_rapid_set_switching_applies_the_latest_request() {
    let (mut app, runner, _tx) = test_fixture();

    // Fire three loads back to back; only the last may win, regardless of
    // the order the worker threads finish in.
    app.request_set("Regulations");
    app.request_set("Airspace");
    app.request_set("Weather");

    drive_until(&mut app, &runner, |a| {
        a.session.active_set_name().is_some() && a.pending_set.is_none()
    });

    assert_eq!(app.session.active_set_name(), Some("Weather"));
}

#[test]
fn headless_navigation_restores_selections() {
    let (mut app, runner, tx) = test_fixture();

    app.request_set("SampleTest");
    drive_until(&mut app, &runner, |a| {
        a.session.active_set_name() == Some("SampleTest")
    });

    // Pick A on question 1 and B on question 2.
    send_key(&tx, KeyCode::Char('a'));
    send_key(&tx, KeyCode::Right);
    send_key(&tx, KeyCode::Char('b'));
    drive_until(&mut app, &runner, |a| {
        a.session.progress() == Some((2, 3)) && a.session.selected() == Some(Choice::B)
    });

    // Stepping back restores the saved pick for question 1, and forward again
    // restores question 2's.
    send_key(&tx, KeyCode::Left);
    drive_until(&mut app, &runner, |a| a.session.progress() == Some((1, 3)));
    assert_eq!(app.session.selected(), Some(Choice::A));

    send_key(&tx, KeyCode::Right);
    drive_until(&mut app, &runner, |a| a.session.progress() == Some((2, 3)));
    assert_eq!(app.session.selected(), Some(Choice::B));
}

#[test]
fn headless_failed_load_notice_blocks_one_key() {
    let (mut app, runner, tx) = test_fixture();

    app.request_set("SampleTest");
    drive_until(&mut app, &runner, |a| {
        a.session.active_set_name() == Some("SampleTest")
    });

    app.request_set("Bogus");
    drive_until(&mut app, &runner, |a| a.notice.is_some());
    assert_eq!(app.session.active_set_name(), Some("SampleTest"));

    // First key only dismisses the notice; the next one selects.
    send_key(&tx, KeyCode::Char('a'));
    send_key(&tx, KeyCode::Char('b'));
    drive_until(&mut app, &runner, |a| a.session.selected() == Some(Choice::B));
    assert!(app.notice.is_none());
}
