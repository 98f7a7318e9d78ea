// tests/property/supervisor_core.rs
//
// Randomised event sequences against the pure supervisor core.

use std::time::Duration;

use proptest::prelude::*;
use tokio::time::Instant;

use simloop::engine::{CoreCommand, CoreStep, SupervisorCore, SupervisorEvent};
use simloop::types::{ChangeEvent, RunId, RunOutcome, WindowId};

const DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy)]
enum Action {
    /// A file change, `gap_ms` after the previous action.
    Change { gap_ms: u64 },
    /// The armed debounce timer fires (or a stale one, when none is armed).
    FireTimer,
    /// The running task exits with this outcome.
    Finish(RunOutcome),
    Stop,
}

fn outcome_strategy() -> impl Strategy<Value = RunOutcome> {
    prop_oneof![
        Just(RunOutcome::Success),
        Just(RunOutcome::Failure),
        Just(RunOutcome::Cancelled),
    ]
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => (0u64..1_000).prop_map(|gap_ms| Action::Change { gap_ms }),
        3 => Just(Action::FireTimer),
        3 => outcome_strategy().prop_map(Action::Finish),
        1 => Just(Action::Stop),
    ]
}

/// Drives the core the way the runtime does and checks invariants after
/// every step.
struct Driver {
    core: SupervisorCore,
    now: Instant,
    armed: Option<(WindowId, Instant)>,
    running: Option<RunId>,
    cancelled: Vec<RunId>,
    started: Vec<RunId>,
    results: Vec<(RunId, RunOutcome)>,
    exited: bool,
}

impl Driver {
    fn new() -> Self {
        let now = Instant::now();
        let mut driver = Self {
            core: SupervisorCore::new(DEBOUNCE),
            now,
            armed: None,
            running: None,
            cancelled: Vec::new(),
            started: Vec::new(),
            results: Vec::new(),
            exited: false,
        };
        let step = driver.core.bootstrap(now);
        driver.apply(step);
        driver
    }

    fn apply(&mut self, step: CoreStep) {
        for command in step.commands {
            match command {
                CoreCommand::ArmDebounce { window, deadline } => {
                    assert!(self.armed.is_none(), "a window is armed at most once");
                    self.armed = Some((window, deadline));
                }
                CoreCommand::DisarmDebounce => self.armed = None,
                CoreCommand::StartTask { run_id } => {
                    assert!(self.running.is_none(), "two tasks would overlap");
                    assert!(!self.exited);
                    if let Some(last) = self.started.last() {
                        assert_eq!(run_id, last + 1, "run ids are consecutive");
                    }
                    self.started.push(run_id);
                    self.running = Some(run_id);
                }
                CoreCommand::CancelTask { run_id } => {
                    assert_eq!(self.running, Some(run_id));
                    assert!(!self.cancelled.contains(&run_id), "cancel requested twice");
                    self.cancelled.push(run_id);
                }
                CoreCommand::EmitResult(result) => {
                    assert_eq!(self.running, Some(result.run_id), "result for current run");
                    assert!(result.finished_at >= result.started_at);
                    self.results.push((result.run_id, result.outcome));
                    self.running = None;
                }
                CoreCommand::Exit => {
                    assert!(self.running.is_none(), "exit only once the task is gone");
                    self.exited = true;
                }
            }
        }
        assert_eq!(step.keep_running, !self.exited);
    }

    fn act(&mut self, action: Action) {
        if self.exited {
            return;
        }
        let event = match action {
            Action::Change { gap_ms } => {
                self.now += Duration::from_millis(gap_ms);
                SupervisorEvent::FileChanged(ChangeEvent::new("src/App.swift", self.now))
            }
            Action::FireTimer => match self.armed.take() {
                Some((window, deadline)) => {
                    self.now = self.now.max(deadline);
                    SupervisorEvent::DebounceElapsed { window }
                }
                None => SupervisorEvent::DebounceElapsed { window: 10_000 },
            },
            Action::Finish(outcome) => {
                self.now += Duration::from_millis(5);
                SupervisorEvent::TaskFinished {
                    // A stale id when nothing runs; the core must ignore it.
                    run_id: self.running.unwrap_or(9_999),
                    exit_status: None,
                    outcome,
                    finished_at: self.now,
                }
            }
            Action::Stop => SupervisorEvent::StopRequested,
        };
        let step = self.core.step(event, self.now);
        self.apply(step);
    }
}

proptest! {
    #[test]
    fn at_most_one_task_and_one_result_per_run(
        actions in proptest::collection::vec(action_strategy(), 0..80)
    ) {
        let mut driver = Driver::new();
        for action in actions {
            driver.act(action);
        }

        // Every finished run was reported exactly once, in start order.
        let reported: Vec<RunId> = driver.results.iter().map(|(id, _)| *id).collect();
        let expected: Vec<RunId> = driver
            .started
            .iter()
            .copied()
            .filter(|id| Some(*id) != driver.running)
            .collect();
        prop_assert_eq!(reported, expected);

        // A run we cancelled never reports a plain failure.
        for (id, outcome) in &driver.results {
            if driver.cancelled.contains(id) {
                prop_assert_ne!(*outcome, RunOutcome::Failure);
            }
        }
    }

    #[test]
    fn burst_within_window_starts_exactly_one_run(
        gaps in proptest::collection::vec(0u64..60, 1..20)
    ) {
        // Total burst length stays below the debounce interval.
        prop_assume!(gaps.iter().sum::<u64>() < DEBOUNCE.as_millis() as u64);

        let mut driver = Driver::new();
        driver.act(Action::Finish(RunOutcome::Success));
        prop_assert!(driver.core.is_idle());

        for gap_ms in gaps {
            driver.act(Action::Change { gap_ms });
        }
        driver.act(Action::FireTimer);

        prop_assert_eq!(driver.started.clone(), vec![1, 2]);
        prop_assert!(driver.core.pending().is_none());
    }

    #[test]
    fn any_number_of_triggers_during_a_run_owe_one_rerun(windows in 1usize..10) {
        let mut driver = Driver::new();
        for _ in 0..windows {
            driver.act(Action::Change { gap_ms: 10 });
            driver.act(Action::FireTimer);
        }
        prop_assert_eq!(driver.cancelled.clone(), vec![1]);
        prop_assert_eq!(driver.started.clone(), vec![1]);

        driver.act(Action::Finish(RunOutcome::Failure));
        prop_assert_eq!(driver.started.clone(), vec![1, 2]);
        prop_assert_eq!(driver.results.clone(), vec![(1, RunOutcome::Cancelled)]);

        driver.act(Action::Finish(RunOutcome::Success));
        prop_assert!(driver.core.is_idle());
        prop_assert_eq!(driver.started.clone(), vec![1, 2]);
    }

    #[test]
    fn nothing_starts_after_stop(
        before in proptest::collection::vec(action_strategy(), 0..30),
        after in proptest::collection::vec(action_strategy(), 0..30),
    ) {
        let mut driver = Driver::new();
        for action in before {
            driver.act(action);
        }
        driver.act(Action::Stop);
        let started_at_stop = driver.started.len();
        for action in after {
            driver.act(action);
        }
        prop_assert_eq!(driver.started.len(), started_at_stop);
        prop_assert!(driver.core.is_stopping() || driver.exited);
    }
}
