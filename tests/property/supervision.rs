use std::time::{Duration, Instant};

use proptest::prelude::*;

use bigeye::engine::{CoreCommand, CoreRuntime, RuntimeEvent};
use bigeye::events::SupervisorEvent;
use bigeye::exec::{ExitCause, ExitResult, RunId};
use bigeye_test_utils::builders::{core_runtime, modified};

#[derive(Debug, Clone)]
enum Action {
    Change(u8),
    Advance(u64),
    ExitNaturally(i32),
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        any::<u8>().prop_map(Action::Change),
        (0u64..40).prop_map(Action::Advance),
        (0i32..3).prop_map(Action::ExitNaturally),
    ]
}

/// Backend model: at most one live child, stops complete immediately.
#[derive(Default)]
struct Model {
    live: Option<RunId>,
    last_run: RunId,
    pending: Vec<RuntimeEvent>,
    executing: usize,
    starts: usize,
    stops: usize,
    killed: usize,
}

impl Model {
    fn apply(&mut self, commands: Vec<CoreCommand>) -> Result<(), TestCaseError> {
        let mut announced = false;
        for command in commands {
            match command {
                CoreCommand::Emit(SupervisorEvent::Executing) => {
                    self.executing += 1;
                    announced = true;
                }
                CoreCommand::Emit(SupervisorEvent::Killed { .. }) => self.killed += 1,
                CoreCommand::Emit(_) => {}
                CoreCommand::StartChild { run_id } => {
                    prop_assert!(announced, "start without a preceding executing event");
                    prop_assert_eq!(self.live, None, "two children alive at once");
                    prop_assert!(run_id > self.last_run, "run ids must increase");
                    self.live = Some(run_id);
                    self.last_run = run_id;
                    self.starts += 1;
                    announced = false;
                }
                CoreCommand::StopChild { run_id, signal } => {
                    prop_assert_eq!(self.live, Some(run_id));
                    self.stops += 1;
                    self.live = None;
                    self.pending.push(RuntimeEvent::ChildExited {
                        run_id,
                        exit: exit(None),
                        cause: ExitCause::Killed {
                            signal,
                            escalated: false,
                        },
                    });
                }
                CoreCommand::Shutdown | CoreCommand::KillTimedOut { .. } => {
                    prop_assert!(false, "unexpected {:?}", command);
                }
            }
        }
        Ok(())
    }
}

fn exit(code: Option<i32>) -> ExitResult {
    ExitResult {
        exit_code: code,
        signal: None,
        duration: Duration::from_millis(1),
    }
}

fn drive(
    core: &mut CoreRuntime,
    model: &mut Model,
    event: RuntimeEvent,
    now: Instant,
) -> Result<(), TestCaseError> {
    let step = core.step(event, now);
    prop_assert!(step.keep_running);
    model.apply(step.commands)?;
    while !model.pending.is_empty() {
        let queued: Vec<_> = model.pending.drain(..).collect();
        for ev in queued {
            let step = core.step(ev, now);
            model.apply(step.commands)?;
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn at_most_one_child_and_every_stop_is_reported(
        lazy in any::<bool>(),
        actions in proptest::collection::vec(action_strategy(), 0..60),
    ) {
        let mut core = core_runtime(10, lazy);
        let mut model = Model::default();
        let mut now = Instant::now();

        let step = core.start(now);
        model.apply(step.commands)?;

        for action in actions {
            match action {
                Action::Change(n) => {
                    let ev = RuntimeEvent::FileChanged(modified(format!("/project/{n}")));
                    drive(&mut core, &mut model, ev, now)?;
                }
                Action::Advance(ms) => {
                    now += Duration::from_millis(ms);
                    drive(&mut core, &mut model, RuntimeEvent::Tick, now)?;
                }
                Action::ExitNaturally(code) => {
                    if let Some(run_id) = model.live.take() {
                        let ev = RuntimeEvent::ChildExited {
                            run_id,
                            exit: exit(Some(code)),
                            cause: ExitCause::Natural,
                        };
                        drive(&mut core, &mut model, ev, now)?;
                    }
                }
            }
            prop_assert_eq!(core.current_run(), model.live);
        }

        prop_assert_eq!(model.executing, model.starts);
        prop_assert_eq!(model.killed, model.stops);
    }
}
