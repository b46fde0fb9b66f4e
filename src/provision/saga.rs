use tracing::{debug, error, warn};

use super::error::{CompensationFailed, error_chain};
use crate::remote::RemoteError;

/// Stages of one provisioning attempt.
///
/// ```text
/// Idle → Creating → Created → Publishing → Published
///           ↘ CreateFailed        ↘ PublishFailed → Compensating → Compensated
///                                                               ↘ CompensationFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Creating,
    Created,
    Publishing,
    Published,
    CreateFailed,
    PublishFailed,
    Compensating,
    Compensated,
    CompensationFailed,
}

impl Stage {
    pub fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, next),
            (Idle, Creating)
                | (Creating, Created)
                | (Creating, CreateFailed)
                | (Created, Publishing)
                | (Publishing, Published)
                | (Publishing, PublishFailed)
                | (PublishFailed, Compensating)
                | (Compensating, Compensated)
                | (Compensating, CompensationFailed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Stage::Published | Stage::CreateFailed | Stage::Compensated | Stage::CompensationFailed
        )
    }
}

/// Stage tracker for a single attempt.
#[derive(Debug)]
pub(crate) struct Saga {
    stage: Stage,
    history: Vec<Stage>,
}

impl Saga {
    pub(crate) fn new() -> Self {
        Self {
            stage: Stage::Idle,
            history: vec![Stage::Idle],
        }
    }

    pub(crate) fn advance(&mut self, next: Stage) {
        if !self.stage.can_advance_to(next) {
            warn!(from = ?self.stage, to = ?next, "unexpected stage transition");
        }
        debug!(from = ?self.stage, to = ?next, "stage");
        self.stage = next;
        self.history.push(next);
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn history(&self) -> &[Stage] {
        &self.history
    }
}

type Action<'a> = Box<dyn FnOnce() -> Result<(), RemoteError> + 'a>;

/// Undo actions for forward steps that already took effect.
///
/// Actions run last-in first-out. Dropping the stack without calling
/// [`Compensations::run`] discards them.
#[derive(Default)]
pub struct Compensations<'a> {
    actions: Vec<(String, Action<'a>)>,
}

impl<'a> Compensations<'a> {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Register an undo action. `target` names what it cleans up and is
    /// reported if the action fails.
    pub fn push<F>(&mut self, target: impl Into<String>, action: F)
    where
        F: FnOnce() -> Result<(), RemoteError> + 'a,
    {
        self.actions.push((target.into(), Box::new(action)));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Forget every registered action; the forward steps are final.
    pub fn disarm(mut self) {
        self.actions.clear();
    }

    /// Run every action, newest first. A failing action does not stop the
    /// ones registered before it.
    pub fn run(mut self) -> Vec<CompensationFailed> {
        let mut failures = Vec::new();
        while let Some((target, action)) = self.actions.pop() {
            match action() {
                Ok(()) => debug!(repo = %target, "compensated"),
                Err(source) => {
                    error!(
                        repo = %target,
                        error = %error_chain(&source),
                        "compensation failed, manual cleanup required"
                    );
                    failures.push(CompensationFailed { target, source });
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn legal_transitions() {
        assert!(Stage::Idle.can_advance_to(Stage::Creating));
        assert!(Stage::Creating.can_advance_to(Stage::CreateFailed));
        assert!(Stage::Publishing.can_advance_to(Stage::PublishFailed));
        assert!(Stage::Compensating.can_advance_to(Stage::CompensationFailed));

        assert!(!Stage::Idle.can_advance_to(Stage::Published));
        assert!(!Stage::CreateFailed.can_advance_to(Stage::Compensating));
        assert!(!Stage::Published.can_advance_to(Stage::Compensating));
    }

    #[test]
    fn terminal_stages() {
        let terminal: Vec<Stage> = [
            Stage::Idle,
            Stage::Creating,
            Stage::Created,
            Stage::Publishing,
            Stage::Published,
            Stage::CreateFailed,
            Stage::PublishFailed,
            Stage::Compensating,
            Stage::Compensated,
            Stage::CompensationFailed,
        ]
        .into_iter()
        .filter(|s| s.is_terminal())
        .collect();
        assert_eq!(
            terminal,
            vec![
                Stage::Published,
                Stage::CreateFailed,
                Stage::Compensated,
                Stage::CompensationFailed
            ]
        );
    }

    #[test]
    fn saga_records_history() {
        let mut saga = Saga::new();
        saga.advance(Stage::Creating);
        saga.advance(Stage::CreateFailed);
        assert_eq!(saga.stage(), Stage::CreateFailed);
        assert_eq!(
            saga.history(),
            &[Stage::Idle, Stage::Creating, Stage::CreateFailed]
        );
    }

    #[test]
    fn run_is_lifo_and_continues_after_failure() {
        let log = RefCell::new(Vec::new());
        let mut undo = Compensations::new();
        undo.push("first", || {
            log.borrow_mut().push("first");
            Ok(())
        });
        undo.push("second", || {
            log.borrow_mut().push("second");
            Err(RemoteError::Other("gone".into()))
        });
        assert_eq!(undo.len(), 2);

        let failures = undo.run();

        assert_eq!(*log.borrow(), vec!["second", "first"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].target, "second");
    }

    #[test]
    fn disarm_skips_actions() {
        let ran = RefCell::new(false);
        let mut undo = Compensations::new();
        undo.push("repo", || {
            *ran.borrow_mut() = true;
            Ok(())
        });
        undo.disarm();
        assert!(!*ran.borrow());
    }

    #[test]
    fn empty_stack_runs_clean() {
        let undo = Compensations::new();
        assert!(undo.is_empty());
        assert!(undo.run().is_empty());
    }
}
