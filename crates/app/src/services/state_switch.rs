//! State switch: the task that owns one delayed-revert switch.
//!
//! Every trigger (turn on, turn off, template result, revert deadline) is
//! handled by a single tokio task, one at a time, so transitions never
//! interleave. The revert timer is a deadline awaited inside the same
//! `select!` loop: when it fires, no other trigger can be half-way through.

use std::future::pending;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use tracing::Instrument;

use stateswitch_domain::action::ActionContext;
use stateswitch_domain::error::StateSwitchError;
use stateswitch_domain::switch::{RevertMachine, SwitchConfig, SwitchState};
use stateswitch_domain::template::TemplateResult;

use crate::ports::{ActionRunner, StatePublisher, TemplateStream};

const COMMAND_CAPACITY: usize = 32;

enum Command {
    Turn {
        target: SwitchState,
        reply: oneshot::Sender<SwitchState>,
    },
    Toggle {
        reply: oneshot::Sender<SwitchState>,
    },
    Template(TemplateResult),
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

enum Input {
    Command(Option<Command>),
    Template(Option<TemplateResult>),
    RevertDue,
}

/// Cloneable handle to a running switch.
#[derive(Clone)]
pub struct SwitchHandle {
    entity_id: String,
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SwitchState>,
}

impl std::fmt::Debug for SwitchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchHandle")
            .field("entity_id", &self.entity_id)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SwitchHandle {
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Latest state the switch transitioned to.
    #[must_use]
    pub fn state(&self) -> SwitchState {
        *self.state.borrow()
    }

    /// Watch transitions of this switch from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SwitchState> {
        let mut receiver = self.state.clone();
        receiver.borrow_and_update();
        receiver
    }

    /// Run the on-script and turn the switch on.
    ///
    /// Resolves once the transition is final, with the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`StateSwitchError::Stopped`] if the switch was torn down.
    pub async fn turn_on(&self) -> Result<SwitchState, StateSwitchError> {
        self.request(|reply| Command::Turn {
            target: SwitchState::On,
            reply,
        })
        .await
    }

    /// Run the off-script and turn the switch off.
    ///
    /// # Errors
    ///
    /// Returns [`StateSwitchError::Stopped`] if the switch was torn down.
    pub async fn turn_off(&self) -> Result<SwitchState, StateSwitchError> {
        self.request(|reply| Command::Turn {
            target: SwitchState::Off,
            reply,
        })
        .await
    }

    /// Turn off when on, turn on otherwise. The decision is taken by the
    /// switch task so it cannot race another trigger.
    ///
    /// # Errors
    ///
    /// Returns [`StateSwitchError::Stopped`] if the switch was torn down.
    pub async fn toggle(&self) -> Result<SwitchState, StateSwitchError> {
        self.request(|reply| Command::Toggle { reply }).await
    }

    /// Feed a template result, as a template source would.
    ///
    /// # Errors
    ///
    /// Returns [`StateSwitchError::Stopped`] if the switch was torn down.
    pub async fn template_update(&self, result: TemplateResult) -> Result<(), StateSwitchError> {
        self.commands
            .send(Command::Template(result))
            .await
            .map_err(|_| self.stopped())
    }

    /// Stop the switch task, cancelling any pending revert.
    ///
    /// Calling it on a switch that already stopped is a no-op.
    pub async fn shutdown(&self) {
        let (done, wait) = oneshot::channel();
        if self.commands.send(Command::Shutdown { done }).await.is_ok() {
            let _ = wait.await;
        }
    }

    /// Whether the switch task is still accepting commands.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn request(
        &self,
        command: impl FnOnce(oneshot::Sender<SwitchState>) -> Command,
    ) -> Result<SwitchState, StateSwitchError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| self.stopped())?;
        response.await.map_err(|_| self.stopped())
    }

    fn stopped(&self) -> StateSwitchError {
        StateSwitchError::Stopped {
            entity_id: self.entity_id.clone(),
        }
    }
}

/// The task side of a delayed-revert switch.
pub struct StateSwitch<R, P> {
    config: SwitchConfig,
    entity_id: String,
    machine: RevertMachine,
    revert_at: Option<Instant>,
    runner: R,
    publisher: P,
    commands: mpsc::Receiver<Command>,
    template: Option<TemplateStream>,
    state: watch::Sender<SwitchState>,
}

impl<R, P> StateSwitch<R, P>
where
    R: ActionRunner + Send + Sync + 'static,
    P: StatePublisher + Send + Sync + 'static,
{
    /// Spawn the switch task on the current runtime.
    ///
    /// With a template stream the initial state is the first result received
    /// from it, and the switch reads `Unknown` until that result arrives.
    /// Without one the switch starts `Off` and is optimistic.
    #[must_use]
    pub fn spawn(
        config: SwitchConfig,
        runner: R,
        publisher: P,
        template: Option<TemplateStream>,
    ) -> SwitchHandle {
        let entity_id = config.entity_id();
        let (commands_tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let initial = if template.is_some() {
            SwitchState::Unknown
        } else {
            SwitchState::default()
        };
        let (state, state_rx) = watch::channel(initial);
        let machine = RevertMachine::new(initial, config.revert_delay());

        let span = tracing::info_span!("switch", entity_id = %entity_id);
        let switch = Self {
            config,
            entity_id: entity_id.clone(),
            machine,
            revert_at: None,
            runner,
            publisher,
            commands,
            template,
            state,
        };
        tokio::spawn(switch.run().instrument(span));

        SwitchHandle {
            entity_id,
            commands: commands_tx,
            state: state_rx,
        }
    }

    async fn run(mut self) {
        tracing::info!(
            name = self.config.name(),
            delay_ms = self.config.revert_delay_ms,
            templated = self.template.is_some(),
            "switch started"
        );
        if let Err(err) = self
            .publisher
            .describe(&self.entity_id, self.config.name())
            .await
        {
            tracing::warn!(error = %err, "failed to publish friendly name");
        }
        if self.template.is_none() {
            self.notify().await;
        }

        loop {
            let input = tokio::select! {
                command = self.commands.recv() => Input::Command(command),
                result = next_template(&mut self.template) => Input::Template(result),
                () = wait_for(self.revert_at) => Input::RevertDue,
            };

            match input {
                Input::Command(Some(Command::Turn { target, reply })) => {
                    let state = self.turn(target).await;
                    let _ = reply.send(state);
                }
                Input::Command(Some(Command::Toggle { reply })) => {
                    let target = if self.machine.current().is_on() {
                        SwitchState::Off
                    } else {
                        SwitchState::On
                    };
                    let state = self.turn(target).await;
                    let _ = reply.send(state);
                }
                Input::Command(Some(Command::Template(result)))
                | Input::Template(Some(result)) => self.apply_template(&result).await,
                Input::Template(None) => {
                    tracing::debug!("template stream closed");
                    self.template = None;
                }
                Input::RevertDue => self.revert().await,
                Input::Command(Some(Command::Shutdown { done })) => {
                    self.stop();
                    let _ = done.send(());
                    return;
                }
                Input::Command(None) => {
                    self.stop();
                    return;
                }
            }
        }
    }

    async fn turn(&mut self, target: SwitchState) -> SwitchState {
        self.cancel_revert();

        let (script, service) = match target {
            SwitchState::On => (&self.config.turn_on, "turn_on"),
            _ => (&self.config.turn_off, "turn_off"),
        };
        let context = ActionContext::new(self.entity_id.clone(), service);
        if let Err(err) = self.runner.run(script, &context).await {
            // A failed action does not block the transition.
            tracing::warn!(service, context = %context.id, error = %err, "action failed");
        }

        let transition = self.machine.turn(target);
        if let Some(pending) = transition.scheduled {
            self.revert_at = Some(Instant::now() + pending.delay);
            tracing::debug!(
                revert_to = %pending.revert_to,
                delay_ms = self.config.revert_delay_ms,
                "revert scheduled"
            );
        }
        tracing::info!(from = %transition.previous, to = %transition.current, service, "switch turned");
        self.notify().await;
        transition.current
    }

    async fn apply_template(&mut self, result: &TemplateResult) {
        self.cancel_revert();
        let state = self.machine.apply_template(result);
        if let TemplateResult::Error(message) = result {
            tracing::warn!(error = %message, "template evaluation failed");
        }
        tracing::info!(%result, to = %state, "template update");
        self.notify().await;
    }

    async fn revert(&mut self) {
        self.revert_at = None;
        if let Some(state) = self.machine.revert() {
            tracing::info!(to = %state, "reverted");
            self.notify().await;
        }
    }

    fn cancel_revert(&mut self) {
        self.revert_at = None;
        if self.machine.cancel_pending() {
            tracing::debug!("pending revert cancelled");
        }
    }

    fn stop(&mut self) {
        self.cancel_revert();
        tracing::info!(state = %self.machine.current(), "switch stopped");
    }

    async fn notify(&mut self) {
        let state = self.machine.current();
        self.state.send_replace(state);
        if let Err(err) = self.publisher.notify(&self.entity_id, state).await {
            tracing::warn!(error = %err, "failed to publish state");
        }
    }
}

async fn next_template(stream: &mut Option<TemplateStream>) -> Option<TemplateResult> {
    match stream {
        Some(rx) => rx.recv().await,
        None => pending().await,
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => pending().await,
    }
}
