//! Counterexample representation and rendering.
//!
//! When a property violation is detected, a counterexample shows
//! the sequence of producer and consumer operations that led to it.

use std::fmt;

/// A counterexample showing the failure path.
///
/// Holds the buffer states and the producer/consumer actions leading
/// up to an invariant violation. Renders as a two-column diagram.
#[derive(Debug, Clone, Default)]
pub struct Counterexample {
    /// Sequence of state snapshots
    pub states: Vec<StateSnapshot>,
    /// Operations in the order they were applied
    pub actions: Vec<ActorAction>,
    /// DST seed for reproduction (if applicable)
    pub dst_seed: Option<u64>,
    /// Human-readable description of the failure
    pub description: Option<String>,
}

/// Snapshot of buffer state at a point in time.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    /// Step number in the execution
    pub step: u64,
    /// Description of the state
    pub description: String,
    /// Variable values at this point
    pub variables: Vec<(String, String)>,
}

/// Which side of the FIFO performed an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Actor {
    Producer,
    Consumer,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Producer => f.write_str("Producer"),
            Actor::Consumer => f.write_str("Consumer"),
        }
    }
}

/// Action taken by the producer or the consumer.
#[derive(Debug, Clone)]
pub struct ActorAction {
    pub actor: Actor,
    /// Step number when this action occurred
    pub step: u64,
    /// Description of the action, e.g. `push(7)`
    pub action: String,
    /// Whether the operation succeeded
    pub success: bool,
}

impl Counterexample {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a counterexample with DST seed for reproduction.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        debug_assert!(seed != 0, "DST seed should not be zero");
        Self {
            dst_seed: Some(seed),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a state snapshot. Steps must be strictly increasing.
    pub fn add_state(&mut self, state: StateSnapshot) {
        debug_assert!(
            self.states.last().map_or(true, |last| state.step > last.step),
            "States must be added in order"
        );
        self.states.push(state);
    }

    pub fn add_action(&mut self, action: ActorAction) {
        self.actions.push(action);
    }

    /// Render the counterexample as a producer/consumer diagram.
    ///
    /// ```text
    /// DST_SEED=12345
    ///
    /// Step | Producer   | Consumer   | State
    /// -----|------------|------------|------
    ///    1 | push(1)    |            | count=1
    ///    2 |            | pop()      | count=0
    ///    3 |            | pop() [FAIL] | count=0
    /// ```
    #[must_use]
    pub fn render_diagram(&self) -> String {
        let mut output = String::new();

        if let Some(seed) = self.dst_seed {
            output.push_str(&format!("DST_SEED={}\n\n", seed));
        }

        if let Some(ref desc) = self.description {
            output.push_str("Failure: ");
            output.push_str(desc);
            output.push_str("\n\n");
        }

        if self.actions.is_empty() {
            output.push_str("(no actions recorded)\n");
            return output;
        }

        output.push_str("Step | Producer   | Consumer   | State\n");
        output.push_str("-----|------------|------------|------\n");

        let max_step = self.actions.iter().map(|a| a.step).max().unwrap_or(0);

        for step in 1..=max_step {
            output.push_str(&format!("{:4} |", step));

            for actor in [Actor::Producer, Actor::Consumer] {
                let action = self
                    .actions
                    .iter()
                    .find(|a| a.step == step && a.actor == actor);

                match action {
                    Some(a) => {
                        let status = if a.success { "" } else { " [FAIL]" };
                        output.push_str(&format!(" {:<10}{} |", a.action, status));
                    }
                    None => output.push_str("            |"),
                }
            }

            if let Some(state) = self.states.iter().find(|s| s.step == step) {
                output.push_str(&format!(" {}", state.description));
            }

            output.push('\n');
        }

        output
    }
}
