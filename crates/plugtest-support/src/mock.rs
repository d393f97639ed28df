use std::fmt;

use anyhow::Result;

/// Lifecycle of a mock: record expectations, replay them, then verify.
pub trait MockControl {
    fn replay(&mut self) -> Result<()>;

    fn verify(&self) -> Result<()>;
}

/// Drives a group of mocks through replay and verification together.
#[derive(Default)]
pub struct MockManager {
    controls: Vec<Box<dyn MockControl>>,
}

impl MockManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, control: impl MockControl + 'static) {
        self.controls.push(Box::new(control));
    }

    pub fn clear(&mut self) {
        self.controls.clear();
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Replays every control in the order added; stops at the first failure.
    pub fn replay_all(&mut self) -> Result<()> {
        for control in &mut self.controls {
            control.replay()?;
        }
        Ok(())
    }

    /// Verifies every control in the order added; stops at the first failure.
    pub fn verify_all(&self) -> Result<()> {
        for control in &self.controls {
            control.verify()?;
        }
        Ok(())
    }
}

impl fmt::Debug for MockManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockManager")
            .field("controls", &self.controls.len())
            .finish()
    }
}
