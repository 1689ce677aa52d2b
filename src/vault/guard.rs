use crate::error::VaultError;

/// Non-reentrancy flag held for the duration of a vault operation.
#[derive(Copy, Clone, Debug, Default)]
pub struct ReentrancyGuard {
    entered: bool,
}

impl ReentrancyGuard {
    pub fn enter(&mut self) -> Result<(), VaultError> {
        if self.entered {
            return Err(VaultError::Reentrancy);
        }
        self.entered = true;
        Ok(())
    }

    pub fn exit(&mut self) {
        self.entered = false;
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }
}
