//! Shared-PIN gate.
use crate::error::{AppError, AppResult};

pub const PIN_HEADER: &str = "x-family-pin";

#[derive(Debug, Clone)]
pub struct PinGate {
    pin: String,
}

impl PinGate {
    pub fn new(pin: impl Into<String>) -> Self {
        PinGate { pin: pin.into() }
    }

    /// Exact comparison against the configured PIN. A missing PIN never matches.
    pub fn verify(&self, presented: Option<&str>) -> AppResult<()> {
        match presented {
            Some(pin) if pin == self.pin => Ok(()),
            _ => Err(AppError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_pin_passes() {
        let gate = PinGate::new("1234");
        assert!(gate.verify(Some("1234")).is_ok());
        for wrong in ["0000", "12345", " 1234", "", "123"] {
            assert!(matches!(gate.verify(Some(wrong)), Err(AppError::Unauthorized)), "{wrong}");
        }
        assert!(gate.verify(None).is_err());
    }
}
