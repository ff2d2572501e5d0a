use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SliceError {
    #[error("Invalid slice '{0}'. Expected 'START:STOP:STEP' with START < STOP and STEP >= 1.")]
    Invalid(String),
}

/// Selects molecules by position: `start, start + step, ...` while `< stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MolSlice {
    start: usize,
    stop: usize,
    step: usize,
}

impl MolSlice {
    pub fn new(start: usize, stop: usize, step: usize) -> Result<Self, SliceError> {
        if start >= stop || step == 0 {
            return Err(SliceError::Invalid(format!("{start}:{stop}:{step}")));
        }
        Ok(Self { start, stop, step })
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.stop && (position - self.start) % self.step == 0
    }

    /// Applies the slice to any iterator, keeping the selected items in order.
    pub fn apply<I: IntoIterator>(&self, items: I) -> impl Iterator<Item = I::Item> {
        items
            .into_iter()
            .skip(self.start)
            .take(self.stop - self.start)
            .step_by(self.step)
    }
}

impl FromStr for MolSlice {
    type Err = SliceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let parse = |p: &str| p.parse::<usize>().map_err(|_| SliceError::Invalid(s.to_string()));
        match parts.as_slice() {
            [start, stop] => Self::new(parse(*start)?, parse(*stop)?, 1),
            [start, stop, step] => Self::new(parse(*start)?, parse(*stop)?, parse(*step)?),
            _ => Err(SliceError::Invalid(s.to_string())),
        }
        .map_err(|_| SliceError::Invalid(s.to_string()))
    }
}

impl fmt::Display for MolSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.stop, self.step)
    }
}
