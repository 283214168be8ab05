use std::fmt;

/// Pan/tilt motor selector understood by motord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motor {
    Pan,
    Tilt,
}

impl AsRef<str> for Motor {
    fn as_ref(&self) -> &str {
        match self {
            Motor::Pan => "pan",
            Motor::Tilt => "tilt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl AsRef<str> for Direction {
    fn as_ref(&self) -> &str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        }
    }
}

/// A single motord instruction. The `Display` impl is the exact text written
/// to the event file; values are passed through without validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move {
        motor: String,
        direction: String,
        steps: String,
    },
    Goto {
        horizontal: String,
        vertical: String,
    },
}

impl Command {
    pub fn motor_move(
        motor: impl AsRef<str>,
        direction: impl AsRef<str>,
        steps: impl AsRef<str>,
    ) -> Self {
        Command::Move {
            motor: motor.as_ref().to_string(),
            direction: direction.as_ref().to_string(),
            steps: steps.as_ref().to_string(),
        }
    }

    pub fn goto(horizontal: impl AsRef<str>, vertical: impl AsRef<str>) -> Self {
        Command::Goto {
            horizontal: horizontal.as_ref().to_string(),
            vertical: vertical.as_ref().to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move {
                motor,
                direction,
                steps,
            } => write!(f, "{} {} {}", motor, direction, steps),
            Command::Goto {
                horizontal,
                vertical,
            } => write!(f, "goto {} {}", horizontal, vertical),
        }
    }
}
