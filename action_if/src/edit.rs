//! # Operator edit commands
//!
//! An action is specified by editing any sufficient subset of six kinematic quantities. Each
//! quantity is identified by a [`Role`] tag. Operators (and edit scripts) drive the tool with
//! one-line commands parsed into a [`ToolCmd`]:
//!
//! - `v 0.2`, `w=-30`: set the raw text of a quantity.
//! - `v`, `clear v`: clear a quantity.
//! - `confirm`: emit the resolved action if the set is ready.
//! - `reset`: clear every quantity.
//! - `show`, `pause`, `resume`, `cancel`, `lock`, `unlock`, `odom`, `help`, `quit`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The role of a kinematic quantity in an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Linear speed (m/s)
    V,
    /// Angular speed (deg/s)
    W,
    /// Turn radius (m)
    R,
    /// Arc length or linear distance (m)
    S,
    /// Turn angle (deg)
    A,
    /// Duration (s)
    T,
}

/// A command which edits the action being specified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditCmd {
    /// Set the raw text of a quantity.
    Set { role: Role, text: String },

    /// Clear a quantity back to void.
    Clear(Role),

    /// Emit the resolved action, if the set is ready.
    Confirm,

    /// Clear all quantities.
    Reset,
}

/// Any command accepted by the operator tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolCmd {
    Edit(EditCmd),
    Show,
    Pause,
    Resume,
    Cancel,
    Lock,
    Unlock,
    Odom,

    /// Reset the chassis odometry.
    ZeroOdom,

    /// Adjust the zero position of the steering, in degrees.
    Steer(f64),
    Help,
    Quit,
}

/// Possible errors when parsing a command.
#[derive(Debug, Error, PartialEq)]
pub enum EditParseError {
    #[error("The command is empty")]
    Empty,

    #[error("{0} is not a recognised command")]
    UnknownCommand(String),

    #[error("{0} is not a recognised quantity, expected one of v, w, r, s, a, t")]
    UnknownRole(String),

    #[error("The {0} command expects a quantity")]
    MissingRole(&'static str),

    #[error("Unexpected argument \"{0}\"")]
    UnexpectedArgument(String),

    #[error("The {0} command expects a number, got \"{1}\"")]
    InvalidNumber(&'static str, String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Role {
    /// All roles, in the order in which they are displayed and solved.
    pub const ALL: [Role; 6] = [Role::V, Role::W, Role::R, Role::S, Role::A, Role::T];

    /// Position of the role in [`Role::ALL`].
    pub fn index(self) -> usize {
        match self {
            Role::V => 0,
            Role::W => 1,
            Role::R => 2,
            Role::S => 3,
            Role::A => 4,
            Role::T => 5,
        }
    }

    /// The one-letter tag of the role.
    pub fn tag(self) -> &'static str {
        match self {
            Role::V => "v",
            Role::W => "w",
            Role::R => "r",
            Role::S => "s",
            Role::A => "a",
            Role::T => "t",
        }
    }

    /// Human readable name of the quantity.
    pub fn name(self) -> &'static str {
        match self {
            Role::V => "linear speed",
            Role::W => "angular speed",
            Role::R => "turn radius",
            Role::S => "distance",
            Role::A => "turn angle",
            Role::T => "duration",
        }
    }

    /// Operator-facing units of the quantity.
    pub fn units(self) -> &'static str {
        match self {
            Role::V => "m/s",
            Role::W => "deg/s",
            Role::R | Role::S => "m",
            Role::A => "deg",
            Role::T => "s",
        }
    }

    /// The quantity which must share this quantity's sign, if any.
    ///
    /// Linear speed and distance describe the same forward/backward direction, angular speed and
    /// turn angle the same rotational direction.
    pub fn conjugate(self) -> Option<Role> {
        match self {
            Role::V => Some(Role::S),
            Role::S => Some(Role::V),
            Role::W => Some(Role::A),
            Role::A => Some(Role::W),
            Role::R | Role::T => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for Role {
    type Err = EditParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v" => Ok(Role::V),
            "w" => Ok(Role::W),
            "r" => Ok(Role::R),
            "s" => Ok(Role::S),
            "a" => Ok(Role::A),
            "t" => Ok(Role::T),
            other => Err(EditParseError::UnknownRole(other.to_string())),
        }
    }
}

impl FromStr for ToolCmd {
    type Err = EditParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();

        if line.is_empty() {
            return Err(EditParseError::Empty);
        }

        // Assignment form, `v = 0.1`
        if let Some((lhs, rhs)) = line.split_once('=') {
            let role: Role = lhs.parse()?;
            return Ok(ToolCmd::Edit(set_or_clear(role, rhs)));
        }

        let mut words = line.split_whitespace();
        let head = match words.next() {
            Some(h) => h.to_lowercase(),
            None => return Err(EditParseError::Empty),
        };
        let rest: Vec<&str> = words.collect();

        // Commands which take no argument
        let bare = match head.as_str() {
            "confirm" | "ok" => Some(ToolCmd::Edit(EditCmd::Confirm)),
            "reset" => Some(ToolCmd::Edit(EditCmd::Reset)),
            "show" => Some(ToolCmd::Show),
            "pause" => Some(ToolCmd::Pause),
            "resume" => Some(ToolCmd::Resume),
            "cancel" => Some(ToolCmd::Cancel),
            "lock" => Some(ToolCmd::Lock),
            "unlock" => Some(ToolCmd::Unlock),
            "odom" => Some(ToolCmd::Odom),
            "zero" => Some(ToolCmd::ZeroOdom),
            "help" | "?" => Some(ToolCmd::Help),
            "quit" | "exit" => Some(ToolCmd::Quit),
            _ => None,
        };

        if let Some(cmd) = bare {
            return match rest.first() {
                Some(arg) => Err(EditParseError::UnexpectedArgument(arg.to_string())),
                None => Ok(cmd),
            };
        }

        if head == "clear" {
            return match rest.as_slice() {
                [] => Err(EditParseError::MissingRole("clear")),
                [tag] => Ok(ToolCmd::Edit(EditCmd::Clear(tag.parse()?))),
                [_, extra, ..] => Err(EditParseError::UnexpectedArgument(extra.to_string())),
            };
        }

        if head == "steer" {
            return match rest.as_slice() {
                [] => Err(EditParseError::InvalidNumber("steer", String::new())),
                [deg] => match deg.parse::<f64>() {
                    Ok(d) if d.is_finite() => Ok(ToolCmd::Steer(d)),
                    _ => Err(EditParseError::InvalidNumber("steer", deg.to_string())),
                },
                [_, extra, ..] => Err(EditParseError::UnexpectedArgument(extra.to_string())),
            };
        }

        match head.parse::<Role>() {
            Ok(role) => Ok(ToolCmd::Edit(set_or_clear(role, &rest.join(" ")))),
            Err(_) => Err(EditParseError::UnknownCommand(head)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn set_or_clear(role: Role, text: &str) -> EditCmd {
    let text = text.trim();

    if text.is_empty() {
        EditCmd::Clear(role)
    } else {
        EditCmd::Set {
            role,
            text: text.to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_edits() {
        assert_eq!(
            "v 0.2".parse::<ToolCmd>(),
            Ok(ToolCmd::Edit(EditCmd::Set {
                role: Role::V,
                text: "0.2".into()
            }))
        );
        assert_eq!(
            " W = -30 ".parse::<ToolCmd>(),
            Ok(ToolCmd::Edit(EditCmd::Set {
                role: Role::W,
                text: "-30".into()
            }))
        );
        assert_eq!(
            "s".parse::<ToolCmd>(),
            Ok(ToolCmd::Edit(EditCmd::Clear(Role::S)))
        );
        assert_eq!(
            "t=".parse::<ToolCmd>(),
            Ok(ToolCmd::Edit(EditCmd::Clear(Role::T)))
        );
        assert_eq!(
            "clear a".parse::<ToolCmd>(),
            Ok(ToolCmd::Edit(EditCmd::Clear(Role::A)))
        );

        // Unparsable values are still edits, validation happens in the editor
        assert_eq!(
            "r abc".parse::<ToolCmd>(),
            Ok(ToolCmd::Edit(EditCmd::Set {
                role: Role::R,
                text: "abc".into()
            }))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<ToolCmd>(), Err(EditParseError::Empty));
        assert_eq!(
            "fly".parse::<ToolCmd>(),
            Err(EditParseError::UnknownCommand("fly".into()))
        );
        assert_eq!(
            "clear".parse::<ToolCmd>(),
            Err(EditParseError::MissingRole("clear"))
        );
        assert_eq!(
            "x = 1".parse::<ToolCmd>(),
            Err(EditParseError::UnknownRole("x".into()))
        );
        assert_eq!(
            "confirm now".parse::<ToolCmd>(),
            Err(EditParseError::UnexpectedArgument("now".into()))
        );
        assert_eq!(
            "steer left".parse::<ToolCmd>(),
            Err(EditParseError::InvalidNumber("steer", "left".into()))
        );
        assert_eq!(
            "steer nan".parse::<ToolCmd>(),
            Err(EditParseError::InvalidNumber("steer", "nan".into()))
        );
    }

    #[test]
    fn test_parse_chassis_cmds() {
        assert_eq!("steer -2.5".parse::<ToolCmd>(), Ok(ToolCmd::Steer(-2.5)));
        assert_eq!("zero".parse::<ToolCmd>(), Ok(ToolCmd::ZeroOdom));
        assert_eq!("odom".parse::<ToolCmd>(), Ok(ToolCmd::Odom));
    }

    #[test]
    fn test_conjugates() {
        for role in Role::ALL.iter() {
            if let Some(c) = role.conjugate() {
                assert_eq!(c.conjugate(), Some(*role));
            }
            assert_eq!(Role::ALL[role.index()], *role);
        }
        assert_eq!(Role::T.conjugate(), None);
        assert_eq!(Role::R.conjugate(), None);
    }
}
