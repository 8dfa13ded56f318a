//! The fixed command table.
//!
//! Each command is described once by an immutable [`CommandDescriptor`]:
//! its wire name, parameter names (the arity), usage and help text, an
//! optional numeric constraint and the shape of the device operation it
//! drives. The table is a `static` and is never mutated.

use std::fmt;

/// Every command understood by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `HELP`
    Help,
    /// `SET_HOME`
    SetHome,
    /// `GO_HOME`
    GoHome,
    /// `ABSOLUTE_MOVE x y z`
    AbsoluteMove,
    /// `DELTA_MOVE dx dy dz`
    DeltaMove,
    /// `GET_POSITION`
    GetPosition,
    /// `SET_SPEED speed`
    SetSpeed,
    /// `GET_SPEED`
    GetSpeed,
    /// `GET_MIN_SPEED`
    GetMinSpeed,
    /// `GET_MAX_SPEED`
    GetMaxSpeed,
    /// `GET_ID`
    GetId,
    /// `CHECK_ERRORS`
    CheckErrors,
}

impl CommandKind {
    /// All commands, in help-listing order.
    pub const ALL: [CommandKind; 12] = [
        CommandKind::Help,
        CommandKind::SetHome,
        CommandKind::GoHome,
        CommandKind::AbsoluteMove,
        CommandKind::DeltaMove,
        CommandKind::GetPosition,
        CommandKind::SetSpeed,
        CommandKind::GetSpeed,
        CommandKind::GetMinSpeed,
        CommandKind::GetMaxSpeed,
        CommandKind::GetId,
        CommandKind::CheckErrors,
    ];

    /// The descriptor for this command.
    pub fn descriptor(self) -> &'static CommandDescriptor {
        &COMMAND_TABLE[self as usize]
    }

    /// Uppercase wire name.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of the device operation a command invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationShape {
    /// Handled by the dispatcher itself; no device operation.
    Builtin,
    /// No arguments, no result.
    Action,
    /// Three floats in, no result.
    Move,
    /// One float in, no result.
    Setter,
    /// No arguments, one float out.
    Getter,
    /// No arguments, three floats out.
    PositionGetter,
}

/// How the `DONE` line carries a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    /// `DONE <NAME>`
    Plain,
    /// `DONE <NAME>: <x> <y> <z>`, two decimals each.
    Position,
    /// `DONE <NAME>: <value>`, integral formatting.
    Speed,
    /// `DONE <NAME>: <device id>`
    Identifier,
}

/// Command-specific rule applied after a parameter parsed successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamConstraint {
    /// The value must be strictly greater than zero.
    StrictlyPositive {
        /// Short statement of the rule, as shown on the wire.
        reason: &'static str,
        /// Condition text, as shown on the wire.
        condition: &'static str,
    },
}

impl ParamConstraint {
    /// Whether `value` satisfies the constraint.
    pub fn admits(&self, value: f64) -> bool {
        match self {
            ParamConstraint::StrictlyPositive { .. } => value > 0.0,
        }
    }
}

/// Immutable description of one command.
#[derive(Debug)]
pub struct CommandDescriptor {
    /// Which command this is.
    pub kind: CommandKind,
    /// Uppercase wire name.
    pub name: &'static str,
    /// Names of the required numeric parameters, in order.
    pub params: &'static [&'static str],
    /// Usage line, e.g. `ABSOLUTE_MOVE x y z`.
    pub usage: &'static str,
    /// One-line description for the help listing.
    pub summary: &'static str,
    /// Optional check applied to the (single) parsed parameter.
    pub constraint: Option<ParamConstraint>,
    /// Shape of the bound device operation.
    pub shape: OperationShape,
    /// Format of the `DONE` payload.
    pub reply: ReplyFormat,
}

impl CommandDescriptor {
    /// Number of required numeric parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Line shown for this command in the help listing.
    pub fn help_line(&self) -> String {
        format!("{} - {}", self.usage, self.summary)
    }
}

/// The command table, indexed by `CommandKind as usize`.
pub static COMMAND_TABLE: [CommandDescriptor; 12] = [
    CommandDescriptor {
        kind: CommandKind::Help,
        name: "HELP",
        params: &[],
        usage: "HELP",
        summary: "Displays this help message",
        constraint: None,
        shape: OperationShape::Builtin,
        reply: ReplyFormat::Plain,
    },
    CommandDescriptor {
        kind: CommandKind::SetHome,
        name: "SET_HOME",
        params: &[],
        usage: "SET_HOME",
        summary: "Sets current position as home (0,0,0)",
        constraint: None,
        shape: OperationShape::Action,
        reply: ReplyFormat::Plain,
    },
    CommandDescriptor {
        kind: CommandKind::GoHome,
        name: "GO_HOME",
        params: &[],
        usage: "GO_HOME",
        summary: "Moves to home position (0,0,0)",
        constraint: None,
        shape: OperationShape::Action,
        reply: ReplyFormat::Plain,
    },
    CommandDescriptor {
        kind: CommandKind::AbsoluteMove,
        name: "ABSOLUTE_MOVE",
        params: &["x", "y", "z"],
        usage: "ABSOLUTE_MOVE x y z",
        summary: "Moves to absolute position x, y, z",
        constraint: None,
        shape: OperationShape::Move,
        reply: ReplyFormat::Plain,
    },
    CommandDescriptor {
        kind: CommandKind::DeltaMove,
        name: "DELTA_MOVE",
        params: &["dx", "dy", "dz"],
        usage: "DELTA_MOVE dx dy dz",
        summary: "Moves relative to current position by dx, dy, dz",
        constraint: None,
        shape: OperationShape::Move,
        reply: ReplyFormat::Plain,
    },
    CommandDescriptor {
        kind: CommandKind::GetPosition,
        name: "GET_POSITION",
        params: &[],
        usage: "GET_POSITION",
        summary: "Returns current position",
        constraint: None,
        shape: OperationShape::PositionGetter,
        reply: ReplyFormat::Position,
    },
    CommandDescriptor {
        kind: CommandKind::SetSpeed,
        name: "SET_SPEED",
        params: &["speed"],
        usage: "SET_SPEED speed",
        summary: "Sets movement speed to speed in mm/s",
        constraint: Some(ParamConstraint::StrictlyPositive {
            reason: "Speed must be positive",
            condition: "speed > 0",
        }),
        shape: OperationShape::Setter,
        reply: ReplyFormat::Plain,
    },
    CommandDescriptor {
        kind: CommandKind::GetSpeed,
        name: "GET_SPEED",
        params: &[],
        usage: "GET_SPEED",
        summary: "Returns current movement speed in mm/s",
        constraint: None,
        shape: OperationShape::Getter,
        reply: ReplyFormat::Speed,
    },
    CommandDescriptor {
        kind: CommandKind::GetMinSpeed,
        name: "GET_MIN_SPEED",
        params: &[],
        usage: "GET_MIN_SPEED",
        summary: "Returns minimum allowed movement speed in mm/s",
        constraint: None,
        shape: OperationShape::Getter,
        reply: ReplyFormat::Speed,
    },
    CommandDescriptor {
        kind: CommandKind::GetMaxSpeed,
        name: "GET_MAX_SPEED",
        params: &[],
        usage: "GET_MAX_SPEED",
        summary: "Returns maximum allowed movement speed in mm/s",
        constraint: None,
        shape: OperationShape::Getter,
        reply: ReplyFormat::Speed,
    },
    CommandDescriptor {
        kind: CommandKind::GetId,
        name: "GET_ID",
        params: &[],
        usage: "GET_ID",
        summary: "Returns the unique device identifier",
        constraint: None,
        shape: OperationShape::Builtin,
        reply: ReplyFormat::Identifier,
    },
    CommandDescriptor {
        kind: CommandKind::CheckErrors,
        name: "CHECK_ERRORS",
        params: &[],
        usage: "CHECK_ERRORS",
        summary: "Performs system diagnostics and reports any errors",
        constraint: None,
        shape: OperationShape::Action,
        reply: ReplyFormat::Plain,
    },
];

/// Header line of the help listing.
pub const HELP_HEADER: &str = "Available commands:";

/// Look up a command by its (already uppercased) name.
pub fn lookup(name: &str) -> Option<&'static CommandDescriptor> {
    COMMAND_TABLE.iter().find(|d| d.name == name)
}

/// The full help listing: header, then one line per command.
pub fn help_lines() -> impl Iterator<Item = String> {
    std::iter::once(HELP_HEADER.to_string()).chain(COMMAND_TABLE.iter().map(|d| d.help_line()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_kind() {
        for kind in CommandKind::ALL {
            assert_eq!(kind.descriptor().kind, kind);
        }
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        assert_eq!(lookup("GET_ID").map(|d| d.kind), Some(CommandKind::GetId));
        assert!(lookup("get_id").is_none());
        assert!(lookup("GET").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn arities_match_protocol() {
        assert_eq!(CommandKind::AbsoluteMove.descriptor().arity(), 3);
        assert_eq!(CommandKind::DeltaMove.descriptor().arity(), 3);
        assert_eq!(CommandKind::SetSpeed.descriptor().arity(), 1);
        for kind in [
            CommandKind::Help,
            CommandKind::SetHome,
            CommandKind::GoHome,
            CommandKind::GetPosition,
            CommandKind::GetSpeed,
            CommandKind::GetMinSpeed,
            CommandKind::GetMaxSpeed,
            CommandKind::GetId,
            CommandKind::CheckErrors,
        ] {
            assert_eq!(kind.descriptor().arity(), 0, "{kind}");
        }
    }

    #[test]
    fn usage_starts_with_name() {
        for descriptor in &COMMAND_TABLE {
            assert!(descriptor.usage.starts_with(descriptor.name));
        }
    }

    #[test]
    fn help_listing_has_header_and_every_command() {
        let lines: Vec<String> = help_lines().collect();
        assert_eq!(lines.len(), 13);
        assert_eq!(lines[0], "Available commands:");
        assert_eq!(lines[1], "HELP - Displays this help message");
        assert_eq!(
            lines[4],
            "ABSOLUTE_MOVE x y z - Moves to absolute position x, y, z"
        );
        assert_eq!(
            lines[12],
            "CHECK_ERRORS - Performs system diagnostics and reports any errors"
        );
    }

    #[test]
    fn speed_constraint_rejects_zero_and_negative() {
        let constraint = CommandKind::SetSpeed
            .descriptor()
            .constraint
            .expect("SET_SPEED has a constraint");
        assert!(constraint.admits(0.1));
        assert!(!constraint.admits(0.0));
        assert!(!constraint.admits(-5.0));
    }
}
