//! Command catalog shared by the parser and the `help` command.

/// Top-level REPL commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandTag {
    Run,
    Tick,
    Advance,
    Sensor,
    Cancel,
    Arm,
    Disarm,
    Status,
    Help,
}

/// Keyword plus the text shown by `help`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub tag: CommandTag,
    pub usage: &'static str,
    pub summary: &'static str,
}

impl CommandSpec {
    const fn new(
        name: &'static str,
        tag: CommandTag,
        usage: &'static str,
        summary: &'static str,
    ) -> Self {
        Self {
            name,
            tag,
            usage,
            summary,
        }
    }
}

pub const COMMANDS: [CommandSpec; 9] = [
    CommandSpec::new(
        "run",
        CommandTag::Run,
        "run <blink|score|sonar>",
        "start an autonomous routine from t=0",
    ),
    CommandSpec::new(
        "tick",
        CommandTag::Tick,
        "tick [count]",
        "advance the clock one period per tick and run the sequencer",
    ),
    CommandSpec::new(
        "advance",
        CommandTag::Advance,
        "advance <N>ms|<N>s",
        "tick repeatedly until the given time has passed",
    ),
    CommandSpec::new(
        "sensor",
        CommandTag::Sensor,
        "sensor <name> <value>|off",
        "set a simulated sensor reading, or make it unavailable",
    ),
    CommandSpec::new(
        "cancel",
        CommandTag::Cancel,
        "cancel",
        "leave autonomous mode; the run stops on its next tick",
    ),
    CommandSpec::new(
        "arm",
        CommandTag::Arm,
        "arm <timer>",
        "re-arm a timer of the active run (e.g. `arm t2`)",
    ),
    CommandSpec::new(
        "disarm",
        CommandTag::Disarm,
        "disarm <timer>",
        "disarm a timer of the active run so it never fires",
    ),
    CommandSpec::new(
        "status",
        CommandTag::Status,
        "status",
        "show the active run, its actions and timers",
    ),
    CommandSpec::new("help", CommandTag::Help, "help [command]", "list commands"),
];

/// Case-insensitive keyword lookup.
#[must_use]
pub fn find(keyword: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(keyword))
}
