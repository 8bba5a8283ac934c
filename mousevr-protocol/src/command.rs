use crate::error::{ProtocolError, Result};
use mousevr_core::Vec3;

/// Characters that survive sanitising; everything else is dropped
fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '(' | ')' | ',' | '.' | '\'' | '-')
}

/// Strips disallowed characters and lower-cases the rest.
/// Returns `None` when nothing is left.
pub fn sanitize(line: &str) -> Option<String> {
    let cleaned: String = line
        .chars()
        .filter(|c| is_allowed(*c))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Signed decimal with an optional fractional part
fn is_number(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int, frac) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits, None),
    };
    let all_digits = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());
    all_digits(int) && frac.map_or(true, all_digits)
}

/// One argument between the parentheses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub text: String,
    pub quoted: bool,
}

impl Arg {
    fn parse(raw: &str) -> Self {
        let quoted = raw.starts_with('\'') || raw.ends_with('\'');
        Self {
            text: raw.trim_matches('\'').to_string(),
            quoted,
        }
    }

    pub fn is_token(&self) -> bool {
        is_word(&self.text)
    }

    pub fn is_number(&self) -> bool {
        !self.quoted && is_number(&self.text)
    }
}

/// `namespace.method(args)` split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub namespace: String,
    pub method: String,
    pub args: Vec<Arg>,
}

impl Call {
    /// Zero or one token argument
    pub fn bare(&self) -> Option<Option<&str>> {
        match self.args.as_slice() {
            [] => Some(None),
            [arg] if arg.is_token() => Some(Some(arg.text.as_str())),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.bare().flatten()
    }

    /// Exactly `N` numeric arguments
    pub fn numbers<const N: usize>(&self) -> Option<[&str; N]> {
        if self.args.len() != N || !self.args.iter().all(Arg::is_number) {
            return None;
        }
        Some(std::array::from_fn(|i| self.args[i].text.as_str()))
    }

    /// A token followed by three numeric arguments
    pub fn token_numbers3(&self) -> Option<(&str, [&str; 3])> {
        match self.args.as_slice() {
            [name, a, b, c]
                if name.is_token() && a.is_number() && b.is_number() && c.is_number() =>
            {
                Some((
                    name.text.as_str(),
                    [a.text.as_str(), b.text.as_str(), c.text.as_str()],
                ))
            }
            _ => None,
        }
    }
}

/// Splits a sanitised line into namespace, method and arguments.
/// Anything after the closing parenthesis is ignored.
pub fn tokenize(line: &str) -> Option<Call> {
    let (head, rest) = line.split_once('(')?;
    let (args, _) = rest.split_once(')')?;
    let (namespace, method) = head.split_once('.')?;
    if !is_word(namespace) || !is_word(method) {
        return None;
    }
    let args = if args.is_empty() {
        Vec::new()
    } else {
        args.split(',').map(Arg::parse).collect()
    };
    Some(Call {
        namespace: namespace.to_string(),
        method: method.to_string(),
        args,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ToggleMotion,
    ToggleBlanking,
    BlankDisplay(bool),
    TeleportToWaypoint(String),
    Teleport(Vec3),
    TeleportWithYaw(Vec3, f32),
    MoveObject { name: String, position: Vec3 },
    GetPosition(String),
    Reward,
    Quit,
}

fn number(command: &str, text: &str) -> Result<f32> {
    text.parse::<f32>().map_err(|_| ProtocolError::Number {
        command: command.to_string(),
        text: text.to_string(),
    })
}

/// Wire order is `(x, z, y)`; the third value is world-up
fn position(command: &str, [x, z, y]: [&str; 3]) -> Result<Vec3> {
    Ok(Vec3::new(
        number(command, x)?,
        number(command, y)?,
        number(command, z)?,
    ))
}

fn teleport(line: &str, call: &Call) -> Result<Option<Command>> {
    if let Some(waypoint) = call.token() {
        return Ok(Some(Command::TeleportToWaypoint(waypoint.to_string())));
    }
    if let Some(xzy) = call.numbers::<3>() {
        return Ok(Some(Command::Teleport(position(line, xzy)?)));
    }
    if let Some([x, z, y, yaw]) = call.numbers::<4>() {
        return Ok(Some(Command::TeleportWithYaw(
            position(line, [x, z, y])?,
            number(line, yaw)?,
        )));
    }
    Ok(None)
}

/// Parses one sanitised, lower-cased line.
///
/// `Ok(None)` means the command was recognised but its arguments matched no
/// shape, which is a no-op. Unknown commands are an error.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let call = || tokenize(line);

    let command = if line.starts_with("console.toggle_motion") {
        Some(Command::ToggleMotion)
    } else if line.starts_with("console.toggle_blanking") {
        Some(Command::ToggleBlanking)
    } else if line.starts_with("console.blank_display") {
        Some(Command::BlankDisplay(
            !line.starts_with("console.blank_display(1)"),
        ))
    } else if line.starts_with("console.teleport") {
        match call() {
            Some(call) => teleport(line, &call)?,
            None => None,
        }
    } else if line.starts_with("model.move") {
        match call().as_ref().and_then(Call::token_numbers3) {
            Some((name, xzy)) => Some(Command::MoveObject {
                name: name.to_string(),
                position: position(line, xzy)?,
            }),
            None => None,
        }
    } else if line.starts_with("model.get_position") {
        call()
            .as_ref()
            .and_then(Call::token)
            .map(|name| Command::GetPosition(name.to_string()))
    } else if line.starts_with("reward") {
        Some(Command::Reward)
    } else if line.starts_with("quit") {
        Some(Command::Quit)
    } else {
        return Err(ProtocolError::Unrecognized(line.to_string()));
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<Option<Command>> {
        parse_command(&sanitize(raw).unwrap())
    }

    #[test]
    fn sanitize_drops_noise_and_lowercases() {
        assert_eq!(
            sanitize("Console.Teleport( 'Home' )\n").as_deref(),
            Some("console.teleport('home')")
        );
        assert_eq!(sanitize("\0\0 \r\n"), None);
        assert_eq!(
            sanitize("model.move(cue, -1.5, 0, 2)").as_deref(),
            Some("model.move(cue,-1.5,0,2)")
        );
    }

    #[test]
    fn tokenize_splits_call() {
        let call = tokenize("model.move('cue',1,2.5,-3)").unwrap();
        assert_eq!(call.namespace, "model");
        assert_eq!(call.method, "move");
        assert_eq!(call.args.len(), 4);
        assert!(call.args[0].quoted);
        assert_eq!(call.token_numbers3(), Some(("cue", ["1", "2.5", "-3"])));

        assert!(tokenize("quit").is_none());
        assert!(tokenize("console.teleport(1").is_none());
        assert!(tokenize("teleport(1)").is_none());
    }

    #[test]
    fn number_shape_is_strict() {
        assert!(is_number("-2"));
        assert!(is_number("1.25"));
        assert!(!is_number("1."));
        assert!(!is_number(".5"));
        assert!(!is_number("--1"));
        assert!(!is_number("1e3"));
    }

    #[test]
    fn teleport_to_named_waypoint() {
        assert_eq!(
            parse("console.teleport('home')").unwrap(),
            Some(Command::TeleportToWaypoint("home".into()))
        );
        assert_eq!(
            parse("console.teleport(10)").unwrap(),
            Some(Command::TeleportToWaypoint("10".into()))
        );
    }

    #[test]
    fn teleport_numeric_args_remap_up_axis() {
        assert_eq!(
            parse("console.teleport(1.5, -2, 3)").unwrap(),
            Some(Command::Teleport(Vec3::new(1.5, 3.0, -2.0)))
        );
        assert_eq!(
            parse("console.teleport(1, 2, 3, 90)").unwrap(),
            Some(Command::TeleportWithYaw(Vec3::new(1.0, 3.0, 2.0), 90.0))
        );
    }

    #[test]
    fn teleport_without_matching_shape_is_noop() {
        assert_eq!(parse("console.teleport(1,2)").unwrap(), None);
        assert_eq!(parse("console.teleport('a',1,2,3,4)").unwrap(), None);
        assert_eq!(parse("console.teleport").unwrap(), None);
    }

    #[test]
    fn model_commands() {
        assert_eq!(
            parse("model.move('cue', 0, 1, -2)").unwrap(),
            Some(Command::MoveObject {
                name: "cue".into(),
                position: Vec3::new(0.0, -2.0, 1.0),
            })
        );
        assert_eq!(
            parse("model.get_position('Cue')").unwrap(),
            Some(Command::GetPosition("cue".into()))
        );
        assert_eq!(parse("model.move(cue)").unwrap(), None);
    }

    #[test]
    fn console_switches() {
        assert_eq!(parse("console.toggle_motion()").unwrap(), Some(Command::ToggleMotion));
        assert_eq!(parse("console.toggle_blanking()").unwrap(), Some(Command::ToggleBlanking));
        assert_eq!(parse("console.blank_display(1)").unwrap(), Some(Command::BlankDisplay(false)));
        assert_eq!(parse("console.blank_display(0)").unwrap(), Some(Command::BlankDisplay(true)));
        assert_eq!(parse("Reward()").unwrap(), Some(Command::Reward));
        assert_eq!(parse("quit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert_eq!(
            parse("xyzzy"),
            Err(ProtocolError::Unrecognized("xyzzy".into()))
        );
    }
}
