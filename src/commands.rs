/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "categories",
    aliases: &["c", "cat", "home"],
    description: "Browse categories",
  },
  Command {
    name: "search",
    aliases: &["s", "find"],
    description: "Search places and categories",
  },
  Command {
    name: "contact",
    aliases: &["help", "about"],
    description: "Contact the directory team",
  },
  Command {
    name: "language",
    aliases: &["lang", "l"],
    description: "Switch between English and Russian",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit placebook",
  },
];

/// Get autocomplete suggestions for a given input, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();

  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&'static Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_rank(cmd, &input).map(|rank| (cmd, rank)))
    .collect();

  // Stable sort keeps declaration order among equal ranks
  matches.sort_by_key(|(_, rank)| *rank);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower is better: exact name, exact alias, prefix, then substring.
fn match_rank(cmd: &Command, input: &str) -> Option<u32> {
  let names = || std::iter::once(cmd.name).chain(cmd.aliases.iter().copied());

  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if names().any(|n| n.starts_with(input)) {
    Some(2)
  } else if names().any(|n| n.contains(input)) {
    Some(3)
  } else {
    None
  }
}
