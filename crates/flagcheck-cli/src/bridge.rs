//! `CommandSpec` ⇄ clap.
//!
//! Flag groups declare flags as [`FlagSpec`]s; this module turns the
//! declarations into a `clap::Command` and turns the parsed matches back into
//! a [`FlagSet`] holding only what appeared on the command line. Declared
//! defaults are never handed to clap; they are applied last by a
//! `StaticDefaults::declared` preprocessor so every other source beats them.

use std::collections::BTreeMap;

use clap::parser::{MatchesError, ValueSource};
use clap::{Arg, ArgAction, ArgMatches, Command};
use flagcheck_kernel::{CommandSpec, FlagKind, FlagSet, FlagSource, FlagSpec, FlagValue};

/// Build a clap subcommand declaring every flag in `spec`.
pub fn command(spec: &CommandSpec) -> Command {
    spec.flags
        .iter()
        .fold(Command::new(spec.name.clone()).about(spec.about.clone()), |cmd, flag| {
            cmd.arg(arg(flag))
        })
}

fn arg(spec: &FlagSpec) -> Arg {
    let mut arg = Arg::new(spec.name.clone())
        .long(spec.name.clone())
        .help(spec.help.clone())
        .hide(spec.hidden);
    if let Some(short) = spec.short {
        arg = arg.short(short);
    }
    if let Some(default) = &spec.default {
        arg = arg.help(format!("{} [default: {default}]", spec.help));
    }

    match spec.kind {
        FlagKind::Bool => arg.action(ArgAction::SetTrue),
        FlagKind::Int => arg
            .action(ArgAction::Set)
            .value_parser(clap::value_parser!(i64)),
        FlagKind::String => arg.action(ArgAction::Set),
        FlagKind::List => arg
            .action(ArgAction::Append)
            .value_delimiter(',')
            .value_name("ITEM"),
        FlagKind::Map => arg
            .action(ArgAction::Append)
            .value_parser(parse_pair)
            .value_name("KEY=VALUE"),
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {raw:?}")),
    }
}

/// Read the matches of a command built by [`command`] into a flag set.
pub fn flag_set(spec: &CommandSpec, matches: &ArgMatches) -> Result<FlagSet, MatchesError> {
    let mut flags = FlagSet::new();
    for flag in &spec.flags {
        if matches.value_source(&flag.name) != Some(ValueSource::CommandLine) {
            continue;
        }
        if let Some(value) = read(flag, matches)? {
            flags.set(&flag.name, value, FlagSource::CommandLine);
        }
    }
    Ok(flags)
}

fn read(flag: &FlagSpec, matches: &ArgMatches) -> Result<Option<FlagValue>, MatchesError> {
    let id = flag.name.as_str();
    let value = match flag.kind {
        FlagKind::Bool => matches.try_get_one::<bool>(id)?.copied().map(FlagValue::Bool),
        FlagKind::Int => matches.try_get_one::<i64>(id)?.copied().map(FlagValue::Int),
        FlagKind::String => matches
            .try_get_one::<String>(id)?
            .map(|s| FlagValue::Str(s.clone())),
        FlagKind::List => matches
            .try_get_many::<String>(id)?
            .map(|items| FlagValue::List(items.cloned().collect())),
        FlagKind::Map => matches
            .try_get_many::<(String, String)>(id)?
            .map(|pairs| FlagValue::Map(pairs.cloned().collect::<BTreeMap<_, _>>())),
    };
    Ok(value)
}
