//! Joining argument lists into a single shell command line.
//!
//! An argument containing a space is wrapped in double quotes verbatim.
//! Embedded double quotes are not escaped, so such arguments do not survive
//! the round trip through the shell intact.

use std::ffi::{OsStr, OsString};

use crate::error::TrailerError;

/// `base` (if any), then each of `extra` quoted as needed, separated by
/// single spaces.
pub fn assemble<S: AsRef<OsStr>>(base: Option<&OsStr>, extra: &[S]) -> OsString {
    let mut command = OsString::new();
    if let Some(base) = base {
        command.push(base);
    }
    for (i, arg) in extra.iter().enumerate() {
        if base.is_some() || i > 0 {
            command.push(" ");
        }
        push_quoted(&mut command, arg.as_ref());
    }
    command
}

fn push_quoted(command: &mut OsString, arg: &OsStr) {
    if arg.as_encoded_bytes().contains(&b' ') {
        command.push("\"");
        command.push(arg);
        command.push("\"");
    } else {
        command.push(arg);
    }
}

/// Bytes stored in a trailer for `command`.
#[cfg(unix)]
pub fn to_payload(command: OsString) -> Result<Vec<u8>, TrailerError> {
    use std::os::unix::ffi::OsStringExt;
    Ok(command.into_vec())
}

#[cfg(not(unix))]
pub fn to_payload(command: OsString) -> Result<Vec<u8>, TrailerError> {
    command
        .into_string()
        .map(String::into_bytes)
        .map_err(|_| TrailerError::NotUnicode)
}

/// Command line recovered from trailer bytes.
#[cfg(unix)]
pub fn from_payload(payload: Vec<u8>) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(payload)
}

#[cfg(not(unix))]
pub fn from_payload(payload: Vec<u8>) -> OsString {
    match String::from_utf8(payload) {
        Ok(command) => command.into(),
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn quotes_only_arguments_with_spaces() {
        assert_eq!(assemble(None, &words(&["a b", "c"])), "\"a b\" c");
        assert_eq!(assemble(None, &words(&["a"])), "a");
    }

    #[test]
    fn base_comes_first() {
        let base = OsString::from("echo hello world");
        assert_eq!(
            assemble(Some(base.as_os_str()), &words(&["extra", "two words"])),
            "echo hello world extra \"two words\""
        );
    }

    #[test]
    fn base_alone_is_unchanged() {
        let base = OsString::from("echo \"pre quoted\"");
        assert_eq!(assemble::<OsString>(Some(base.as_os_str()), &[]), "echo \"pre quoted\"");
    }

    #[test]
    fn no_arguments_is_empty() {
        assert_eq!(assemble::<OsString>(None, &[]), "");
    }

    #[test]
    fn embedded_quotes_are_not_escaped() {
        // Known limitation: the inner quotes end up unbalanced for the shell.
        assert_eq!(
            assemble(None, &words(&["say \"hi\" now"])),
            "\"say \"hi\" now\""
        );
    }

    #[test]
    fn tabs_do_not_trigger_quoting() {
        assert_eq!(assemble(None, &words(&["a\tb"])), "a\tb");
    }

    #[test]
    fn payload_round_trips_through_bytes() {
        let command = assemble(None, &words(&["echo", "hello world"]));
        let payload = to_payload(command.clone()).unwrap();
        assert_eq!(payload, b"echo \"hello world\"");
        assert_eq!(from_payload(payload), command);
    }
}
