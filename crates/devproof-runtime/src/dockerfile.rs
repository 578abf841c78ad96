//! Line-oriented inspection of Dockerfiles using `nom`.
//!
//! Only the instructions the pipelines care about are recognized
//! (`FROM`, `WORKDIR`, `USER`, `EXPOSE`); everything else is skipped.
//! This is prefix matching over logical lines, not a full grammar.

use std::path::Path;

use devproof_common::error::{DevproofError, Result};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::space1,
    combinator::{map, rest},
    sequence::{preceded, terminated},
};

/// Facts extracted from a build script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptInfo {
    /// Image named by the first `FROM` line.
    pub base_image: Option<String>,
    /// One-based line of the first `FROM`.
    pub base_image_line: Option<u32>,
    /// Last declared working directory.
    pub workdir: Option<String>,
    /// Last declared user.
    pub user: Option<String>,
    /// One-based line of the last `USER`.
    pub user_line: Option<u32>,
    /// Every exposed port, in declaration order.
    pub exposed_ports: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Instruction {
    From(Option<String>),
    Workdir(String),
    User(String),
    Expose(Vec<u16>),
}

/// Reads and inspects the build script at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn inspect_script(path: &Path) -> Result<ScriptInfo> {
    let text = std::fs::read_to_string(path).map_err(|source| DevproofError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_script(&text))
}

/// Inspects build-script text.
#[must_use]
pub fn parse_script(text: &str) -> ScriptInfo {
    let mut info = ScriptInfo::default();
    for (line_no, line) in logical_lines(text) {
        let Ok((_, instruction)) = instruction(line.trim_start()) else {
            continue;
        };
        match instruction {
            Instruction::From(image) => {
                if info.base_image.is_none() {
                    info.base_image = image;
                    info.base_image_line = Some(line_no);
                }
            }
            Instruction::Workdir(dir) => info.workdir = Some(dir),
            Instruction::User(user) => {
                info.user = Some(user);
                info.user_line = Some(line_no);
            }
            Instruction::Expose(ports) => info.exposed_ports.extend(ports),
        }
    }
    info
}

/// Joins `\`-continued lines and drops comments and blanks, keeping the
/// one-based number of each logical line's first physical line.
fn logical_lines(text: &str) -> Vec<(u32, String)> {
    let mut out = Vec::new();
    let mut pending: Option<(u32, String)> = None;
    for (idx, raw) in text.lines().enumerate() {
        let line_no = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        let trimmed = raw.trim();
        if pending.is_none() && (trimmed.is_empty() || trimmed.starts_with('#')) {
            continue;
        }
        let (start, mut acc) = pending.take().unwrap_or((line_no, String::new()));
        if let Some(body) = trimmed.strip_suffix('\\') {
            acc.push_str(body);
            acc.push(' ');
            pending = Some((start, acc));
        } else {
            acc.push_str(trimmed);
            out.push((start, acc));
        }
    }
    if let Some(last) = pending {
        out.push(last);
    }
    out
}

fn instruction(line: &str) -> IResult<&str, Instruction> {
    alt((
        map(preceded(terminated(tag_no_case("FROM"), space1), rest), |args: &str| {
            Instruction::From(from_image(args))
        }),
        map(preceded(terminated(tag_no_case("WORKDIR"), space1), rest), |args: &str| {
            Instruction::Workdir(unquote(args))
        }),
        map(preceded(terminated(tag_no_case("USER"), space1), rest), |args: &str| {
            Instruction::User(unquote(args))
        }),
        map(preceded(terminated(tag_no_case("EXPOSE"), space1), rest), |args: &str| {
            Instruction::Expose(exposed_ports(args))
        }),
    ))
    .parse(line)
}

/// `FROM [--platform=...] image [AS name]` → `image`.
fn from_image(args: &str) -> Option<String> {
    args.split_whitespace()
        .find(|token| !token.starts_with("--"))
        .map(str::to_string)
}

/// `EXPOSE 80 443/tcp 53/udp` → `[80, 443, 53]`. Variables are skipped.
fn exposed_ports(args: &str) -> Vec<u16> {
    args.split_whitespace()
        .filter_map(|token| token.split('/').next())
        .filter_map(|port| port.parse().ok())
        .collect()
}

fn unquote(args: &str) -> String {
    args.trim().trim_matches('"').to_string()
}
