// src/exec/template.rs

//! Command templates.
//!
//! Templates use `$name` or `${name}` placeholders and `$$` for a literal
//! dollar sign. Each context has a closed placeholder vocabulary; a name
//! outside it is an error, and so is a `$` that starts no valid
//! placeholder. Values substituted into commands are shell-quoted.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::job::Job;
use crate::watch::source::FsEvent;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:(?P<escaped>\$)|(?P<named>[_a-zA-Z][_a-zA-Z0-9]*)|\{(?P<braced>[_a-zA-Z][_a-zA-Z0-9]*)\}|(?P<invalid>))")
        .expect("placeholder regex is valid")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder '${name}'")]
    UnknownPlaceholder { name: String },

    #[error("invalid placeholder at byte {offset}")]
    InvalidPlaceholder { offset: usize },
}

/// A closed set of placeholder names for one template context.
pub trait Placeholder: Copy {
    fn lookup(name: &str) -> Option<Self>;
}

/// Placeholders of a job's `command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPlaceholder {
    Job,
    Folder,
    Watched,
    Filename,
    Tflags,
    Nflags,
    Cookie,
}

impl Placeholder for EventPlaceholder {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "job" => EventPlaceholder::Job,
            "folder" => EventPlaceholder::Folder,
            "watched" => EventPlaceholder::Watched,
            "filename" => EventPlaceholder::Filename,
            "tflags" => EventPlaceholder::Tflags,
            "nflags" => EventPlaceholder::Nflags,
            "cookie" => EventPlaceholder::Cookie,
            _ => return None,
        })
    }
}

/// Placeholders of `action_on_success` / `action_on_failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPlaceholder {
    Job,
    Host,
    Output,
}

impl Placeholder for ActionPlaceholder {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "job" => ActionPlaceholder::Job,
            "host" => ActionPlaceholder::Host,
            "output" => ActionPlaceholder::Output,
            _ => return None,
        })
    }
}

/// The single placeholder of `outfile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutfilePlaceholder;

impl Placeholder for OutfilePlaceholder {
    fn lookup(name: &str) -> Option<Self> {
        (name == "job").then_some(OutfilePlaceholder)
    }
}

/// Expand `template`, asking `value` for the text of each placeholder.
/// Values are inserted verbatim; quoting is the caller's business.
pub fn substitute<P: Placeholder>(
    template: &str,
    mut value: impl FnMut(P) -> String,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&template[last..whole.start()]);
        last = whole.end();
        out.push_str(&expand_one(&caps, whole.start(), &mut value)?);
    }
    out.push_str(&template[last..]);

    Ok(out)
}

fn expand_one<P: Placeholder>(
    caps: &Captures<'_>,
    offset: usize,
    value: &mut impl FnMut(P) -> String,
) -> Result<String, TemplateError> {
    if caps.name("escaped").is_some() {
        return Ok("$".to_string());
    }
    let name = match caps.name("named").or_else(|| caps.name("braced")) {
        Some(m) => m.as_str(),
        None => return Err(TemplateError::InvalidPlaceholder { offset }),
    };
    let placeholder = P::lookup(name).ok_or_else(|| TemplateError::UnknownPlaceholder {
        name: name.to_string(),
    })?;
    Ok(value(placeholder))
}

/// Quote `s` for a POSIX shell: wrap it in single quotes and write each
/// embedded `'` as `'\''`.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Render a job's command for one event.
pub fn render_event_command(job: &Job, event: &FsEvent) -> Result<String, TemplateError> {
    substitute(&job.command, |p: EventPlaceholder| {
        let raw = match p {
            EventPlaceholder::Job => job.name.clone(),
            EventPlaceholder::Folder => job.watch_path.to_string_lossy().into_owned(),
            EventPlaceholder::Watched => event.watched.to_string_lossy().into_owned(),
            EventPlaceholder::Filename => event.path.to_string_lossy().into_owned(),
            EventPlaceholder::Tflags => event.flag_names(),
            EventPlaceholder::Nflags => event.flags().to_string(),
            EventPlaceholder::Cookie => event.cookie.unwrap_or(0).to_string(),
        };
        shell_quote(&raw)
    })
}

/// Render a post action (`action_on_success` / `action_on_failure`).
pub fn render_action(
    template: &str,
    job: &str,
    host: &str,
    output: &str,
) -> Result<String, TemplateError> {
    substitute(template, |p: ActionPlaceholder| {
        shell_quote(match p {
            ActionPlaceholder::Job => job,
            ActionPlaceholder::Host => host,
            ActionPlaceholder::Output => output,
        })
    })
}

/// Render an `outfile` template. The job name is inserted unquoted.
pub fn render_outfile(template: &str, job: &str) -> Result<String, TemplateError> {
    substitute(template, |_: OutfilePlaceholder| job.to_string())
}
