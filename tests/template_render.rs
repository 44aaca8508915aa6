// tests/template_render.rs

mod common;
use crate::common::builders::JobConfigBuilder;
use crate::common::{dir_event, file_event};

use proptest::prelude::*;

use dirwatch::exec::template::{
    render_action, render_event_command, render_outfile, shell_quote, TemplateError,
};
use dirwatch::types::EventKind;

#[test]
fn filename_placeholder_is_quoted() {
    let job = JobConfigBuilder::new("/watch", "echo ${filename}").compile("scan");
    let event = file_event("/watch/a.txt", EventKind::Create);

    let command = render_event_command(&job, &event).expect("render");
    assert_eq!(command, "echo '/watch/a.txt'");
}

#[test]
fn every_event_placeholder_is_available() {
    let job = JobConfigBuilder::new("/watch", "run $job $folder $watched $filename $tflags $nflags $cookie")
        .compile("scan");
    let event = dir_event("/watch/sub/new", EventKind::Create).with_cookie(42);

    let command = render_event_command(&job, &event).expect("render");
    assert_eq!(
        command,
        "run 'scan' '/watch' '/watch/sub' '/watch/sub/new' 'IN_CREATE|IN_ISDIR' '1073742080' '42'"
    );
}

#[test]
fn missing_cookie_renders_as_zero() {
    let job = JobConfigBuilder::new("/watch", "echo ${cookie}").compile("scan");
    let event = file_event("/watch/a", EventKind::Delete);
    assert_eq!(render_event_command(&job, &event).expect("render"), "echo '0'");
}

#[test]
fn dollar_dollar_is_a_literal_dollar() {
    let job = JobConfigBuilder::new("/watch", "echo $$HOME ${filename}").compile("scan");
    let event = file_event("/watch/a", EventKind::Create);
    assert_eq!(
        render_event_command(&job, &event).expect("render"),
        "echo $HOME '/watch/a'"
    );
}

#[test]
fn unknown_placeholder_is_an_error() {
    let job = JobConfigBuilder::new("/watch", "echo ${host}").compile("scan");
    let event = file_event("/watch/a", EventKind::Create);
    assert_eq!(
        render_event_command(&job, &event),
        Err(TemplateError::UnknownPlaceholder {
            name: "host".to_string()
        })
    );
}

#[test]
fn stray_dollar_is_an_invalid_placeholder() {
    let job = JobConfigBuilder::new("/watch", "cost $5").compile("scan");
    let event = file_event("/watch/a", EventKind::Create);
    assert_eq!(
        render_event_command(&job, &event),
        Err(TemplateError::InvalidPlaceholder { offset: 5 })
    );

    assert_eq!(
        render_outfile("/logs/${job", "scan"),
        Err(TemplateError::InvalidPlaceholder { offset: 6 })
    );
}

#[test]
fn filename_with_quotes_and_spaces_survives_word_splitting() {
    let job = JobConfigBuilder::new("/watch", "cp ${filename} /backup").compile("scan");
    let event = file_event("/watch/it's a file.txt", EventKind::CloseWrite);

    let command = render_event_command(&job, &event).expect("render");
    let argv = shlex::split(&command).expect("split");
    assert_eq!(argv, vec!["cp", "/watch/it's a file.txt", "/backup"]);
}

#[test]
fn actions_quote_output_and_host() {
    let command = render_action(
        "notify ${job}@${host}: $output",
        "scan",
        "box",
        "it's done",
    )
    .expect("render");
    assert_eq!(command, r"notify 'scan'@'box': 'it'\''s done'");
}

#[test]
fn actions_reject_event_placeholders() {
    assert_eq!(
        render_action("echo ${filename}", "scan", "box", ""),
        Err(TemplateError::UnknownPlaceholder {
            name: "filename".to_string()
        })
    );
}

#[test]
fn outfile_inserts_job_name_unquoted() {
    assert_eq!(
        render_outfile("/logs/$job.out", "scan").expect("render"),
        "/logs/scan.out"
    );
}

proptest! {
    #[test]
    fn shell_quote_round_trips_through_shlex(s in "[^\\x00]*") {
        let quoted = shell_quote(&s);
        prop_assert_eq!(shlex::split(&quoted), Some(vec![s]));
    }
}
